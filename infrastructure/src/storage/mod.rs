//! Community store adapters.
//!
//! - [`InMemoryCommunityStore`]: process memory, one lock for everything
//! - [`SqliteCommunityStore`]: SQLite with record-versioned updates

mod memory;
mod sqlite;

pub use memory::InMemoryCommunityStore;
pub use sqlite::SqliteCommunityStore;
