//! Agent domain.
//!
//! - [`entities::Agent`]: a runtime agent: identity, persona, notes and buffer
//! - [`notes::Notes`]: enumerated notes with stale-index protection

pub mod entities;
pub mod notes;

pub use entities::{Agent, AppliedDecision, NEXT_PASS_PREFIX, SPAWN_PERSONA};
pub use notes::{NoteEnumeration, Notes};
