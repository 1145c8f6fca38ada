//! Knowledge lookup adapters

mod wikipedia;

pub use wikipedia::{DEFAULT_WIKIPEDIA_ENDPOINT, WikipediaLookup};
