//! Decisions returned by the decision model each pass.
//!
//! - [`entities::Decision`]: the structured output
//! - [`parser::parse_decision`]: lenient extraction from raw text
//! - [`schema::decision_schema`]: the JSON shape the model is asked for

pub mod entities;
pub mod parser;
pub mod schema;

pub use entities::Decision;
pub use parser::{DecisionParseError, parse_decision};
pub use schema::decision_schema;
