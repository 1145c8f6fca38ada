//! Run summary output

pub mod console;
pub mod formatter;
