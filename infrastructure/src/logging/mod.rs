//! Structured transcript logging.
//!
//! [`JsonlTranscriptLogger`] appends every community event as one JSON
//! line and implements the [`TranscriptLogger`](polis_application::TranscriptLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlTranscriptLogger;
