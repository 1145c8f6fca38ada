//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: char-safe truncation used by read-side projections

pub mod error;
pub mod string;
