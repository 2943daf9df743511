//! Channel layer for pattern matching and transcript filtering.
//!
//! This module holds the output buffer a session searches for prompts,
//! the default recognition patterns, and the secret log filter.

mod buffer;
mod filter;
pub mod patterns;

pub use buffer::{PatternBuffer, PatternMatch};
pub use filter::{LogFilter, MASK};
