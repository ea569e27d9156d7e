//! Shared types for the opaque-API migration engine.
//!
//! This crate provides foundational types used across the engine crates:
//! - Source spans and line/column mapping (`span`)
//! - Trivia (comments, blank lines) attachment (`trivia`)
//! - Confidence levels and the unsafe-reason taxonomy (`confidence`)
//! - Centralized limits and thresholds (`limits`)

pub mod confidence;
pub mod limits;
pub mod span;
pub mod trivia;

pub use confidence::{ConfidenceLevel, UnsafeReason};
pub use span::{LineColumn, LineMap, Location, Span};
pub use trivia::{Trivia, TriviaBag, do_not_submit};
