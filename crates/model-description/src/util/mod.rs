//! Utility modules.

pub mod datetime;

pub use datetime::{OffsetStyle, Timestamp, TimestampParseError};
