//! Splice Core - Foundation types for the edit history
//!
//! This crate provides the types shared by every Splice crate:
//! - Time representation (RationalTime, FrameRate, TimeRange)
//! - The error taxonomy
//! - Runtime configuration

pub mod config;
pub mod error;
pub mod time;

pub use config::{HistoryConfig, JobConfig, SpliceConfig};
pub use error::{Result, SpliceError};
pub use time::{FrameRate, RationalTime, TimeRange};
