//! Splice Jobs - background work on bin clips
//!
//! This crate handles:
//! - The `ClipJob` contract shared by every job kind
//! - Cutting and transcoding through an ffmpeg child process
//! - Scheduling jobs with per-clip exclusivity

pub mod cut;
pub mod job;
pub mod queue;

pub use cut::{CutClipJob, PENDING_OUTPUT_PROPERTY};
pub use job::{ClipJob, JobCancel, JobId, JobKind, JobStatus};
pub use queue::{JobEvent, JobQueue};
