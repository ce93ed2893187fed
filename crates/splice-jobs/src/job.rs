//! The clip job contract.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use splice_core::Result;
use splice_timeline::BinClipId;

/// Identifier assigned by the [`crate::JobQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// What a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Extract a time zone of the clip into a new file.
    Cut,
    /// Re-encode the whole clip.
    Transcode,
}

/// Lifecycle of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Waiting,
    Working,
    Finished,
    Failed(String),
    Aborted,
}

/// A background task producing a file from a bin clip.
pub trait ClipJob: Send {
    fn kind(&self) -> JobKind;

    /// Bin clip the job reads from.
    fn clip_id(&self) -> BinClipId;

    /// Run the job to completion on the calling thread. `progress` receives
    /// percentages in `0..=100`. Returns `SpliceError::Cancelled` when
    /// `cancel` fires before the job is done.
    fn start_job(&mut self, cancel: &JobCancel, progress: &mut dyn FnMut(u8)) -> Result<()>;

    /// File the job writes.
    fn destination(&self) -> &Path;

    /// Bin clip properties to write back when the job is cancelled.
    fn cancel_properties(&self) -> BTreeMap<String, String>;

    /// Consume one line of the worker process log. Returns the new progress
    /// percentage when the line carried one.
    fn process_log_info(&mut self, line: &str) -> Option<u8>;

    /// Human readable state for the job list.
    fn status_message(&self) -> String;

    /// Exclusive jobs never run alongside another job on the same clip.
    fn is_exclusive(&self) -> bool {
        true
    }

    fn status(&self) -> &JobStatus;
}

/// Handle for cancelling a queued or running job.
#[derive(Debug, Clone)]
pub struct JobCancel(Arc<AtomicBool>);

impl JobCancel {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for JobCancel {
    fn default() -> Self {
        Self::new()
    }
}
