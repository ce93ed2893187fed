//! Job scheduling with per-clip exclusivity.
//!
//! Jobs run on their own worker thread. At most `max_parallel` run at once;
//! an exclusive job never shares its clip with another running job, and jobs
//! on the same clip start in submission order.

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use splice_core::{JobConfig, SpliceError};
use splice_timeline::BinClipId;
use tracing::{debug, info, warn};

use crate::job::{ClipJob, JobCancel, JobId};

/// Progress and completion notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Started {
        id: JobId,
        clip: BinClipId,
    },
    Progress {
        id: JobId,
        percent: u8,
    },
    Finished {
        id: JobId,
        clip: BinClipId,
        destination: PathBuf,
    },
    Failed {
        id: JobId,
        clip: BinClipId,
        message: String,
    },
    /// The job was cancelled; `properties` should be written back to the clip.
    Cancelled {
        id: JobId,
        clip: BinClipId,
        properties: BTreeMap<String, String>,
    },
}

impl JobEvent {
    pub fn id(&self) -> JobId {
        match self {
            Self::Started { id, .. }
            | Self::Progress { id, .. }
            | Self::Finished { id, .. }
            | Self::Failed { id, .. }
            | Self::Cancelled { id, .. } => *id,
        }
    }

    /// Whether this is the last event of its job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}

struct QueuedJob {
    id: JobId,
    clip: BinClipId,
    exclusive: bool,
    cancel: JobCancel,
    job: Box<dyn ClipJob>,
}

struct RunningJob {
    id: JobId,
    clip: BinClipId,
    exclusive: bool,
    cancel: JobCancel,
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    pending: VecDeque<QueuedJob>,
    running: Vec<RunningJob>,
}

impl QueueState {
    /// Whether a job on `clip` may start next to the running set.
    fn admits(&self, clip: BinClipId, exclusive: bool) -> bool {
        self.running
            .iter()
            .filter(|running| running.clip == clip)
            .all(|running| !exclusive && !running.exclusive)
    }

    /// Index of the first pending job allowed to start.
    fn next_startable(&self) -> Option<usize> {
        self.pending.iter().enumerate().find_map(|(index, queued)| {
            let earlier_on_clip = self
                .pending
                .iter()
                .take(index)
                .any(|earlier| earlier.clip == queued.clip);
            (!earlier_on_clip && self.admits(queued.clip, queued.exclusive)).then_some(index)
        })
    }
}

struct Shared {
    state: Mutex<QueueState>,
    events: Sender<JobEvent>,
    max_parallel: usize,
}

/// Runs clip jobs in the background.
pub struct JobQueue {
    shared: Arc<Shared>,
    events: Receiver<JobEvent>,
}

impl JobQueue {
    pub fn new(config: &JobConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                events: tx,
                max_parallel: config.max_parallel.max(1),
            }),
            events: rx,
        }
    }

    /// Queue a job; it starts as soon as the scheduling rules allow.
    pub fn submit(&self, job: Box<dyn ClipJob>) -> JobId {
        let id = {
            let mut state = self.shared.state.lock();
            state.next_id += 1;
            let id = JobId(state.next_id);
            debug!(%id, clip = %job.clip_id(), exclusive = job.is_exclusive(), "Job queued");
            state.pending.push_back(QueuedJob {
                id,
                clip: job.clip_id(),
                exclusive: job.is_exclusive(),
                cancel: JobCancel::new(),
                job,
            });
            id
        };
        schedule(&self.shared);
        id
    }

    /// Cancel a queued or running job. Returns false for unknown or finished
    /// jobs.
    pub fn cancel(&self, id: JobId) -> bool {
        let mut state = self.shared.state.lock();
        if let Some(index) = state.pending.iter().position(|queued| queued.id == id) {
            let removed = state.pending.remove(index);
            drop(state);
            if let Some(queued) = removed {
                info!(%id, "Cancelled queued job");
                let _ = self.shared.events.send(JobEvent::Cancelled {
                    id,
                    clip: queued.clip,
                    properties: queued.job.cancel_properties(),
                });
                schedule(&self.shared);
            }
            return true;
        }
        match state.running.iter().find(|running| running.id == id) {
            Some(running) => {
                running.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every queued and running job.
    pub fn cancel_all(&self) {
        let ids: Vec<JobId> = {
            let state = self.shared.state.lock();
            state
                .pending
                .iter()
                .map(|queued| queued.id)
                .chain(state.running.iter().map(|running| running.id))
                .collect()
        };
        for id in ids {
            self.cancel(id);
        }
    }

    /// Event stream shared by all jobs of this queue.
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    pub fn pending_count(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    pub fn running_count(&self) -> usize {
        self.shared.state.lock().running.len()
    }

    /// Jobs currently running on `clip`.
    pub fn running_on(&self, clip: BinClipId) -> Vec<JobId> {
        self.shared
            .state
            .lock()
            .running
            .iter()
            .filter(|running| running.clip == clip)
            .map(|running| running.id)
            .collect()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.shared.state.lock();
        state.pending.is_empty() && state.running.is_empty()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.pending.clear();
        for running in &state.running {
            running.cancel.cancel();
        }
    }
}

/// Start every pending job the rules allow.
fn schedule(shared: &Arc<Shared>) {
    let mut started = Vec::new();
    {
        let mut state = shared.state.lock();
        while state.running.len() < shared.max_parallel {
            let Some(index) = state.next_startable() else {
                break;
            };
            let Some(queued) = state.pending.remove(index) else {
                break;
            };
            state.running.push(RunningJob {
                id: queued.id,
                clip: queued.clip,
                exclusive: queued.exclusive,
                cancel: queued.cancel.clone(),
            });
            started.push(queued);
        }
    }
    for queued in started {
        spawn_worker(Arc::clone(shared), queued);
    }
}

fn spawn_worker(shared: Arc<Shared>, queued: QueuedJob) {
    let QueuedJob {
        id,
        clip,
        cancel,
        mut job,
        ..
    } = queued;

    let spawned = thread::Builder::new()
        .name(format!("clip-job-{}", id.0))
        .spawn({
            let shared = Arc::clone(&shared);
            move || {
                let events = shared.events.clone();
                let _ = events.send(JobEvent::Started { id, clip });
                let result = job.start_job(&cancel, &mut |percent| {
                    let _ = events.send(JobEvent::Progress { id, percent });
                });
                let event = match result {
                    Ok(()) => JobEvent::Finished {
                        id,
                        clip,
                        destination: job.destination().to_path_buf(),
                    },
                    Err(SpliceError::Cancelled) => JobEvent::Cancelled {
                        id,
                        clip,
                        properties: job.cancel_properties(),
                    },
                    Err(e) => JobEvent::Failed {
                        id,
                        clip,
                        message: e.to_string(),
                    },
                };
                finish(&shared, id, event);
            }
        });

    if let Err(e) = spawned {
        warn!(%id, error = %e, "Failed to spawn job worker");
        finish(
            &shared,
            id,
            JobEvent::Failed {
                id,
                clip,
                message: format!("Failed to spawn worker: {e}"),
            },
        );
    }
}

/// Retire a job and start whatever it was blocking.
fn finish(shared: &Arc<Shared>, id: JobId, event: JobEvent) {
    shared.state.lock().running.retain(|running| running.id != id);
    debug!(%id, ?event, "Job done");
    let _ = shared.events.send(event);
    schedule(shared);
}
