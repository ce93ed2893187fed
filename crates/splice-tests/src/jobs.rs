//! Integration tests for clip jobs.
//!
//! Runs jobs through a `JobQueue` and writes their results back to the
//! document bin, the way an editor front-end would.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use splice_core::{JobConfig, RationalTime, Result, SpliceError, TimeRange};
use splice_jobs::{
    ClipJob, CutClipJob, JobCancel, JobEvent, JobId, JobKind, JobQueue, JobStatus,
    PENDING_OUTPUT_PROPERTY,
};
use splice_timeline::{BinClipDescriptor, BinClipId, BinClipKind, Document};

use crate::init_tracing;

const TIMEOUT: Duration = Duration::from_secs(5);

// ── Helpers ────────────────────────────────────────────────────

fn config(max_parallel: usize) -> JobConfig {
    JobConfig {
        ffmpeg_binary: PathBuf::from("/nonexistent/splice-ffmpeg"),
        max_parallel,
    }
}

fn document() -> Document {
    let mut doc = Document::new("Jobs");
    doc.bin.add_clip(
        BinClipId(1),
        BinClipDescriptor::new("interview", "media/interview.mov", BinClipKind::Video, RationalTime::from_secs(90)),
    );
    doc
}

/// Holds its clip until cancelled.
struct Blocker {
    clip: BinClipId,
    status: JobStatus,
}

impl ClipJob for Blocker {
    fn kind(&self) -> JobKind {
        JobKind::Transcode
    }
    fn clip_id(&self) -> BinClipId {
        self.clip
    }
    fn start_job(&mut self, cancel: &JobCancel, _: &mut dyn FnMut(u8)) -> Result<()> {
        self.status = JobStatus::Working;
        while !cancel.is_cancelled() {
            std::thread::sleep(Duration::from_millis(2));
        }
        self.status = JobStatus::Aborted;
        Err(SpliceError::Cancelled)
    }
    fn destination(&self) -> &Path {
        Path::new("blocker.out")
    }
    fn cancel_properties(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
    fn process_log_info(&mut self, _: &str) -> Option<u8> {
        None
    }
    fn status_message(&self) -> String {
        "blocking".into()
    }
    fn status(&self) -> &JobStatus {
        &self.status
    }
}

/// Apply a terminal event to the bin clip it belongs to.
fn write_back(doc: &mut Document, event: &JobEvent) {
    match event {
        JobEvent::Cancelled { clip, properties, .. } => {
            if let Some(descriptor) = doc.bin.clip_mut(*clip) {
                descriptor.properties.extend(properties.clone());
            }
        }
        JobEvent::Failed { clip, .. } => {
            if let Some(descriptor) = doc.bin.clip_mut(*clip) {
                descriptor.properties.remove(PENDING_OUTPUT_PROPERTY);
            }
        }
        _ => {}
    }
}

/// Events received so far, so waiting on one job never loses another's.
struct EventLog<'a> {
    queue: &'a JobQueue,
    seen: Vec<JobEvent>,
}

impl<'a> EventLog<'a> {
    fn new(queue: &'a JobQueue) -> Self {
        Self {
            queue,
            seen: Vec::new(),
        }
    }

    fn wait(&mut self, predicate: impl Fn(&JobEvent) -> bool) -> JobEvent {
        if let Some(event) = self.seen.iter().find(|&event| predicate(event)) {
            return event.clone();
        }
        loop {
            let event = self.queue.events().recv_timeout(TIMEOUT).expect("job event");
            self.seen.push(event.clone());
            if predicate(&event) {
                return event;
            }
        }
    }

    fn started(&mut self, id: JobId) {
        self.wait(|event| matches!(event, JobEvent::Started { id: started, .. } if *started == id));
    }

    fn done(&mut self, id: JobId) -> JobEvent {
        self.wait(|event| event.id() == id && event.is_terminal())
    }
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn cancelled_cut_writes_properties_back() {
    init_tracing();
    let mut doc = document();
    let queue = JobQueue::new(&config(1));
    let mut log = EventLog::new(&queue);

    let blocker = queue.submit(Box::new(Blocker {
        clip: BinClipId(1),
        status: JobStatus::Waiting,
    }));
    log.started(blocker);

    let zone = TimeRange::new(RationalTime::from_secs(5), RationalTime::from_secs(20));
    let cut = CutClipJob::cut(BinClipId(1), "media/interview.mov", "media/interview-cut.mov", zone, &config(1));
    if let Some(descriptor) = doc.bin.clip_mut(BinClipId(1)) {
        descriptor.properties.insert(
            PENDING_OUTPUT_PROPERTY.to_string(),
            cut.destination().display().to_string(),
        );
    }
    let cut_id = queue.submit(Box::new(cut));
    assert_eq!(queue.pending_count(), 1);

    assert!(queue.cancel(cut_id));
    let event = log.done(cut_id);
    assert!(matches!(event, JobEvent::Cancelled { .. }));
    write_back(&mut doc, &event);

    let descriptor = doc.bin.clip(BinClipId(1)).unwrap();
    assert_eq!(
        descriptor.properties.get(PENDING_OUTPUT_PROPERTY).map(String::as_str),
        Some("")
    );

    queue.cancel(blocker);
    assert!(matches!(log.done(blocker), JobEvent::Cancelled { .. }));
    assert!(queue.is_idle());
}

#[test]
fn failed_cut_reports_and_clears_pending_output() {
    let mut doc = document();
    let queue = JobQueue::new(&config(2));
    let mut log = EventLog::new(&queue);

    let zone = TimeRange::new(RationalTime::ZERO, RationalTime::from_secs(3));
    let cut = CutClipJob::cut(BinClipId(1), "media/interview.mov", "media/short.mov", zone, &config(2));
    doc.bin
        .clip_mut(BinClipId(1))
        .unwrap()
        .properties
        .insert(PENDING_OUTPUT_PROPERTY.to_string(), "media/short.mov".to_string());

    let id = queue.submit(Box::new(cut));
    let event = log.done(id);
    match &event {
        JobEvent::Failed { message, clip, .. } => {
            assert_eq!(*clip, BinClipId(1));
            assert!(message.contains("ffmpeg"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    write_back(&mut doc, &event);
    assert!(doc
        .bin
        .clip(BinClipId(1))
        .unwrap()
        .properties
        .get(PENDING_OUTPUT_PROPERTY)
        .is_none());
}

#[test]
fn cuts_of_one_clip_run_side_by_side() {
    let queue = JobQueue::new(&config(4));
    let mut log = EventLog::new(&queue);
    let zone = TimeRange::new(RationalTime::ZERO, RationalTime::from_secs(1));
    let first = CutClipJob::cut(BinClipId(1), "in.mov", "a.mov", zone, &config(4));
    let second = CutClipJob::cut(BinClipId(1), "in.mov", "b.mov", zone, &config(4));
    assert!(!first.is_exclusive());

    let a = queue.submit(Box::new(first));
    let b = queue.submit(Box::new(second));
    assert!(matches!(log.done(a), JobEvent::Failed { .. }));
    assert!(matches!(log.done(b), JobEvent::Failed { .. }));
}
