//! Cut and transcode jobs backed by an ffmpeg child process.
//!
//! ffmpeg reports progress on stderr as `\r`-separated status lines carrying
//! `time=HH:MM:SS.ss`; the input duration comes from the `Duration:` line of
//! the banner. Both are turned into a percentage by `process_log_info`.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use splice_core::{JobConfig, RationalTime, Result, SpliceError, TimeRange};
use splice_timeline::BinClipId;
use tracing::{debug, info, warn};

use crate::job::{ClipJob, JobCancel, JobKind, JobStatus};

/// Bin clip property naming the file a running cut will produce.
pub const PENDING_OUTPUT_PROPERTY: &str = "pending_output";

/// Log lines kept for error reports.
const LOG_TAIL: usize = 8;

/// How often a silent ffmpeg is checked for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Cut a zone of a clip (stream copy) or transcode it with custom arguments.
#[derive(Debug)]
pub struct CutClipJob {
    clip_id: BinClipId,
    kind: JobKind,
    ffmpeg: PathBuf,
    source: PathBuf,
    destination: PathBuf,
    /// Zone to extract; `None` processes the whole clip.
    zone: Option<TimeRange>,
    /// Encoding arguments; empty means stream copy.
    encoding_args: Vec<String>,
    /// Duration progress is measured against.
    total: Option<RationalTime>,
    progress: u8,
    status: JobStatus,
    log_tail: Vec<String>,
}

impl CutClipJob {
    /// Extract `zone` of `source` into `destination` without re-encoding.
    pub fn cut(
        clip_id: BinClipId,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        zone: TimeRange,
        config: &JobConfig,
    ) -> Self {
        let mut job = Self::new(clip_id, JobKind::Cut, source, destination, config);
        job.zone = Some(zone);
        job.total = Some(zone.duration);
        job
    }

    /// Re-encode all of `source` with `encoding_args`.
    pub fn transcode(
        clip_id: BinClipId,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        encoding_args: Vec<String>,
        config: &JobConfig,
    ) -> Self {
        let mut job = Self::new(clip_id, JobKind::Transcode, source, destination, config);
        job.encoding_args = encoding_args;
        job
    }

    fn new(
        clip_id: BinClipId,
        kind: JobKind,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        config: &JobConfig,
    ) -> Self {
        Self {
            clip_id,
            kind,
            ffmpeg: config.ffmpeg_binary.clone(),
            source: source.into(),
            destination: destination.into(),
            zone: None,
            encoding_args: Vec::new(),
            total: None,
            progress: 0,
            status: JobStatus::Waiting,
            log_tail: Vec::new(),
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Build the ffmpeg command arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            self.source.to_string_lossy().into_owned(),
        ];
        if let Some(zone) = self.zone {
            args.extend([
                "-ss".to_string(),
                zone.start.to_timestamp(),
                "-t".to_string(),
                zone.duration.to_timestamp(),
            ]);
        }
        if self.encoding_args.is_empty() {
            args.extend(["-acodec", "copy", "-vcodec", "copy"].map(String::from));
        } else {
            args.extend(self.encoding_args.iter().cloned());
        }
        args.push(self.destination.to_string_lossy().into_owned());
        args
    }

    fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn remember(&mut self, line: &str) {
        if self.log_tail.len() == LOG_TAIL {
            self.log_tail.remove(0);
        }
        self.log_tail.push(line.to_string());
    }

    fn fail(&mut self, message: String) -> SpliceError {
        warn!(clip = %self.clip_id, %message, "Clip job failed");
        self.status = JobStatus::Failed(message.clone());
        SpliceError::Job(message)
    }
}

/// Kill `child` and reap it so no ffmpeg process outlives its job.
fn stop_child(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "ffmpeg already exited");
    }
    let _ = child.wait();
}

/// The token following `key` in `line`, up to the next space or comma.
fn value_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start();
    let end = rest.find([' ', ',']).unwrap_or(rest.len());
    Some(&rest[..end])
}

impl ClipJob for CutClipJob {
    fn kind(&self) -> JobKind {
        self.kind
    }

    fn clip_id(&self) -> BinClipId {
        self.clip_id
    }

    fn start_job(&mut self, cancel: &JobCancel, progress: &mut dyn FnMut(u8)) -> Result<()> {
        if cancel.is_cancelled() {
            self.status = JobStatus::Aborted;
            return Err(SpliceError::Cancelled);
        }
        if self.source == self.destination {
            return Err(self.fail("Source and destination are the same file".into()));
        }

        let args = self.ffmpeg_args();
        info!(clip = %self.clip_id, dest = %self.destination.display(), "Starting clip job");
        self.status = JobStatus::Working;

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.fail(format!("Failed to spawn ffmpeg: {e}")))?;

        let Some(stderr) = child.stderr.take() else {
            stop_child(&mut child);
            return Err(self.fail("Failed to open ffmpeg stderr".into()));
        };

        // ffmpeg can stall without writing, so stderr is read on its own
        // thread and cancellation is polled between segments
        let (segments_tx, segments) = crossbeam_channel::unbounded();
        let reader = thread::spawn(move || {
            for segment in BufReader::new(stderr).split(b'\r') {
                if segments_tx.send(segment).is_err() {
                    break;
                }
            }
        });

        loop {
            if cancel.is_cancelled() {
                // the reader ends on its own once the pipe closes
                stop_child(&mut child);
                self.status = JobStatus::Aborted;
                info!(clip = %self.clip_id, "Clip job cancelled");
                return Err(SpliceError::Cancelled);
            }
            match segments.recv_timeout(CANCEL_POLL) {
                Ok(Ok(segment)) => {
                    for line in String::from_utf8_lossy(&segment).lines() {
                        if let Some(percent) = self.process_log_info(line) {
                            progress(percent);
                        }
                        self.remember(line);
                    }
                }
                Ok(Err(e)) => {
                    stop_child(&mut child);
                    return Err(self.fail(format!("Failed to read ffmpeg output: {e}")));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let _ = reader.join();

        let exit = child
            .wait()
            .map_err(|e| self.fail(format!("Failed to wait for ffmpeg: {e}")))?;
        if !exit.success() {
            let detail = self.log_tail.last().cloned().unwrap_or_default();
            return Err(self.fail(format!("ffmpeg exited with {exit}: {detail}")));
        }

        self.progress = 100;
        progress(100);
        self.status = JobStatus::Finished;
        info!(clip = %self.clip_id, dest = %self.destination.display(), "Clip job finished");
        Ok(())
    }

    fn destination(&self) -> &Path {
        &self.destination
    }

    fn cancel_properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(PENDING_OUTPUT_PROPERTY.to_string(), String::new())])
    }

    fn process_log_info(&mut self, line: &str) -> Option<u8> {
        if self.total.is_none() {
            if let Some(duration) = value_after(line, "Duration:").and_then(RationalTime::parse_timestamp) {
                debug!(%duration, "Source duration from ffmpeg");
                self.total = Some(duration);
                return None;
            }
        }
        let time = value_after(line, "time=").and_then(RationalTime::parse_timestamp)?;
        let total = self.total.filter(|total| *total > RationalTime::ZERO)?;
        let percent = (time.to_seconds_f64() / total.to_seconds_f64() * 100.0).clamp(0.0, 100.0);
        self.progress = percent as u8;
        Some(self.progress)
    }

    fn status_message(&self) -> String {
        let verb = match self.kind {
            JobKind::Cut => "Cut",
            JobKind::Transcode => "Transcode",
        };
        let file = self.file_name();
        match &self.status {
            JobStatus::Waiting => format!("{verb} of {file} waiting"),
            JobStatus::Working => format!("{verb} of {file}: {}%", self.progress),
            JobStatus::Finished => format!("{verb} of {file} finished"),
            JobStatus::Failed(message) => format!("{verb} of {file} failed: {message}"),
            JobStatus::Aborted => format!("{verb} of {file} aborted"),
        }
    }

    fn is_exclusive(&self) -> bool {
        false
    }

    fn status(&self) -> &JobStatus {
        &self.status
    }
}
