//! Clip types for the timeline.

use serde::{Deserialize, Serialize};
use splice_core::{RationalTime, TimeRange};
use uuid::Uuid;

use crate::bin::BinClipId;
use crate::effect::Effect;

/// Reference to a media source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRef {
    /// Path to the media file
    pub path: String,
    /// Source duration
    pub source_duration: RationalTime,
}

impl ClipRef {
    pub fn new(path: impl Into<String>, duration: RationalTime) -> Self {
        Self {
            path: path.into(),
            source_duration: duration,
        }
    }
}

/// A clip placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: Uuid,
    /// Bin clip this instance was cut from
    pub bin_id: Option<BinClipId>,
    /// Clip name (displayed in UI)
    pub name: String,
    /// Reference to source media
    pub source: ClipRef,
    /// Start on the timeline
    pub position: RationalTime,
    /// Source in point
    pub source_in: RationalTime,
    /// Duration on timeline
    pub duration: RationalTime,
    pub enabled: bool,
    /// False once the audio stream has been split onto its own clip.
    pub audio_enabled: bool,
    /// Companion audio clip created by an audio split.
    pub audio_link: Option<Uuid>,
    /// Effect stack, applied top to bottom.
    pub effects: Vec<Effect>,
}

impl Clip {
    /// Create a clip covering the whole source, placed at `position`.
    pub fn new(name: impl Into<String>, source: ClipRef, position: RationalTime) -> Self {
        let duration = source.source_duration;
        Self {
            id: Uuid::new_v4(),
            bin_id: None,
            name: name.into(),
            source,
            position,
            source_in: RationalTime::ZERO,
            duration,
            enabled: true,
            audio_enabled: true,
            audio_link: None,
            effects: Vec::new(),
        }
    }

    /// Interval occupied on the timeline.
    pub fn timeline_range(&self) -> TimeRange {
        TimeRange::new(self.position, self.duration)
    }

    pub fn source_out(&self) -> RationalTime {
        self.source_in + self.duration
    }

    /// Whether `range` is a valid placement for this clip's media: non-empty,
    /// not before the timeline origin, and within the source bounds once the
    /// in point follows the start edge.
    pub fn can_occupy(&self, range: TimeRange) -> bool {
        if range.is_empty() || range.start.is_negative() {
            return false;
        }
        let source_in = self.source_in + (range.start - self.position);
        !source_in.is_negative() && source_in + range.duration <= self.source.source_duration
    }

    /// Move the clip edges to `range`. The in point follows the start edge so
    /// the frames under the untouched edge stay put.
    pub fn set_timeline_range(&mut self, range: TimeRange) {
        self.source_in = self.source_in + (range.start - self.position);
        self.position = range.start;
        self.duration = range.duration;
    }
}
