//! Track types for the timeline.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use splice_core::{RationalTime, TimeRange};
use uuid::Uuid;

use crate::clip::Clip;

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Track metadata, the part of a track the track dialog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: String,
    pub kind: TrackKind,
    pub muted: bool,
    /// Locked tracks reject clip edits.
    pub locked: bool,
    pub hidden: bool,
}

impl TrackInfo {
    pub fn video(name: impl Into<String>) -> Self {
        Self::new(name, TrackKind::Video)
    }

    pub fn audio(name: impl Into<String>) -> Self {
        Self::new(name, TrackKind::Audio)
    }

    fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            name: name.into(),
            kind,
            muted: false,
            locked: false,
            hidden: false,
        }
    }
}

/// A track holding non-overlapping clips sorted by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: Uuid,
    pub info: TrackInfo,
    clips: Vec<Clip>,
}

impl Track {
    /// Create an empty track.
    pub fn new(info: TrackInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            info,
            clips: Vec::new(),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.info.kind
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Number of clips on this track.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// End of the last clip.
    pub fn duration(&self) -> RationalTime {
        self.clips
            .last()
            .map(|clip| clip.timeline_range().end())
            .unwrap_or(RationalTime::ZERO)
    }

    /// Whether `range` is free, ignoring the clip with id `except`.
    pub fn is_free(&self, range: TimeRange, except: Option<Uuid>) -> bool {
        self.overlapping(range)
            .iter()
            .all(|&index| Some(self.clips[index].id) == except)
    }

    /// Indices of clips overlapping `range`.
    pub fn overlapping(&self, range: TimeRange) -> SmallVec<[usize; 4]> {
        self.clips
            .iter()
            .enumerate()
            .filter(|(_, clip)| clip.timeline_range().overlaps(range))
            .map(|(index, _)| index)
            .collect()
    }

    /// Insert a clip at its position. Returns false (and drops nothing) when
    /// the clip would overlap an existing one.
    pub fn insert_clip(&mut self, clip: Clip) -> bool {
        if !self.is_free(clip.timeline_range(), None) {
            return false;
        }
        let index = self
            .clips
            .partition_point(|existing| existing.position < clip.position);
        self.clips.insert(index, clip);
        true
    }

    /// Remove a clip by UUID.
    pub fn remove_clip(&mut self, id: Uuid) -> Option<Clip> {
        let index = self.clips.iter().position(|clip| clip.id == id)?;
        Some(self.clips.remove(index))
    }

    /// Find a clip by UUID.
    pub fn find_clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id == id)
    }

    pub fn find_clip_mut(&mut self, id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id == id)
    }

    /// The clip covering `time`.
    pub fn clip_at(&self, time: RationalTime) -> Option<&Clip> {
        self.clips
            .iter()
            .find(|clip| clip.timeline_range().contains(time))
    }

    pub fn clip_at_mut(&mut self, time: RationalTime) -> Option<&mut Clip> {
        self.clips
            .iter_mut()
            .find(|clip| clip.timeline_range().contains(time))
    }

    /// The clip occupying exactly `range`.
    pub fn clip_with_range(&self, range: TimeRange) -> Option<&Clip> {
        self.clips
            .iter()
            .find(|clip| clip.timeline_range() == range)
    }

    /// Re-sort after a clip moved. Clips never overlap, so ordering by
    /// position is total.
    pub(crate) fn resort(&mut self) {
        self.clips.sort_by_key(|clip| clip.position);
    }
}
