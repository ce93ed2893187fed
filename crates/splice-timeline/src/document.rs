//! Document and sequence types.
//!
//! A [`Document`] is the edit target of an [`crate::ActionHistory`]: it owns
//! the timeline, the project bin, and a queue of change notifications for
//! whatever view is watching it.

use serde::{Deserialize, Serialize};
use splice_core::{FrameRate, RationalTime};
use uuid::Uuid;

use crate::bin::{Bin, BinClipId, FolderId};
use crate::track::{Track, TrackInfo};

/// The ordered track list of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub tracks: Vec<Track>,
}

impl Sequence {
    /// Empty sequence without tracks.
    pub fn empty() -> Self {
        Self { tracks: Vec::new() }
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Metadata of every track, in order.
    pub fn track_infos(&self) -> Vec<TrackInfo> {
        self.tracks.iter().map(|track| track.info.clone()).collect()
    }

    /// End of the longest track.
    pub fn duration(&self) -> RationalTime {
        self.tracks
            .iter()
            .map(Track::duration)
            .max()
            .unwrap_or(RationalTime::ZERO)
    }
}

impl Default for Sequence {
    /// One video and one audio track.
    fn default() -> Self {
        Self {
            tracks: vec![
                Track::new(TrackInfo::video("V1")),
                Track::new(TrackInfo::audio("A1")),
            ],
        }
    }
}

/// Change notification for views of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    TrackInserted { index: usize },
    TrackRemoved { index: usize },
    TracksReconfigured,
    ClipChanged { track: usize, clip: Uuid },
    ClipInserted { track: usize, clip: Uuid },
    ClipRemoved { track: usize, clip: Uuid },
    EffectStackChanged { track: usize, clip: Uuid },
    BinClipAdded(BinClipId),
    BinClipRemoved(BinClipId),
    FolderAdded(FolderId),
    FolderRemoved(FolderId),
    FolderRenamed(FolderId),
}

/// An editing document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Document name
    pub name: String,
    pub frame_rate: FrameRate,
    pub sequence: Sequence,
    pub bin: Bin,
    #[serde(skip)]
    events: Vec<DocumentEvent>,
}

impl Document {
    /// Create a document with the default track layout.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            frame_rate: FrameRate::default(),
            sequence: Sequence::default(),
            bin: Bin::new(),
            events: Vec::new(),
        }
    }

    /// Replace the track layout.
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub(crate) fn notify(&mut self, event: DocumentEvent) {
        self.events.push(event);
    }

    /// Take all pending change notifications.
    pub fn drain_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Documents compare by content; pending notifications are transient.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.frame_rate == other.frame_rate
            && self.sequence == other.sequence
            && self.bin == other.bin
    }
}
