//! The collaborator interfaces action records mutate.
//!
//! Records never hold on to their target. The target is handed to
//! `apply`/`revert` on every call as an [`EditContext`], and records address
//! what they touch by track index, clip interval, or bin identifier.
//!
//! Every operation is synchronous and treats invalid input as a no-op,
//! reporting it through the return value and a `tracing` warning.

use splice_core::{RationalTime, TimeRange};
use tracing::warn;
use uuid::Uuid;

use crate::bin::{BinClipDescriptor, BinClipId, FolderId};
use crate::clip::Clip;
use crate::document::{Document, DocumentEvent};
use crate::effect::Effect;
use crate::track::{Track, TrackInfo, TrackKind};

/// Ordered track list.
pub trait TrackContainer {
    /// Create an empty track from `info` at `index`. An index past the end
    /// is rejected.
    fn add_track(&mut self, info: TrackInfo, index: usize) -> Option<Uuid>;

    /// Re-insert a previously removed track, clips included. A rejected
    /// track is handed back.
    fn insert_track(&mut self, index: usize, track: Track) -> Result<(), Track>;

    fn remove_track(&mut self, index: usize) -> Option<Track>;

    /// Replace the metadata of each track, in order.
    fn reconfigure_tracks(&mut self, infos: &[TrackInfo]);
}

/// Clip-level timeline edits.
pub trait ClipContainer {
    /// Move the edges of the clip on `track` occupying `old` to `new`.
    fn resize_clip(
        &mut self,
        track: usize,
        old: TimeRange,
        new: TimeRange,
        suppress_warning: bool,
    ) -> bool;

    /// Split the audio of the clip at `position` onto an audio track
    /// (`enable`), or merge a previously split audio clip back.
    fn split_audio(
        &mut self,
        position: RationalTime,
        track: usize,
        effects: &[Effect],
        enable: bool,
    ) -> bool;

    /// Replace `old` with `new` at `stack_position` in the effect stack of the
    /// clip at `position`. `None` on either side inserts or removes; an insert
    /// past the end of the stack is rejected.
    fn edit_effect(
        &mut self,
        track: usize,
        position: RationalTime,
        old: Option<&Effect>,
        new: Option<&Effect>,
        stack_position: usize,
        refresh_ui: bool,
    ) -> bool;
}

/// Project bin clips.
pub trait ClipBin {
    fn add_clip(&mut self, descriptor: &BinClipDescriptor, id: BinClipId) -> bool;
    fn delete_clip(&mut self, id: BinClipId) -> Option<BinClipDescriptor>;
}

/// Project bin folders.
pub trait FolderRegistry {
    /// Delete, rename, or create folder `id`, in that order of precedence.
    fn add_or_rename_folder(
        &mut self,
        name: &str,
        id: FolderId,
        is_delete: bool,
        is_rename: bool,
    ) -> bool;
}

/// Everything an action record can touch, plus the identity a history binds to.
pub trait EditContext: TrackContainer + ClipContainer + ClipBin + FolderRegistry {
    fn context_id(&self) -> Uuid;
}

// ── Document implementation ─────────────────────────────────────

impl TrackContainer for Document {
    fn add_track(&mut self, info: TrackInfo, index: usize) -> Option<Uuid> {
        let track = Track::new(info);
        let id = track.id;
        self.insert_track(index, track).ok().map(|()| id)
    }

    fn insert_track(&mut self, index: usize, track: Track) -> Result<(), Track> {
        if index > self.sequence.tracks.len() {
            warn!(index, tracks = self.sequence.tracks.len(), "Cannot insert track past the end");
            return Err(track);
        }
        self.sequence.tracks.insert(index, track);
        self.notify(DocumentEvent::TrackInserted { index });
        Ok(())
    }

    fn remove_track(&mut self, index: usize) -> Option<Track> {
        if index >= self.sequence.tracks.len() {
            warn!(index, "Cannot remove missing track");
            return None;
        }
        let track = self.sequence.tracks.remove(index);
        self.notify(DocumentEvent::TrackRemoved { index });
        Some(track)
    }

    fn reconfigure_tracks(&mut self, infos: &[TrackInfo]) {
        if infos.len() != self.sequence.tracks.len() {
            warn!(
                given = infos.len(),
                tracks = self.sequence.tracks.len(),
                "Track configuration length mismatch"
            );
        }
        for (track, info) in self.sequence.tracks.iter_mut().zip(infos) {
            track.info = info.clone();
        }
        self.notify(DocumentEvent::TracksReconfigured);
    }
}

impl ClipContainer for Document {
    fn resize_clip(
        &mut self,
        track_index: usize,
        old: TimeRange,
        new: TimeRange,
        suppress_warning: bool,
    ) -> bool {
        let Some(track) = self.sequence.track_mut(track_index) else {
            if !suppress_warning {
                warn!(track = track_index, "Cannot resize clip on missing track");
            }
            return false;
        };
        if track.info.locked {
            warn!(track = track_index, "Cannot resize clip on locked track");
            return false;
        }
        let Some(clip) = track.clip_with_range(old) else {
            if !suppress_warning {
                warn!(track = track_index, range = %old, "Cannot find clip to resize");
            }
            return false;
        };
        let clip_id = clip.id;
        if !clip.can_occupy(new) || !track.is_free(new, Some(clip_id)) {
            warn!(track = track_index, from = %old, to = %new, "Rejected clip resize");
            return false;
        }
        if let Some(clip) = track.find_clip_mut(clip_id) {
            clip.set_timeline_range(new);
        }
        track.resort();
        self.notify(DocumentEvent::ClipChanged {
            track: track_index,
            clip: clip_id,
        });
        true
    }

    fn split_audio(
        &mut self,
        position: RationalTime,
        track_index: usize,
        effects: &[Effect],
        enable: bool,
    ) -> bool {
        let Some(source) = self
            .sequence
            .track(track_index)
            .filter(|track| track.kind() == TrackKind::Video)
            .and_then(|track| track.clip_at(position))
            .cloned()
        else {
            warn!(track = track_index, %position, "No video clip to split audio from");
            return false;
        };

        if enable {
            split_audio_out(self, track_index, source, effects)
        } else {
            merge_audio_back(self, track_index, source)
        }
    }

    fn edit_effect(
        &mut self,
        track_index: usize,
        position: RationalTime,
        old: Option<&Effect>,
        new: Option<&Effect>,
        stack_position: usize,
        refresh_ui: bool,
    ) -> bool {
        let Some(clip) = self
            .sequence
            .track_mut(track_index)
            .and_then(|track| track.clip_at_mut(position))
        else {
            warn!(track = track_index, %position, "No clip to edit effect on");
            return false;
        };
        let slot_matches = |effects: &[Effect], expected: &Effect| {
            effects
                .get(stack_position)
                .is_some_and(|current| current.id == expected.id)
        };

        let edited = match (old, new) {
            (None, Some(new)) if stack_position <= clip.effects.len() => {
                clip.effects.insert(stack_position, new.clone());
                true
            }
            (Some(old), None) if slot_matches(&clip.effects, old) => {
                clip.effects.remove(stack_position);
                true
            }
            (Some(old), Some(new)) if slot_matches(&clip.effects, old) => {
                clip.effects[stack_position] = new.clone();
                true
            }
            _ => false,
        };
        if !edited {
            warn!(track = track_index, stack_position, "Effect stack does not match edit");
            return false;
        }

        let clip_id = clip.id;
        if refresh_ui {
            self.notify(DocumentEvent::EffectStackChanged {
                track: track_index,
                clip: clip_id,
            });
        }
        true
    }
}

/// Audio tracks in search order for a split from `from`: the tracks after it
/// first, then the ones before it, nearest first.
fn audio_track_candidates(document: &Document, from: usize) -> Vec<usize> {
    let tracks = &document.sequence.tracks;
    (from + 1..tracks.len())
        .chain((0..from).rev())
        .filter(|&index| tracks[index].kind() == TrackKind::Audio && !tracks[index].info.locked)
        .collect()
}

fn split_audio_out(
    document: &mut Document,
    track_index: usize,
    source: Clip,
    effects: &[Effect],
) -> bool {
    if source.audio_link.is_some() || !source.audio_enabled {
        warn!(clip = %source.id, "Clip audio is already split");
        return false;
    }
    let range = source.timeline_range();
    let Some(audio_index) = audio_track_candidates(document, track_index)
        .into_iter()
        .find(|&index| document.sequence.tracks[index].is_free(range, None))
    else {
        warn!(clip = %source.id, "No free audio track for split audio");
        return false;
    };

    let mut audio = source.clone();
    audio.id = Uuid::new_v4();
    audio.effects = effects.to_vec();
    audio.audio_link = Some(source.id);
    audio.audio_enabled = true;
    let audio_id = audio.id;
    if !document.sequence.tracks[audio_index].insert_clip(audio) {
        return false;
    }

    if let Some(video) = document.sequence.tracks[track_index].find_clip_mut(source.id) {
        video.audio_link = Some(audio_id);
        video.audio_enabled = false;
    }
    document.notify(DocumentEvent::ClipInserted {
        track: audio_index,
        clip: audio_id,
    });
    document.notify(DocumentEvent::ClipChanged {
        track: track_index,
        clip: source.id,
    });
    true
}

fn merge_audio_back(document: &mut Document, track_index: usize, source: Clip) -> bool {
    let Some(audio_id) = source.audio_link else {
        warn!(clip = %source.id, "Clip audio is not split");
        return false;
    };
    let removed_from = document
        .sequence
        .tracks
        .iter_mut()
        .enumerate()
        .find_map(|(index, track)| track.remove_clip(audio_id).map(|_| index));

    if let Some(video) = document.sequence.tracks[track_index].find_clip_mut(source.id) {
        video.audio_link = None;
        video.audio_enabled = true;
    }
    if let Some(index) = removed_from {
        document.notify(DocumentEvent::ClipRemoved {
            track: index,
            clip: audio_id,
        });
    }
    document.notify(DocumentEvent::ClipChanged {
        track: track_index,
        clip: source.id,
    });
    true
}

impl ClipBin for Document {
    fn add_clip(&mut self, descriptor: &BinClipDescriptor, id: BinClipId) -> bool {
        if !self.bin.add_clip(id, descriptor.clone()) {
            warn!(%id, "Bin clip id already in use");
            return false;
        }
        self.notify(DocumentEvent::BinClipAdded(id));
        true
    }

    fn delete_clip(&mut self, id: BinClipId) -> Option<BinClipDescriptor> {
        let removed = self.bin.remove_clip(id);
        match removed {
            Some(_) => self.notify(DocumentEvent::BinClipRemoved(id)),
            None => warn!(%id, "Cannot delete missing bin clip"),
        }
        removed
    }
}

impl FolderRegistry for Document {
    fn add_or_rename_folder(
        &mut self,
        name: &str,
        id: FolderId,
        is_delete: bool,
        is_rename: bool,
    ) -> bool {
        let (done, event) = if is_delete {
            (
                self.bin.remove_folder(id).is_some(),
                DocumentEvent::FolderRemoved(id),
            )
        } else if is_rename {
            (
                self.bin.rename_folder(id, name).is_some(),
                DocumentEvent::FolderRenamed(id),
            )
        } else {
            (self.bin.add_folder(id, name), DocumentEvent::FolderAdded(id))
        };
        if done {
            self.notify(event);
        } else {
            warn!(%id, name, is_delete, is_rename, "Folder operation had no target");
        }
        done
    }
}

impl EditContext for Document {
    fn context_id(&self) -> Uuid {
        self.id
    }
}
