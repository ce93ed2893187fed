//! Reversible edit records.
//!
//! Every mutation is an [`Action`] that knows how to apply itself to an
//! [`EditContext`] and how to revert that effect. An [`ActionRecord`] wraps an
//! action with its label and whether it is currently in effect.

use std::time::{Duration, Instant};

use splice_core::{RationalTime, TimeRange};
use tracing::debug;

use crate::bin::{BinClipDescriptor, BinClipId, FolderId};
use crate::context::EditContext;
use crate::effect::Effect;
use crate::track::{Track, TrackInfo};

/// Whether the forward effect of a presence edit creates or removes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Insert,
    Remove,
}

// ── Actions ─────────────────────────────────────────────────────

/// A reversible edit operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Add or delete a track at `index`.
    Track {
        index: usize,
        info: TrackInfo,
        /// Track contents while it is out of the sequence. Filled on removal
        /// so re-insertion brings back the same track, clips included.
        track: Option<Track>,
        direction: Direction,
    },
    /// Replace the metadata of every track.
    ConfigureTracks {
        old: Vec<TrackInfo>,
        new: Vec<TrackInfo>,
    },
    /// Move the edges of the clip occupying `old` on a track.
    ResizeClip {
        track: usize,
        old: TimeRange,
        new: TimeRange,
        suppress_warning: bool,
    },
    /// Split the audio of a video clip onto an audio track (`enable`), or
    /// merge it back.
    SplitAudio {
        track: usize,
        position: RationalTime,
        effects: Vec<Effect>,
        enable: bool,
    },
    /// Change one entry of a clip's effect stack.
    EditEffect {
        track: usize,
        position: RationalTime,
        old: Option<Effect>,
        new: Option<Effect>,
        stack_position: usize,
        refresh_ui: bool,
    },
    /// Add or delete a bin clip.
    BinClip {
        id: BinClipId,
        descriptor: BinClipDescriptor,
        direction: Direction,
    },
    /// Add or delete a bin folder.
    Folder {
        id: FolderId,
        name: String,
        direction: Direction,
    },
    RenameFolder {
        id: FolderId,
        old_name: String,
        new_name: String,
    },
    /// Several actions undone and redone as one step.
    Batch { label: String, actions: Vec<Action> },
}

impl Action {
    pub fn add_track(index: usize, info: TrackInfo) -> Self {
        Self::Track {
            index,
            info,
            track: None,
            direction: Direction::Insert,
        }
    }

    /// Delete the track at `index`. `track` is its current content, used to
    /// restore it when the deletion has already happened.
    pub fn delete_track(index: usize, track: Track) -> Self {
        Self::Track {
            index,
            info: track.info.clone(),
            track: Some(track),
            direction: Direction::Remove,
        }
    }

    pub fn configure_tracks(old: Vec<TrackInfo>, new: Vec<TrackInfo>) -> Self {
        Self::ConfigureTracks { old, new }
    }

    pub fn resize_clip(track: usize, old: TimeRange, new: TimeRange) -> Self {
        Self::ResizeClip {
            track,
            old,
            new,
            suppress_warning: false,
        }
    }

    pub fn split_audio(
        track: usize,
        position: RationalTime,
        effects: Vec<Effect>,
        enable: bool,
    ) -> Self {
        Self::SplitAudio {
            track,
            position,
            effects,
            enable,
        }
    }

    pub fn edit_effect(
        track: usize,
        position: RationalTime,
        old: Option<Effect>,
        new: Option<Effect>,
        stack_position: usize,
        refresh_ui: bool,
    ) -> Self {
        Self::EditEffect {
            track,
            position,
            old,
            new,
            stack_position,
            refresh_ui,
        }
    }

    pub fn add_bin_clip(id: BinClipId, descriptor: BinClipDescriptor) -> Self {
        Self::BinClip {
            id,
            descriptor,
            direction: Direction::Insert,
        }
    }

    pub fn delete_bin_clip(id: BinClipId, descriptor: BinClipDescriptor) -> Self {
        Self::BinClip {
            id,
            descriptor,
            direction: Direction::Remove,
        }
    }

    pub fn add_folder(id: FolderId, name: impl Into<String>) -> Self {
        Self::Folder {
            id,
            name: name.into(),
            direction: Direction::Insert,
        }
    }

    pub fn delete_folder(id: FolderId, name: impl Into<String>) -> Self {
        Self::Folder {
            id,
            name: name.into(),
            direction: Direction::Remove,
        }
    }

    pub fn rename_folder(
        id: FolderId,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameFolder {
            id,
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    pub fn batch(label: impl Into<String>, actions: Vec<Action>) -> Self {
        Self::Batch {
            label: label.into(),
            actions,
        }
    }

    /// Label shown in the undo menu.
    pub fn default_label(&self) -> String {
        let label = match self {
            Self::Track {
                direction: Direction::Insert,
                ..
            } => "Add track",
            Self::Track {
                direction: Direction::Remove,
                ..
            } => "Delete track",
            Self::ConfigureTracks { .. } => "Configure tracks",
            Self::ResizeClip { .. } => "Resize clip",
            Self::SplitAudio { enable: true, .. } => "Split audio",
            Self::SplitAudio { enable: false, .. } => "Unsplit audio",
            Self::EditEffect { .. } => "Edit effect",
            Self::BinClip {
                direction: Direction::Insert,
                ..
            } => "Add clip",
            Self::BinClip {
                direction: Direction::Remove,
                ..
            } => "Delete clip",
            Self::Folder {
                direction: Direction::Insert,
                ..
            } => "Add folder",
            Self::Folder {
                direction: Direction::Remove,
                ..
            } => "Delete folder",
            Self::RenameFolder { .. } => "Rename folder",
            Self::Batch { label, .. } => return label.clone(),
        };
        label.to_string()
    }

    /// Perform the forward effect.
    pub fn apply<C: EditContext + ?Sized>(&mut self, ctx: &mut C) {
        self.run(ctx, true);
    }

    /// Undo the forward effect.
    pub fn revert<C: EditContext + ?Sized>(&mut self, ctx: &mut C) {
        self.run(ctx, false);
    }

    fn run<C: EditContext + ?Sized>(&mut self, ctx: &mut C, forward: bool) {
        match self {
            Self::Track {
                index,
                info,
                track,
                direction,
            } => {
                if (*direction == Direction::Insert) == forward {
                    match track.take() {
                        Some(captured) => {
                            if let Err(rejected) = ctx.insert_track(*index, captured) {
                                *track = Some(rejected);
                            }
                        }
                        None if *direction == Direction::Insert => {
                            ctx.add_track(info.clone(), *index);
                        }
                        // the deletion never happened, so there is nothing to restore
                        None => debug!(index = *index, "No deleted track to restore"),
                    }
                } else if let Some(removed) = ctx.remove_track(*index) {
                    *track = Some(removed);
                } else if *direction == Direction::Remove {
                    *track = None;
                }
            }
            Self::ConfigureTracks { old, new } => {
                ctx.reconfigure_tracks(if forward { new } else { old });
            }
            Self::ResizeClip {
                track,
                old,
                new,
                suppress_warning,
            } => {
                let (from, to) = if forward { (*old, *new) } else { (*new, *old) };
                ctx.resize_clip(*track, from, to, *suppress_warning);
            }
            Self::SplitAudio {
                track,
                position,
                effects,
                enable,
            } => {
                ctx.split_audio(*position, *track, effects, *enable == forward);
            }
            Self::EditEffect {
                track,
                position,
                old,
                new,
                stack_position,
                refresh_ui,
            } => {
                let (from, to) = if forward { (old, new) } else { (new, old) };
                ctx.edit_effect(
                    *track,
                    *position,
                    from.as_ref(),
                    to.as_ref(),
                    *stack_position,
                    *refresh_ui,
                );
            }
            Self::BinClip {
                id,
                descriptor,
                direction,
            } => {
                if (*direction == Direction::Insert) == forward {
                    ctx.add_clip(descriptor, *id);
                } else if let Some(removed) = ctx.delete_clip(*id) {
                    // keep whatever properties the clip gained since it was added
                    *descriptor = removed;
                }
            }
            Self::Folder {
                id,
                name,
                direction,
            } => {
                let is_delete = (*direction == Direction::Remove) == forward;
                ctx.add_or_rename_folder(name, *id, is_delete, false);
            }
            Self::RenameFolder {
                id,
                old_name,
                new_name,
            } => {
                let name = if forward { new_name } else { old_name };
                ctx.add_or_rename_folder(name, *id, false, true);
            }
            Self::Batch { actions, .. } => {
                if forward {
                    for action in actions.iter_mut() {
                        action.run(ctx, true);
                    }
                } else {
                    for action in actions.iter_mut().rev() {
                        action.run(ctx, false);
                    }
                }
            }
        }
    }

    /// Fold `next` into this action when both edit the same target and
    /// `next` continues where this one ends. The merged action keeps this
    /// action's before-state and takes `next`'s after-state.
    pub fn try_merge(&mut self, next: &Action) -> bool {
        match (self, next) {
            (
                Self::ResizeClip { track, new, .. },
                Self::ResizeClip {
                    track: next_track,
                    old: next_old,
                    new: next_new,
                    ..
                },
            ) if *track == *next_track && *new == *next_old => {
                *new = *next_new;
                true
            }
            (
                Self::EditEffect {
                    track,
                    position,
                    new: Some(current),
                    stack_position,
                    refresh_ui,
                    ..
                },
                Self::EditEffect {
                    track: next_track,
                    position: next_position,
                    old: Some(next_old),
                    new: Some(next_new),
                    stack_position: next_stack_position,
                    refresh_ui: next_refresh,
                },
            ) if *track == *next_track
                && *position == *next_position
                && *stack_position == *next_stack_position
                && current.id == next_old.id
                && next_new.id == next_old.id =>
            {
                *current = next_new.clone();
                *refresh_ui |= *next_refresh;
                true
            }
            (
                Self::RenameFolder { id, new_name, .. },
                Self::RenameFolder {
                    id: next_id,
                    old_name: next_old,
                    new_name: next_new,
                },
            ) if *id == *next_id && *new_name == *next_old => {
                new_name.clone_from(next_new);
                true
            }
            _ => false,
        }
    }

    /// Whether applying this action leaves its target unchanged.
    pub fn is_noop(&self) -> bool {
        match self {
            Self::ResizeClip { old, new, .. } => old == new,
            Self::EditEffect { old, new, .. } => old == new,
            Self::RenameFolder {
                old_name, new_name, ..
            } => old_name == new_name,
            Self::ConfigureTracks { old, new } => old == new,
            Self::Batch { actions, .. } => actions.iter().all(Action::is_noop),
            _ => false,
        }
    }
}

// ── Records ─────────────────────────────────────────────────────

/// Whether a record's effect is currently in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Created but never applied.
    Pending,
    Applied,
    Reverted,
}

/// One entry of an [`crate::ActionHistory`].
#[derive(Debug, Clone)]
pub struct ActionRecord {
    label: String,
    action: Action,
    state: RecordState,
    /// Time of the last edit folded into this record.
    timestamp: Instant,
}

impl ActionRecord {
    /// A record whose effect has not happened yet. The history applies it
    /// once when it is pushed.
    pub fn forward(action: Action) -> Self {
        Self::with_state(action, RecordState::Pending)
    }

    /// A record for an edit the caller already performed. Pushing it does not
    /// touch the context; the first `redo` after an `undo` re-applies it.
    pub fn already_applied(action: Action) -> Self {
        Self::with_state(action, RecordState::Applied)
    }

    fn with_state(action: Action, state: RecordState) -> Self {
        Self {
            label: action.default_label(),
            action,
            state,
            timestamp: Instant::now(),
        }
    }

    /// Override the undo menu label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Override the creation time used for merge decisions.
    pub fn with_timestamp(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_applied(&self) -> bool {
        self.state == RecordState::Applied
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Perform the forward effect. Returns false without touching the context
    /// when the effect is already in place.
    pub fn apply<C: EditContext + ?Sized>(&mut self, ctx: &mut C) -> bool {
        if self.is_applied() {
            debug!(label = %self.label, "Record already applied");
            return false;
        }
        self.action.apply(ctx);
        self.state = RecordState::Applied;
        true
    }

    /// Undo the forward effect. Returns false without touching the context
    /// when the effect is not in place.
    pub fn revert<C: EditContext + ?Sized>(&mut self, ctx: &mut C) -> bool {
        if !self.is_applied() {
            debug!(label = %self.label, "Record not applied, nothing to revert");
            return false;
        }
        self.action.revert(ctx);
        self.state = RecordState::Reverted;
        true
    }

    /// Fold an applied `next` record into this applied one. `window` bounds
    /// the time between the two; `None` merges on target identity alone.
    pub(crate) fn try_merge(&mut self, next: &ActionRecord, window: Option<Duration>) -> bool {
        if !self.is_applied() || !next.is_applied() {
            return false;
        }
        if let Some(window) = window {
            if next.timestamp.saturating_duration_since(self.timestamp) > window {
                return false;
            }
        }
        if !self.action.try_merge(&next.action) {
            return false;
        }
        self.timestamp = self.timestamp.max(next.timestamp);
        true
    }
}
