//! Integration tests for the undo history.
//!
//! Drives `ActionHistory` against a real `Document` through
//! splice-timeline's public API, including persistence.

use proptest::prelude::*;
use splice_core::{HistoryConfig, RationalTime, SpliceError, TimeRange};
use splice_timeline::{
    Action, ActionHistory, ActionRecord, BinClipDescriptor, BinClipId, BinClipKind, Clip, ClipRef,
    Document, DocumentFile, Effect, EffectKind, FolderId, Track, TrackInfo,
};

use crate::init_tracing;

// ── Helpers ────────────────────────────────────────────────────

fn secs(s: i64) -> RationalTime {
    RationalTime::from_secs(s)
}

/// V1 holding a 10s shot cut from a 60s source, A1 empty.
fn document() -> Document {
    let mut doc = Document::new("Integration");
    let mut shot = Clip::new("shot", ClipRef::new("media/shot.mov", secs(60)), secs(0));
    shot.duration = secs(10);
    doc.sequence.tracks[0].insert_clip(shot);
    doc
}

fn shot_range(doc: &Document) -> Option<TimeRange> {
    doc.sequence
        .track(0)?
        .clips()
        .first()
        .map(Clip::timeline_range)
}

fn descriptor(n: u32) -> BinClipDescriptor {
    BinClipDescriptor::new(
        format!("clip {n}"),
        format!("media/{n}.mov"),
        BinClipKind::Video,
        secs(i64::from(n) + 1),
    )
}

/// Without a merge window only exact continuations merge, so tests do not
/// depend on wall-clock timing.
fn identity_merge() -> HistoryConfig {
    HistoryConfig {
        merge_window_ms: None,
        ..HistoryConfig::default()
    }
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn edit_session_undoes_to_initial_state() {
    init_tracing();
    let initial = document();
    let mut doc = initial.clone();
    let mut history = ActionHistory::with_config(&doc, identity_merge());

    history
        .execute(Action::add_folder(FolderId(1), "Rushes"), &mut doc)
        .unwrap();
    history
        .execute(Action::add_bin_clip(BinClipId(1), descriptor(1)), &mut doc)
        .unwrap();
    history
        .execute(Action::rename_folder(FolderId(1), "Rushes", "Selects"), &mut doc)
        .unwrap();
    let old = shot_range(&doc).unwrap();
    history
        .execute(
            Action::resize_clip(0, old, TimeRange::new(secs(2), secs(6))),
            &mut doc,
        )
        .unwrap();
    let gain = Effect::new("volume", "Volume", EffectKind::Audio).with_param("level", "0.5");
    history
        .execute(Action::split_audio(0, secs(3), vec![gain.clone()], true), &mut doc)
        .unwrap();

    assert_eq!(doc.sequence.tracks[1].clips()[0].effects, vec![gain]);
    assert_eq!(history.len(), 5);
    assert_eq!(history.undo_label(), Some("Split audio"));

    while history.undo(&mut doc).unwrap() {}
    assert_eq!(doc, initial);
    assert!(history.is_clean());
    assert!(!history.can_undo());
    assert!(history.can_redo());
}

#[test]
fn redo_after_undo_restores_edited_state() {
    let mut doc = document();
    let mut history = ActionHistory::with_config(&doc, identity_merge());
    let track = doc.sequence.tracks[1].clone();

    history.execute(Action::delete_track(1, track), &mut doc).unwrap();
    history
        .execute(Action::add_folder(FolderId(4), "Music"), &mut doc)
        .unwrap();
    let edited = doc.clone();

    assert!(history.undo(&mut doc).unwrap());
    assert!(history.undo(&mut doc).unwrap());
    assert_eq!(doc.sequence.track_count(), 2);
    assert!(history.redo(&mut doc).unwrap());
    assert!(history.redo(&mut doc).unwrap());
    assert!(!history.redo(&mut doc).unwrap());
    assert_eq!(doc, edited);
}

#[test]
fn new_edit_after_undo_discards_redo_tail() {
    let mut doc = document();
    let mut history = ActionHistory::new(&doc);
    for id in 1..=3 {
        history
            .execute(Action::add_folder(FolderId(id), format!("F{id}")), &mut doc)
            .unwrap();
    }
    history.undo(&mut doc).unwrap();
    history.undo(&mut doc).unwrap();
    history
        .execute(Action::add_bin_clip(BinClipId(8), descriptor(8)), &mut doc)
        .unwrap();

    assert_eq!(history.len(), 2);
    assert!(!history.can_redo());
    assert_eq!(doc.bin.folder_count(), 1);
    assert!(doc.bin.clip(BinClipId(8)).is_some());
}

#[test]
fn drag_resize_collapses_into_one_step() {
    let initial = document();
    let mut doc = initial.clone();
    let mut history = ActionHistory::with_config(&doc, identity_merge());

    let mut current = shot_range(&doc).unwrap();
    for len in (4..10).rev() {
        let next = TimeRange::new(secs(0), secs(len));
        history
            .execute(Action::resize_clip(0, current, next), &mut doc)
            .unwrap();
        current = next;
    }

    assert_eq!(history.len(), 1);
    assert_eq!(shot_range(&doc), Some(TimeRange::new(secs(0), secs(4))));
    history.undo(&mut doc).unwrap();
    assert_eq!(doc, initial);
}

#[test]
fn edits_made_by_caller_are_recorded_not_replayed() {
    let mut doc = document();
    let mut history = ActionHistory::new(&doc);

    // the caller already created the folder
    doc.bin.add_folder(FolderId(2), "Old");
    history
        .record(Action::add_folder(FolderId(2), "Old"), &mut doc)
        .unwrap();
    assert_eq!(doc.bin.folder_count(), 1);

    let record = ActionRecord::already_applied(Action::add_bin_clip(BinClipId(3), descriptor(3)))
        .with_label("Import clip");
    doc.bin.add_clip(BinClipId(3), descriptor(3));
    history.push(record, &mut doc).unwrap();
    assert_eq!(history.undo_label(), Some("Import clip"));

    history.undo(&mut doc).unwrap();
    history.undo(&mut doc).unwrap();
    assert_eq!(doc.bin.clip_count(), 0);
    assert_eq!(doc.bin.folder_count(), 0);
}

#[test]
fn history_rejects_other_document() {
    let mut doc = document();
    let mut other = document();
    let mut history = ActionHistory::new(&doc);
    history
        .execute(Action::add_folder(FolderId(1), "Mine"), &mut doc)
        .unwrap();

    let err = history.undo(&mut other).unwrap_err();
    assert!(matches!(err, SpliceError::ContextMismatch { .. }));
    assert_eq!(history.cursor(), 1);
    assert_eq!(other.bin.folder_count(), 0);
}

#[test]
fn reloaded_document_keeps_history_identity() {
    let dir = std::env::temp_dir().join(format!("splice-history-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("project.json");

    let mut doc = document();
    let mut history = ActionHistory::new(&doc);
    history
        .execute(Action::add_folder(FolderId(1), "Rushes"), &mut doc)
        .unwrap();
    history
        .execute(Action::add_bin_clip(BinClipId(1), descriptor(1).in_folder(FolderId(1))), &mut doc)
        .unwrap();
    DocumentFile::new(doc.clone()).save_to_file(&path).unwrap();
    history.set_clean();

    let mut loaded = DocumentFile::load_from_file(&path).unwrap().document;
    assert_eq!(loaded, doc);
    assert_eq!(loaded.bin.clips_in_folder(FolderId(1)), vec![BinClipId(1)]);

    // same document id, so the old history still drives the reloaded copy
    history.undo(&mut loaded).unwrap();
    assert!(!history.is_clean());
    assert_eq!(loaded.bin.clip_count(), 0);

    let _ = std::fs::remove_dir_all(&dir);
}

// ── Properties ─────────────────────────────────────────────────

/// An edit request interpreted against the current document.
#[derive(Debug, Clone)]
enum Op {
    Folder(u32),
    BinClip(u32),
    Track { add: bool, index: usize },
    ToggleMute(usize),
    Resize { start: i64, len: i64 },
    Effect { slot: usize, level: u8 },
    Undo,
    Redo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..4).prop_map(Op::Folder),
        (0u32..4).prop_map(Op::BinClip),
        (any::<bool>(), 0usize..6).prop_map(|(add, index)| Op::Track { add, index }),
        (0usize..4).prop_map(Op::ToggleMute),
        (0i64..20, 1i64..20).prop_map(|(start, len)| Op::Resize { start, len }),
        (0usize..4, 0u8..10).prop_map(|(slot, level)| Op::Effect { slot, level }),
        Just(Op::Undo),
        Just(Op::Redo),
    ]
}

/// Turn `op` into an action for `doc`, or `None` when it has no target.
///
/// Track indices and effect slots are not clamped, so some actions point
/// past the end and must be rejected symmetrically on apply and revert.
fn action_for(op: &Op, doc: &Document) -> Option<Action> {
    match *op {
        Op::Folder(n) => {
            let id = FolderId(n);
            Some(match doc.bin.folder(id) {
                Some(folder) if n % 2 == 0 => {
                    Action::rename_folder(id, folder.name.clone(), format!("{}+", folder.name))
                }
                Some(folder) => Action::delete_folder(id, folder.name.clone()),
                None => Action::add_folder(id, format!("folder {n}")),
            })
        }
        Op::BinClip(n) => {
            let id = BinClipId(n);
            Some(match doc.bin.clip(id) {
                Some(existing) => Action::delete_bin_clip(id, existing.clone()),
                None => Action::add_bin_clip(id, descriptor(n)),
            })
        }
        Op::Track { add, index } => {
            let count = doc.sequence.track_count();
            if add {
                let info = TrackInfo::video(format!("V{}", count + 1));
                Some(Action::add_track(index, info))
            } else {
                let track = doc
                    .sequence
                    .track(index)
                    .cloned()
                    .unwrap_or_else(|| Track::new(TrackInfo::video("ghost")));
                Some(Action::delete_track(index, track))
            }
        }
        Op::ToggleMute(k) => {
            let old = doc.sequence.track_infos();
            if old.is_empty() {
                return None;
            }
            let mut new = old.clone();
            let index = k % new.len();
            new[index].muted = !new[index].muted;
            Some(Action::configure_tracks(old, new))
        }
        Op::Resize { start, len } => {
            let track = doc.sequence.track(0)?;
            let shot = track.clips().first()?;
            if track.clip_count() != 1 || track.info.locked {
                return None;
            }
            let new = TimeRange::new(secs(start), secs(len));
            shot.can_occupy(new)
                .then(|| Action::resize_clip(0, shot.timeline_range(), new))
        }
        Op::Effect { slot, level } => {
            let shot = doc.sequence.track(0)?.clips().first()?;
            let (old, new) = match shot.effects.get(slot) {
                Some(current) => {
                    let next = current.clone().with_param("level", level.to_string());
                    (Some(current.clone()), Some(next))
                }
                None => (
                    None,
                    Some(Effect::new(format!("fx{slot}"), "Brightness", EffectKind::Video)),
                ),
            };
            Some(Action::edit_effect(0, shot.position, old, new, slot, true))
        }
        Op::Undo | Op::Redo => None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_everything_restores_initial_document(ops in prop::collection::vec(op(), 0..40)) {
        let initial = document();
        let mut doc = initial.clone();
        let mut history = ActionHistory::new(&doc);

        for op in &ops {
            match op {
                Op::Undo => {
                    history.undo(&mut doc).unwrap();
                }
                Op::Redo => {
                    history.redo(&mut doc).unwrap();
                }
                other => {
                    if let Some(action) = action_for(other, &doc) {
                        history.execute(action, &mut doc).unwrap();
                    }
                }
            }
            prop_assert!(history.cursor() <= history.len());

            // undo then redo is the identity, and so is redo then undo
            let before = doc.clone();
            if history.undo(&mut doc).unwrap() {
                prop_assert!(history.redo(&mut doc).unwrap());
                prop_assert_eq!(&doc, &before);
            }
            if history.redo(&mut doc).unwrap() {
                prop_assert!(history.undo(&mut doc).unwrap());
                prop_assert_eq!(&doc, &before);
            }
        }

        let reached = doc.clone();
        let cursor = history.cursor();
        while history.undo(&mut doc).unwrap() {}
        prop_assert_eq!(&doc, &initial);
        prop_assert_eq!(history.cursor(), 0);

        for _ in 0..cursor {
            prop_assert!(history.redo(&mut doc).unwrap());
        }
        prop_assert_eq!(&doc, &reached);
    }

    #[test]
    fn depth_limit_holds(count in 1u32..60, depth in 1usize..20) {
        let mut doc = document();
        let config = HistoryConfig { max_depth: depth, merge_window_ms: None };
        let mut history = ActionHistory::with_config(&doc, config);
        for id in 0..count {
            history.execute(Action::add_folder(FolderId(id), "f"), &mut doc).unwrap();
        }
        prop_assert_eq!(history.len(), (count as usize).min(depth));
        prop_assert_eq!(history.cursor(), history.len());
        prop_assert_eq!(doc.bin.folder_count(), count as usize);
    }
}
