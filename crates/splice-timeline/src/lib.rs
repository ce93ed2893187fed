//! Splice Timeline - Edit model and undo history
//!
//! Implements the editable document and its reversible edit log:
//! - Documents holding a track sequence and a project bin
//! - Collaborator traits the edit records operate through
//! - Action records with paired apply/revert effects
//! - A cursor-based undo/redo history with edit coalescing

pub mod action;
pub mod bin;
pub mod clip;
pub mod context;
pub mod document;
pub mod effect;
pub mod history;
pub mod serialization;
pub mod track;

pub use action::{Action, ActionRecord, Direction, RecordState};
pub use bin::{Bin, BinClipDescriptor, BinClipId, BinClipKind, Folder, FolderId};
pub use clip::{Clip, ClipRef};
pub use context::{ClipBin, ClipContainer, EditContext, FolderRegistry, TrackContainer};
pub use document::{Document, DocumentEvent, Sequence};
pub use effect::{Effect, EffectKind};
pub use history::ActionHistory;
pub use serialization::DocumentFile;
pub use track::{Track, TrackInfo, TrackKind};
