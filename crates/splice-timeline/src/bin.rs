//! Project bin: imported media clips and the folders organizing them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use splice_core::RationalTime;

/// Identifier of a bin clip, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BinClipId(pub u32);

impl fmt::Display for BinClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Identifier of a bin folder, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FolderId(pub u32);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "folder#{}", self.0)
    }
}

/// Media type of a bin clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinClipKind {
    AudioVideo,
    Video,
    Audio,
    Image,
    Color,
    Title,
}

/// Everything needed to recreate a bin clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinClipDescriptor {
    pub name: String,
    pub path: String,
    pub kind: BinClipKind,
    pub duration: RationalTime,
    /// Folder the clip is filed under; `None` is the bin root.
    pub folder: Option<FolderId>,
    /// Free-form clip properties (proxy path, job state, ...).
    pub properties: BTreeMap<String, String>,
}

impl BinClipDescriptor {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        kind: BinClipKind,
        duration: RationalTime,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            duration,
            folder: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn in_folder(mut self, folder: FolderId) -> Self {
        self.folder = Some(folder);
        self
    }
}

/// A bin folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
}

/// The project bin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    clips: BTreeMap<BinClipId, BinClipDescriptor>,
    folders: BTreeMap<FolderId, Folder>,
}

impl Bin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip under `id`. Returns false if the id is taken.
    pub fn add_clip(&mut self, id: BinClipId, descriptor: BinClipDescriptor) -> bool {
        if self.clips.contains_key(&id) {
            return false;
        }
        self.clips.insert(id, descriptor);
        true
    }

    pub fn remove_clip(&mut self, id: BinClipId) -> Option<BinClipDescriptor> {
        self.clips.remove(&id)
    }

    pub fn clip(&self, id: BinClipId) -> Option<&BinClipDescriptor> {
        self.clips.get(&id)
    }

    pub fn clip_mut(&mut self, id: BinClipId) -> Option<&mut BinClipDescriptor> {
        self.clips.get_mut(&id)
    }

    pub fn clips(&self) -> impl Iterator<Item = (BinClipId, &BinClipDescriptor)> {
        self.clips.iter().map(|(id, clip)| (*id, clip))
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Clips filed under `folder`.
    pub fn clips_in_folder(&self, folder: FolderId) -> Vec<BinClipId> {
        self.clips
            .iter()
            .filter(|(_, clip)| clip.folder == Some(folder))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Smallest id above every clip id in use.
    pub fn next_clip_id(&self) -> BinClipId {
        BinClipId(self.clips.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    /// Create a folder. Returns false if the id is taken.
    pub fn add_folder(&mut self, id: FolderId, name: impl Into<String>) -> bool {
        if self.folders.contains_key(&id) {
            return false;
        }
        self.folders.insert(
            id,
            Folder {
                id,
                name: name.into(),
            },
        );
        true
    }

    pub fn remove_folder(&mut self, id: FolderId) -> Option<Folder> {
        self.folders.remove(&id)
    }

    /// Rename a folder, returning its previous name.
    pub fn rename_folder(&mut self, id: FolderId, name: impl Into<String>) -> Option<String> {
        let folder = self.folders.get_mut(&id)?;
        Some(std::mem::replace(&mut folder.name, name.into()))
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(&id)
    }

    pub fn folders(&self) -> impl Iterator<Item = &Folder> {
        self.folders.values()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }
}
