//! Effect descriptors attached to timeline clips.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which stream an effect processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Video,
    Audio,
}

/// One entry of a clip's effect stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Effect type identifier (e.g. "volume", "brightness").
    pub id: String,
    /// Display name
    pub name: String,
    pub kind: EffectKind,
    pub enabled: bool,
    /// Parameter values keyed by parameter name.
    pub params: BTreeMap<String, String>,
}

impl Effect {
    /// Create an enabled effect with no parameters.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            enabled: true,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}
