//! Entity kinds shared by every layer.

use serde::{Deserialize, Serialize};

/// Which variant of filesystem entity a path was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    File,
    Directory,
}

impl EntityKind {
    pub fn is_file(self) -> bool {
        matches!(self, EntityKind::File)
    }

    pub fn is_directory(self) -> bool {
        matches!(self, EntityKind::Directory)
    }
}
