//! Media loading seam.
//!
//! Decoding images and audio is the embedding application's business.
//! [`FileHandle::load_image`](crate::FileHandle::load_image) and
//! [`load_audio`](crate::FileHandle::load_audio) only run the usual
//! preconditions and hand the file to a [`ResourceLoader`].

use async_trait::async_trait;

use crate::error::FsError;
use crate::file::FileHandle;
use crate::template::MediaCategory;

/// What a loader is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// The discovery category whose files this kind usually loads.
    pub fn category(self) -> MediaCategory {
        match self {
            MediaKind::Image => MediaCategory::Image,
            MediaKind::Audio => MediaCategory::Audio,
        }
    }
}

/// Turns a file into a loaded media handle.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    type Media: Send;

    async fn load(&self, file: &FileHandle, kind: MediaKind) -> Result<Self::Media, FsError>;
}

/// The bytes of a media file, undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMedia {
    pub kind: MediaKind,
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Loader that reads the file and returns its bytes as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMediaLoader;

#[async_trait]
impl ResourceLoader for RawMediaLoader {
    type Media = RawMedia;

    async fn load(&self, file: &FileHandle, kind: MediaKind) -> Result<RawMedia, FsError> {
        if !kind.category().matches(file.full_name()) {
            tracing::debug!(path = %file.full_path(), ?kind, "loading media with an unexpected extension");
        }
        let bytes = file.host().fs().read(file.path().as_path()).await?;
        Ok(RawMedia {
            kind,
            path: file.full_path().to_string(),
            bytes,
        })
    }
}
