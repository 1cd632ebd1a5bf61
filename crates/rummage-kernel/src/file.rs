//! Files: payload reads and writes through the codec pipeline, plus
//! media loading through a [`ResourceLoader`].

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use rummage_types::{Envelope, Status};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::blocking::Blocking;
use crate::bridge::{self, Callbacks};
use crate::codec;
use crate::entity::Node;
use crate::error::{FsError, OpResult};
use crate::host::{Access, Host};
use crate::loader::{MediaKind, ResourceLoader};

/// Which read stages run. Both off means raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Inflate a zlib stream first.
    pub decompress: bool,
    /// Parse the (possibly inflated) bytes as JSON.
    pub parse: bool,
}

impl ReadOptions {
    pub fn raw() -> Self {
        Self::default()
    }

    pub fn json() -> Self {
        Self {
            decompress: false,
            parse: true,
        }
    }

    pub fn decompress(mut self, on: bool) -> Self {
        self.decompress = on;
        self
    }

    pub fn parse(mut self, on: bool) -> Self {
        self.parse = on;
        self
    }
}

/// Write behaviour. The default neither overwrites nor compresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing file instead of reporting
    /// `OVERWRITE_NOT_PERMITTED`.
    pub overwrite: bool,
    /// Deflate the payload into a zlib stream before writing.
    pub compress: bool,
}

impl WriteOptions {
    pub fn overwrite(mut self, on: bool) -> Self {
        self.overwrite = on;
        self
    }

    pub fn compress(mut self, on: bool) -> Self {
        self.compress = on;
        self
    }
}

/// What a [`FileHandle::read`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Content {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Bytes(bytes) => Some(bytes),
            Content::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Content::Json(value) => Some(value),
            Content::Bytes(_) => None,
        }
    }
}

/// A file on a host.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    node: Node,
}

impl FileHandle {
    pub fn new(host: &Host, path: impl AsRef<str>) -> Self {
        Self {
            node: Node::new(host, path),
        }
    }

    pub(crate) fn from_node(node: Node) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Blocking forms of this file's operations.
    pub fn blocking(&self) -> Blocking<'_, FileHandle> {
        Blocking::new(self)
    }

    // ── reads ──────────────────────────────────────────────────────────

    /// Read the file through the enabled stages.
    ///
    /// Statuses: `OK`, `MISSING_OPTIONS`, `NOT_PERMITTED`, `PATH_NOT_FOUND`,
    /// `DECODE_FAILED`, `PARSE_FAILED`.
    pub async fn read(&self, options: Option<&ReadOptions>) -> OpResult<Content> {
        match self.gate(options, Access::Read) {
            Ok(options) => self.read_checked(*options).await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`read`](Self::read).
    pub fn read_with(&self, options: Option<ReadOptions>, callbacks: Callbacks<Content>) -> Status {
        let gate = self.gate(options, Access::Read);
        bridge::start(self, gate, callbacks, |file, options| async move {
            file.read_checked(options).await
        })
    }

    /// Read and parse into `T`. The parse stage always runs; only
    /// `decompress` is taken from `options`.
    pub async fn read_json<T>(&self, options: Option<&ReadOptions>) -> OpResult<T>
    where
        T: DeserializeOwned + Send,
    {
        match self.gate(options, Access::Read) {
            Ok(options) => self.read_json_checked(options.decompress).await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`read_json`](Self::read_json).
    pub fn read_json_with<T>(&self, options: Option<ReadOptions>, callbacks: Callbacks<T>) -> Status
    where
        T: DeserializeOwned + Send + 'static,
    {
        let gate = self.gate(options, Access::Read);
        bridge::start(self, gate, callbacks, |file, options| async move {
            file.read_json_checked(options.decompress).await
        })
    }

    // ── writes ─────────────────────────────────────────────────────────

    /// Write `data`, compressing first if asked. Missing parent
    /// directories are created.
    ///
    /// Statuses: `OK` (no payload), `MISSING_OPTIONS`, `NOT_PERMITTED`,
    /// `OVERWRITE_NOT_PERMITTED`.
    pub async fn write(&self, data: &[u8], options: Option<&WriteOptions>) -> OpResult<()> {
        match self.gate(options, Access::Write) {
            Ok(options) => self.write_checked(data, *options).await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`write`](Self::write).
    pub fn write_with(
        &self,
        data: Vec<u8>,
        options: Option<WriteOptions>,
        callbacks: Callbacks<()>,
    ) -> Status {
        let gate = self.gate(options, Access::Write);
        bridge::start(self, gate, callbacks, |file, options| async move {
            file.write_checked(&data, options).await
        })
    }

    /// Serialize `value` as JSON and write it.
    ///
    /// Statuses: those of [`write`](Self::write), plus `PARSE_FAILED` when
    /// the value cannot be serialized.
    pub async fn write_json<T>(&self, value: &T, options: Option<&WriteOptions>) -> OpResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let options = match self.gate(options, Access::Write) {
            Ok(options) => *options,
            Err(status) => return Ok(status.into()),
        };
        match codec::serialize(value) {
            Ok(bytes) => self.write_checked(&bytes, options).await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`write_json`](Self::write_json). Serialization
    /// runs before going pending; its failure arrives on the success
    /// callback like any other status.
    pub fn write_json_with<T>(
        &self,
        value: &T,
        options: Option<WriteOptions>,
        callbacks: Callbacks<()>,
    ) -> Status
    where
        T: Serialize + ?Sized,
    {
        let gate = self.gate(options, Access::Write);
        let serialized = codec::serialize(value);
        bridge::start(self, gate, callbacks, |file, options| async move {
            match serialized {
                Ok(bytes) => file.write_checked(&bytes, options).await,
                Err(status) => Ok(status.into()),
            }
        })
    }

    /// Delete the file.
    ///
    /// Statuses: `OK` (no payload), `NOT_PERMITTED`, `PATH_NOT_FOUND`.
    /// A directory at this path is a host error, not a status.
    pub async fn remove(&self) -> OpResult<()> {
        match self.gate_access(Access::Write) {
            Ok(()) => self.remove_checked().await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`remove`](Self::remove).
    pub fn remove_with(&self, callbacks: Callbacks<()>) -> Status {
        let gate = self.gate_access(Access::Write);
        bridge::start(self, gate, callbacks, |file, ()| async move { file.remove_checked().await })
    }

    // ── media ──────────────────────────────────────────────────────────

    /// Hand the file to `loader` as an image and pass its result through.
    ///
    /// Statuses: `OK`, `NOT_PERMITTED`, `PATH_NOT_FOUND`.
    pub async fn load_image<L: ResourceLoader>(&self, loader: &L) -> OpResult<L::Media> {
        self.load(loader, MediaKind::Image).await
    }

    pub fn load_image_with<L>(&self, loader: Arc<L>, callbacks: Callbacks<L::Media>) -> Status
    where
        L: ResourceLoader + 'static,
        L::Media: 'static,
    {
        self.load_with(loader, MediaKind::Image, callbacks)
    }

    /// Hand the file to `loader` as audio and pass its result through.
    pub async fn load_audio<L: ResourceLoader>(&self, loader: &L) -> OpResult<L::Media> {
        self.load(loader, MediaKind::Audio).await
    }

    pub fn load_audio_with<L>(&self, loader: Arc<L>, callbacks: Callbacks<L::Media>) -> Status
    where
        L: ResourceLoader + 'static,
        L::Media: 'static,
    {
        self.load_with(loader, MediaKind::Audio, callbacks)
    }

    async fn load<L: ResourceLoader>(&self, loader: &L, kind: MediaKind) -> OpResult<L::Media> {
        match self.gate_access(Access::Read) {
            Ok(()) => self.load_checked(loader, kind).await,
            Err(status) => Ok(status.into()),
        }
    }

    fn load_with<L>(&self, loader: Arc<L>, kind: MediaKind, callbacks: Callbacks<L::Media>) -> Status
    where
        L: ResourceLoader + 'static,
        L::Media: 'static,
    {
        let gate = self.gate_access(Access::Read).map(|()| loader);
        bridge::start(self, gate, callbacks, move |file, loader| async move {
            file.load_checked(loader.as_ref(), kind).await
        })
    }

    // ── checked bodies (gates already passed) ──────────────────────────

    /// Existence check plus the raw host read.
    async fn fetch(&self) -> Result<Result<Vec<u8>, Status>, FsError> {
        if let Err(status) = self.require_existing().await {
            return Ok(Err(status));
        }
        let bytes = self.host().fs().read(self.path().as_path()).await?;
        tracing::debug!(path = %self.full_path(), len = bytes.len(), "read file");
        Ok(Ok(bytes))
    }

    async fn read_checked(&self, options: ReadOptions) -> OpResult<Content> {
        let bytes = match self.fetch().await? {
            Ok(bytes) => bytes,
            Err(status) => return Ok(status.into()),
        };
        Ok(decode(bytes, options).into())
    }

    async fn read_json_checked<T: DeserializeOwned>(&self, decompress: bool) -> OpResult<T> {
        let bytes = match self.fetch().await? {
            Ok(bytes) => bytes,
            Err(status) => return Ok(status.into()),
        };
        let bytes = if decompress {
            match codec::decompress(&bytes) {
                Ok(inflated) => inflated,
                Err(status) => return Ok(status.into()),
            }
        } else {
            bytes
        };
        Ok(codec::parse::<T>(&bytes).into())
    }

    async fn write_checked(&self, data: &[u8], options: WriteOptions) -> OpResult<()> {
        if !options.overwrite && self.exists().await {
            tracing::debug!(path = %self.full_path(), "refusing to overwrite");
            return Ok(Status::OverwriteNotPermitted.into());
        }

        let fs = self.host().fs();
        if options.compress {
            let deflated = codec::compress(data)?;
            fs.write(self.path().as_path(), &deflated).await?;
        } else {
            fs.write(self.path().as_path(), data).await?;
        }
        tracing::debug!(path = %self.full_path(), len = data.len(), compressed = options.compress, "wrote file");
        Ok(Envelope::done())
    }

    async fn remove_checked(&self) -> OpResult<()> {
        let meta = match self.metadata().await {
            Ok(meta) => meta,
            Err(FsError::NotFound(_)) => return Ok(Status::PathNotFound.into()),
            Err(err) => return Err(err.into()),
        };
        if meta.is_dir {
            return Err(FsError::IsDirectory(self.full_path().to_string()).into());
        }
        self.host().fs().remove(self.path().as_path()).await?;
        tracing::debug!(path = %self.full_path(), "removed file");
        Ok(Envelope::done())
    }

    async fn load_checked<L: ResourceLoader + ?Sized>(&self, loader: &L, kind: MediaKind) -> OpResult<L::Media> {
        if let Err(status) = self.require_existing().await {
            return Ok(status.into());
        }
        let media = loader.load(self, kind).await?;
        tracing::debug!(path = %self.full_path(), ?kind, "loaded media");
        Ok(Envelope::ok(media))
    }
}

/// Run the read stages in order, stopping at the first that fails.
fn decode(bytes: Vec<u8>, options: ReadOptions) -> Result<Content, Status> {
    let bytes = if options.decompress {
        codec::decompress(&bytes)?
    } else {
        bytes
    };
    if options.parse {
        Ok(Content::Json(codec::parse(&bytes)?))
    } else {
        Ok(Content::Bytes(bytes))
    }
}

impl Deref for FileHandle {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileHandle").field(&self.full_path()).finish()
    }
}
