//! Key-value persistence for save data and settings.
//!
//! A [`KeyValueStore`] holds plain strings. [`Storage`] layers the codec
//! on top: typed values are serialized to JSON and optionally deflated;
//! deflated payloads are base64-encoded so every backend stays a string
//! store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use rummage_types::{Envelope, Status};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::{FsError, OpResult};
use crate::vfs::Filesystem;

/// A string store keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, FsError>;

    async fn set(&self, key: &str, value: String) -> Result<(), FsError>;

    /// Remove `key`, returning whether it was present.
    async fn remove(&self, key: &str) -> Result<bool, FsError>;

    /// Every key, sorted.
    async fn keys(&self) -> Result<Vec<String>, FsError>;

    async fn contains(&self, key: &str) -> Result<bool, FsError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// In-memory store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> FsError {
    FsError::Io("lock poisoned".to_string())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FsError> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), FsError> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, FsError> {
        Ok(self.entries.write().map_err(poisoned)?.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, FsError> {
        Ok(self.entries.read().map_err(poisoned)?.keys().cloned().collect())
    }

    async fn contains(&self, key: &str) -> Result<bool, FsError> {
        Ok(self.entries.read().map_err(poisoned)?.contains_key(key))
    }
}

/// One file per key under a directory of a [`Filesystem`].
///
/// `file1` is stored as `<dir>/file1.<extension>`.
pub struct FsStore {
    fs: Arc<dyn Filesystem>,
    dir: PathBuf,
    extension: String,
}

impl FsStore {
    pub const DEFAULT_EXTENSION: &'static str = "rsave";

    pub fn new(fs: Arc<dyn Filesystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
            extension: Self::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are single path segments; anything that could name another
    /// location is refused.
    fn key_path(&self, key: &str) -> Result<PathBuf, FsError> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(FsError::PermissionDenied(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.{}", self.extension)))
    }
}

impl std::fmt::Debug for FsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStore")
            .field("dir", &self.dir)
            .field("extension", &self.extension)
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for FsStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FsError> {
        let path = self.key_path(key)?;
        match self.fs.read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| FsError::Io(format!("{} is not UTF-8", path.display()))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), FsError> {
        let path = self.key_path(key)?;
        self.fs.write(&path, value.as_bytes()).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, FsError> {
        let path = self.key_path(key)?;
        match self.fs.remove(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, FsError> {
        let entries = match self.fs.list(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let suffix = format!(".{}", self.extension);
        Ok(entries
            .into_iter()
            .filter(|entry| entry.kind.is_file())
            .filter_map(|entry| entry.name.strip_suffix(&suffix).map(str::to_string))
            .collect())
    }
}

/// How a value is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Deflate + base64 the payload. Must match between `set` and `get`.
    pub compress: bool,
    /// Replace an existing key instead of reporting
    /// `OVERWRITE_NOT_PERMITTED`. Ignored by reads.
    pub overwrite: bool,
}

impl StoreOptions {
    pub fn compressed() -> Self {
        Self {
            compress: true,
            overwrite: false,
        }
    }

    pub fn overwrite(mut self, on: bool) -> Self {
        self.overwrite = on;
        self
    }
}

/// Typed façade over a [`KeyValueStore`].
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serialize `value` (then compress, if asked) and store it.
    ///
    /// Statuses: `OK` (no payload), `OVERWRITE_NOT_PERMITTED`,
    /// `PARSE_FAILED`.
    pub async fn set<T>(&self, key: &str, value: &T, options: &StoreOptions) -> OpResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let bytes = match codec::serialize(value) {
            Ok(bytes) => bytes,
            Err(status) => return Ok(status.into()),
        };
        self.put(key, &bytes, options).await
    }

    /// Load and parse a value stored by [`set`](Self::set).
    ///
    /// Statuses: `OK`, `PATH_NOT_FOUND`, `DECODE_FAILED`, `PARSE_FAILED`.
    pub async fn get<T>(&self, key: &str, options: &StoreOptions) -> OpResult<T>
    where
        T: DeserializeOwned + Send,
    {
        match self.fetch(key, options).await? {
            Ok(bytes) => Ok(codec::parse::<T>(&bytes).into()),
            Err(status) => Ok(status.into()),
        }
    }

    /// Store a string as-is (or compressed).
    pub async fn set_text(&self, key: &str, text: &str, options: &StoreOptions) -> OpResult<()> {
        self.put(key, text.as_bytes(), options).await
    }

    /// Load a string stored by [`set_text`](Self::set_text).
    pub async fn get_text(&self, key: &str, options: &StoreOptions) -> OpResult<String> {
        match self.fetch(key, options).await? {
            Ok(bytes) => Ok(codec::utf8(bytes).into()),
            Err(status) => Ok(status.into()),
        }
    }

    /// Statuses: `OK` (no payload), `PATH_NOT_FOUND`.
    pub async fn remove(&self, key: &str) -> OpResult<()> {
        if self.store.remove(key).await? {
            tracing::debug!(key, "removed key");
            Ok(Envelope::done())
        } else {
            Ok(Status::PathNotFound.into())
        }
    }

    /// Move the value under `from` to `to`.
    ///
    /// Statuses: `OK` (no payload), `PATH_NOT_FOUND` (`from`),
    /// `ALREADY_EXISTS` (`to`). If `from` cannot be removed, `to` is
    /// removed again before the error is returned.
    pub async fn rename(&self, from: &str, to: &str) -> OpResult<()> {
        let Some(value) = self.store.get(from).await? else {
            return Ok(Status::PathNotFound.into());
        };
        if self.store.contains(to).await? {
            return Ok(Status::AlreadyExists.into());
        }
        self.store.set(to, value).await?;
        if let Err(err) = self.store.remove(from).await {
            if let Err(rollback) = self.store.remove(to).await {
                tracing::warn!(from, to, error = %rollback, "rename rollback failed, value left under both keys");
            }
            return Err(err.into());
        }
        tracing::debug!(from, to, "renamed key");
        Ok(Envelope::done())
    }

    pub async fn keys(&self) -> OpResult<Vec<String>> {
        Ok(Envelope::ok(self.store.keys().await?))
    }

    async fn put(&self, key: &str, bytes: &[u8], options: &StoreOptions) -> OpResult<()> {
        if !options.overwrite && self.store.contains(key).await? {
            return Ok(Status::OverwriteNotPermitted.into());
        }
        let payload = if options.compress {
            codec::to_base64(&codec::compress(bytes)?)
        } else {
            match codec::utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(status) => return Ok(status.into()),
            }
        };
        self.store.set(key, payload).await?;
        tracing::debug!(key, compressed = options.compress, "stored key");
        Ok(Envelope::done())
    }

    /// The stored bytes after undoing compression. A missing key or a
    /// failed decode stage comes back as the inner `Err`.
    async fn fetch(&self, key: &str, options: &StoreOptions) -> Result<Result<Vec<u8>, Status>, FsError> {
        let Some(payload) = self.store.get(key).await? else {
            return Ok(Err(Status::PathNotFound));
        };
        if !options.compress {
            return Ok(Ok(payload.into_bytes()));
        }
        Ok(codec::from_base64(&payload).and_then(|deflated| codec::decompress(&deflated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Failure;
    use crate::vfs::MemoryFs;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Config {
        bgm_volume: u8,
        always_dash: bool,
    }

    fn config() -> Config {
        Config {
            bgm_volume: 80,
            always_dash: true,
        }
    }

    #[tokio::test]
    async fn compressed_round_trip() {
        let storage = Storage::new(MemoryStore::new());
        let options = StoreOptions::compressed();

        assert!(storage.set("config", &config(), &options).await.unwrap().is_ok());
        let raw = storage.store().get("config").await.unwrap().unwrap();
        assert!(!raw.contains("bgm_volume"), "payload should be deflated: {raw}");

        let env = storage.get::<Config>("config", &options).await.unwrap();
        assert_eq!(env.into_data(), Some(config()));
    }

    /// Refuses to remove one key.
    struct PinnedStore {
        inner: MemoryStore,
        pinned: &'static str,
    }

    #[async_trait]
    impl KeyValueStore for PinnedStore {
        async fn get(&self, key: &str) -> Result<Option<String>, FsError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> Result<(), FsError> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<bool, FsError> {
            if key == self.pinned {
                return Err(FsError::PermissionDenied(key.to_string()));
            }
            self.inner.remove(key).await
        }

        async fn keys(&self) -> Result<Vec<String>, FsError> {
            self.inner.keys().await
        }
    }

    #[tokio::test]
    async fn failed_rename_rolls_back_target() {
        let storage = Storage::new(PinnedStore {
            inner: MemoryStore::new(),
            pinned: "file1",
        });
        storage.set_text("file1", "slot", &StoreOptions::default()).await.unwrap();

        let failure = storage.rename("file1", "file2").await.unwrap_err();
        assert!(matches!(failure, Failure::Io(FsError::PermissionDenied(_))));
        assert_eq!(storage.keys().await.unwrap().into_data(), Some(vec!["file1".to_string()]));
    }

    #[tokio::test]
    async fn missing_key_is_path_not_found() {
        let storage = Storage::new(MemoryStore::new());
        let env = storage.get::<Config>("nope", &StoreOptions::default()).await.unwrap();
        assert_eq!(env.status_code(), Status::PathNotFound);
        assert_eq!(storage.remove("nope").await.unwrap().status_code(), Status::PathNotFound);
    }

    #[tokio::test]
    async fn set_respects_overwrite() {
        let storage = Storage::new(MemoryStore::new());
        let options = StoreOptions::default();
        storage.set_text("global", "v1", &options).await.unwrap();

        let env = storage.set_text("global", "v2", &options).await.unwrap();
        assert_eq!(env.status_code(), Status::OverwriteNotPermitted);

        storage
            .set_text("global", "v2", &options.overwrite(true))
            .await
            .unwrap();
        let env = storage.get_text("global", &options).await.unwrap();
        assert_eq!(env.into_data().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn wrong_stage_reports_decode_failed() {
        let storage = Storage::new(MemoryStore::new());
        storage
            .set_text("plain", "not base64 at all!", &StoreOptions::default())
            .await
            .unwrap();
        let env = storage
            .get_text("plain", &StoreOptions::compressed())
            .await
            .unwrap();
        assert_eq!(env.status_code(), Status::DecodeFailed);
    }

    #[tokio::test]
    async fn rename_moves_and_refuses_clobber() {
        let storage = Storage::new(MemoryStore::new());
        let options = StoreOptions::default();
        storage.set_text("file1", "a", &options).await.unwrap();
        storage.set_text("file2", "b", &options).await.unwrap();

        assert_eq!(
            storage.rename("file1", "file2").await.unwrap().status_code(),
            Status::AlreadyExists
        );
        assert_eq!(
            storage.rename("gone", "file3").await.unwrap().status_code(),
            Status::PathNotFound
        );

        assert!(storage.rename("file1", "file3").await.unwrap().is_ok());
        let keys = storage.keys().await.unwrap().into_data().unwrap();
        assert_eq!(keys, ["file2", "file3"]);
    }

    #[tokio::test]
    async fn fs_store_keeps_one_file_per_key() {
        let fs: Arc<dyn Filesystem> = Arc::new(MemoryFs::new());
        let storage = Storage::new(FsStore::new(fs.clone(), "save"));
        let options = StoreOptions::compressed();

        storage.set("file1", &config(), &options).await.unwrap();
        assert!(fs.exists(Path::new("save/file1.rsave")).await);

        let env = storage.get::<Config>("file1", &options).await.unwrap();
        assert_eq!(env.into_data(), Some(config()));
        assert_eq!(storage.keys().await.unwrap().into_data().unwrap(), ["file1"]);
    }

    #[tokio::test]
    async fn fs_store_rejects_path_like_keys() {
        let store = FsStore::new(Arc::new(MemoryFs::new()), "save");
        let err = store.set("../escape", "x".into()).await.unwrap_err();
        assert!(matches!(err, FsError::PermissionDenied(_)));
    }
}
