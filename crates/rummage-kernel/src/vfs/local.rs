//! Local filesystem backend.
//!
//! Gives access to a real directory tree under a project root, with an
//! optional read-only mode.

use super::traits::{DirEntry, Filesystem, Metadata};
use async_trait::async_trait;
use rummage_types::EntityKind;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem backend.
///
/// Relative paths are resolved under `root`. Absolute paths are accepted
/// as long as they stay inside `root`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
    read_only: bool,
}

impl LocalFs {
    /// Create a new local filesystem rooted at the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_only: false,
        }
    }

    /// Create a read-only local filesystem.
    pub fn read_only(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_only: true,
        }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path to a canonical absolute path within the root.
    ///
    /// `.` and `..` are folded lexically first. The longest existing prefix
    /// is then canonicalized (following symlinks) and the missing tail is
    /// re-appended, so paths that do not exist yet resolve the same way as
    /// the root does. Returns `PermissionDenied` if the result leaves the
    /// root.
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let lexical_root = std::path::absolute(&self.root)?;
        let root = self.root.canonicalize().unwrap_or_else(|_| lexical_root.clone());

        let full = if path.is_absolute() {
            match path.strip_prefix(&lexical_root) {
                Ok(rest) => root.join(rest),
                Err(_) => path.to_path_buf(),
            }
        } else {
            root.join(path)
        };

        let mut base = normalize(&full)?;
        let mut missing = Vec::new();
        // symlink_metadata so a dangling link counts as present and fails
        // in canonicalize instead of being written through.
        while std::fs::symlink_metadata(&base).is_err() {
            let Some(name) = base.file_name().map(ToOwned::to_owned) else {
                break;
            };
            missing.push(name);
            base.pop();
        }

        let mut resolved = base.canonicalize()?;
        resolved.extend(missing.iter().rev());

        if !resolved.starts_with(&root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "path escapes root: {} is not under {}",
                    resolved.display(),
                    root.display()
                ),
            ));
        }

        Ok(resolved)
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.read_only {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "filesystem is read-only",
            ))
        } else {
            Ok(())
        }
    }
}

/// Fold `.` and `..` out of an absolute path without touching the disk.
fn normalize(path: &Path) -> io::Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        format!("path escapes root: {}", path.display()),
                    ));
                }
            }
        }
    }
    Ok(out)
}

#[async_trait]
impl Filesystem for LocalFs {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        tracing::trace!(path = %full_path.display(), "local read");
        fs::read(&full_path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        tracing::trace!(path = %full_path.display(), bytes = data.len(), "local write");

        // Saves land in slot directories that may not exist yet.
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full_path, data).await
    }

    async fn list(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let full_path = self.resolve(path)?;
        tracing::trace!(path = %full_path.display(), "local list");
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&full_path).await?;

        while let Some(entry) = dir.next_entry().await? {
            // Follow symlinks so a link to a directory is listed as one.
            let is_dir = match fs::metadata(entry.path()).await {
                Ok(meta) => meta.is_dir(),
                Err(_) => entry.file_type().await?.is_dir(),
            };
            let kind = if is_dir {
                EntityKind::Directory
            } else {
                EntityKind::File
            };

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(dir = %full_path.display(), name = ?raw, "skipping non-UTF-8 entry");
                    continue;
                }
            };
            entries.push(DirEntry { name, kind });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let full_path = self.resolve(path)?;
        // Follows symlinks, matching the kinds `list` reports.
        let meta = fs::metadata(&full_path).await?;

        Ok(Metadata {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        tracing::trace!(path = %full_path.display(), "local mkdir");
        fs::create_dir_all(&full_path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        tracing::trace!(path = %full_path.display(), "local remove");

        // Never recursive: emptiness is decided above this layer.
        if fs::metadata(&full_path).await?.is_dir() {
            fs::remove_dir(&full_path).await
        } else {
            fs::remove_file(&full_path).await
        }
    }

    fn read_only(&self) -> bool {
        self.read_only
    }
}
