//! The host an entity lives on: filesystem, trust level and project root.
//!
//! The trust gate is explicit configuration carried by [`Host`], never
//! process-wide state, so two hosts with different trust levels can share
//! one filesystem side by side.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::directory::Directory;
use crate::file::FileHandle;
use crate::vfs::{Filesystem, LocalFs};

/// What an operation needs from the trust gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Enumerate directories, stat and read files.
    Read,
    /// Create, write or remove.
    Write,
}

/// How much filesystem access the current execution context is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustLevel {
    /// Full local filesystem access.
    #[default]
    Local,
    /// Enumeration and reads only.
    ReadOnly,
    /// No filesystem access at all (browser-like hosts).
    Sandboxed,
}

impl TrustLevel {
    pub fn permits(self, access: Access) -> bool {
        match (self, access) {
            (TrustLevel::Local, _) => true,
            (TrustLevel::ReadOnly, Access::Read) => true,
            (TrustLevel::ReadOnly, Access::Write) => false,
            (TrustLevel::Sandboxed, _) => false,
        }
    }
}

struct HostInner {
    fs: Arc<dyn Filesystem>,
    trust: TrustLevel,
    project_root: PathBuf,
}

/// Shared handle to a filesystem plus the context it is used in.
///
/// Cheap to clone; every entity keeps one.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

impl Host {
    /// Create a host over any filesystem backend.
    pub fn new(fs: impl Filesystem + 'static, trust: TrustLevel, project_root: impl Into<PathBuf>) -> Self {
        Self::with_shared_fs(Arc::new(fs), trust, project_root)
    }

    /// Create a host over a filesystem that is shared with other hosts.
    pub fn with_shared_fs(
        fs: Arc<dyn Filesystem>,
        trust: TrustLevel,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(HostInner {
                fs,
                trust,
                project_root: project_root.into(),
            }),
        }
    }

    /// A fully trusted host over the real filesystem rooted at `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::new(LocalFs::new(root.clone()), TrustLevel::Local, root)
    }

    /// The same filesystem and root seen through a different trust level.
    pub fn with_trust(&self, trust: TrustLevel) -> Self {
        Self::with_shared_fs(self.inner.fs.clone(), trust, self.inner.project_root.clone())
    }

    pub fn fs(&self) -> &dyn Filesystem {
        self.inner.fs.as_ref()
    }

    pub fn trust(&self) -> TrustLevel {
        self.inner.trust
    }

    pub fn project_root(&self) -> &Path {
        &self.inner.project_root
    }

    pub fn permits(&self, access: Access) -> bool {
        self.inner.trust.permits(access)
    }

    /// True when both handles are clones of one host.
    pub(crate) fn same_as(&self, other: &Host) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A directory entity for `path` on this host.
    pub fn directory(&self, path: impl AsRef<str>) -> Directory {
        Directory::new(self, path)
    }

    /// A file entity for `path` on this host.
    pub fn file(&self, path: impl AsRef<str>) -> FileHandle {
        FileHandle::new(self, path)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("trust", &self.inner.trust)
            .field("project_root", &self.inner.project_root)
            .field("read_only_fs", &self.inner.fs.read_only())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    #[test]
    fn trust_matrix() {
        assert!(TrustLevel::Local.permits(Access::Read));
        assert!(TrustLevel::Local.permits(Access::Write));
        assert!(TrustLevel::ReadOnly.permits(Access::Read));
        assert!(!TrustLevel::ReadOnly.permits(Access::Write));
        assert!(!TrustLevel::Sandboxed.permits(Access::Read));
        assert!(!TrustLevel::Sandboxed.permits(Access::Write));
    }

    #[test]
    fn with_trust_shares_filesystem() {
        let fs = MemoryFs::new();
        fs.insert_file("shared.txt", "x").unwrap();
        let host = Host::new(fs, TrustLevel::Local, "/game");
        let sandboxed = host.with_trust(TrustLevel::Sandboxed);

        assert_eq!(sandboxed.trust(), TrustLevel::Sandboxed);
        assert_eq!(sandboxed.project_root(), Path::new("/game"));
        assert!(std::ptr::addr_eq(host.fs(), sandboxed.fs()));
    }

    #[test]
    fn trust_level_config_names() {
        let level: TrustLevel = serde_json::from_str("\"read-only\"").unwrap();
        assert_eq!(level, TrustLevel::ReadOnly);
    }
}
