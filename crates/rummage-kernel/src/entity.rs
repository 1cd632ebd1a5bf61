//! Entities: paths on a host, classified as files or directories.

use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;

use rummage_types::{EntityKind, Status};

use crate::directory::Directory;
use crate::error::FsError;
use crate::file::FileHandle;
use crate::host::{Access, Host};
use crate::path::EntityPath;
use crate::vfs::{DirEntry, Metadata};

/// What every entity has: a host and an immutable path.
///
/// [`FileHandle`] and [`Directory`] dereference to this, so the path and
/// existence queries are available on both.
#[derive(Clone)]
pub struct Node {
    host: Host,
    path: EntityPath,
}

impl Node {
    pub(crate) fn new(host: &Host, raw: impl AsRef<str>) -> Self {
        Self {
            host: host.clone(),
            path: EntityPath::new(raw.as_ref()),
        }
    }

    pub(crate) fn from_path(host: &Host, path: EntityPath) -> Self {
        Self {
            host: host.clone(),
            path,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    /// The path exactly as given at construction.
    pub fn raw_path(&self) -> &str {
        self.path.raw()
    }

    /// The normalized path.
    pub fn full_path(&self) -> &str {
        self.path.full()
    }

    /// The normalized path resolved against the host's project root.
    pub fn absolute_path(&self) -> PathBuf {
        self.path.absolute(self.host.project_root())
    }

    pub fn full_name(&self) -> &str {
        self.path.full_name()
    }

    pub fn base_name(&self) -> &str {
        self.path.base_name()
    }

    pub fn extension(&self) -> &str {
        self.path.extension()
    }

    /// One host existence check.
    pub async fn exists(&self) -> bool {
        self.host.fs().exists(self.path.as_path()).await
    }

    /// True when a host stat says this is a regular file.
    pub async fn is_file(&self) -> bool {
        self.metadata().await.is_ok_and(|meta| meta.is_file)
    }

    /// True when a host stat says this is a directory.
    pub async fn is_directory(&self) -> bool {
        self.metadata().await.is_ok_and(|meta| meta.is_dir)
    }

    pub async fn metadata(&self) -> Result<Metadata, FsError> {
        Ok(self.host.fs().stat(self.path.as_path()).await?)
    }

    /// The directory containing this entity.
    pub fn parent(&self) -> Directory {
        Directory::from_node(Node::from_path(&self.host, self.path.parent()))
    }

    /// Synchronous preconditions, in contract order: options present, then
    /// the trust gate.
    pub(crate) fn gate<O>(&self, options: Option<O>, access: Access) -> Result<O, Status> {
        let options = options.ok_or(Status::MissingOptions)?;
        self.gate_access(access)?;
        Ok(options)
    }

    pub(crate) fn gate_access(&self, access: Access) -> Result<(), Status> {
        if self.host.permits(access) {
            Ok(())
        } else {
            tracing::debug!(path = %self.full_path(), ?access, trust = ?self.host.trust(), "trust gate refused");
            Err(Status::NotPermitted)
        }
    }

    pub(crate) async fn require_existing(&self) -> Result<(), Status> {
        if self.exists().await {
            Ok(())
        } else {
            Err(Status::PathNotFound)
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.path.full() == other.path.full() && self.host.same_as(&other.host)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("raw", &self.path.raw())
            .field("full", &self.path.full())
            .finish()
    }
}

/// A file or a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    File(FileHandle),
    Directory(Directory),
}

impl Entity {
    /// Wrap a listing entry found inside `parent`.
    pub(crate) fn from_entry(parent: &Node, entry: DirEntry) -> Self {
        let node = Node::from_path(parent.host(), parent.path().join(&entry.name));
        match entry.kind {
            EntityKind::File => Entity::File(FileHandle::from_node(node)),
            EntityKind::Directory => Entity::Directory(Directory::from_node(node)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::File(_) => EntityKind::File,
            Entity::Directory(_) => EntityKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind().is_file()
    }

    pub fn is_directory(&self) -> bool {
        self.kind().is_directory()
    }

    pub fn as_file(&self) -> Option<&FileHandle> {
        match self {
            Entity::File(file) => Some(file),
            Entity::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Entity::Directory(dir) => Some(dir),
            Entity::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<FileHandle> {
        match self {
            Entity::File(file) => Some(file),
            Entity::Directory(_) => None,
        }
    }

    pub fn into_directory(self) -> Option<Directory> {
        match self {
            Entity::Directory(dir) => Some(dir),
            Entity::File(_) => None,
        }
    }
}

impl Deref for Entity {
    type Target = Node;

    fn deref(&self) -> &Node {
        match self {
            Entity::File(file) => file.node(),
            Entity::Directory(dir) => dir.node(),
        }
    }
}

impl From<FileHandle> for Entity {
    fn from(file: FileHandle) -> Self {
        Entity::File(file)
    }
}

impl From<Directory> for Entity {
    fn from(dir: Directory) -> Self {
        Entity::Directory(dir)
    }
}
