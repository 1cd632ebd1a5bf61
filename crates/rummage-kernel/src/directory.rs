//! Directories: enumeration, typed discovery, creation and removal.
//!
//! Every operation comes in three forms built from one `async fn`:
//!
//! - `op(..).await`: the future form;
//! - `dir.blocking().op(..)`: blocks until done (see [`Blocking`]);
//! - `op_with(.., callbacks)`: returns `PENDING` and settles a callback.
//!
//! Preconditions run in a fixed order and stop at the first failure:
//! options present, trust gate, success callback present (callback form
//! only), target exists.

use std::fmt;
use std::ops::Deref;

use rummage_types::{Envelope, Status};

use crate::blocking::Blocking;
use crate::bridge::{self, Callbacks};
use crate::entity::{Entity, Node};
use crate::error::OpResult;
use crate::file::FileHandle;
use crate::host::{Access, Host};
use crate::search::{self, Collect};
use crate::template::{MediaCategory, Template};

/// Search limit used when a caller does not pick one: the root only.
pub const DEFAULT_SEARCH_LIMIT: usize = 1;

/// Options for the `get_*` family.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Filter applied to each child's full name.
    pub template: Template,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(template: impl Into<Template>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

/// Options for the `find_*` family.
#[derive(Debug, Clone)]
pub struct FindOptions {
    /// Filter applied to each collected entity's full name.
    pub template: Template,
    /// Most directories the search examines, root included.
    pub search_limit: usize,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            template: Template::Any,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: impl Into<Template>) -> Self {
        self.template = template.into();
        self
    }

    pub fn search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }
}

/// A directory on a host.
#[derive(Clone, PartialEq, Eq)]
pub struct Directory {
    node: Node,
}

impl Directory {
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

    /// A file entity for a direct child. Does not touch the host.
    pub fn file(&self, name: &str) -> FileHandle {
        FileHandle::from_node(Node::from_path(self.host(), self.path().join(name)))
    }

    /// A directory entity for a direct child. Does not touch the host.
    pub fn directory(&self, name: &str) -> Directory {
        Directory::from_node(Node::from_path(self.host(), self.path().join(name)))
    }

    /// Blocking forms of this directory's operations.
    pub fn blocking(&self) -> Blocking<'_, Directory> {
        Blocking::new(self)
    }

    // ── enumeration ────────────────────────────────────────────────────

    /// Direct children, optionally filtered by name.
    ///
    /// Statuses: `OK`, `MISSING_OPTIONS`, `NOT_PERMITTED`, `PATH_NOT_FOUND`.
    pub async fn get_all(&self, options: Option<&ListOptions>) -> OpResult<Vec<Entity>> {
        match self.gate(options, Access::Read) {
            Ok(options) => self.enumerate(&options.template).await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`get_all`](Self::get_all).
    pub fn get_all_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<Entity>>,
    ) -> Status {
        let gate = self.gate(options, Access::Read);
        bridge::start(self, gate, callbacks, |dir, options| async move {
            dir.enumerate(&options.template).await
        })
    }

    /// Direct children that are files.
    pub async fn get_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        Ok(self.get_all(options).await?.map(files_of))
    }

    /// Callback form of [`get_files`](Self::get_files); filters the
    /// eventual listing instead of reading the host again.
    pub fn get_files_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_all_with(options, callbacks.map(files_of))
    }

    /// Direct children that are directories.
    pub async fn get_directories(&self, options: Option<&ListOptions>) -> OpResult<Vec<Directory>> {
        Ok(self.get_all(options).await?.map(directories_of))
    }

    /// Callback form of [`get_directories`](Self::get_directories).
    pub fn get_directories_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<Directory>>,
    ) -> Status {
        self.get_all_with(options, callbacks.map(directories_of))
    }

    /// Direct child files of one media category.
    ///
    /// The category's extension pattern always applies; the caller's
    /// template, if any, narrows it further.
    pub async fn get_category(
        &self,
        category: MediaCategory,
        options: Option<&ListOptions>,
    ) -> OpResult<Vec<FileHandle>> {
        Ok(self
            .get_files(options)
            .await?
            .map(move |files| of_category(files, category)))
    }

    /// Callback form of [`get_category`](Self::get_category).
    pub fn get_category_with(
        &self,
        category: MediaCategory,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_all_with(
            options,
            callbacks.map(move |entities| of_category(files_of(entities), category)),
        )
    }

    pub async fn get_audio_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Audio, options).await
    }

    pub fn get_audio_files_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_category_with(MediaCategory::Audio, options, callbacks)
    }

    pub async fn get_image_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Image, options).await
    }

    pub fn get_image_files_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_category_with(MediaCategory::Image, options, callbacks)
    }

    pub async fn get_video_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Video, options).await
    }

    pub fn get_video_files_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_category_with(MediaCategory::Video, options, callbacks)
    }

    pub async fn get_json_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Json, options).await
    }

    pub fn get_json_files_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_category_with(MediaCategory::Json, options, callbacks)
    }

    pub async fn get_txt_files(&self, options: Option<&ListOptions>) -> OpResult<Vec<FileHandle>> {
        self.get_category(MediaCategory::Text, options).await
    }

    pub fn get_txt_files_with(
        &self,
        options: Option<ListOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        self.get_category_with(MediaCategory::Text, options, callbacks)
    }

    // ── bounded search ─────────────────────────────────────────────────

    /// Files matching the template anywhere within the search budget.
    ///
    /// Statuses: `OK`, `MISSING_OPTIONS`, `NOT_PERMITTED`, `PATH_NOT_FOUND`
    /// (root). A failing branch rejects with [`Failure`](crate::Failure).
    #[tracing::instrument(level = "debug", skip(self, options), fields(path = %self.full_path()))]
    pub async fn find_files(&self, options: Option<&FindOptions>) -> OpResult<Vec<FileHandle>> {
        match self.gate(options, Access::Read) {
            Ok(options) => Ok(search::run(self, options, Collect::Files).await?.map(files_of)),
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`find_files`](Self::find_files).
    pub fn find_files_with(
        &self,
        options: Option<FindOptions>,
        callbacks: Callbacks<Vec<FileHandle>>,
    ) -> Status {
        let gate = self.gate(options, Access::Read);
        bridge::start(self, gate, callbacks, |dir, options| async move {
            Ok(search::run(&dir, &options, Collect::Files).await?.map(files_of))
        })
    }

    /// Directories matching the template anywhere within the search budget.
    ///
    /// Matching and descending are independent: a directory that does not
    /// match is still searched when the budget allows.
    #[tracing::instrument(level = "debug", skip(self, options), fields(path = %self.full_path()))]
    pub async fn find_directories(&self, options: Option<&FindOptions>) -> OpResult<Vec<Directory>> {
        match self.gate(options, Access::Read) {
            Ok(options) => Ok(search::run(self, options, Collect::Directories)
                .await?
                .map(directories_of)),
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`find_directories`](Self::find_directories).
    pub fn find_directories_with(
        &self,
        options: Option<FindOptions>,
        callbacks: Callbacks<Vec<Directory>>,
    ) -> Status {
        let gate = self.gate(options, Access::Read);
        bridge::start(self, gate, callbacks, |dir, options| async move {
            Ok(search::run(&dir, &options, Collect::Directories)
                .await?
                .map(directories_of))
        })
    }

    // ── mutation ───────────────────────────────────────────────────────

    /// Create this directory (and missing parents).
    ///
    /// Statuses: `OK` (no payload), `NOT_PERMITTED`, `ALREADY_EXISTS`.
    pub async fn create(&self) -> OpResult<()> {
        match self.gate_access(Access::Write) {
            Ok(()) => self.create_checked().await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`create`](Self::create).
    pub fn create_with(&self, callbacks: Callbacks<()>) -> Status {
        let gate = self.gate_access(Access::Write);
        bridge::start(self, gate, callbacks, |dir, ()| async move { dir.create_checked().await })
    }

    /// Create a direct child directory called `name`.
    ///
    /// Statuses: `OK` with the new directory, `NOT_PERMITTED`,
    /// `PATH_NOT_FOUND` (this directory), `ALREADY_EXISTS` (the child).
    pub async fn create_directory(&self, name: &str) -> OpResult<Directory> {
        match self.gate_access(Access::Write) {
            Ok(()) => self.create_child_checked(name).await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`create_directory`](Self::create_directory).
    pub fn create_directory_with(&self, name: &str, callbacks: Callbacks<Directory>) -> Status {
        let gate = self.gate_access(Access::Write).map(|()| name.to_string());
        bridge::start(self, gate, callbacks, |dir, name| async move {
            dir.create_child_checked(&name).await
        })
    }

    /// Remove this directory if it is empty.
    ///
    /// Emptiness comes from a `get_all` of the directory, so removal also
    /// needs the trust level to allow enumeration.
    ///
    /// Statuses: `OK` (no payload), `NOT_PERMITTED`, `PATH_NOT_FOUND`,
    /// `NOT_EMPTY`.
    pub async fn remove(&self) -> OpResult<()> {
        match self.gate_access(Access::Write) {
            Ok(()) => self.remove_checked().await,
            Err(status) => Ok(status.into()),
        }
    }

    /// Callback form of [`remove`](Self::remove).
    pub fn remove_with(&self, callbacks: Callbacks<()>) -> Status {
        let gate = self.gate_access(Access::Write);
        bridge::start(self, gate, callbacks, |dir, ()| async move { dir.remove_checked().await })
    }

    // ── checked bodies (gates already passed) ──────────────────────────

    /// List this directory after the synchronous gates have passed.
    pub(crate) async fn enumerate(&self, template: &Template) -> OpResult<Vec<Entity>> {
        if let Err(status) = self.require_existing().await {
            return Ok(status.into());
        }

        let entries = self.host().fs().list(self.path().as_path()).await?;
        let entities: Vec<Entity> = entries
            .into_iter()
            .filter(|entry| template.matches(&entry.name))
            .map(|entry| Entity::from_entry(&self.node, entry))
            .collect();

        tracing::debug!(path = %self.full_path(), count = entities.len(), "listed directory");
        Ok(Envelope::ok(entities))
    }

    async fn create_checked(&self) -> OpResult<()> {
        if self.exists().await {
            return Ok(Status::AlreadyExists.into());
        }
        self.host().fs().mkdir(self.path().as_path()).await?;
        tracing::debug!(path = %self.full_path(), "created directory");
        Ok(Envelope::done())
    }

    async fn create_child_checked(&self, name: &str) -> OpResult<Directory> {
        if let Err(status) = self.require_existing().await {
            return Ok(status.into());
        }
        let child = self.directory(name);
        if child.exists().await {
            return Ok(Status::AlreadyExists.into());
        }
        self.host().fs().mkdir(child.path().as_path()).await?;
        tracing::debug!(path = %child.full_path(), "created directory");
        Ok(Envelope::ok(child))
    }

    async fn remove_checked(&self) -> OpResult<()> {
        if let Err(status) = self.require_existing().await {
            return Ok(status.into());
        }

        let listing = self.get_all(Some(&ListOptions::default())).await?;
        match listing.into_parts() {
            (Status::Ok, Some(children)) if children.is_empty() => {}
            (Status::Ok, _) => {
                tracing::debug!(path = %self.full_path(), "refusing to remove non-empty directory");
                return Ok(Status::NotEmpty.into());
            }
            (status, _) => return Ok(status.into()),
        }

        self.host().fs().remove(self.path().as_path()).await?;
        tracing::debug!(path = %self.full_path(), "removed directory");
        Ok(Envelope::done())
    }
}

impl Deref for Directory {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Directory").field(&self.full_path()).finish()
    }
}

fn files_of(entities: Vec<Entity>) -> Vec<FileHandle> {
    entities.into_iter().filter_map(Entity::into_file).collect()
}

fn directories_of(entities: Vec<Entity>) -> Vec<Directory> {
    entities.into_iter().filter_map(Entity::into_directory).collect()
}

fn of_category(files: Vec<FileHandle>, category: MediaCategory) -> Vec<FileHandle> {
    files
        .into_iter()
        .filter(|file| category.matches(file.full_name()))
        .collect()
}
