//! rummage-kernel: filesystem entities for a game project tree.
//!
//! This crate provides:
//!
//! - **Entities**: [`FileHandle`] and [`Directory`] over a normalized path on a [`Host`]
//! - **Discovery**: direct listings, typed media discovery, bounded recursive search
//! - **Codec**: zlib + JSON payload pipelines for files and saved values
//! - **Storage**: a key-value store for save data, in memory or on disk
//! - **VFS**: the host filesystem seam with local and in-memory backends
//!
//! Every operation is one `async fn` returning an [`OpResult`]. Each also
//! has a blocking form (`entity.blocking().op(..)`) and a callback form
//! (`entity.op_with(.., callbacks)`), and all three observe the same
//! statuses for the same tree.

pub mod blocking;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod file;
pub mod host;
pub mod loader;
pub mod path;
pub mod storage;
pub mod template;
pub mod vfs;

mod search;

pub use blocking::Blocking;
pub use bridge::{Callbacks, promisify};
pub use config::RummageConfig;
pub use directory::{DEFAULT_SEARCH_LIMIT, Directory, FindOptions, ListOptions};
pub use entity::{Entity, Node};
pub use error::{Failure, FsError, OpResult};
pub use file::{Content, FileHandle, ReadOptions, WriteOptions};
pub use host::{Access, Host, TrustLevel};
pub use loader::{MediaKind, RawMedia, RawMediaLoader, ResourceLoader};
pub use storage::{FsStore, KeyValueStore, MemoryStore, Storage, StoreOptions};
pub use template::{MediaCategory, Template};

// Shared vocabulary, so embedders need only this crate.
pub use rummage_types::{EntityKind, Envelope, Status};
