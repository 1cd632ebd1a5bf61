//! Host filesystem seam.
//!
//! Everything rummage knows about storage goes through [`Filesystem`]:
//!
//! - **LocalFs**: the real filesystem under a project root
//! - **MemoryFs**: in-memory storage for tests and sandboxed hosts
//!
//! Entities never call `std::fs` or `tokio::fs` directly.

mod local;
mod memory;
mod traits;

pub use local::LocalFs;
pub use memory::MemoryFs;
pub use traits::{DirEntry, Filesystem, Metadata};
