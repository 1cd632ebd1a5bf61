//! Pure data types for rummage: the result envelope and its status codes.
//!
//! This crate is a leaf dependency with no async runtime and no I/O, so
//! front ends can inspect results without pulling in the kernel.

pub mod entity;
pub mod envelope;
pub mod status;

pub use entity::*;
pub use envelope::*;
pub use status::*;
