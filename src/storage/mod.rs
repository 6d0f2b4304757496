//! Storage module for notescribe
//!
//! Uploaded audio is handed to a blob store and from then on only referred
//! to by the opaque key the store returns.

mod blob;

pub use blob::{BlobStore, FileReference, FsBlobStore, MemoryBlobStore};
