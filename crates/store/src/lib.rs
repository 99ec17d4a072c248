//! Chunked path storage over remote message attachments.
//!
//! This crate provides:
//! - `PathStore`: put/get/delete of arbitrary byte payloads addressed by
//!   string path, split into bounded-size chunks stored as one remote
//!   message attachment each
//! - `PathIndex`: the path to chunk-sequence mapping, persisted as a JSON
//!   attachment on a distinguished root message at store close
//! - A counting permit pool bounding concurrent transfers across every
//!   put and get on one store instance

mod chunk;
pub mod error;
pub mod index;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use index::PathIndex;
pub use store::{ByteStream, PathStore};
