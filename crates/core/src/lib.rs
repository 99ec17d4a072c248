//! Core domain types and shared logic for the loft webhook drive.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Container (message) identifiers and attachment metadata
//! - Outgoing payload and file-part types
//! - Configuration for the remote endpoint and the store
//! - Chunk-size constants

pub mod config;
pub mod error;
pub mod message;

pub use config::{RemoteConfig, StoreConfig};
pub use error::{Error, Result};
pub use message::{Attachment, ContainerId, FilePart, Message, MessagePayload, PartialAttachment};

/// Remote attachment size ceiling: 25 MiB.
pub const ATTACHMENT_CEILING: usize = 25 * 1024 * 1024;

/// Headroom left under the ceiling for multipart encoding overhead.
pub const PART_MARGIN: usize = 1024;

/// Maximum chunk size: the attachment ceiling minus multipart headroom.
pub const MAX_CHUNK_SIZE: usize = ATTACHMENT_CEILING - PART_MARGIN;

/// Default chunk size. Chunks fill the available attachment space.
pub const DEFAULT_CHUNK_SIZE: usize = MAX_CHUNK_SIZE;

/// Minimum chunk size.
pub const MIN_CHUNK_SIZE: usize = 1;

/// Default bound on concurrent chunk transfers per store instance.
pub const DEFAULT_TRANSFER_CONCURRENCY: usize = 16;
