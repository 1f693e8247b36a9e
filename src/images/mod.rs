//! Image ingestion.
//!
//! Uploads flow through the [`codec`] into a JPEG, get a fresh blob path
//! from [`naming`], and are persisted by the [`coordinator`] as a metadata
//! row ([`metadata`]) plus a blob ([`blob`]) that always exist together.

pub mod blob;
pub mod codec;
pub mod coordinator;
pub mod metadata;
pub mod naming;

pub use blob::{BlobStore, LocalBlobStore};
pub use codec::{Codec, Transcoded};
pub use coordinator::{AssetDescriptor, ImageCoordinator, Upload};
pub use metadata::{MetadataStore, SqliteMetadataStore};
