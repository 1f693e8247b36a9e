//! Dual-store image coordinator.
//!
//! An asset exists only when both its metadata row and its blob exist.
//! [`ImageCoordinator::create`] inserts the row first and writes the blob
//! second; if the blob write fails the row is deleted again before the error
//! is returned. [`ImageCoordinator::delete`] removes the row before the blob,
//! so a reader can never find a row whose blob is already gone.

use std::io::Read;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventimg_common::{Error, EventId, ImageId, Result, Tier};
use eventimg_db::models::{ImageAsset, NewImage};
use serde::Serialize;

use super::blob::BlobStore;
use super::codec::Codec;
use super::metadata::MetadataStore;
use super::naming::{self, JPEG_EXTENSION};

/// Caller-facing view of a stored asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetDescriptor {
    pub id: ImageId,
    pub event_id: EventId,
    /// Public URL of the blob.
    pub url: String,
    /// Relative blob path.
    #[serde(skip)]
    pub storage_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    pub image_quality: Tier,
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// One upload handed to [`ImageCoordinator::create`].
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub data: &'a [u8],
    pub declared_mime: &'a str,
    pub file_name: &'a str,
    pub tier: Tier,
    pub is_primary: bool,
}

/// Owns the consistency of metadata rows and blobs.
pub struct ImageCoordinator {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    codec: Codec,
    url_prefix: String,
}

impl ImageCoordinator {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        codec: Codec,
        url_prefix: impl Into<String>,
    ) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            metadata,
            blobs,
            codec,
            url_prefix,
        }
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Transcode and store an upload.
    ///
    /// Codec and validation failures happen before either store is touched.
    /// A failed blob write is compensated by deleting the freshly inserted
    /// row, and surfaces as [`Error::Storage`].
    pub fn create(&self, event_id: EventId, upload: Upload<'_>) -> Result<AssetDescriptor> {
        let encoded = self
            .codec
            .transcode(upload.data, upload.declared_mime, upload.tier)?;
        let path = naming::generate(event_id, JPEG_EXTENSION)?;

        let row = NewImage {
            event_id,
            storage_path: path.clone(),
            mime_type: encoded.mime_type().to_string(),
            original_file_name: upload.file_name.to_string(),
            byte_size: encoded.data.len() as u64,
            width: encoded.width,
            height: encoded.height,
            quality_tier: upload.tier,
            sort_order: 0,
            is_primary: upload.is_primary,
            created_at: Utc::now(),
        };

        let image_id = self.metadata.insert(&row)?;
        tracing::debug!(%event_id, %image_id, %path, "metadata row inserted");

        if let Err(err) = self.blobs.put(&path, &encoded.data) {
            tracing::warn!(%event_id, %image_id, %path, error = %err, "blob write failed, removing metadata row");
            self.compensate(event_id, image_id, &path);
            return Err(match err {
                Error::Storage { .. } => err,
                other => Error::storage(&path, other),
            });
        }

        tracing::info!(
            %event_id,
            %image_id,
            %path,
            tier = %upload.tier,
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.data.len(),
            "image stored"
        );
        Ok(self.describe(row.into_asset(image_id)))
    }

    fn compensate(&self, event_id: EventId, image_id: ImageId, path: &str) {
        match self.metadata.delete_by_id(image_id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(%event_id, %image_id, path, "compensation found no metadata row");
            }
            Err(e) => {
                tracing::error!(
                    %event_id,
                    %image_id,
                    path,
                    error = %e,
                    "compensation failed: orphan metadata row"
                );
            }
        }
    }

    /// Delete an image of an event.
    ///
    /// Fails with [`Error::NotFound`] when no such image exists. The blob is
    /// removed after the row; a missing blob is fine, and any other blob
    /// failure is logged as an orphan without failing the delete.
    pub fn delete(&self, event_id: EventId, image_id: ImageId) -> Result<()> {
        let path = self
            .metadata
            .delete_and_return_path(image_id, event_id)?
            .ok_or_else(|| Error::not_found("image", image_id))?;

        match self.blobs.delete(&path) {
            Ok(true) => {
                tracing::info!(%event_id, %image_id, %path, "image deleted");
            }
            Ok(false) => {
                tracing::warn!(%event_id, %image_id, %path, "image deleted, blob was already gone");
            }
            Err(e) => {
                tracing::error!(
                    %event_id,
                    %image_id,
                    %path,
                    error = %e,
                    "blob delete failed: orphan blob"
                );
            }
        }
        Ok(())
    }

    /// Images of an event, ordered by sort order then insertion order.
    pub fn list(&self, event_id: EventId) -> Result<Vec<AssetDescriptor>> {
        Ok(self
            .metadata
            .list(event_id)?
            .into_iter()
            .map(|asset| self.describe(asset))
            .collect())
    }

    pub fn get(&self, event_id: EventId, image_id: ImageId) -> Result<AssetDescriptor> {
        self.metadata
            .get(image_id, event_id)?
            .map(|asset| self.describe(asset))
            .ok_or_else(|| Error::not_found("image", image_id))
    }

    /// Open a stored blob by its relative path.
    pub fn open_blob(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        self.blobs.get(path)
    }

    fn describe(&self, asset: ImageAsset) -> AssetDescriptor {
        AssetDescriptor {
            id: asset.id,
            event_id: asset.event_id,
            url: format!("{}/{}", self.url_prefix, asset.storage_path),
            storage_path: asset.storage_path,
            file_name: asset.original_file_name,
            file_size: asset.byte_size,
            width: asset.width,
            height: asset.height,
            image_quality: asset.quality_tier,
            sort_order: asset.sort_order,
            is_primary: asset.is_primary,
            created_at: asset.created_at,
        }
    }
}
