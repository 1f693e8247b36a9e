//! Metadata store seam.
//!
//! The coordinator talks to the relational store only through
//! [`MetadataStore`]. [`SqliteMetadataStore`] implements it on top of the
//! `eventimg_db` queries.

use eventimg_common::{EventId, ImageId, Result};
use eventimg_db::models::{ImageAsset, NewImage};
use eventimg_db::pool::{get_conn, DbPool};
use eventimg_db::queries::images;

/// Procedural interface to the relational store of image rows.
pub trait MetadataStore: Send + Sync {
    /// Insert a row and return its store-assigned id.
    ///
    /// Fails with a validation error on bad references. Setting
    /// `is_primary` clears the flag on the event's other images.
    fn insert(&self, image: &NewImage) -> Result<ImageId>;

    /// Delete the image of `event_id` and return the blob path it held.
    fn delete_and_return_path(&self, image_id: ImageId, event_id: EventId) -> Result<Option<String>>;

    /// Delete a row by id alone; used to undo a half-finished create.
    fn delete_by_id(&self, image_id: ImageId) -> Result<bool>;

    fn get(&self, image_id: ImageId, event_id: EventId) -> Result<Option<ImageAsset>>;

    /// Images of an event ordered by sort order, then insertion order.
    fn list(&self, event_id: EventId) -> Result<Vec<ImageAsset>>;
}

/// [`MetadataStore`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    pool: DbPool,
}

impl SqliteMetadataStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl MetadataStore for SqliteMetadataStore {
    fn insert(&self, image: &NewImage) -> Result<ImageId> {
        let conn = get_conn(&self.pool)?;
        images::insert_image(&conn, image)
    }

    fn delete_and_return_path(&self, image_id: ImageId, event_id: EventId) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        images::delete_image(&conn, image_id, event_id)
    }

    fn delete_by_id(&self, image_id: ImageId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        images::delete_image_by_id(&conn, image_id)
    }

    fn get(&self, image_id: ImageId, event_id: EventId) -> Result<Option<ImageAsset>> {
        let conn = get_conn(&self.pool)?;
        images::get_image(&conn, image_id, event_id)
    }

    fn list(&self, event_id: EventId) -> Result<Vec<ImageAsset>> {
        let conn = get_conn(&self.pool)?;
        images::list_images(&conn, event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use eventimg_common::{Error, Tier};
    use eventimg_db::pool::init_memory_pool;
    use eventimg_db::queries::events::create_event;

    fn new_image(event_id: EventId, path: &str) -> NewImage {
        NewImage {
            event_id,
            storage_path: path.to_string(),
            mime_type: "image/jpeg".to_string(),
            original_file_name: "a.png".to_string(),
            byte_size: 10,
            width: 4,
            height: 3,
            quality_tier: Tier::Thumbnail,
            sort_order: 0,
            is_primary: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sqlite_store_round_trip() {
        let pool = init_memory_pool().unwrap();
        let event = create_event(&get_conn(&pool).unwrap(), "Gala").unwrap();
        let store = SqliteMetadataStore::new(pool);

        let id = store.insert(&new_image(event.id, "events/1/a.jpg")).unwrap();
        let row = store.get(id, event.id).unwrap().unwrap();
        assert_eq!(row.storage_path, "events/1/a.jpg");
        assert_eq!(store.list(event.id).unwrap().len(), 1);

        assert_eq!(
            store.delete_and_return_path(id, event.id).unwrap().as_deref(),
            Some("events/1/a.jpg")
        );
        assert!(store.delete_and_return_path(id, event.id).unwrap().is_none());
        assert!(!store.delete_by_id(id).unwrap());
    }

    #[test]
    fn test_sqlite_store_rejects_unknown_event() {
        let store = SqliteMetadataStore::new(init_memory_pool().unwrap());
        let missing = EventId::new(999).unwrap();
        let err = store.insert(&new_image(missing, "events/999/a.jpg")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
