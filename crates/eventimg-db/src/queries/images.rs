//! Event image queries.
//!
//! These functions are the procedural interface the ingestion pipeline talks
//! to: insert, delete-and-return-path, list, plus the by-id delete used to
//! compensate a failed blob write.

use eventimg_common::{Error, EventId, ImageId, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension};

use crate::models::{ImageAsset, NewImage};
use crate::queries::events::event_exists;

/// Map constraint violations to validation errors, everything else to
/// database errors.
fn map_write_err(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(err, msg) = &e {
        if err.code == ErrorCode::ConstraintViolation {
            let msg = msg.clone().unwrap_or_else(|| "constraint violation".to_string());
            return Error::validation(msg);
        }
    }
    Error::database(e)
}

/// Insert a new image row and return its store-assigned ID.
///
/// Fails with [`Error::Validation`] when the event does not exist or a
/// required field is empty. When `image.is_primary` is set, every other image
/// of the event loses its primary flag in the same transaction.
pub fn insert_image(conn: &Connection, image: &NewImage) -> Result<ImageId> {
    if image.storage_path.trim().is_empty() {
        return Err(Error::validation("file path cannot be empty"));
    }
    if image.mime_type.trim().is_empty() {
        return Err(Error::validation("mime type cannot be empty"));
    }
    let file_size =
        i64::try_from(image.byte_size).map_err(|_| Error::validation("file size out of range"))?;
    if !event_exists(conn, image.event_id)? {
        return Err(Error::validation(format!(
            "event {} does not exist",
            image.event_id
        )));
    }

    let tx = conn.unchecked_transaction().map_err(Error::database)?;

    if image.is_primary {
        tx.execute(
            "UPDATE event_images SET is_primary = 0 WHERE event_id = ?1 AND is_primary = 1",
            [image.event_id.get()],
        )
        .map_err(map_write_err)?;
    }

    tx.execute(
        "INSERT INTO event_images
            (event_id, file_path, mime_type, file_name, file_size, width, height,
             image_quality, sort_order, is_primary, created_at)
         VALUES (:event_id, :file_path, :mime_type, :file_name, :file_size, :width, :height,
                 :image_quality, :sort_order, :is_primary, :created_at)",
        rusqlite::named_params! {
            ":event_id": image.event_id.get(),
            ":file_path": &image.storage_path,
            ":mime_type": &image.mime_type,
            ":file_name": &image.original_file_name,
            ":file_size": file_size,
            ":width": image.width,
            ":height": image.height,
            ":image_quality": image.quality_tier.as_str(),
            ":sort_order": image.sort_order,
            ":is_primary": image.is_primary,
            ":created_at": image.created_at.to_rfc3339(),
        },
    )
    .map_err(map_write_err)?;

    let id = ImageId::new(tx.last_insert_rowid())?;
    tx.commit().map_err(Error::database)?;

    Ok(id)
}

/// Get one image of an event.
///
/// Returns `None` when the image does not exist or belongs to another event.
pub fn get_image(conn: &Connection, id: ImageId, event_id: EventId) -> Result<Option<ImageAsset>> {
    let q = format!(
        "SELECT {} FROM event_images WHERE id = ?1 AND event_id = ?2",
        ImageAsset::COLUMNS
    );
    conn.query_row(&q, [id.get(), event_id.get()], ImageAsset::from_row)
        .optional()
        .map_err(Error::database)
}

/// List the images of an event ordered by sort order, then insertion order.
pub fn list_images(conn: &Connection, event_id: EventId) -> Result<Vec<ImageAsset>> {
    let q = format!(
        "SELECT {} FROM event_images WHERE event_id = ?1 ORDER BY sort_order, id",
        ImageAsset::COLUMNS
    );
    let mut stmt = conn.prepare(&q).map_err(Error::database)?;
    let rows = stmt
        .query_map([event_id.get()], ImageAsset::from_row)
        .map_err(Error::database)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::database)?;
    Ok(rows)
}

/// Delete an image of an event and return the blob path it pointed to.
///
/// Returns `None` when no row matched both `id` and `event_id`.
pub fn delete_image(conn: &Connection, id: ImageId, event_id: EventId) -> Result<Option<String>> {
    let tx = conn.unchecked_transaction().map_err(Error::database)?;

    let path: Option<String> = tx
        .query_row(
            "SELECT file_path FROM event_images WHERE id = ?1 AND event_id = ?2",
            [id.get(), event_id.get()],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::database)?;

    if path.is_some() {
        tx.execute(
            "DELETE FROM event_images WHERE id = ?1 AND event_id = ?2",
            [id.get(), event_id.get()],
        )
        .map_err(Error::database)?;
    }

    tx.commit().map_err(Error::database)?;
    Ok(path)
}

/// Delete an image row by ID regardless of event.
///
/// Returns `true` if a row was removed.
pub fn delete_image_by_id(conn: &Connection, id: ImageId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM event_images WHERE id = ?1", [id.get()])
        .map_err(Error::database)?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{init_memory_pool, PooledConnection};
    use crate::queries::events::create_event;
    use chrono::Utc;
    use eventimg_common::Tier;

    fn setup() -> (PooledConnection, EventId) {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let event = create_event(&conn, "Concert").unwrap();
        (conn, event.id)
    }

    fn new_image(event_id: EventId, name: &str) -> NewImage {
        NewImage {
            event_id,
            storage_path: format!("events/{event_id}/{name}.jpg"),
            mime_type: "image/jpeg".to_string(),
            original_file_name: format!("{name}.png"),
            byte_size: 1234,
            width: 800,
            height: 533,
            quality_tier: Tier::Compressed,
            sort_order: 0,
            is_primary: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_get_image() {
        let (conn, event_id) = setup();
        let image = new_image(event_id, "a");
        let id = insert_image(&conn, &image).unwrap();

        let found = get_image(&conn, id, event_id).unwrap().unwrap();
        assert_eq!(found, image.into_asset(id));
    }

    #[test]
    fn test_insert_unknown_event_is_validation_error() {
        let (conn, _) = setup();
        let image = new_image(EventId::new(404).unwrap(), "a");
        let err = insert_image(&conn, &image).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {err:?}");
    }

    #[test]
    fn test_insert_empty_path_is_validation_error() {
        let (conn, event_id) = setup();
        let mut image = new_image(event_id, "a");
        image.storage_path = String::new();
        assert!(matches!(
            insert_image(&conn, &image),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_get_image_of_other_event() {
        let (conn, event_id) = setup();
        let other = create_event(&conn, "Other").unwrap();
        let id = insert_image(&conn, &new_image(event_id, "a")).unwrap();

        assert!(get_image(&conn, id, other.id).unwrap().is_none());
    }

    #[test]
    fn test_list_images_ordering() {
        let (conn, event_id) = setup();

        let mut late = new_image(event_id, "late");
        late.sort_order = 5;
        let late_id = insert_image(&conn, &late).unwrap();
        let first_id = insert_image(&conn, &new_image(event_id, "first")).unwrap();
        let second_id = insert_image(&conn, &new_image(event_id, "second")).unwrap();

        let ids: Vec<ImageId> = list_images(&conn, event_id)
            .unwrap()
            .into_iter()
            .map(|img| img.id)
            .collect();
        assert_eq!(ids, vec![first_id, second_id, late_id]);
    }

    #[test]
    fn test_list_images_empty() {
        let (conn, event_id) = setup();
        assert!(list_images(&conn, event_id).unwrap().is_empty());
    }

    #[test]
    fn test_primary_flag_moves_to_latest_insert() {
        let (conn, event_id) = setup();

        let mut a = new_image(event_id, "a");
        a.is_primary = true;
        let a_id = insert_image(&conn, &a).unwrap();

        let mut b = new_image(event_id, "b");
        b.is_primary = true;
        let b_id = insert_image(&conn, &b).unwrap();

        assert!(!get_image(&conn, a_id, event_id).unwrap().unwrap().is_primary);
        assert!(get_image(&conn, b_id, event_id).unwrap().unwrap().is_primary);
    }

    #[test]
    fn test_primary_flag_is_scoped_to_event() {
        let (conn, event_id) = setup();
        let other = create_event(&conn, "Other").unwrap();

        let mut a = new_image(event_id, "a");
        a.is_primary = true;
        let a_id = insert_image(&conn, &a).unwrap();

        let mut b = new_image(other.id, "b");
        b.is_primary = true;
        insert_image(&conn, &b).unwrap();

        assert!(get_image(&conn, a_id, event_id).unwrap().unwrap().is_primary);
    }

    #[test]
    fn test_delete_image_returns_path() {
        let (conn, event_id) = setup();
        let image = new_image(event_id, "a");
        let id = insert_image(&conn, &image).unwrap();

        let path = delete_image(&conn, id, event_id).unwrap();
        assert_eq!(path.as_deref(), Some(image.storage_path.as_str()));
        assert!(get_image(&conn, id, event_id).unwrap().is_none());

        assert!(delete_image(&conn, id, event_id).unwrap().is_none());
    }

    #[test]
    fn test_delete_image_wrong_event() {
        let (conn, event_id) = setup();
        let other = create_event(&conn, "Other").unwrap();
        let id = insert_image(&conn, &new_image(event_id, "a")).unwrap();

        assert!(delete_image(&conn, id, other.id).unwrap().is_none());
        assert!(get_image(&conn, id, event_id).unwrap().is_some());
    }

    #[test]
    fn test_delete_image_by_id() {
        let (conn, event_id) = setup();
        let id = insert_image(&conn, &new_image(event_id, "a")).unwrap();

        assert!(delete_image_by_id(&conn, id).unwrap());
        assert!(!delete_image_by_id(&conn, id).unwrap());
    }

    #[test]
    fn test_malformed_tier_row_is_rejected() {
        let (conn, event_id) = setup();
        let id = insert_image(&conn, &new_image(event_id, "a")).unwrap();

        // Bypass the CHECK constraint to simulate a row written by something else.
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
            .unwrap();
        conn.execute(
            "UPDATE event_images SET image_quality = 'poster' WHERE id = ?1",
            [id.get()],
        )
        .unwrap();

        assert!(matches!(
            get_image(&conn, id, event_id),
            Err(Error::Database { .. })
        ));
    }
}
