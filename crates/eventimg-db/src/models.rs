//! Rust structs mapping to database tables.
//!
//! Rows are decoded into these strongly-typed records at the store boundary;
//! a row with an unknown tier, a non-positive key or a malformed timestamp is
//! rejected as a conversion failure instead of leaking into the caller.

use chrono::{DateTime, Utc};
use eventimg_common::{EventId, ImageId, Tier};
use rusqlite::types::Type;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_failure<E>(idx: usize, ty: Type, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

/// Parse a positive integer key column into a typed ID.
fn parse_id<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: TryFrom<i64, Error = eventimg_common::Error>,
{
    let raw: i64 = row.get(idx)?;
    T::try_from(raw).map_err(|e| conversion_failure(idx, Type::Integer, e))
}

fn parse_dimension(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<u32> {
    let raw: i64 = row.get(idx)?;
    u32::try_from(raw).map_err(|e| conversion_failure(idx, Type::Integer, e))
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, Type::Text, e))
}

fn parse_tier(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Tier> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_failure(idx, Type::Text, e))
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            title: row.get(1)?,
            created_at: parse_timestamp(row, 2)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ImageAsset
// ---------------------------------------------------------------------------

/// A committed image row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: ImageId,
    pub event_id: EventId,
    /// Blob path relative to the upload root, e.g. `events/42/<uuid>.jpg`.
    pub storage_path: String,
    pub mime_type: String,
    /// Name of the uploaded file; diagnostic only.
    pub original_file_name: String,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub quality_tier: Tier,
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl ImageAsset {
    /// Columns expected by [`ImageAsset::from_row`], in order.
    pub const COLUMNS: &'static str = "id, event_id, file_path, mime_type, file_name, file_size, \
         width, height, image_quality, sort_order, is_primary, created_at";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let byte_size: i64 = row.get(5)?;
        Ok(Self {
            id: parse_id(row, 0)?,
            event_id: parse_id(row, 1)?,
            storage_path: row.get(2)?,
            mime_type: row.get(3)?,
            original_file_name: row.get(4)?,
            byte_size: u64::try_from(byte_size)
                .map_err(|e| conversion_failure(5, Type::Integer, e))?,
            width: parse_dimension(row, 6)?,
            height: parse_dimension(row, 7)?,
            quality_tier: parse_tier(row, 8)?,
            sort_order: row.get(9)?,
            is_primary: row.get(10)?,
            created_at: parse_timestamp(row, 11)?,
        })
    }
}

/// Arguments of an image insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub event_id: EventId,
    pub storage_path: String,
    pub mime_type: String,
    pub original_file_name: String,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub quality_tier: Tier,
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl NewImage {
    /// The row this insert becomes once the store has assigned `id`.
    pub fn into_asset(self, id: ImageId) -> ImageAsset {
        ImageAsset {
            id,
            event_id: self.event_id,
            storage_path: self.storage_path,
            mime_type: self.mime_type,
            original_file_name: self.original_file_name,
            byte_size: self.byte_size,
            width: self.width,
            height: self.height,
            quality_tier: self.quality_tier,
            sort_order: self.sort_order,
            is_primary: self.is_primary,
            created_at: self.created_at,
        }
    }
}
