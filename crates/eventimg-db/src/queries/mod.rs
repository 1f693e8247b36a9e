//! Database query modules.
//!
//! - events: minimal event rows referenced by images
//! - images: the image metadata procedures used by the ingestion pipeline

pub mod events;
pub mod images;
