//! Eventimg-DB: SQLite-backed image metadata store.
//!
//! This crate provides the relational side of image ingestion using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - Typed rows decoded at the store boundary
//! - `queries` - Insert, lookup, list and delete operations
//!
//! # Example
//!
//! ```
//! use eventimg_db::pool::{init_memory_pool, get_conn};
//! use eventimg_db::queries::{events, images};
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let event = events::create_event(&conn, "Opening night").unwrap();
//! assert!(images::list_images(&conn, event.id).unwrap().is_empty());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
