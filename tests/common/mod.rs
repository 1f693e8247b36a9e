//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary upload
//! directory and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;

use eventimg::config::Config;
use eventimg::server::{create_router, AppContext};
use eventimg_common::EventId;
use eventimg_db::pool::{init_memory_pool, DbPool};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a scratch upload directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub upload_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The upload
    /// directory is always replaced by a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let upload_dir = tempfile::tempdir().expect("failed to create upload dir");
        config.storage.upload_dir = upload_dir.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone()).expect("failed to build context");

        Self {
            ctx,
            db,
            upload_dir,
        }
    }

    /// Start an Axum server on a random port.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> eventimg_db::pool::PooledConnection {
        eventimg_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Insert an event row.
    pub fn create_event(&self, title: &str) -> EventId {
        eventimg_db::queries::events::create_event(&self.conn(), title)
            .expect("failed to create event")
            .id
    }

    /// Number of files stored under the upload directory.
    pub fn blob_count(&self) -> usize {
        fn walk(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|e| {
                            let path = e.path();
                            if path.is_dir() {
                                walk(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        walk(self.upload_dir.path())
    }

    /// Number of image rows across all events.
    pub fn row_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM event_images", [], |row| row.get(0))
            .expect("failed to count rows")
    }
}

/// Encode a solid-color RGB image as PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 144, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("png encode");
    out.into_inner()
}

/// Encode a fully transparent RGBA image as PNG.
pub fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("png encode");
    out.into_inner()
}

/// Smallest valid GIF: one transparent pixel.
pub const TINY_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff,
    0xff, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Build a multipart form with a single `file` part.
pub fn file_form(bytes: Vec<u8>, file_name: &str, mime: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime");
    reqwest::multipart::Form::new().part("file", part)
}
