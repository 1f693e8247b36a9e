use eventimg_common::Tier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory blobs are written under
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// URL prefix that maps 1:1 onto paths under `upload_dir`
    #[serde(default = "default_static_url_prefix")]
    pub static_url_prefix: String,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads/images")
}
fn default_static_url_prefix() -> String {
    "/static/images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            static_url_prefix: default_static_url_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    /// Largest accepted upload in bytes (default: 2 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// MIME types accepted on upload
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,

    #[serde(default)]
    pub tiers: TierBoxes,
}

fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024
}
fn default_allowed_mime_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/webp".to_string(),
    ]
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
            tiers: TierBoxes::default(),
        }
    }
}

/// Maximum output dimensions of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct BoundingBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl BoundingBox {
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

/// Per-tier bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierBoxes {
    #[serde(default = "default_original_box")]
    pub original: BoundingBox,

    #[serde(default = "default_compressed_box")]
    pub compressed: BoundingBox,

    #[serde(default = "default_thumbnail_box")]
    pub thumbnail: BoundingBox,
}

fn default_original_box() -> BoundingBox {
    BoundingBox::new(1200, 1200)
}
fn default_compressed_box() -> BoundingBox {
    BoundingBox::new(800, 800)
}
fn default_thumbnail_box() -> BoundingBox {
    BoundingBox::new(300, 300)
}

impl TierBoxes {
    pub fn get(&self, tier: Tier) -> BoundingBox {
        match tier {
            Tier::Original => self.original,
            Tier::Compressed => self.compressed,
            Tier::Thumbnail => self.thumbnail,
        }
    }
}

impl Default for TierBoxes {
    fn default() -> Self {
        Self {
            original: default_original_box(),
            compressed: default_compressed_box(),
            thumbnail: default_thumbnail_box(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("eventimg.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}
