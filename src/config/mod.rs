mod types;

pub use types::*;

use anyhow::{Context, Result};
use eventimg_common::Tier;
use std::path::{Path, PathBuf};

use crate::images::codec::{normalize_mime, SUPPORTED_MIME_TYPES};

/// Environment variable overriding `storage.upload_dir`.
pub const UPLOAD_DIR_ENV: &str = "EVENTIMG_UPLOAD_DIR";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./eventimg.toml",
        "./config.toml",
        "~/.config/eventimg/config.toml",
        "/etc/eventimg/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration from TOML text without touching the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(dir) = std::env::var(UPLOAD_DIR_ENV) {
        if !dir.trim().is_empty() {
            tracing::debug!("Upload directory overridden by {}: {}", UPLOAD_DIR_ENV, dir);
            config.storage.upload_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.images.max_upload_bytes == 0 {
        anyhow::bail!("images.max_upload_bytes must be greater than 0");
    }

    if config.images.allowed_mime_types.is_empty() {
        anyhow::bail!("images.allowed_mime_types cannot be empty");
    }
    for mime in &config.images.allowed_mime_types {
        let normalized = normalize_mime(mime);
        if !SUPPORTED_MIME_TYPES.contains(&normalized.as_str()) {
            anyhow::bail!(
                "Unsupported MIME type '{}' in images.allowed_mime_types (supported: {})",
                mime,
                SUPPORTED_MIME_TYPES.join(", ")
            );
        }
    }

    for tier in Tier::all() {
        let bbox = config.images.tiers.get(*tier);
        for (name, value) in [("max_width", bbox.max_width), ("max_height", bbox.max_height)] {
            if value == 0 || value > u32::from(u16::MAX) {
                anyhow::bail!(
                    "images.tiers.{}.{} must be between 1 and {}, got {}",
                    tier,
                    name,
                    u16::MAX,
                    value
                );
            }
        }
    }

    if !config.storage.static_url_prefix.starts_with('/') {
        anyhow::bail!(
            "storage.static_url_prefix must start with '/', got '{}'",
            config.storage.static_url_prefix
        );
    }

    if config.storage.upload_dir.as_os_str().is_empty() {
        anyhow::bail!("storage.upload_dir cannot be empty");
    }

    Ok(())
}
