//! Core enums shared between the metadata store and the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Canonical MIME type of every stored blob.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Bounding-box preset an uploaded image is normalized into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Largest stored rendition.
    Original,
    /// Default rendition for uploads.
    #[default]
    Compressed,
    /// Small preview.
    Thumbnail,
}

impl Tier {
    /// Returns all tiers, largest first.
    pub fn all() -> &'static [Tier] {
        &[Tier::Original, Tier::Compressed, Tier::Thumbnail]
    }

    /// Lowercase name as stored in the metadata store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Compressed => "compressed",
            Self::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "compressed" => Ok(Self::Compressed),
            "thumbnail" => Ok(Self::Thumbnail),
            other => Err(Error::Validation(format!("unknown image tier: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Original.to_string(), "original");
        assert_eq!(Tier::Compressed.to_string(), "compressed");
        assert_eq!(Tier::Thumbnail.to_string(), "thumbnail");
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("Thumbnail".parse::<Tier>().unwrap(), Tier::Thumbnail);
        assert_eq!(" original ".parse::<Tier>().unwrap(), Tier::Original);
        assert!("large".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_serialization() {
        let json = serde_json::to_string(&Tier::Compressed).unwrap();
        assert_eq!(json, r#""compressed""#);
        let back: Tier = serde_json::from_str(r#""thumbnail""#).unwrap();
        assert_eq!(back, Tier::Thumbnail);
    }

    #[test]
    fn test_default_tier_is_compressed() {
        assert_eq!(Tier::default(), Tier::Compressed);
    }
}
