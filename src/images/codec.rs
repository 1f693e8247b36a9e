//! Upload transcoding.
//!
//! Every accepted upload is decoded, flattened onto an opaque white
//! background, shrunk to fit its tier's bounding box and re-encoded as a
//! baseline JPEG (quality 85, optimized Huffman tables). The output format
//! never depends on the input format.

use eventimg_common::{Error, Result, Tier, OUTPUT_MIME};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use jpeg_encoder::{ColorType, Encoder};
use std::path::Path;

use crate::config::{BoundingBox, ImageConfig, TierBoxes};

/// MIME types the codec can decode.
pub const SUPPORTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// JPEG quality of every stored blob.
pub const JPEG_QUALITY: u8 = 85;

/// Result of a successful transcode.
#[derive(Debug, Clone)]
pub struct Transcoded {
    /// Encoded JPEG bytes.
    pub data: Vec<u8>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl Transcoded {
    /// MIME type of [`Transcoded::data`]; always JPEG.
    pub fn mime_type(&self) -> &'static str {
        OUTPUT_MIME
    }
}

/// Stateless decode/normalize/resize/encode pipeline.
#[derive(Debug, Clone)]
pub struct Codec {
    max_upload_bytes: usize,
    allowed_mime_types: Vec<String>,
    tiers: TierBoxes,
}

impl Codec {
    /// Build a codec from the `[images]` config section.
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            allowed_mime_types: config
                .allowed_mime_types
                .iter()
                .map(|m| normalize_mime(m))
                .collect(),
            tiers: config.tiers,
        }
    }

    /// Largest payload [`Codec::transcode`] accepts.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Bounding box for `tier`.
    pub fn bounding_box(&self, tier: Tier) -> BoundingBox {
        self.tiers.get(tier)
    }

    /// Transcode an upload into a JPEG that fits `tier`'s bounding box.
    ///
    /// Size and MIME checks run before any decoding work.
    ///
    /// # Errors
    ///
    /// - [`Error::PayloadTooLarge`] if `raw` exceeds the configured maximum
    /// - [`Error::UnsupportedFormat`] if `declared_mime`, or the format sniffed
    ///   from the bytes, is not allowed
    /// - [`Error::Codec`] if the payload cannot be decoded or encoded
    pub fn transcode(&self, raw: &[u8], declared_mime: &str, tier: Tier) -> Result<Transcoded> {
        if raw.len() > self.max_upload_bytes {
            return Err(Error::PayloadTooLarge {
                size: raw.len(),
                limit: self.max_upload_bytes,
            });
        }

        let mime = normalize_mime(declared_mime);
        if !self.is_allowed(&mime) {
            return Err(Error::UnsupportedFormat(format!(
                "declared type {declared_mime:?} is not accepted"
            )));
        }

        let img = self.decode(raw)?;
        let source = (img.width(), img.height());
        let rgb = flatten_onto_white(img);

        let (width, height) = fit_within(source.0, source.1, self.bounding_box(tier));
        let rgb = if (width, height) == source {
            rgb
        } else {
            image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
        };

        let data = encode_jpeg(&rgb)?;
        tracing::debug!(
            %tier,
            src_width = source.0,
            src_height = source.1,
            width,
            height,
            in_bytes = raw.len(),
            out_bytes = data.len(),
            "transcoded upload"
        );

        Ok(Transcoded {
            data,
            width,
            height,
        })
    }

    fn is_allowed(&self, normalized_mime: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == normalized_mime)
    }

    fn decode(&self, raw: &[u8]) -> Result<DynamicImage> {
        let format = image::guess_format(raw)
            .map_err(|_| Error::Codec("unrecognized image data".to_string()))?;

        match format_mime(format) {
            Some(mime) if self.is_allowed(mime) => {}
            _ => {
                return Err(Error::UnsupportedFormat(format!(
                    "payload is {format:?}, which is not accepted"
                )))
            }
        }

        image::load_from_memory_with_format(raw, format)
            .map_err(|e| Error::Codec(format!("failed to decode {format:?} image: {e}")))
    }
}

/// Canonical form of a declared MIME type: parameters dropped, lowercase,
/// `image/jpg` folded into `image/jpeg`.
pub fn normalize_mime(declared: &str) -> String {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

/// Guess an upload's MIME type from its file extension.
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn format_mime(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Output dimensions for a `width`×`height` source inside `bbox`.
///
/// Aspect ratio is preserved and the source is never enlarged.
pub fn fit_within(width: u32, height: u32, bbox: BoundingBox) -> (u32, u32) {
    if width <= bbox.max_width && height <= bbox.max_height {
        return (width, height);
    }

    let ratio = f64::min(
        f64::from(bbox.max_width) / f64::from(width),
        f64::from(bbox.max_height) / f64::from(height),
    );
    let scale = |side: u32, max: u32| ((f64::from(side) * ratio).round() as u32).clamp(1, max);

    (
        scale(width, bbox.max_width),
        scale(height, bbox.max_height),
    )
}

/// Drop alpha (and palette transparency, which decodes to alpha) by
/// compositing over opaque white.
fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }

    let rgba = img.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u32::from(a);
        let over_white = |c: u8| ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>> {
    let width = u16::try_from(img.width())
        .map_err(|_| Error::Codec(format!("width {} exceeds JPEG limit", img.width())))?;
    let height = u16::try_from(img.height())
        .map_err(|_| Error::Codec(format!("height {} exceeds JPEG limit", img.height())))?;

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, JPEG_QUALITY);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(img.as_raw(), width, height, ColorType::Rgb)
        .map_err(|e| Error::Codec(format!("JPEG encoding failed: {e}")))?;

    Ok(out)
}
