//! Image preparation for embedding in trip documents.
//!
//! Images travel inside the document as `data:` URLs, so they are downscaled
//! and re-encoded before they ever reach the model.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;

use crate::models::ImageSource;
use crate::{Error, Result};

/// Limits for embedded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Maximum output width in pixels; height follows the aspect ratio.
    pub max_width: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: 800,
            jpeg_quality: 70,
        }
    }
}

/// An image ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
    /// Size of the encoded JPEG before base64
    pub encoded_bytes: usize,
}

/// Downscale and JPEG-encode image bytes into an embedded image.
///
/// Images narrower than `max_width` keep their size.
pub fn prepare_image(source_bytes: &[u8], options: ImageOptions) -> Result<PreparedImage> {
    if source_bytes.is_empty() {
        return Err(Error::InvalidInput("Image bytes cannot be empty".to_string()));
    }
    if options.max_width == 0 {
        return Err(Error::InvalidInput(
            "Image max width must be greater than zero".to_string(),
        ));
    }

    let source = image::load_from_memory(source_bytes)
        .map_err(|error| Error::InvalidInput(format!("Failed to decode image: {error}")))?;

    let (source_width, source_height) = source.dimensions();
    let resized = if source_width <= options.max_width {
        source
    } else {
        let height = scaled_height(source_width, source_height, options.max_width);
        source.resize_exact(
            options.max_width,
            height,
            image::imageops::FilterType::Triangle,
        )
    };
    let (width, height) = resized.dimensions();

    // JPEG has no alpha channel.
    let rgb = resized.to_rgb8();
    let mut cursor = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut cursor, options.jpeg_quality)
        .encode_image(&rgb)
        .map_err(|error| Error::InvalidInput(format!("Failed to encode JPEG image: {error}")))?;
    let bytes = cursor.into_inner();

    Ok(PreparedImage {
        source: ImageSource::Embedded(format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(&bytes)
        )),
        width,
        height,
        encoded_bytes: bytes.len(),
    })
}

/// Read and prepare an image file.
pub fn prepare_image_file(path: &Path, options: ImageOptions) -> Result<PreparedImage> {
    let bytes = std::fs::read(path)?;
    prepare_image(&bytes, options)
}

fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
