//! Decoding and encoding of rasters exchanged with the host application.
//!
//! The host passes images around as encoded bytes or `data:` URLs. Everything
//! this crate emits is PNG so LSB payloads and mask edges survive untouched.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{Error, Result};

/// MIME type of every raster this crate produces.
pub const PNG_MIME: &str = "image/png";

/// Decode encoded image bytes in any format the `image` crate recognizes.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the format is unknown or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(Error::Decode)
}

/// Encode an RGBA raster as PNG.
///
/// # Errors
///
/// Returns [`Error::Encode`] if the encoder rejects the buffer.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    PngEncoder::new(&mut out)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(Error::Encode)?;
    Ok(out.into_inner())
}

/// Extract the payload of a base64 `data:` URL.
///
/// # Errors
///
/// Returns [`Error::InvalidDataUrl`] if the URL lacks the `data:` scheme,
/// the `;base64` marker, or the comma separator, or if the body is not
/// valid base64.
pub fn parse_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (header, body) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUrl("missing comma separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(Error::InvalidDataUrl(format!(
            "only base64 bodies are supported (header {header:?})"
        )));
    }
    STANDARD
        .decode(body.trim())
        .map_err(|e| Error::InvalidDataUrl(e.to_string()))
}

/// Wrap PNG bytes in a `data:image/png;base64,` URL.
#[must_use]
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:{PNG_MIME};base64,{}", STANDARD.encode(png))
}

/// Resample `source` to exactly `width x height`, ignoring aspect ratio.
///
/// Used to bring a secondary image onto the primary image's pixel grid
/// before both are sent to a generator together.
#[must_use]
pub fn resize_to_match(source: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(&source.to_rgba8(), width, height, FilterType::Triangle)
}

/// Decode `source` and `target`, resize `source` to the target's natural
/// size and return it as PNG.
///
/// # Errors
///
/// Returns [`Error::Decode`] if either input is not an image, or
/// [`Error::Encode`] if PNG encoding fails.
pub fn resize_png_to_match(source: &[u8], target: &[u8]) -> Result<Vec<u8>> {
    let target = decode(target)?;
    let source = decode(source)?;
    encode_png(&resize_to_match(&source, target.width(), target.height()))
}
