//! Least-significant-bit text watermark.
//!
//! The payload is the UTF-8 bytes of the text followed by the delimiter
//! `"::END"`, written most-significant bit first into the lowest bit of the
//! R, G and B channels of consecutive pixels. Alpha is never touched, and
//! pixels past the end of the payload keep their exact values.
//!
//! For ASCII text this is identical to writing each character's 8-bit code.
//! The embedding survives lossless re-encoding only; JPEG destroys it.

use image::RgbaImage;
use tracing::warn;

/// End-of-message marker appended to every payload.
pub const DELIMITER: &str = "::END";

/// Usable channels per RGBA pixel (R, G, B).
const CHANNELS_PER_PIXEL: usize = 3;

/// Bytes per RGBA pixel.
const BYTES_PER_PIXEL: usize = 4;

/// Why an embed was skipped and the image left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The payload needs more bits than the image has channels.
    CapacityExceeded {
        /// Bits the payload (text plus delimiter) needs.
        required: usize,
        /// Bits the image can hold.
        available: usize,
    },
    /// The text contains the delimiter and could not be decoded intact.
    ContainsDelimiter,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityExceeded {
                required,
                available,
            } => write!(
                f,
                "watermark needs {required} bits but image holds {available}"
            ),
            Self::ContainsDelimiter => write!(f, "watermark text contains {DELIMITER:?}"),
        }
    }
}

/// Result of an embed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedOutcome {
    /// The payload was written.
    Embedded {
        /// Number of channel LSBs written.
        bits: usize,
        /// Number of leading pixels whose channels were written.
        pixels_touched: usize,
    },
    /// Nothing was written.
    Skipped(SkipReason),
}

impl EmbedOutcome {
    /// Whether the payload was written.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }
}

/// Bits needed to embed `text` including the delimiter.
#[must_use]
pub fn payload_bits(text: &str) -> usize {
    (text.len() + DELIMITER.len()) * 8
}

/// Bits an RGBA buffer of `len` bytes can hold.
#[must_use]
pub fn capacity_bits_for_len(len: usize) -> usize {
    (len / BYTES_PER_PIXEL) * CHANNELS_PER_PIXEL
}

/// Bits `image` can hold: three per pixel.
#[must_use]
pub fn capacity_bits(image: &RgbaImage) -> usize {
    capacity_bits_for_len(image.as_raw().len())
}

/// Embed `text` into `image` in place.
///
/// If the payload does not fit, or the text contains the delimiter, the
/// image is left byte-for-byte unchanged and the reason is returned.
pub fn embed(image: &mut RgbaImage, text: &str) -> EmbedOutcome {
    embed_raw(image, text)
}

/// Embed `text` into a raw RGBA byte buffer (R, G, B, A per pixel).
///
/// A trailing partial pixel is ignored.
pub fn embed_raw(data: &mut [u8], text: &str) -> EmbedOutcome {
    if text.contains(DELIMITER) {
        warn!("watermark text contains the delimiter; skipping embed");
        return EmbedOutcome::Skipped(SkipReason::ContainsDelimiter);
    }

    let required = payload_bits(text);
    let available = capacity_bits_for_len(data.len());
    if required > available {
        warn!(required, available, "watermark is too long for the image; skipping embed");
        return EmbedOutcome::Skipped(SkipReason::CapacityExceeded {
            required,
            available,
        });
    }

    let mut bits = message_bits(text);
    let mut written = 0usize;
    'pixels: for pixel in data.chunks_exact_mut(BYTES_PER_PIXEL) {
        for channel in &mut pixel[..CHANNELS_PER_PIXEL] {
            let Some(bit) = bits.next() else {
                break 'pixels;
            };
            *channel = (*channel & 0xFE) | bit;
            written += 1;
        }
    }

    EmbedOutcome::Embedded {
        bits: written,
        pixels_touched: written.div_ceil(CHANNELS_PER_PIXEL),
    }
}

/// Read a watermark back out of `image`.
///
/// Returns `None` if no delimiter is found before the pixels run out or
/// the recovered bytes are not UTF-8.
#[must_use]
pub fn extract(image: &RgbaImage) -> Option<String> {
    String::from_utf8(extract_raw(image)?).ok()
}

/// Read the raw payload bytes preceding the first delimiter.
#[must_use]
pub fn extract_raw(data: &[u8]) -> Option<Vec<u8>> {
    let delimiter = DELIMITER.as_bytes();
    let mut message = Vec::new();
    let mut current = 0u8;
    let mut filled = 0u8;

    let lsbs = data
        .chunks_exact(BYTES_PER_PIXEL)
        .flat_map(|pixel| pixel[..CHANNELS_PER_PIXEL].iter().map(|c| c & 1));

    for bit in lsbs {
        current = (current << 1) | bit;
        filled += 1;
        if filled == 8 {
            message.push(current);
            current = 0;
            filled = 0;
            if message.ends_with(delimiter) {
                message.truncate(message.len() - delimiter.len());
                return Some(message);
            }
        }
    }

    None
}

/// Payload bits, most-significant bit first.
fn message_bits(text: &str) -> impl Iterator<Item = u8> + '_ {
    text.bytes()
        .chain(DELIMITER.bytes())
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
}
