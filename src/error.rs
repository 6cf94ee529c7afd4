//! Error types for the banana-editor-core crate.

/// Errors that can occur while loading, masking, or watermarking images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source bytes could not be interpreted as an image.
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),

    /// The decoded image has no pixels along one axis.
    #[error("decoded image is empty ({width}x{height})")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// A `data:` URL was malformed or its base64 body could not be decoded.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Encoding a raster to PNG failed.
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),

    /// The requested output container would destroy the embedded bits.
    #[error("refusing to write watermarked image to lossy format: {0}")]
    LossyFormat(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while saving an image to disk.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let empty = Error::EmptyImage {
            width: 0,
            height: 20,
        };
        assert!(empty.to_string().contains("0x20"));

        let lossy = Error::LossyFormat("Jpeg".to_string());
        assert!(lossy.to_string().contains("lossy"));

        let url = Error::InvalidDataUrl("missing comma".to_string());
        assert!(url.to_string().contains("missing comma"));
    }
}
