//! Watermark stamping over encoded images and files.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster;
use crate::watermark::{self, EmbedOutcome};

/// Marker stamped into generated images when no other text is given.
pub const DEFAULT_WATERMARK_TEXT: &str = "Banana Shop";

/// Options controlling batch processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Report images too small for the payload as failures instead of skips.
    pub strict: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (payload did not fit).
    pub skipped: bool,
    /// Embed outcome, if the image was decoded.
    pub outcome: Option<EmbedOutcome>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            outcome: None,
            message: String::new(),
        }
    }

    fn failed(path: &Path, message: String) -> Self {
        Self {
            message,
            ..Self::new(path)
        }
    }
}

/// An encoded image after a stamping attempt.
#[derive(Debug, Clone)]
pub struct Stamped {
    /// PNG bytes of the watermarked image, or the untouched input bytes
    /// when the embed was skipped.
    pub bytes: Vec<u8>,
    /// What the codec did.
    pub outcome: EmbedOutcome,
}

/// Stamps a fixed text into images.
///
/// Create once and reuse; stamping touches no shared state, so one engine
/// can serve many images in parallel.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    text: String,
}

impl Default for WatermarkEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WATERMARK_TEXT)
    }
}

impl WatermarkEngine {
    /// Create an engine stamping `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The text this engine embeds.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the payload fits into a `width x height` image.
    #[must_use]
    pub fn fits(&self, width: u32, height: u32) -> bool {
        let pixels = u64::from(width) * u64::from(height);
        usize::try_from(pixels)
            .ok()
            .and_then(|p| p.checked_mul(3))
            .is_some_and(|capacity| watermark::payload_bits(&self.text) <= capacity)
    }

    /// Stamp a decoded RGBA image in place.
    pub fn embed(&self, image: &mut RgbaImage) -> EmbedOutcome {
        watermark::embed(image, &self.text)
    }

    /// Decode `bytes`, stamp them, and re-encode as PNG.
    ///
    /// A skipped embed returns the input bytes unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for undecodable input or [`Error::Encode`]
    /// if PNG encoding fails.
    pub fn embed_bytes(&self, bytes: &[u8]) -> Result<Stamped> {
        let mut image = raster::decode(bytes)?.to_rgba8();
        let outcome = self.embed(&mut image);
        let bytes = match outcome {
            EmbedOutcome::Embedded { .. } => raster::encode_png(&image)?,
            EmbedOutcome::Skipped(_) => bytes.to_vec(),
        };
        Ok(Stamped { bytes, outcome })
    }

    /// Stamp an image given as a `data:` URL.
    ///
    /// A skipped embed returns `url` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataUrl`], [`Error::Decode`] or [`Error::Encode`].
    pub fn embed_data_url(&self, url: &str) -> Result<(String, EmbedOutcome)> {
        let stamped = self.embed_bytes(&raster::parse_data_url(url)?)?;
        let url = match stamped.outcome {
            EmbedOutcome::Embedded { .. } => raster::png_data_url(&stamped.bytes),
            EmbedOutcome::Skipped(_) => url.to_string(),
        };
        Ok((url, stamped.outcome))
    }

    /// Decode `bytes` and read back any embedded text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes are not an image.
    pub fn extract_bytes(bytes: &[u8]) -> Result<Option<String>> {
        let image = raster::decode(bytes)?.to_rgba8();
        Ok(watermark::extract(&image))
    }

    /// Read back any text embedded in an image file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or [`Error::Decode`]
    /// if it is not an image.
    pub fn extract_file(path: &Path) -> Result<Option<String>> {
        Self::extract_bytes(&std::fs::read(path)?)
    }

    /// Process a single image file: load, stamp, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let mut image = match image::open(input) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let outcome = self.embed(&mut image);
        result.outcome = Some(outcome);
        debug!(path = %input.display(), ?outcome, "stamped");

        if let EmbedOutcome::Skipped(reason) = outcome {
            result.skipped = !opts.strict;
            result.success = !opts.strict;
            result.message = reason.to_string();
            return result;
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&image, output) {
            Ok(()) => {
                result.success = true;
                result.message = "Watermark embedded".to_string();
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Outputs are PNG files named by [`batch_output_name`]. An input whose
    /// output name was already claimed by another input is reported as a
    /// failure instead of overwriting it. Uses parallel iteration when the
    /// `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        inputs.sort();
        let mut claimed = HashSet::new();
        let mut conflicts = Vec::new();
        let mut jobs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let output = output_dir.join(batch_output_name(&input));
            if claimed.insert(output.clone()) {
                jobs.push((input, output));
            } else {
                let message =
                    format!("Output {} already written by another input", output.display());
                conflicts.push(ProcessResult::failed(&input, message));
            }
        }

        let process = |(input, output): &(PathBuf, PathBuf)| {
            self.process_file(input, output, opts)
        };

        #[cfg(feature = "cli")]
        let mut results: Vec<ProcessResult> = {
            use rayon::prelude::*;
            jobs.par_iter().map(process).collect()
        };

        #[cfg(not(feature = "cli"))]
        let mut results: Vec<ProcessResult> = jobs.iter().map(process).collect();

        results.extend(conflicts);
        results
    }
}

/// Output file name for `input` in batch mode.
///
/// PNG inputs keep their name. Other formats append their extension to the
/// stem so same-stem inputs stay distinct: `"photo.bmp"` becomes
/// `"photo_bmp.png"`.
#[must_use]
pub fn batch_output_name(input: &Path) -> OsString {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    match input.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => {}
        Some(ext) => {
            name.push("_");
            name.push(ext.to_ascii_lowercase());
        }
        None => {}
    }
    name.push(".png");
    name
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA image to a lossless format chosen by extension.
///
/// # Errors
///
/// Returns [`Error::LossyFormat`] for JPEG, [`Error::UnsupportedFormat`]
/// for unknown extensions, or an I/O / encoding error if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png => {
            std::fs::write(path, raster::encode_png(img)?)?;
        }
        ImageFormat::WebP | ImageFormat::Bmp => {
            DynamicImage::ImageRgba8(img.clone()).save(path)?;
        }
        ImageFormat::Jpeg => {
            return Err(Error::LossyFormat(format!("{format:?}")));
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_marked.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_marked.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gray_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([120, 130, 140, 255]));
        raster::encode_png(&img).unwrap()
    }

    #[test]
    fn default_engine_uses_banana_shop() {
        assert_eq!(WatermarkEngine::default().text(), "Banana Shop");
    }

    #[test]
    fn fits_matches_capacity_math() {
        let engine = WatermarkEngine::default();
        // 128 bits need 43 pixels.
        assert!(engine.fits(43, 1));
        assert!(!engine.fits(42, 1));
        assert!(engine.fits(10, 10));
        assert!(!engine.fits(0, 100));
    }

    #[test]
    fn embed_bytes_round_trips_through_png() {
        let engine = WatermarkEngine::new("hello");
        let stamped = engine.embed_bytes(&gray_png(10, 10)).unwrap();
        assert!(stamped.outcome.is_embedded());
        assert_eq!(
            WatermarkEngine::extract_bytes(&stamped.bytes).unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn skipped_embed_returns_input_bytes() {
        let engine = WatermarkEngine::default();
        let input = gray_png(3, 3);
        let stamped = engine.embed_bytes(&input).unwrap();
        assert!(!stamped.outcome.is_embedded());
        assert_eq!(stamped.bytes, input);
    }

    #[test]
    fn embed_data_url_round_trips() {
        let engine = WatermarkEngine::default();
        let url = raster::png_data_url(&gray_png(16, 16));
        let (stamped, outcome) = engine.embed_data_url(&url).unwrap();
        assert!(outcome.is_embedded());
        assert_ne!(stamped, url);
        let bytes = raster::parse_data_url(&stamped).unwrap();
        assert_eq!(
            WatermarkEngine::extract_bytes(&bytes).unwrap().as_deref(),
            Some("Banana Shop")
        );
    }

    #[test]
    fn embed_bytes_rejects_garbage() {
        let engine = WatermarkEngine::default();
        assert!(matches!(engine.embed_bytes(b"nope"), Err(Error::Decode(_))));
    }

    #[test]
    fn default_output_path_appends_marked_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_marked.png"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "image_marked.png");
    }

    #[test]
    fn batch_output_name_keeps_same_stem_inputs_apart() {
        assert_eq!(batch_output_name(Path::new("in/photo.png")), "photo.png");
        assert_eq!(batch_output_name(Path::new("in/photo.BMP")), "photo_bmp.png");
        assert_eq!(batch_output_name(Path::new("in/photo.jpg")), "photo_jpg.png");
        assert_eq!(batch_output_name(Path::new("in/v1.2.webp")), "v1.2_webp.png");
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn save_image_refuses_jpeg() {
        let img = RgbaImage::new(2, 2);
        assert!(matches!(
            save_image(&img, Path::new("out.jpg")),
            Err(Error::LossyFormat(_))
        ));
        assert!(matches!(
            save_image(&img, Path::new("out.xyz")),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
