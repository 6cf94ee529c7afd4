//! Client-side masking and invisible watermarking for AI image editing.
//!
//! Two independent pieces sit around a generation request:
//!
//! - [`MaskEditor`] lets a user paint an edit mask over an image that is
//!   letterboxed into a fixed viewport, with full undo, and hands back the
//!   mask raster every time it changes.
//! - [`watermark`] stamps a short text into the least-significant bits of
//!   a generated image's R, G and B channels, and reads it back.
//!
//! # Quick Start
//!
//! ```no_run
//! use banana_editor_core::{EditorConfig, MaskEditor, Point, Viewport};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let mut editor = MaskEditor::new(EditorConfig::default(), Viewport::new(400, 400));
//! editor.load_image(&bytes).expect("failed to decode");
//! editor.set_tool_active(true);
//!
//! editor.begin_stroke(Point::new(120.0, 200.0));
//! editor.continue_stroke(Point::new(280.0, 200.0), banana_editor_core::DEFAULT_STROKE_COLOR);
//! if let Some(change) = editor.end_stroke() {
//!     let png = change.to_png().unwrap();
//!     println!("mask painted: {}", png.is_some());
//! }
//! ```
//!
//! # Watermarking
//!
//! ```no_run
//! use banana_editor_core::WatermarkEngine;
//!
//! let engine = WatermarkEngine::default();
//! let generated = std::fs::read("generated.png").unwrap();
//! let stamped = engine.embed_bytes(&generated).unwrap();
//! if !stamped.outcome.is_embedded() {
//!     eprintln!("image too small, left unchanged: {:?}", stamped.outcome);
//! }
//! let text = WatermarkEngine::extract_bytes(&stamped.bytes).unwrap();
//! assert_eq!(text.as_deref(), Some("Banana Shop"));
//! ```

#![deny(missing_docs)]

pub mod editor;
mod engine;
pub mod error;
pub mod geometry;
pub mod history;
pub mod mask;
pub mod raster;
pub mod watermark;

pub use editor::{
    BrushState, DisplayedImage, EditorConfig, MaskChange, MaskEditor, ResizePolicy,
    DEFAULT_BRUSH_SIZE, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_OPACITY, MAX_BRUSH_SIZE,
    MIN_BRUSH_SIZE,
};
pub use engine::{
    batch_output_name, default_output_path, is_supported_image, save_image, ProcessOptions,
    ProcessResult, Stamped, WatermarkEngine, DEFAULT_WATERMARK_TEXT,
};
pub use error::{Error, Result};
pub use geometry::{
    canvas_point, compute_layout, CanvasBounds, LayoutRect, Point, PointerInput, Viewport,
};
pub use watermark::{EmbedOutcome, SkipReason};
