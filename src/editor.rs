//! Interactive mask editing session.
//!
//! [`MaskEditor`] owns one displayed image at a time together with its
//! viewport-sized mask and undo history. Every mask-changing operation
//! returns the [`MaskChange`] the consuming application should react to;
//! guarded no-ops (tool inactive, no image, nothing to undo) return `None`.

use image::{DynamicImage, Rgb, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{
    canvas_point, compute_layout, CanvasBounds, LayoutRect, Point, PointerInput, Viewport,
};
use crate::history::StrokeHistory;
use crate::mask::{self, MaskCanvas};
use crate::raster;

/// Smallest brush diameter in pixels.
pub const MIN_BRUSH_SIZE: u32 = 5;
/// Largest brush diameter in pixels.
pub const MAX_BRUSH_SIZE: u32 = 100;
/// Brush diameter of a fresh session.
pub const DEFAULT_BRUSH_SIZE: u32 = 20;
/// Accent orange used for mask strokes.
pub const DEFAULT_STROKE_COLOR: Rgb<u8> = Rgb([0xF9, 0x73, 0x16]);
/// 70% opacity.
pub const DEFAULT_STROKE_OPACITY: u8 = 0xB3;

/// What happens to painted content when the viewport changes size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Reallocate the mask at the new size, discarding paint and history.
    #[default]
    Clear,
    /// Rescale the mask and every history snapshot to the new size.
    Resample,
}

/// Options controlling a mask editing session.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Initial brush diameter, clamped to `[5, 100]`.
    pub brush_size: u32,
    /// Color used by pointer-driven strokes.
    pub stroke_color: Rgb<u8>,
    /// Stroke alpha (0-255).
    pub stroke_opacity: u8,
    /// Behavior on viewport resize.
    pub resize_policy: ResizePolicy,
    /// Maximum number of undo snapshots; `None` keeps all of them.
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            stroke_color: DEFAULT_STROKE_COLOR,
            stroke_opacity: DEFAULT_STROKE_OPACITY,
            resize_policy: ResizePolicy::Clear,
            history_limit: None,
        }
    }
}

/// Brush diameter, always within `[MIN_BRUSH_SIZE, MAX_BRUSH_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushState {
    size: u32,
}

impl BrushState {
    /// Create a brush, clamping `size` into range.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            size: size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE),
        }
    }

    /// Current diameter in pixels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Set the diameter, clamping into range. Returns the stored value.
    pub fn set_size(&mut self, size: u32) -> u32 {
        *self = Self::new(size);
        self.size
    }
}

impl Default for BrushState {
    fn default() -> Self {
        Self::new(DEFAULT_BRUSH_SIZE)
    }
}

/// A decoded source image and its natural dimensions.
#[derive(Debug, Clone)]
pub struct DisplayedImage {
    image: DynamicImage,
}

impl DisplayedImage {
    /// Wrap an already decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyImage`] if either dimension is zero.
    pub fn new(image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self { image })
    }

    /// Decode encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the bytes are not an image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::new(raster::decode(bytes)?)
    }

    /// Natural width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Natural height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The decoded raster.
    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Where this image lands inside `viewport`.
    #[must_use]
    pub fn layout_in(&self, viewport: Viewport) -> LayoutRect {
        compute_layout(self.width(), self.height(), viewport)
    }
}

/// Notification that the mask changed.
///
/// `Painted` carries the stroke raster as drawn: stroke color at the
/// configured opacity, with alpha accumulating where strokes overlap. Use
/// [`MaskEditor::export_alpha`] or [`MaskEditor::export_source_aligned`]
/// for a binary mask (opaque where painted, transparent elsewhere).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskChange {
    /// Nothing is painted; the consumer should drop any mask it holds.
    Cleared,
    /// The full viewport-sized mask raster after the change.
    Painted(RgbaImage),
}

impl MaskChange {
    fn from_canvas(mask: &MaskCanvas) -> Self {
        if mask.is_blank() {
            Self::Cleared
        } else {
            Self::Painted(mask.snapshot())
        }
    }

    /// The painted raster, if any.
    #[must_use]
    pub fn mask(&self) -> Option<&RgbaImage> {
        match self {
            Self::Cleared => None,
            Self::Painted(mask) => Some(mask),
        }
    }

    /// Encode the painted raster as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if PNG encoding fails.
    pub fn to_png(&self) -> Result<Option<Vec<u8>>> {
        self.mask().map(raster::encode_png).transpose()
    }

    /// Encode the painted raster as a `data:image/png;base64,` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if PNG encoding fails.
    pub fn to_data_url(&self) -> Result<Option<String>> {
        Ok(self.to_png()?.map(|png| raster::png_data_url(&png)))
    }
}

/// Per-image editing state, dropped wholesale on the next load.
#[derive(Debug)]
struct Session {
    image: DisplayedImage,
    layout: LayoutRect,
    mask: MaskCanvas,
    history: StrokeHistory,
    /// Last point of the active stroke; `Some` while drawing.
    last_point: Option<Point>,
}

/// Mask editor over a letterboxed image.
#[derive(Debug)]
pub struct MaskEditor {
    config: EditorConfig,
    brush: BrushState,
    viewport: Viewport,
    tool_active: bool,
    session: Option<Session>,
}

impl MaskEditor {
    /// Create an editor with no image loaded.
    #[must_use]
    pub fn new(config: EditorConfig, viewport: Viewport) -> Self {
        let brush = BrushState::new(config.brush_size);
        Self {
            config,
            brush,
            viewport,
            tool_active: false,
            session: None,
        }
    }

    /// Decode `bytes` and start editing it.
    ///
    /// On success the mask and history are reset and [`MaskChange::Cleared`]
    /// is returned. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] or [`Error::EmptyImage`].
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<MaskChange> {
        let image = DisplayedImage::decode(bytes)?;
        Ok(self.start_session(image))
    }

    /// Like [`load_image`](Self::load_image) for a `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataUrl`], [`Error::Decode`] or [`Error::EmptyImage`].
    pub fn load_data_url(&mut self, url: &str) -> Result<MaskChange> {
        let bytes = raster::parse_data_url(url)?;
        self.load_image(&bytes)
    }

    /// Start editing an already decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyImage`] if the image has no pixels.
    pub fn load_decoded(&mut self, image: DynamicImage) -> Result<MaskChange> {
        let image = DisplayedImage::new(image)?;
        Ok(self.start_session(image))
    }

    fn start_session(&mut self, image: DisplayedImage) -> MaskChange {
        let layout = image.layout_in(self.viewport);
        debug!(
            width = image.width(),
            height = image.height(),
            ?layout,
            "loaded image into mask editor"
        );
        self.session = Some(Session {
            image,
            layout,
            mask: MaskCanvas::new(self.viewport.width, self.viewport.height),
            history: StrokeHistory::new(self.config.history_limit),
            last_point: None,
        });
        MaskChange::Cleared
    }

    /// Release the current image and all of its buffers.
    pub fn close_image(&mut self) -> Option<MaskChange> {
        self.session.take().map(|_| MaskChange::Cleared)
    }

    /// The image being edited, if any.
    #[must_use]
    pub fn image(&self) -> Option<&DisplayedImage> {
        self.session.as_ref().map(|s| &s.image)
    }

    /// Current viewport size.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Where the image is drawn, if one is loaded.
    #[must_use]
    pub fn layout(&self) -> Option<LayoutRect> {
        self.session.as_ref().map(|s| s.layout)
    }

    /// React to a viewport resize.
    ///
    /// Recomputes the layout and reallocates the mask at the new size
    /// according to [`EditorConfig::resize_policy`]. An unchanged size is a
    /// no-op. Any stroke in progress ends.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Option<MaskChange> {
        if viewport == self.viewport {
            return None;
        }
        self.viewport = viewport;
        let policy = self.config.resize_policy;
        let session = self.session.as_mut()?;

        session.layout = session.image.layout_in(viewport);
        session.last_point = None;
        debug!(?viewport, layout = ?session.layout, ?policy, "viewport resized");

        match policy {
            ResizePolicy::Clear => {
                let had_paint = !session.mask.is_blank();
                session.mask = MaskCanvas::new(viewport.width, viewport.height);
                session.history.clear();
                had_paint.then_some(MaskChange::Cleared)
            }
            ResizePolicy::Resample => {
                session.mask = session.mask.resampled(viewport.width, viewport.height);
                session
                    .history
                    .map_snapshots(|s| mask::resample(s, viewport.width, viewport.height));
                (!session.mask.is_blank()).then(|| MaskChange::from_canvas(&session.mask))
            }
        }
    }

    /// Enable or disable drawing. Disabling ends a stroke in progress.
    pub fn set_tool_active(&mut self, active: bool) -> Option<MaskChange> {
        let change = if active { None } else { self.end_stroke() };
        self.tool_active = active;
        change
    }

    /// Whether drawing handlers are live.
    #[must_use]
    pub fn is_tool_active(&self) -> bool {
        self.tool_active
    }

    /// Current brush diameter.
    #[must_use]
    pub fn brush_size(&self) -> u32 {
        self.brush.size()
    }

    /// Set the brush diameter, clamped to `[5, 100]`. Returns the stored value.
    pub fn set_brush_size(&mut self, px: u32) -> u32 {
        self.brush.set_size(px)
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.last_point.is_some())
    }

    fn drawable_session(&mut self) -> Option<&mut Session> {
        if self.tool_active {
            self.session.as_mut()
        } else {
            None
        }
    }

    /// Snapshot the mask and start a stroke at `point` (viewport space).
    pub fn begin_stroke(&mut self, point: Point) {
        if let Some(session) = self.drawable_session() {
            session.history.push(session.mask.snapshot());
            session.last_point = Some(point);
        }
    }

    /// Paint from the last point to `point` in `color`.
    ///
    /// No-op unless the tool is active and a stroke is in progress.
    pub fn continue_stroke(&mut self, point: Point, color: Rgb<u8>) {
        let width = f64::from(self.brush.size());
        let opacity = self.config.stroke_opacity;
        let Some(session) = self.drawable_session() else {
            return;
        };
        let Some(last) = session.last_point else {
            return;
        };
        session.mask.stroke_segment(last, point, width, color, opacity);
        session.last_point = Some(point);
    }

    /// Finish the stroke and report the resulting mask.
    ///
    /// No-op when no stroke is in progress.
    pub fn end_stroke(&mut self) -> Option<MaskChange> {
        let session = self.drawable_session()?;
        session.last_point.take()?;
        Some(MaskChange::from_canvas(&session.mask))
    }

    /// Wipe the mask. The previous state is kept in history so the clear
    /// can be undone.
    pub fn clear_mask(&mut self) -> Option<MaskChange> {
        let session = self.session.as_mut()?;
        session.history.push(session.mask.snapshot());
        session.mask.clear();
        session.last_point = None;
        Some(MaskChange::Cleared)
    }

    /// Restore the mask to the state before the most recent mutation.
    ///
    /// No-op when there is nothing to undo.
    pub fn undo(&mut self) -> Option<MaskChange> {
        let session = self.session.as_mut()?;
        let snapshot = session.history.pop()?;
        session.mask.restore(snapshot);
        session.last_point = None;
        debug!(remaining = session.history.len(), "undo");
        Some(MaskChange::from_canvas(&session.mask))
    }

    /// Whether [`undo`](Self::undo) would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_undo())
    }

    /// Number of undo steps available.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.history.len())
    }

    /// The live mask buffer.
    #[must_use]
    pub fn mask(&self) -> Option<&MaskCanvas> {
        self.session.as_ref().map(|s| &s.mask)
    }

    /// The current mask raster, or `None` if nothing is painted.
    #[must_use]
    pub fn export(&self) -> Option<RgbaImage> {
        self.mask()
            .filter(|m| !m.is_blank())
            .map(MaskCanvas::snapshot)
    }

    /// The current mask as a viewport-sized binary alpha mask: opaque white
    /// where painted, transparent elsewhere. `None` if nothing is painted.
    #[must_use]
    pub fn export_alpha(&self) -> Option<RgbaImage> {
        self.mask()
            .filter(|m| !m.is_blank())
            .map(MaskCanvas::alpha_mask)
    }

    /// The current mask as a binary alpha mask on the source image's
    /// pixel grid, or `None` if nothing is painted.
    #[must_use]
    pub fn export_source_aligned(&self) -> Option<RgbaImage> {
        let session = self.session.as_ref()?;
        if session.mask.is_blank() {
            return None;
        }
        Some(session.mask.source_aligned(
            &session.layout,
            session.image.width(),
            session.image.height(),
        ))
    }

    /// Bytes held by the mask and its history.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.mask.memory_size() + s.history.memory_usage())
    }

    /// Pointer/touch down: start a stroke at the event's canvas position.
    pub fn pointer_down(&mut self, input: &PointerInput<'_>, bounds: CanvasBounds) {
        if let Some(point) = canvas_point(input, bounds) {
            self.begin_stroke(point);
        }
    }

    /// Pointer/touch move: extend the stroke using the configured color.
    pub fn pointer_move(&mut self, input: &PointerInput<'_>, bounds: CanvasBounds) {
        if let Some(point) = canvas_point(input, bounds) {
            self.continue_stroke(point, self.config.stroke_color);
        }
    }

    /// Pointer/touch up or leave.
    pub fn pointer_up(&mut self) -> Option<MaskChange> {
        self.end_stroke()
    }
}
