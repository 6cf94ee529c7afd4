//! Viewport geometry: contain-fit layout and pointer coordinate mapping.
//!
//! The editor draws the source image letterboxed inside a viewport of a
//! possibly different aspect ratio. Strokes are captured directly in
//! viewport space, so everything here works in viewport pixels.

/// A position in viewport (canvas-local) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal offset from the canvas's left edge.
    pub x: f64,
    /// Vertical offset from the canvas's top edge.
    pub y: f64,
}

impl Point {
    /// Create a point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The editor's drawing surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Container width in pixels.
    pub width: u32,
    /// Container height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport of the given size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Where the image is actually drawn inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRect {
    /// Left edge in viewport coordinates.
    pub x: f64,
    /// Top edge in viewport coordinates.
    pub y: f64,
    /// Drawn width.
    pub width: f64,
    /// Drawn height.
    pub height: f64,
}

impl LayoutRect {
    /// Whether `point` falls inside the drawn image area.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    /// Ratio between drawn size and the image's natural size.
    ///
    /// Uniform on both axes because the layout preserves aspect ratio.
    #[must_use]
    pub fn scale_for(&self, image_width: u32) -> f64 {
        if image_width == 0 {
            return 0.0;
        }
        self.width / f64::from(image_width)
    }
}

/// Contain-fit `image_width x image_height` into `viewport`.
///
/// If the viewport is wider (relative to its height) than the image, the
/// result is height-constrained, otherwise width-constrained. The unused
/// dimension is split evenly on both sides.
///
/// Degenerate inputs (any zero dimension) yield an empty rect at the
/// viewport's center.
#[must_use]
pub fn compute_layout(image_width: u32, image_height: u32, viewport: Viewport) -> LayoutRect {
    let vw = f64::from(viewport.width);
    let vh = f64::from(viewport.height);

    if viewport.is_empty() || image_width == 0 || image_height == 0 {
        return LayoutRect {
            x: vw / 2.0,
            y: vh / 2.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let viewport_aspect = vw / vh;
    let image_aspect = f64::from(image_width) / f64::from(image_height);

    let (width, height) = if viewport_aspect > image_aspect {
        (vh * image_aspect, vh)
    } else {
        (vw, vw / image_aspect)
    };

    LayoutRect {
        x: (vw - width) / 2.0,
        y: (vh - height) / 2.0,
        width,
        height,
    }
}

/// The canvas's bounding rectangle origin in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasBounds {
    /// Client-space x of the canvas's left edge.
    pub left: f64,
    /// Client-space y of the canvas's top edge.
    pub top: f64,
}

/// A raw pointer event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput<'a> {
    /// Mouse event with a single client position.
    Mouse {
        /// Client-space x.
        client_x: f64,
        /// Client-space y.
        client_y: f64,
    },
    /// Touch event with every active touch point in client space.
    Touch(&'a [Point]),
}

/// Map a mouse or touch event into canvas-local coordinates.
///
/// Only the first touch point is read; multi-touch gestures are not
/// supported. Returns `None` for a touch event with no touches.
#[must_use]
pub fn canvas_point(input: &PointerInput<'_>, bounds: CanvasBounds) -> Option<Point> {
    let (client_x, client_y) = match *input {
        PointerInput::Mouse { client_x, client_y } => (client_x, client_y),
        PointerInput::Touch(touches) => {
            let first = touches.first()?;
            (first.x, first.y)
        }
    };
    Some(Point::new(client_x - bounds.left, client_y - bounds.top))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn wide_image_in_square_viewport_is_width_constrained() {
        let rect = compute_layout(500, 300, Viewport::new(400, 400));
        assert!((rect.x - 0.0).abs() < EPS);
        assert!((rect.y - 80.0).abs() < EPS, "y = {}", rect.y);
        assert!((rect.width - 400.0).abs() < EPS);
        assert!((rect.height - 240.0).abs() < EPS);
    }

    #[test]
    fn tall_image_in_wide_viewport_is_height_constrained() {
        let rect = compute_layout(300, 600, Viewport::new(800, 400));
        assert!((rect.height - 400.0).abs() < EPS);
        assert!((rect.width - 200.0).abs() < EPS);
        assert!((rect.x - 300.0).abs() < EPS);
        assert!(rect.y.abs() < EPS);
    }

    #[test]
    fn matching_aspect_fills_viewport() {
        let rect = compute_layout(1024, 768, Viewport::new(512, 384));
        assert_eq!(
            rect,
            LayoutRect {
                x: 0.0,
                y: 0.0,
                width: 512.0,
                height: 384.0
            }
        );
    }

    #[test]
    fn layout_is_contained_and_preserves_aspect() {
        let sizes = [1u32, 3, 17, 64, 299, 500, 1023, 4096];
        for &iw in &sizes {
            for &ih in &sizes {
                for &vw in &sizes {
                    for &vh in &sizes {
                        let rect = compute_layout(iw, ih, Viewport::new(vw, vh));
                        assert!(rect.width <= f64::from(vw) + EPS, "{iw}x{ih} in {vw}x{vh}");
                        assert!(rect.height <= f64::from(vh) + EPS, "{iw}x{ih} in {vw}x{vh}");
                        let want = f64::from(iw) / f64::from(ih);
                        let got = rect.width / rect.height;
                        assert!(
                            (got - want).abs() <= want * 1e-9,
                            "aspect {got} != {want} for {iw}x{ih} in {vw}x{vh}"
                        );
                        assert!((rect.x - (f64::from(vw) - rect.width) / 2.0).abs() < EPS);
                        assert!((rect.y - (f64::from(vh) - rect.height) / 2.0).abs() < EPS);
                    }
                }
            }
        }
    }

    #[test]
    fn degenerate_viewport_yields_empty_rect() {
        let rect = compute_layout(100, 100, Viewport::new(0, 50));
        assert!(rect.width.abs() < EPS);
        assert!(rect.height.abs() < EPS);
    }

    #[test]
    fn mouse_and_touch_map_through_bounds() {
        let bounds = CanvasBounds {
            left: 10.0,
            top: 20.0,
        };
        let mouse = PointerInput::Mouse {
            client_x: 15.0,
            client_y: 45.0,
        };
        assert_eq!(canvas_point(&mouse, bounds), Some(Point::new(5.0, 25.0)));

        let touches = [Point::new(110.0, 120.0), Point::new(0.0, 0.0)];
        let touch = PointerInput::Touch(&touches);
        assert_eq!(canvas_point(&touch, bounds), Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn empty_touch_list_has_no_point() {
        let touch = PointerInput::Touch(&[]);
        assert_eq!(canvas_point(&touch, CanvasBounds::default()), None);
    }

    #[test]
    fn contains_respects_letterbox_bands() {
        let rect = compute_layout(500, 300, Viewport::new(400, 400));
        assert!(!rect.contains(Point::new(200.0, 10.0)));
        assert!(rect.contains(Point::new(200.0, 200.0)));
        assert!(!rect.contains(Point::new(200.0, 330.0)));
    }
}
