//! Viewport-sized mask raster.
//!
//! The mask is an RGBA buffer with the same pixel dimensions as the
//! viewport canvas, not the source image. Strokes are painted in viewport
//! coordinates as round-capped segments composited source-over, so a
//! semi-transparent brush darkens where segments overlap, exactly like a
//! 2D canvas context issuing one `stroke()` per pointer move.

use image::imageops::{self, FilterType};
use image::{Rgb, Rgba, RgbaImage};

use crate::geometry::{LayoutRect, Point};

/// Fully transparent pixel.
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Painted pixel in the exported alpha mask.
const OPAQUE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A raster mask covering the whole viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskCanvas {
    pixels: RgbaImage,
}

impl MaskCanvas {
    /// Allocate a transparent mask of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the underlying raster.
    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Wipe every pixel back to transparent.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = CLEAR;
        }
    }

    /// True when no pixel carries any alpha.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|px| px[3] == 0)
    }

    /// Copy of the current buffer, for history.
    #[must_use]
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    /// Replace the buffer with a previously taken snapshot.
    ///
    /// Snapshots of a different size are ignored; the editor keeps history
    /// and canvas geometry in lockstep so this only guards misuse.
    pub fn restore(&mut self, snapshot: RgbaImage) {
        if snapshot.dimensions() == self.pixels.dimensions() {
            self.pixels = snapshot;
        }
    }

    /// Paint a round-capped, round-joined line from `from` to `to`.
    ///
    /// Every pixel whose center lies within `width / 2` of the segment is
    /// composited once with `color` at `alpha` (0-255).
    pub fn stroke_segment(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Rgb<u8>,
        alpha: u8,
    ) {
        let radius = width / 2.0;
        if radius <= 0.0 || alpha == 0 || self.width() == 0 || self.height() == 0 {
            return;
        }

        let max_x = f64::from(self.width() - 1);
        let max_y = f64::from(self.height() - 1);
        let left = (from.x.min(to.x) - radius).floor().clamp(0.0, max_x);
        let right = (from.x.max(to.x) + radius).ceil().clamp(0.0, max_x);
        let top = (from.y.min(to.y) - radius).floor().clamp(0.0, max_y);
        let bottom = (from.y.max(to.y) + radius).ceil().clamp(0.0, max_y);

        // Entirely off-canvas segments collapse onto an edge row/column;
        // the distance test below rejects them.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, x1, y0, y1) = (left as u32, right as u32, top as u32, bottom as u32);

        let src = Rgba([color[0], color[1], color[2], alpha]);
        let r2 = radius * radius;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let center = Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5);
                if distance_sq_to_segment(center, from, to) <= r2 {
                    let dst = self.pixels.get_pixel_mut(px, py);
                    *dst = source_over(src, *dst);
                }
            }
        }
    }

    /// Binary alpha mask: opaque white where painted, transparent elsewhere.
    #[must_use]
    pub fn alpha_mask(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width(), self.height());
        for (dst, src) in out.pixels_mut().zip(self.pixels.pixels()) {
            *dst = if src[3] > 0 { OPAQUE } else { CLEAR };
        }
        out
    }

    /// Cut the drawn image area out of the mask and scale it to the
    /// image's natural size, yielding a mask on the source pixel grid.
    ///
    /// Paint in the letterbox bands is discarded.
    #[must_use]
    pub fn source_aligned(
        &self,
        layout: &LayoutRect,
        image_width: u32,
        image_height: u32,
    ) -> RgbaImage {
        let vw = f64::from(self.width());
        let vh = f64::from(self.height());
        let left = layout.x.clamp(0.0, vw).floor();
        let top = layout.y.clamp(0.0, vh).floor();
        let right = (layout.x + layout.width).clamp(0.0, vw).ceil();
        let bottom = (layout.y + layout.height).clamp(0.0, vh).ceil();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y, w, h) = (
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        );

        if w == 0 || h == 0 || image_width == 0 || image_height == 0 {
            return RgbaImage::new(image_width, image_height);
        }

        let region = imageops::crop_imm(&self.alpha_mask(), x, y, w, h).to_image();
        imageops::resize(&region, image_width, image_height, FilterType::Nearest)
    }

    /// Nearest-neighbour rescale to a new viewport size.
    #[must_use]
    pub fn resampled(&self, width: u32, height: u32) -> Self {
        Self {
            pixels: resample(&self.pixels, width, height),
        }
    }

    /// Bytes held by the pixel buffer.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

/// Nearest-neighbour rescale that tolerates empty source or target sizes.
pub(crate) fn resample(pixels: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if pixels.width() == 0 || pixels.height() == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    imageops::resize(pixels, width, height, FilterType::Nearest)
}

/// Squared distance from `p` to the segment `a`-`b`.
fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    (p.x - cx).powi(2) + (p.y - cy).powi(2)
}

/// Non-premultiplied source-over compositing.
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return CLEAR;
    }

    let channel = |ch: usize| {
        let sc = f32::from(src[ch]);
        let dc = f32::from(dst[ch]);
        to_u8((sc * sa + dc * da * (1.0 - sa)) / out_a)
    };
    Rgba([channel(0), channel(1), channel(2), to_u8(out_a * 255.0)])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
