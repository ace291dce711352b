//! Padded crop rectangle around a detected face.
//!
//! Vertical padding is split 70/30 in favour of the area above the box so
//! hair and forehead survive the crop; horizontal padding is split evenly.

use crate::shared::region::{CropRegion, FaceBox};

/// Fraction of the box size added as margin.
pub const DEFAULT_PADDING: f64 = 0.25;

/// Share of the vertical padding placed above the box.
const TOP_SHARE: f64 = 0.7;

/// Margins in pixels around a face box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Margins {
    pub top: i64,
    pub bottom: i64,
    pub sides: i64,
}

impl Margins {
    /// `pad = floor(size * padding)`; odd horizontal totals lose the spare
    /// pixel since both sides use `pad_w / 2`.
    pub fn for_box(bbox: &FaceBox, padding: f64) -> Self {
        let pad_h = (bbox.height as f64 * padding) as i64;
        let pad_w = (bbox.width as f64 * padding) as i64;
        let top = (pad_h as f64 * TOP_SHARE) as i64;
        Self {
            top,
            bottom: pad_h - top,
            sides: pad_w / 2,
        }
    }
}

/// Whether `padding` is usable as a crop margin fraction.
pub fn is_valid_padding(padding: f64) -> bool {
    (0.0..1.0).contains(&padding)
}

/// Expands `bbox` by `padding` and clamps it to a `frame_w` x `frame_h` image.
///
/// Returns `None` when nothing of the box lies inside the image.
pub fn compute_crop_region(
    bbox: &FaceBox,
    frame_w: u32,
    frame_h: u32,
    padding: f64,
) -> Option<CropRegion> {
    debug_assert!(is_valid_padding(padding), "padding must be in [0, 1)");
    let m = Margins::for_box(bbox, padding);
    let (fw, fh) = (frame_w as i64, frame_h as i64);
    let (x, y) = (bbox.x as i64, bbox.y as i64);
    let (w, h) = (bbox.width as i64, bbox.height as i64);

    let x1 = (x - m.sides).clamp(0, fw);
    let y1 = (y - m.top).clamp(0, fh);
    let x2 = (x + w + m.sides).clamp(0, fw);
    let y2 = (y + h + m.bottom).clamp(0, fh);

    if x1 >= x2 || y1 >= y2 {
        return None;
    }

    Some(CropRegion {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}
