//! Centered region of interest.

use serde::Serialize;

/// Half-open pixel bounds `[x1, x2) x [y1, y2)` inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Square region of side `side`, centered in a `width x height` frame.
///
/// Offsets use truncating division: `x1 = width/2 - side/2`, `x2 = x1 + side`.
/// When `side` exceeds a frame dimension the bounds are clamped to the frame,
/// so the result always lies inside it. For a non-empty frame and `side >= 1`
/// the result is never empty.
pub fn centered_region(width: u32, height: u32, side: u32) -> Region {
    let (x1, x2) = centered_span(width, side);
    let (y1, y2) = centered_span(height, side);
    Region { x1, y1, x2, y2 }
}

fn centered_span(extent: u32, side: u32) -> (u32, u32) {
    let start = extent as i64 / 2 - side as i64 / 2;
    let end = start + side as i64;
    let clamp = |v: i64| v.clamp(0, extent as i64) as u32;
    (clamp(start), clamp(end))
}
