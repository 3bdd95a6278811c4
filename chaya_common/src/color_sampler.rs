//! Average color of a region, with an optional median pass for foam and bubbles.

use image::imageops;
use imageproc::filter::median_filter;
use serde::Serialize;

use crate::frame::{ChannelOrder, Frame};
use crate::roi::Region;

/// Per-channel means of a region, in the frame's native channel order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorSample {
    means: [f64; 3],
    order: ChannelOrder,
}

impl ColorSample {
    /// Means are clamped into `[0, 255]`.
    pub fn new(means: [f64; 3], order: ChannelOrder) -> Self {
        Self {
            means: means.map(|m| m.clamp(0.0, 255.0)),
            order,
        }
    }

    /// Channel means in [`ColorSample::order`].
    pub fn channels(&self) -> [f64; 3] {
        self.means
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Channel means as `[r, g, b]`.
    pub fn rgb(&self) -> [f64; 3] {
        self.order.from_rgb(self.means)
    }

    /// Sum of the three channel means, each truncated first. Lies in `[0, 765]`.
    pub fn brightness(&self) -> u32 {
        self.means.iter().map(|m| *m as u32).sum()
    }
}

/// Samples the mean color of `region`.
///
/// With `denoise_radius > 0` the crop first goes through a median filter with
/// a `(2r + 1)` square window. Both steps are purely spatial, so the same
/// input always yields the same sample.
pub fn sample_region(frame: &Frame, region: Region, denoise_radius: u32) -> ColorSample {
    let crop = imageops::crop_imm(
        frame.pixels(),
        region.x1,
        region.y1,
        region.width(),
        region.height(),
    )
    .to_image();

    let crop = if denoise_radius > 0 {
        median_filter(&crop, denoise_radius, denoise_radius)
    } else {
        crop
    };

    let mut sums = [0u64; 3];
    for pixel in crop.pixels() {
        for (sum, value) in sums.iter_mut().zip(pixel.0) {
            *sum += value as u64;
        }
    }

    let count = crop.width() as u64 * crop.height() as u64;
    if count == 0 {
        log::warn!("Sampled an empty region {region:?}, reporting black");
        return ColorSample::new([0.0; 3], frame.order());
    }

    ColorSample::new(sums.map(|s| s as f64 / count as f64), frame.order())
}
