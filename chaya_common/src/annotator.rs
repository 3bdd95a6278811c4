//! Draws the sampled region and the verdict onto a copy of a frame.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::roi::Region;

pub const ROI_CAPTION: &str = "Point your chaya here";

const OUTLINE_THICKNESS: u32 = 2;
const OUTLINE_COLOR: [u8; 3] = [0, 255, 0];
const LABEL_COLOR: [u8; 3] = [255, 255, 255];
const MIN_TEXT_PX: f32 = 12.0;

/// How tall the verdict label is drawn. The region caption is half of it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TextSize {
    /// Fixed label height in pixels.
    Fixed { px: f32 },
    /// Label height as a fraction of the frame's shorter side.
    Scaled { ratio: f32 },
}

impl TextSize {
    pub fn label_px(&self, width: u32, height: u32) -> f32 {
        let px = match *self {
            TextSize::Fixed { px } => px,
            TextSize::Scaled { ratio } => width.min(height) as f32 * ratio,
        };
        px.max(MIN_TEXT_PX)
    }
}

pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    /// Loads a TrueType font, falling back to outline-only annotation.
    pub fn from_font_file(path: &Path) -> Self {
        let font = match std::fs::read(path) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    log::debug!("Loaded overlay font {path:?}");
                    Some(font)
                }
                Err(err) => {
                    log::warn!("Font {path:?} is not a usable TrueType font: {err}");
                    None
                }
            },
            Err(err) => {
                log::warn!("Could not read font {path:?}, captions disabled: {err}");
                None
            }
        };
        Self::new(font)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Returns a new frame with the region outlined, a caption above it and
    /// `label` centered near the top. `frame` is left untouched.
    pub fn annotate(&self, frame: &Frame, region: Region, label: &str, text: TextSize) -> Frame {
        let mut out = frame.clone();
        let order = frame.order();
        let outline = Rgb(order.from_rgb(OUTLINE_COLOR));
        let (width, height) = (frame.width(), frame.height());

        // Nested 1px outlines grow the border inwards.
        for inset in 0..OUTLINE_THICKNESS {
            let w = region.width().saturating_sub(2 * inset);
            let h = region.height().saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((region.x1 + inset) as i32, (region.y1 + inset) as i32);
            draw_hollow_rect_mut(out.pixels_mut(), rect.of_size(w, h), outline);
        }

        let Some(font) = &self.font else {
            return out;
        };

        let label_px = text.label_px(width, height);
        let caption_scale = PxScale::from((label_px / 2.0).max(MIN_TEXT_PX));
        let (_, caption_h) = text_size(caption_scale, font, ROI_CAPTION);
        let caption_y = region.y1 as i32 - caption_h as i32 - (label_px / 4.0) as i32;
        draw_text_mut(
            out.pixels_mut(),
            outline,
            region.x1 as i32,
            caption_y.max(0),
            caption_scale,
            font,
            ROI_CAPTION,
        );

        let label_scale = PxScale::from(label_px);
        let (label_w, _) = text_size(label_scale, font, label);
        let label_x = (width as i32 - label_w as i32) / 2;
        let label_y = (label_px / 2.0) as i32;
        draw_text_mut(
            out.pixels_mut(),
            Rgb(order.from_rgb(LABEL_COLOR)),
            label_x.max(0),
            label_y,
            label_scale,
            font,
            label,
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_text_follows_shorter_side() {
        let policy = TextSize::Scaled { ratio: 0.1 };
        assert_eq!(policy.label_px(1920, 1080), 108.0);
        assert_eq!(policy.label_px(480, 640), 48.0);
    }

    #[test]
    fn text_never_shrinks_below_minimum() {
        assert_eq!(TextSize::Scaled { ratio: 0.05 }.label_px(40, 40), MIN_TEXT_PX);
        assert_eq!(TextSize::Fixed { px: 4.0 }.label_px(4000, 4000), MIN_TEXT_PX);
    }

    #[test]
    fn missing_font_disables_captions() {
        let annotator = Annotator::from_font_file(Path::new("/nonexistent/font.ttf"));
        assert!(!annotator.has_font());
    }
}
