//! Region → sample → classify → annotate, run once per frame.

use serde::Serialize;

use crate::annotator::{Annotator, TextSize};
use crate::classifier::Strength;
use crate::color_sampler::{sample_region, ColorSample};
use crate::config::{AnalysisConfig, AnnotationConfig, ConfigError};
use crate::frame::Frame;
use crate::roi::{centered_region, Region};

/// Where a frame came from; picks the overlay text size policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Live,
    Static,
}

/// Result of analysing a single frame.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub region: Region,
    pub sample: ColorSample,
    pub strength: Strength,
    pub annotated: Frame,
}

impl Analysis {
    pub fn brightness(&self) -> u32 {
        self.sample.brightness()
    }

    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            region: self.region,
            brightness: self.brightness(),
            sample_rgb: self.sample.rgb(),
            strength: self.strength,
            label: self.strength.label(),
        }
    }
}

/// Serializable view of an [`Analysis`], without pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub region: Region,
    pub brightness: u32,
    pub sample_rgb: [f64; 3],
    pub strength: Strength,
    pub label: &'static str,
}

pub struct Analyzer {
    config: AnalysisConfig,
    live_text: TextSize,
    static_text: TextSize,
    annotator: Annotator,
}

impl Analyzer {
    pub fn new(
        config: AnalysisConfig,
        annotation: &AnnotationConfig,
        annotator: Annotator,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            live_text: annotation.live_text,
            static_text: annotation.static_text,
            annotator,
        })
    }

    /// Builds the analyzer and loads the configured overlay font, if any.
    pub fn from_config(
        config: AnalysisConfig,
        annotation: &AnnotationConfig,
    ) -> Result<Self, ConfigError> {
        let annotator = match &annotation.font_path {
            Some(path) => Annotator::from_font_file(path),
            None => Annotator::new(None),
        };
        Self::new(config, annotation, annotator)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, frame: &Frame, kind: FrameKind) -> Analysis {
        let region = centered_region(frame.width(), frame.height(), self.config.roi_size);
        let sample = sample_region(frame, region, self.config.denoise_radius);
        let strength = self.config.thresholds.classify_sample(&sample);
        let text = match kind {
            FrameKind::Live => self.live_text,
            FrameKind::Static => self.static_text,
        };
        let annotated = self.annotator.annotate(frame, region, strength.label(), text);

        log::debug!(
            "{}x{} frame, roi {region:?}, brightness {} -> {strength:?}",
            frame.width(),
            frame.height(),
            sample.brightness()
        );

        Analysis {
            region,
            sample,
            strength,
            annotated,
        }
    }
}
