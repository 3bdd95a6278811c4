use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotator::TextSize;
use crate::classifier::ClassifierThresholds;

pub const DEFAULT_ROI_SIZE: u32 = 100;
pub const DEFAULT_DENOISE_RADIUS: u32 = 2;
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("roi_size must be at least 1 pixel")]
    ZeroRoi,

    #[error(
        "thresholds must satisfy {very_strong_below} < {medium_below} < {not_chai_below} <= 765"
    )]
    UnorderedThresholds {
        very_strong_below: u32,
        medium_below: u32,
        not_chai_below: u32,
    },
}

/// Region, smoothing and classification parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Side length of the centered square that is sampled.
    pub roi_size: u32,
    /// Median filter radius applied before sampling; 0 disables it.
    pub denoise_radius: u32,
    pub thresholds: ClassifierThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            roi_size: DEFAULT_ROI_SIZE,
            denoise_radius: DEFAULT_DENOISE_RADIUS,
            thresholds: ClassifierThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roi_size == 0 {
            return Err(ConfigError::ZeroRoi);
        }
        self.thresholds.validate()
    }
}

/// Overlay font and text size policies.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// TrueType font used for captions. `None` draws outlines only.
    pub font_path: Option<PathBuf>,
    pub live_text: TextSize,
    pub static_text: TextSize,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            font_path: Some(PathBuf::from(DEFAULT_FONT_PATH)),
            live_text: TextSize::Fixed { px: 32.0 },
            static_text: TextSize::Scaled { ratio: 0.06 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(AnalysisConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_roi_is_rejected() {
        let config = AnalysisConfig {
            roi_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroRoi));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"thresholds": {"medium_below": 400}}"#).unwrap();
        assert_eq!(config.roi_size, DEFAULT_ROI_SIZE);
        assert_eq!(config.thresholds.medium_below, 400);
        assert_eq!(config.thresholds.very_strong_below, 150);
    }

    #[test]
    fn text_policy_is_tagged() {
        let config: AnnotationConfig = serde_json::from_str(
            r#"{"font_path": null, "live_text": {"policy": "scaled", "ratio": 0.1}}"#,
        )
        .unwrap();
        assert_eq!(config.font_path, None);
        assert_eq!(config.live_text, TextSize::Scaled { ratio: 0.1 });
        assert_eq!(config.static_text, AnnotationConfig::default().static_text);
    }
}
