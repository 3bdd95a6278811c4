//! Brightness thresholds mapping a color sample to a strength category.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color_sampler::ColorSample;
use crate::config::ConfigError;

/// Largest possible brightness: three channels at 255.
pub const MAX_BRIGHTNESS: u32 = 255 * 3;

/// Strength categories, ordered dark to light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    VeryStrong,
    Medium,
    NotChai,
    MostlyMilk,
}

impl Strength {
    /// Text overlaid on frames and shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Strength::VeryStrong => "Very strong",
            Strength::Medium => "Medium",
            Strength::NotChai => "Not chai",
            Strength::MostlyMilk => "Mostly milk / empty",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper (exclusive) brightness bounds of the first three categories.
/// Everything from `not_chai_below` up to 765 is [`Strength::MostlyMilk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub very_strong_below: u32,
    pub medium_below: u32,
    pub not_chai_below: u32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            very_strong_below: 150,
            medium_below: 300,
            not_chai_below: 500,
        }
    }
}

impl ClassifierThresholds {
    /// Bounds must be strictly increasing and no larger than [`MAX_BRIGHTNESS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.very_strong_below < self.medium_below
            && self.medium_below < self.not_chai_below
            && self.not_chai_below <= MAX_BRIGHTNESS;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::UnorderedThresholds {
                very_strong_below: self.very_strong_below,
                medium_below: self.medium_below,
                not_chai_below: self.not_chai_below,
            })
        }
    }

    /// First matching half-open range wins, evaluated low to high.
    pub fn classify(&self, brightness: u32) -> Strength {
        if brightness < self.very_strong_below {
            Strength::VeryStrong
        } else if brightness < self.medium_below {
            Strength::Medium
        } else if brightness < self.not_chai_below {
            Strength::NotChai
        } else {
            Strength::MostlyMilk
        }
    }

    pub fn classify_sample(&self, sample: &ColorSample) -> Strength {
        self.classify(sample.brightness())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    #[test]
    fn boundaries_are_half_open() {
        let t = ClassifierThresholds::default();
        assert_eq!(t.classify(0), Strength::VeryStrong);
        assert_eq!(t.classify(149), Strength::VeryStrong);
        assert_eq!(t.classify(150), Strength::Medium);
        assert_eq!(t.classify(299), Strength::Medium);
        assert_eq!(t.classify(300), Strength::NotChai);
        assert_eq!(t.classify(499), Strength::NotChai);
        assert_eq!(t.classify(500), Strength::MostlyMilk);
        assert_eq!(t.classify(MAX_BRIGHTNESS), Strength::MostlyMilk);
    }

    #[test]
    fn categories_are_monotonic_in_brightness() {
        let t = ClassifierThresholds::default();
        let mut previous = Strength::VeryStrong;
        for b in 0..=MAX_BRIGHTNESS {
            let current = t.classify(b);
            assert!(current >= previous, "{b}: {current:?} after {previous:?}");
            previous = current;
        }
    }

    #[test]
    fn alternate_calibration_moves_medium_boundary() {
        let t = ClassifierThresholds {
            medium_below: 400,
            ..Default::default()
        };
        assert!(t.validate().is_ok());
        assert_eq!(t.classify(399), Strength::Medium);
        assert_eq!(t.classify(400), Strength::NotChai);
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let t = ClassifierThresholds {
            very_strong_below: 300,
            medium_below: 300,
            not_chai_below: 500,
        };
        assert!(t.validate().is_err());

        let t = ClassifierThresholds {
            not_chai_below: 900,
            ..Default::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn sample_brightness_truncates_each_channel() {
        // 49.9 + 49.9 + 49.9 truncates to 147, not 149.
        let sample = ColorSample::new([49.9; 3], ChannelOrder::Bgr);
        assert_eq!(sample.brightness(), 147);
        assert_eq!(
            ClassifierThresholds::default().classify_sample(&sample),
            Strength::VeryStrong
        );
    }
}
