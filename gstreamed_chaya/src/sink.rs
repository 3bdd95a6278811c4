use std::path::{Path, PathBuf};

use chaya_common::{Analysis, DisplaySink, RatingResult, Strength};

/// Headless display: keeps the latest annotated frame on disk and reports
/// verdict changes in the log.
pub struct SnapshotSink {
    path: PathBuf,
    last_strength: Option<Strength>,
    frames: u64,
}

impl SnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_strength: None,
            frames: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames
    }
}

impl DisplaySink for SnapshotSink {
    fn show_analysis(&mut self, analysis: &Analysis) {
        self.frames += 1;

        if self.last_strength != Some(analysis.strength) {
            log::info!(
                "Frame {}: {} (brightness {})",
                self.frames,
                analysis.strength,
                analysis.brightness()
            );
            self.last_strength = Some(analysis.strength);
        } else {
            log::debug!("Frame {}: brightness {}", self.frames, analysis.brightness());
        }

        if let Err(err) = analysis.annotated.save(&self.path) {
            log::warn!("Could not write snapshot {:?}: {err}", self.path);
        }
    }

    fn show_rating(&mut self, rating: &RatingResult) {
        println!("Rating: {}/5 | {}", rating.rating(), rating.comment());
    }

    fn show_error(&mut self, message: &str) {
        log::error!("{message}");
        eprintln!("{message}");
    }
}
