//! Frame sources that need no camera: image files, URLs and directories.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chaya_common::{CaptureError, Frame, FrameSource};

const USER_AGENT: &str = concat!(
    "chaya-o-meter/",
    env!("CARGO_PKG_VERSION"),
    " (chai strength rater)"
);
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Loads a frame from a local path or an http(s) URL.
pub fn load_frame(source: &str) -> anyhow::Result<Frame> {
    if is_url(source) {
        log::info!("Downloading {source}");
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        let bytes = client
            .get(source)
            .send()
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to download {source}"))?
            .bytes()?;
        Frame::decode(&bytes).with_context(|| format!("{source} is not a readable image"))
    } else {
        Frame::open(Path::new(source)).with_context(|| format!("failed to open image {source}"))
    }
}

/// File stem used to name outputs; for URLs the last path segment.
pub fn output_stem(source: &str) -> String {
    let path = if is_url(source) {
        let without_query = source.split(['?', '#']).next().unwrap_or(source);
        without_query.rsplit('/').next().unwrap_or_default()
    } else {
        source
    };
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("image")
        .to_string()
}

/// Replays the images of a directory, in file name order, as if they came
/// from a camera. Files that fail to decode are skipped.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    dir: PathBuf,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl FrameSource for ImageSequenceSource {
    type Handle = std::vec::IntoIter<PathBuf>;

    fn open(&mut self) -> Result<Self::Handle, CaptureError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| CaptureError::DeviceUnavailable(format!("{:?}: {e}", self.dir)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_image(path))
            .collect();
        if paths.is_empty() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "no images in {:?}",
                self.dir
            )));
        }
        paths.sort();

        log::info!("Replaying {} images from {:?}", paths.len(), self.dir);
        Ok(paths.into_iter())
    }

    fn read(&mut self, handle: &mut Self::Handle) -> Result<Frame, CaptureError> {
        for path in handle.by_ref() {
            match Frame::open(&path) {
                Ok(frame) => {
                    log::debug!("Replaying {path:?}");
                    return Ok(frame);
                }
                Err(err) => log::warn!("Skipping {path:?}: {err}"),
            }
        }
        Err(CaptureError::ReadFailed("end of image sequence".to_string()))
    }

    fn release(&mut self, handle: Self::Handle) {
        let remaining = handle.len();
        if remaining > 0 {
            log::debug!("Released image sequence with {remaining} images left");
        }
    }
}
