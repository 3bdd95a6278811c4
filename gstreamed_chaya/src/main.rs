mod describe;
mod process_image;
mod process_live;
mod settings;
mod sink;
mod sources;
#[cfg(feature = "webcam")]
mod webcam;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chaya_common::Analyzer;
use clap::{Parser, ValueEnum};
use gemini_common::{GeminiClient, Rater};
use tracing_subscriber::prelude::*;

use crate::process_live::StdinWatcher;
use crate::settings::Settings;
use crate::sources::ImageSequenceSource;

/// What to ask the vision model, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelMode {
    /// Color analysis only.
    Off,
    /// Ask for a 0-5 rating with a comment.
    Rate,
    /// Ask whether the image shows chai at all.
    Detect,
    /// Ask for a JSON description of each input, skipping color analysis.
    Describe,
}

#[derive(Debug, Parser)]
pub struct Args {
    /// Inputs: image paths (.jpeg/.png), image URLs, or directories of images
    /// replayed as a live feed.
    /// Use "webcam" or a device path like "/dev/video0" for camera input.
    #[arg(required = true)]
    inputs: Vec<String>,
    #[arg(long, value_enum, default_value = "off")]
    model_mode: ModelMode,
    /// Webcam device (e.g., /dev/video0). Use with input "webcam".
    #[arg(long, default_value = "/dev/video0")]
    device: String,
    /// Stop a live feed after this many frames instead of waiting for Enter.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Where annotated images and reports are written. Defaults to the
    /// input's directory, or the working directory for URLs and live feeds.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Configuration file; `chaya.toml` in the working directory otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "warn,gstreamed_chaya=info,chaya_common=info,gemini_common=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    let rater = match args.model_mode {
        ModelMode::Off => None,
        _ => Some(Rater::new(GeminiClient::from_config(settings.gemini.clone())?)),
    };

    if args.model_mode == ModelMode::Describe {
        let rater = rater.context("describe mode needs a model")?;
        let entries = describe::describe_all(&args.inputs, &rater);
        return describe::print_entries(&entries);
    }

    let analyzer = Analyzer::from_config(settings.analysis.clone(), &settings.annotation)?;
    log::info!("Prepared analyzer: {:?}", analyzer.config());

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("cannot create {dir:?}"))?;
    }
    let model = rater.as_ref().map(|rater| (rater, args.model_mode));

    // Without a frame limit, live loops run until Enter is pressed.
    let watcher = (args.max_frames.is_none() && args.inputs.iter().any(|i| is_live_input(i)))
        .then(StdinWatcher::spawn);

    for input in &args.inputs {
        if is_camera(input) {
            let device = if input == "webcam" { &args.device } else { input };
            process_webcam(device, &analyzer, rater.as_ref(), watcher.as_ref(), &args);
        } else if Path::new(input).is_dir() {
            process_live::process_live(
                input,
                ImageSequenceSource::new(input),
                &analyzer,
                rater.as_ref(),
                watcher.as_ref(),
                args.max_frames,
                &live_output_dir(&args),
            );
        } else {
            let output_dir = image_output_dir(input, &args);
            if let Err(err) = process_image::process_image(input, &analyzer, model, &output_dir) {
                log::error!("{input}: {err:#}");
            }
        }
    }

    Ok(())
}

fn is_camera(input: &str) -> bool {
    input == "webcam" || input.starts_with("/dev/video")
}

fn is_live_input(input: &str) -> bool {
    is_camera(input) || Path::new(input).is_dir()
}

fn live_output_dir(args: &Args) -> PathBuf {
    args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

fn image_output_dir(input: &str, args: &Args) -> PathBuf {
    if let Some(dir) = &args.output_dir {
        return dir.clone();
    }
    if sources::is_url(input) {
        return PathBuf::from(".");
    }
    match Path::new(input).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(feature = "webcam")]
fn process_webcam(
    device: &str,
    analyzer: &Analyzer,
    rater: Option<&Rater<GeminiClient>>,
    watcher: Option<&StdinWatcher>,
    args: &Args,
) {
    log::info!("Starting webcam analysis from device: {device}");
    process_live::process_live(
        device,
        webcam::GstCameraSource::new(device),
        analyzer,
        rater,
        watcher,
        args.max_frames,
        &live_output_dir(args),
    );
}

#[cfg(not(feature = "webcam"))]
fn process_webcam(
    device: &str,
    _analyzer: &Analyzer,
    _rater: Option<&Rater<GeminiClient>>,
    _watcher: Option<&StdinWatcher>,
    _args: &Args,
) {
    log::error!("Cannot open camera {device}: built without the `webcam` feature");
}
