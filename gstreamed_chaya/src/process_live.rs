use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chaya_common::{Analyzer, CaptureController, DisplaySink, FrameSource, StopSignal};
use gemini_common::{Rater, VisionModel};

use crate::sink::SnapshotSink;

/// One stdin reader for the whole run. Every line (Enter, `q`, ...) requests
/// a stop of whichever loop is running; once stdin closes, every loop stops
/// as soon as it starts.
pub struct StdinWatcher {
    stop: StopSignal,
    closed: Arc<AtomicBool>,
}

impl StdinWatcher {
    pub fn spawn() -> Self {
        let watcher = Self {
            stop: StopSignal::default(),
            closed: Arc::new(AtomicBool::new(false)),
        };

        let stop = watcher.stop.clone();
        let closed = Arc::clone(&watcher.closed);
        let spawned = std::thread::Builder::new()
            .name("stdin-stop".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    if line.is_err() {
                        break;
                    }
                    log::info!("Stop requested");
                    stop.request_stop();
                }
                log::debug!("stdin closed");
                closed.store(true, Ordering::Relaxed);
                stop.request_stop();
            });
        if let Err(err) = spawned {
            log::warn!("Cannot watch stdin, loops will only stop on their own: {err}");
        }

        watcher
    }

    fn stop_signal(&self) -> StopSignal {
        if self.closed.load(Ordering::Relaxed) {
            self.stop.request_stop();
        }
        self.stop.clone()
    }
}

/// Runs the capture loop over `source` until the user stops it, the source
/// runs dry, or `max_frames` frames are analysed. The last frame is then
/// rated when a rater is given.
///
/// Capture failures are reported to the user, never returned.
pub fn process_live<S: FrameSource, M: VisionModel>(
    name: &str,
    source: S,
    analyzer: &Analyzer,
    rater: Option<&Rater<M>>,
    watcher: Option<&StdinWatcher>,
    max_frames: Option<u64>,
    output_dir: &Path,
) {
    let _span = tracing::info_span!("live", source = name).entered();

    let mut sink = SnapshotSink::new(output_dir.join("live.out.jpg"));
    let mut controller = match watcher {
        Some(watcher) => {
            println!("Analysing {name}. Press Enter to stop.");
            CaptureController::with_stop_signal(source, watcher.stop_signal())
        }
        None => CaptureController::new(source),
    };

    match controller.run(analyzer, &mut sink, max_frames) {
        Ok(frames) => log::info!("Stopped after {frames} frames"),
        Err(err) => sink.show_error(&format!("Live analysis of {name} ended: {err}")),
    }

    let Some(latest) = &controller.state().latest_result else {
        return;
    };
    println!(
        "Last verdict: {} (brightness {}), snapshot in {:?}",
        latest.strength,
        latest.brightness(),
        sink.path()
    );

    if let (Some(rater), Some(frame)) = (rater, &controller.state().latest_frame) {
        let rating = rater.rate_or_degrade(frame);
        sink.show_rating(&rating);
    }
}
