//! Capture loop: owns the camera handle and drives frames through analysis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::analysis::{Analysis, Analyzer, FrameKind};
use crate::frame::Frame;
use crate::reply::RatingResult;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open camera: {0}")]
    DeviceUnavailable(String),

    #[error("failed to capture frame: {0}")]
    ReadFailed(String),
}

/// Something that hands out frames: a camera, a replayed directory, ...
///
/// `release` consumes the handle, so a handle cannot be released twice.
pub trait FrameSource {
    type Handle;

    fn open(&mut self) -> Result<Self::Handle, CaptureError>;

    fn read(&mut self, handle: &mut Self::Handle) -> Result<Frame, CaptureError>;

    fn release(&mut self, handle: Self::Handle);
}

/// Where results end up: a window, a file on disk, the log.
pub trait DisplaySink {
    fn show_analysis(&mut self, analysis: &Analysis);

    fn show_rating(&mut self, _rating: &RatingResult) {}

    fn show_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Cooperative stop request, checked between iterations.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Session state owned by the controller: loop state plus the latest
/// captured frame and its analysis.
#[derive(Debug)]
pub struct ControllerState {
    pub loop_state: LoopState,
    pub latest_frame: Option<Frame>,
    pub latest_result: Option<Analysis>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            loop_state: LoopState::Idle,
            latest_frame: None,
            latest_result: None,
        }
    }
}

pub struct CaptureController<S: FrameSource> {
    source: S,
    handle: Option<S::Handle>,
    state: ControllerState,
    stop: StopSignal,
}

impl<S: FrameSource> CaptureController<S> {
    pub fn new(source: S) -> Self {
        Self::with_stop_signal(source, StopSignal::default())
    }

    /// Shares `stop` with whoever may request a stop, e.g. a watcher that
    /// outlives several controllers.
    pub fn with_stop_signal(source: S, stop: StopSignal) -> Self {
        Self {
            source,
            handle: None,
            state: ControllerState::default(),
            stop,
        }
    }

    /// Handle for requesting a stop from outside the loop.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.state.loop_state
    }

    /// Idle → Running. Acquires the camera; no-op when already running.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state.loop_state == LoopState::Running {
            log::debug!("Start requested while running, ignoring");
            return Ok(());
        }

        let handle = self.source.open()?;
        self.handle = Some(handle);
        self.state.loop_state = LoopState::Running;
        log::info!("Capture started");
        Ok(())
    }

    /// Running → Idle. Releases the camera; no-op when already idle.
    ///
    /// Any pending stop request is consumed here, so a request made before
    /// the loop started is still honoured, and only once.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.source.release(handle);
            log::info!("Capture stopped, camera released");
        }
        self.state.loop_state = LoopState::Idle;
        self.stop.reset();
    }

    /// Runs one iteration: pull, analyse, store, render.
    ///
    /// A pending stop request is honoured before pulling. A failed pull
    /// releases the camera and returns the error with the loop back in Idle.
    pub fn step<D: DisplaySink>(
        &mut self,
        analyzer: &Analyzer,
        sink: &mut D,
    ) -> Result<LoopState, CaptureError> {
        if self.stop.is_requested() {
            self.stop();
        }

        let Some(handle) = self.handle.as_mut() else {
            return Ok(LoopState::Idle);
        };

        let frame = match self.source.read(handle) {
            Ok(frame) => frame,
            Err(err) => {
                self.stop();
                return Err(err);
            }
        };

        let analysis = analyzer.analyze(&frame, FrameKind::Live);
        self.state.latest_frame = Some(frame);
        let latest = self.state.latest_result.insert(analysis);
        sink.show_analysis(latest);

        Ok(LoopState::Running)
    }

    /// Starts the loop and iterates until stopped, `max_frames` frames have
    /// been rendered, or a capture error occurs. Returns the frame count.
    pub fn run<D: DisplaySink>(
        &mut self,
        analyzer: &Analyzer,
        sink: &mut D,
        max_frames: Option<u64>,
    ) -> Result<u64, CaptureError> {
        self.start()?;

        let mut frames = 0;
        while self.state.loop_state == LoopState::Running {
            if max_frames.is_some_and(|max| frames >= max) {
                self.stop();
                break;
            }
            if self.step(analyzer, sink)? == LoopState::Running {
                frames += 1;
            }
        }
        Ok(frames)
    }

    /// Analyses an uploaded image once. Live capture and uploads are
    /// mutually exclusive, so a running loop is stopped first.
    pub fn analyze_upload<D: DisplaySink>(
        &mut self,
        frame: Frame,
        analyzer: &Analyzer,
        sink: &mut D,
    ) -> &Analysis {
        if self.state.loop_state == LoopState::Running {
            log::info!("Upload received while capturing, stopping live analysis");
            self.stop();
        }

        let analysis = analyzer.analyze(&frame, FrameKind::Static);
        self.state.latest_frame = Some(frame);
        let latest = self.state.latest_result.insert(analysis);
        sink.show_analysis(latest);
        latest
    }
}

impl<S: FrameSource> Drop for CaptureController<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
