//! Color based chai strength analysis: region extraction, color sampling,
//! threshold classification, frame annotation, the capture loop controller
//! and parsers for vision model replies.

pub mod analysis;
pub mod annotator;
pub mod capture;
pub mod classifier;
pub mod color_sampler;
pub mod config;
pub mod frame;
pub mod reply;
pub mod roi;

pub use analysis::{Analysis, AnalysisSummary, Analyzer, FrameKind};
pub use capture::{
    CaptureController, CaptureError, ControllerState, DisplaySink, FrameSource, LoopState,
    StopSignal,
};
pub use classifier::{ClassifierThresholds, Strength};
pub use frame::{ChannelOrder, Frame, FrameError};
pub use reply::RatingResult;
