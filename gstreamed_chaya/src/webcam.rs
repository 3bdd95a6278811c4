use chaya_common::{CaptureError, ChannelOrder, Frame, FrameSource};
use gstreamer::{self as gst, prelude::*};
use gstreamer_app as gst_app;

/// How long to wait for the device to start, or for the next frame.
const TIMEOUT_SECS: u64 = 5;

/// V4L2 camera read through a gstreamer appsink, delivering BGR frames.
pub struct GstCameraSource {
    device: String,
}

pub struct CameraHandle {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
}

impl GstCameraSource {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> CaptureError {
        CaptureError::DeviceUnavailable(format!("{}: {reason}", self.device))
    }
}

fn read_failed(reason: impl std::fmt::Display) -> CaptureError {
    CaptureError::ReadFailed(reason.to_string())
}

impl FrameSource for GstCameraSource {
    type Handle = CameraHandle;

    fn open(&mut self) -> Result<CameraHandle, CaptureError> {
        gst::init().map_err(|e| self.unavailable(e))?;

        // Only the newest frame is kept; stale frames are dropped.
        let description = format!(
            "v4l2src device={} ! videoconvert ! video/x-raw,format=BGR ! \
             appsink name=sink max-buffers=1 drop=true sync=false",
            self.device
        );
        log::debug!("Pipeline: {description}");

        let pipeline = gst::parse::launch(&description)
            .map_err(|e| self.unavailable(e))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| self.unavailable("not a pipeline"))?;
        let appsink = pipeline
            .by_name("sink")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| self.unavailable("failed to get appsink"))?;

        let started = pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| e.to_string())
            .and_then(|_| {
                let (result, _, _) = pipeline.state(gst::ClockTime::from_seconds(TIMEOUT_SECS));
                result.map(|_| ()).map_err(|e| e.to_string())
            });
        if let Err(reason) = started {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(self.unavailable(reason));
        }

        log::info!("Camera {} opened", self.device);
        Ok(CameraHandle { pipeline, appsink })
    }

    fn read(&mut self, handle: &mut CameraHandle) -> Result<Frame, CaptureError> {
        let sample = handle
            .appsink
            .try_pull_sample(gst::ClockTime::from_seconds(TIMEOUT_SECS))
            .ok_or_else(|| {
                read_failed(format!("no frame from {} in {TIMEOUT_SECS}s", self.device))
            })?;

        let caps = sample.caps().ok_or_else(|| read_failed("sample without caps"))?;
        let structure = caps.structure(0).ok_or_else(|| read_failed("empty caps"))?;
        let width = structure.get::<i32>("width").map_err(read_failed)?;
        let height = structure.get::<i32>("height").map_err(read_failed)?;
        let (width, height) = (
            u32::try_from(width).map_err(read_failed)?,
            u32::try_from(height).map_err(read_failed)?,
        );

        let buffer = sample.buffer().ok_or_else(|| read_failed("sample without buffer"))?;
        let map = buffer.map_readable().map_err(read_failed)?;

        // Packed 24-bit rows are padded to a multiple of 4 bytes.
        let stride = (width as usize * 3 + 3) & !3;
        Frame::from_strided(width, height, stride, map.as_slice(), ChannelOrder::Bgr)
            .map_err(read_failed)
    }

    fn release(&mut self, handle: CameraHandle) {
        if let Err(err) = handle.pipeline.set_state(gst::State::Null) {
            log::warn!("Failed to stop camera pipeline: {err}");
        }
    }
}
