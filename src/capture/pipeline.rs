// SPDX-License-Identifier: MPL-2.0

//! GStreamer camera pipeline
//!
//! Captures from PipeWire when available, or straight from a V4L2 device,
//! converts to RGBA and pushes frames through an appsink callback.

use super::{CameraFrame, FrameSender};
use crate::constants::capture;
use crate::errors::{ScannerError, ScannerResult};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSource {
    /// `pipewiresrc`, optionally targeting a specific node
    PipeWire { target: Option<String> },
    /// `v4l2src`, optionally on a specific device node
    V4l2 { device: Option<String> },
}

impl CameraSource {
    /// Pick a source for `camera_path`
    ///
    /// `/dev/video*` paths always go through V4L2. Anything else is a
    /// PipeWire target, falling back to the default V4L2 device when
    /// PipeWire is not available.
    pub fn select(camera_path: Option<&str>, pipewire_available: bool) -> Self {
        match camera_path {
            Some(path) if path.starts_with("/dev/video") => CameraSource::V4l2 {
                device: Some(path.to_string()),
            },
            path if pipewire_available => CameraSource::PipeWire {
                target: path.map(str::to_string),
            },
            _ => CameraSource::V4l2 { device: None },
        }
    }

    /// gst-launch description ending in an RGBA appsink named `sink`
    pub fn description(&self) -> String {
        let source = match self {
            CameraSource::PipeWire { target: Some(target) } => {
                format!("pipewiresrc target-object={}", target)
            }
            CameraSource::PipeWire { target: None } => "pipewiresrc".to_string(),
            CameraSource::V4l2 {
                device: Some(device),
            } => format!("v4l2src device={}", device),
            CameraSource::V4l2 { device: None } => "v4l2src".to_string(),
        };

        format!(
            "{} ! videoconvert ! video/x-raw,format=RGBA ! appsink name=sink",
            source
        )
    }
}

/// Running camera pipeline
pub struct CameraPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    source: CameraSource,
}

impl CameraPipeline {
    /// Build and start a pipeline delivering frames to `frame_sender`
    pub fn new(camera_path: Option<&str>, frame_sender: FrameSender) -> ScannerResult<Self> {
        gstreamer::init()?;

        let pipewire_available = gstreamer::ElementFactory::find("pipewiresrc").is_some();
        let source = CameraSource::select(camera_path, pipewire_available);
        let description = source.description();
        info!(?source, pipeline = %description, "Creating camera pipeline");

        let pipeline = gstreamer::parse::launch(&description)?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                ScannerError::DeviceUnavailable("Failed to cast to pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| ScannerError::DeviceUnavailable("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| ScannerError::DeviceUnavailable("Failed to cast appsink".to_string()))?;

        appsink.set_property("emit-signals", true);
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", capture::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_start = Instant::now();
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                    let log_frame = frame_num % capture::FRAME_LOG_INTERVAL == 0;

                    let sample = appsink.pull_sample().map_err(|e| {
                        if log_frame {
                            error!(frame = frame_num, error = ?e, "Failed to pull sample");
                        }
                        gstreamer::FlowError::Eos
                    })?;

                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                        if log_frame {
                            warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
                        }
                        return Ok(gstreamer::FlowSuccess::Ok);
                    }

                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                        if log_frame {
                            error!(frame = frame_num, error = ?e, "Failed to get video info");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: Arc::from(map.as_slice()),
                        captured_at: frame_start,
                    };

                    let mut sender = frame_sender.clone();
                    match sender.try_send(frame) {
                        Ok(_) => {
                            if log_frame {
                                debug!(
                                    frame = frame_num,
                                    width = video_info.width(),
                                    height = video_info.height(),
                                    total_us = frame_start.elapsed().as_micros(),
                                    "Frame delivered"
                                );
                            }
                        }
                        Err(e) if e.is_disconnected() => return Err(gstreamer::FlowError::Eos),
                        Err(_) => {
                            if log_frame {
                                debug!(frame = frame_num, "Frame dropped (channel full)");
                            }
                        }
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        let camera = Self {
            pipeline,
            appsink,
            source,
        };

        // Errors raised while starting (missing device, refused access) are
        // only detailed on the bus.
        if let Err(e) = camera.pipeline.set_state(gstreamer::State::Playing) {
            return Err(camera.poll_error().unwrap_or_else(|| {
                ScannerError::DeviceUnavailable(format!("Failed to start pipeline: {}", e))
            }));
        }

        let (result, state, pending) = camera.pipeline.state(gstreamer::ClockTime::from_nseconds(
            capture::START_TIMEOUT.as_nanos() as u64,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if let Some(err) = camera.poll_error() {
            return Err(err);
        }
        if state != gstreamer::State::Playing {
            warn!("Pipeline is not in PLAYING state");
        }

        info!("Camera pipeline started");
        Ok(camera)
    }

    pub fn source(&self) -> &CameraSource {
        &self.source
    }

    /// Pop the first pending error from the pipeline bus
    pub fn poll_error(&self) -> Option<ScannerError> {
        let bus = self.pipeline.bus()?;

        while let Some(msg) = bus.pop_filtered(&[gstreamer::MessageType::Error]) {
            if let gstreamer::MessageView::Error(err) = msg.view() {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "Camera pipeline error"
                );
                return Some(ScannerError::from(err.error()));
            }
        }

        None
    }

    fn shutdown(&self) {
        info!("Stopping camera pipeline");

        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop pipeline");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_nseconds(
            capture::STOP_TIMEOUT.as_nanos() as u64,
        ));
        match result {
            Ok(_) => info!(state = ?state, "Camera pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
    }
}

impl Drop for CameraPipeline {
    /// Dropping the pipeline releases the camera
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_node_uses_v4l2() {
        assert_eq!(
            CameraSource::select(Some("/dev/video2"), true),
            CameraSource::V4l2 {
                device: Some("/dev/video2".to_string())
            }
        );
    }

    #[test]
    fn test_pipewire_preferred() {
        assert_eq!(
            CameraSource::select(None, true),
            CameraSource::PipeWire { target: None }
        );
        assert_eq!(
            CameraSource::select(Some("42"), true),
            CameraSource::PipeWire {
                target: Some("42".to_string())
            }
        );
        assert_eq!(
            CameraSource::select(Some("42"), false),
            CameraSource::V4l2 { device: None }
        );
    }

    #[test]
    fn test_description_ends_in_rgba_appsink() {
        let description = CameraSource::V4l2 {
            device: Some("/dev/video0".to_string()),
        }
        .description();
        assert_eq!(
            description,
            "v4l2src device=/dev/video0 ! videoconvert ! video/x-raw,format=RGBA ! appsink name=sink"
        );
    }
}
