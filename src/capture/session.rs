// SPDX-License-Identifier: GPL-3.0-only

//! Camera session loop
//!
//! Runs a [`CameraPipeline`], forwards every frame and samples frames for
//! decoding at a fixed interval while the [`ScanGate`] is open. Decoding runs
//! on the blocking pool so the loop keeps forwarding preview frames.

use super::{
    CameraFrame, CameraPipeline, CaptureEvent, CapturedCode, CodeDecoder, FrameReceiver,
    FrameSender, ScanGate, Symbology,
};
use crate::constants::capture;
use crate::errors::{ScannerError, ScannerResult};
use futures::SinkExt;
use futures::StreamExt;
use futures::channel::mpsc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a session captures
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Camera device path or PipeWire target, default camera when `None`
    pub camera_path: Option<String>,
    /// Symbologies that may claim the gate
    pub symbologies: Vec<Symbology>,
}

/// Run a camera session until the event receiver goes away or the camera fails
///
/// Failures are reported as [`CaptureEvent::SessionError`] before being
/// returned.
pub async fn run_session(
    options: SessionOptions,
    decoder: Arc<dyn CodeDecoder>,
    gate: ScanGate,
    mut events: mpsc::Sender<CaptureEvent>,
) -> ScannerResult<()> {
    let (frame_tx, mut frame_rx): (FrameSender, FrameReceiver) =
        mpsc::channel(capture::FRAME_CHANNEL_SIZE);

    let pipeline = match CameraPipeline::new(options.camera_path.as_deref(), frame_tx) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            let _ = events.send(CaptureEvent::SessionError(e.clone())).await;
            return Err(e);
        }
    };

    info!(source = ?pipeline.source(), "Camera session started");

    let mut last_decode: Option<Instant> = None;
    let mut decoding: Option<JoinHandle<Vec<CapturedCode>>> = None;

    let result = loop {
        if let Some(err) = pipeline.poll_error() {
            break Err(err);
        }

        match tokio::time::timeout(capture::FRAME_POLL_TIMEOUT, frame_rx.next()).await {
            Ok(Some(frame)) => {
                if decode_due(last_decode, &gate, decoding.is_some()) {
                    last_decode = Some(Instant::now());
                    decoding = Some(spawn_decode(decoder.clone(), frame.clone()));
                }

                if events.send(CaptureEvent::Frame(frame)).await.is_err() {
                    debug!("Event receiver dropped, ending session");
                    break Ok(());
                }
            }
            Ok(None) => {
                break Err(ScannerError::DeviceUnavailable(
                    "Camera stream ended".to_string(),
                ));
            }
            Err(_) => {}
        }

        if let Some(handle) = decoding.take_if(|handle| handle.is_finished()) {
            let codes = handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "Decode task failed");
                Vec::new()
            });

            if let Some(code) = select_code(codes, &options.symbologies)
                && gate.try_claim()
            {
                debug!(symbology = %code.symbology, "Emitting captured code");
                if events.send(CaptureEvent::CodeCaptured(code)).await.is_err() {
                    break Ok(());
                }
            }
        }
    };

    if let Err(e) = &result {
        let _ = events.send(CaptureEvent::SessionError(e.clone())).await;
    }

    info!("Camera session ended");
    result
}

/// Whether a new decode should start now
fn decode_due(last_decode: Option<Instant>, gate: &ScanGate, in_flight: bool) -> bool {
    !in_flight
        && gate.is_open()
        && last_decode.is_none_or(|at| at.elapsed() >= capture::DECODE_INTERVAL)
}

fn spawn_decode(decoder: Arc<dyn CodeDecoder>, frame: CameraFrame) -> JoinHandle<Vec<CapturedCode>> {
    tokio::task::spawn_blocking(move || decoder.decode(&frame))
}

/// First code of an accepted symbology
fn select_code(codes: Vec<CapturedCode>, symbologies: &[Symbology]) -> Option<CapturedCode> {
    codes
        .into_iter()
        .find(|code| symbologies.contains(&code.symbology))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_due_respects_gate_and_interval() {
        let gate = ScanGate::new();
        assert!(decode_due(None, &gate, false));
        assert!(!decode_due(None, &gate, true));
        assert!(!decode_due(Some(Instant::now()), &gate, false));

        gate.set_open(false);
        assert!(!decode_due(None, &gate, false));
    }

    #[test]
    fn test_select_code_filters_symbologies() {
        let codes = vec![
            CapturedCode::new("123", Symbology::Code128),
            CapturedCode::new("hello", Symbology::Qr),
        ];
        let code = select_code(codes.clone(), &[Symbology::Qr]);
        assert_eq!(code.map(|c| c.payload), Some("hello".to_string()));
        assert_eq!(select_code(codes, &[Symbology::Ean8]), None);
    }

    #[tokio::test]
    async fn test_spawn_decode_runs_decoder() {
        struct Fixed;
        impl CodeDecoder for Fixed {
            fn supported_symbologies(&self) -> &[Symbology] {
                &[Symbology::Qr]
            }
            fn decode(&self, _frame: &CameraFrame) -> Vec<CapturedCode> {
                vec![CapturedCode::new("fixed", Symbology::Qr)]
            }
        }

        let frame = CameraFrame::from_rgba(1, 1, vec![0; 4]);
        let codes = spawn_decode(Arc::new(Fixed), frame).await.unwrap();
        assert_eq!(codes[0].payload, "fixed");
    }
}
