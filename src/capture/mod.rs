// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture and code decoding
//!
//! The camera session feeds RGBA frames from a GStreamer pipeline to a
//! [`CodeDecoder`] and reports what it finds as [`CaptureEvent`]s. The
//! scanner state machine never touches frames directly.

pub mod authorization;
pub mod decoder;
pub mod pipeline;
pub mod session;

pub use authorization::{AuthorizationStatus, check_camera_access};
pub use decoder::{CodeDecoder, QrDecoder, decode_image};
pub use pipeline::{CameraPipeline, CameraSource};
pub use session::{SessionOptions, run_session};

use crate::errors::ScannerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Frame sender used by the pipeline callback
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Frame receiver used by the session loop
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// A single RGBA camera frame
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a frame from tightly packed RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Barcode symbologies a decoder may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbology {
    Qr,
    Aztec,
    DataMatrix,
    Pdf417,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code39,
    Code93,
    Code128,
    Itf14,
    Interleaved2of5,
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbology::Qr => "QR",
            Symbology::Aztec => "Aztec",
            Symbology::DataMatrix => "Data Matrix",
            Symbology::Pdf417 => "PDF417",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Code39 => "Code 39",
            Symbology::Code93 => "Code 93",
            Symbology::Code128 => "Code 128",
            Symbology::Itf14 => "ITF-14",
            Symbology::Interleaved2of5 => "Interleaved 2 of 5",
        };
        write!(f, "{}", name)
    }
}

/// A decoded code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedCode {
    pub payload: String,
    pub symbology: Symbology,
}

impl CapturedCode {
    /// Create a code as reported by a decoder
    ///
    /// EAN-13 codes with a leading zero are UPC-A codes and are reported as
    /// such, without the zero.
    pub fn new(payload: impl Into<String>, symbology: Symbology) -> Self {
        let payload = payload.into();

        match (symbology, payload.strip_prefix('0')) {
            (Symbology::Ean13, Some(upc)) if payload.len() == 13 => Self {
                payload: upc.to_string(),
                symbology: Symbology::UpcA,
            },
            _ => Self { payload, symbology },
        }
    }
}

/// Events emitted by a camera session
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A new preview frame
    Frame(CameraFrame),
    /// A code was decoded while the gate was open
    CodeCaptured(CapturedCode),
    /// The session failed
    SessionError(ScannerError),
}

/// At most one decoded code in flight
///
/// The session claims the gate before emitting a code. The host reopens it
/// once the scanner accepts codes again. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct ScanGate(Arc<AtomicBool>);

impl Default for ScanGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanGate {
    /// A new, open gate
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Close the gate if it is open, returning whether this call closed it
    pub fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn set_open(&self, open: bool) {
        self.0.store(open, Ordering::Release);
    }
}
