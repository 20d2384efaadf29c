// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::capture::{AuthorizationStatus, CapturedCode, QrDecoder, ScanGate};
use crate::config::Config;
use crate::errors::ScannerError;
use crate::scanner::{BarcodeScanner, TimerRequest};
use crate::scanner::{CaptureDecision, EventQueue};
use cosmic::cosmic_config;
use cosmic::widget::image::Handle;
use std::collections::VecDeque;
use std::sync::Arc;

/// Main application state
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<cosmic_config::Config>,
    /// Scanning state machine
    pub scanner: BarcodeScanner,
    /// Bumped whenever `scanner` is replaced; timers of older scanners are dropped
    pub scanner_generation: u64,
    /// One-time search captured a code and waits for the user to scan again
    pub awaiting_rescan: bool,
    /// Delegate callbacks recorded by the scanner, drained after each update
    pub queue: EventQueue,
    /// Shared with the camera session, open while captures are accepted
    pub gate: ScanGate,
    pub decoder: Arc<QrDecoder>,
    /// Latest camera frame, already mirrored when configured
    pub preview: Option<Handle>,
    /// Captured codes, newest first
    pub history: VecDeque<CapturedCode>,
    /// The camera subscription only runs once access was granted
    pub camera_allowed: bool,
    /// Bumped to restart the camera subscription
    pub session_generation: u64,
}

impl AppModel {
    /// Scanner for the current settings with the event queue installed
    pub(crate) fn build_scanner(config: &Config, queue: &EventQueue) -> BarcodeScanner {
        let mut scanner = BarcodeScanner::new(config.scanner_config());
        queue.install(scanner.delegates_mut());
        scanner
    }

    /// Event queue used by the desktop application
    ///
    /// Captures are held in the processing state while the application shows
    /// them. [`Message::ProcessingFinished`] then resumes continuous scanning,
    /// while one-time search waits for [`Message::ScanAgain`].
    pub(crate) fn new_queue() -> EventQueue {
        EventQueue::with_decision(CaptureDecision::Hold)
    }
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    /// New camera frame for the preview
    PreviewFrame(Handle),
    /// A code was decoded by the camera session
    CodeCaptured(CapturedCode),
    /// The camera session failed
    SessionError(ScannerError),
    /// Result of the startup authorization check
    AuthorizationChecked(Result<AuthorizationStatus, ScannerError>),
    /// The main window gained focus
    WindowFocused,
    /// Result of the authorization re-check after gaining focus
    ForegroundChecked(Result<AuthorizationStatus, ScannerError>),
    /// A timer requested by the scanner of the given generation is due
    Timer(u64, TimerRequest),
    /// The processing hold for a code captured by the given scanner generation elapsed
    ProcessingFinished(u64, CapturedCode),
    /// Resume scanning after a one-time capture
    ScanAgain,
    /// Close button pressed
    Close,
    /// Toggle between one-time and continuous scanning
    ToggleContinuous,
    /// Copy a captured payload to the clipboard
    CopyCode(String),
    /// Update the configuration
    UpdateConfig(Config),
    /// No-op message for async tasks that don't need a response
    Noop,
}
