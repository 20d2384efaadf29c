// SPDX-License-Identifier: GPL-3.0-only

//! Scanning state machine
//!
//! [`BarcodeScanner`] is the single writer of the scan state. Every input
//! (decoded codes, session errors, authorization changes, resets and timer
//! callbacks) goes through one of its methods, which update the overlay
//! appearance synchronously and return the timer requests the host must
//! schedule.

use super::animation::{AnimationKind, LoadingAnimation};
use super::delegate::{
    CaptureDecision, CodeDelegate, Delegates, DismissalDelegate, ErrorDelegate,
};
use super::display::{OverlayAppearance, render};
use super::state::ScanState;
use super::timers::TimerRequest;
use crate::capture::{AuthorizationStatus, CapturedCode};
use crate::config::ScannerConfig;
use crate::errors::ScannerError;
use tracing::{debug, info, warn};

/// Barcode scanner controller
#[derive(Debug)]
pub struct BarcodeScanner {
    config: ScannerConfig,
    state: ScanState,
    appearance: OverlayAppearance,
    animation: LoadingAnimation,
    /// Text substituted for the current not-found cycle
    not_found_text: Option<String>,
    /// Incremented each time the not-found state is entered
    not_found_cycle: u64,
    authorization: AuthorizationStatus,
    delegates: Delegates,
}

impl BarcodeScanner {
    pub fn new(config: ScannerConfig) -> Self {
        let state = ScanState::default();
        let appearance = render(state, &config.display, None);

        Self {
            config,
            state,
            appearance,
            animation: LoadingAnimation::new(),
            not_found_text: None,
            not_found_cycle: 0,
            authorization: AuthorizationStatus::NotDetermined,
            delegates: Delegates::default(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Overlay for the current state
    pub fn appearance(&self) -> &OverlayAppearance {
        &self.appearance
    }

    pub fn animation(&self) -> &LoadingAnimation {
        &self.animation
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Last reported camera authorization
    pub fn authorization(&self) -> AuthorizationStatus {
        self.authorization
    }

    pub fn set_code_delegate(&mut self, delegate: impl CodeDelegate + 'static) {
        self.delegates.code = Some(Box::new(delegate));
    }

    pub fn set_error_delegate(&mut self, delegate: impl ErrorDelegate + 'static) {
        self.delegates.error = Some(Box::new(delegate));
    }

    pub fn set_dismissal_delegate(&mut self, delegate: impl DismissalDelegate + 'static) {
        self.delegates.dismissal = Some(Box::new(delegate));
    }

    pub fn delegates_mut(&mut self) -> &mut Delegates {
        &mut self.delegates
    }

    /// Whether a decoded code would be accepted right now
    pub fn accepts_captures(&self) -> bool {
        match self.state {
            ScanState::Scanning => true,
            ScanState::NotFound => !self.config.one_time_search,
            ScanState::Processing | ScanState::Unauthorized => false,
        }
    }

    /// Move to `state`
    ///
    /// Setting the current state again re-runs the update without side
    /// effects beyond it: running animation chains are not started twice.
    pub fn set_state(&mut self, state: ScanState) -> Vec<TimerRequest> {
        self.transition(state, None)
    }

    fn transition(&mut self, state: ScanState, not_found_text: Option<String>) -> Vec<TimerRequest> {
        if self.state != state {
            info!(from = %self.state, to = %state, "Scan state changed");
        }

        self.state = state;
        self.not_found_text = not_found_text;
        self.appearance = render(state, &self.config.display, self.not_found_text.as_deref());

        let mut timers = self.animation.start(state);

        if state == ScanState::NotFound {
            self.not_found_cycle += 1;
            if let Some(after) = self.config.not_found_timeout() {
                timers.push(TimerRequest::NotFoundExpiry {
                    cycle: self.not_found_cycle,
                    after,
                });
            }
        }

        timers
    }

    /// Go back to scanning
    pub fn reset(&mut self) -> Vec<TimerRequest> {
        self.transition(ScanState::Scanning, None)
    }

    /// Show the not-found state
    ///
    /// `text` replaces the configured message for this cycle only; `None`
    /// shows the configured message.
    pub fn reset_with_error(&mut self, text: Option<String>) -> Vec<TimerRequest> {
        debug!(custom_text = text.is_some(), "Reset with error");
        self.transition(ScanState::NotFound, text)
    }

    /// Feed back a due timer request
    pub fn on_timer(&mut self, request: TimerRequest) -> Vec<TimerRequest> {
        match request {
            TimerRequest::AnimationStep { kind, .. } => self.on_animation_tick(kind),
            TimerRequest::NotFoundExpiry { cycle, .. } => self.on_not_found_expired(cycle),
        }
    }

    /// Complete one animation step
    pub fn on_animation_tick(&mut self, kind: AnimationKind) -> Vec<TimerRequest> {
        self.animation.step(kind, self.state).into_iter().collect()
    }

    /// Revert to scanning if `cycle` is still the current not-found cycle
    pub fn on_not_found_expired(&mut self, cycle: u64) -> Vec<TimerRequest> {
        if self.state == ScanState::NotFound && cycle == self.not_found_cycle {
            debug!(cycle, "Not-found message expired");
            self.reset()
        } else {
            Vec::new()
        }
    }

    /// Handle a code decoded by the capture session
    pub fn on_code_captured(&mut self, code: CapturedCode) -> Vec<TimerRequest> {
        let mut timers = Vec::new();

        if self.state == ScanState::NotFound && !self.config.one_time_search {
            timers.extend(self.reset());
        }

        if self.state != ScanState::Scanning {
            debug!(state = %self.state, "Ignoring captured code");
            return timers;
        }

        if !self.config.symbologies.contains(&code.symbology) {
            debug!(symbology = %code.symbology, "Ignoring code of unrequested symbology");
            return timers;
        }

        info!(symbology = %code.symbology, len = code.payload.len(), "Code captured");
        timers.extend(self.set_state(ScanState::Processing));

        let decision = self.delegates.capture(&code);
        debug!(?decision, "Capture decision");

        match decision {
            Some(CaptureDecision::Resume) => timers.extend(self.reset()),
            Some(CaptureDecision::NotFound(text)) => timers.extend(self.reset_with_error(text)),
            Some(CaptureDecision::Dismiss) => self.request_dismiss(),
            Some(CaptureDecision::Hold) | None => {
                if !self.config.one_time_search {
                    timers.extend(self.reset());
                }
            }
        }

        timers
    }

    /// Handle an error from the capture session
    pub fn on_session_error(&mut self, error: ScannerError) -> Vec<TimerRequest> {
        warn!(error = %error, "Capture session error");
        self.delegates.error(&error);

        if error.is_permission_error() {
            self.set_state(ScanState::Unauthorized)
        } else {
            Vec::new()
        }
    }

    /// Handle a camera authorization result
    pub fn on_authorization_changed(&mut self, status: AuthorizationStatus) -> Vec<TimerRequest> {
        info!(?status, "Camera authorization");
        self.authorization = status;

        if status.is_refused() {
            self.delegates.error(&ScannerError::PermissionDenied);
            self.set_state(ScanState::Unauthorized)
        } else {
            Vec::new()
        }
    }

    /// Handle the application returning to the foreground
    ///
    /// `status` is the freshly re-checked authorization.
    pub fn on_foreground(&mut self, status: AuthorizationStatus) -> Vec<TimerRequest> {
        match (self.state, status) {
            (ScanState::Unauthorized, AuthorizationStatus::Granted) => {
                info!("Camera access granted, resuming scan");
                self.authorization = status;
                self.reset()
            }
            (ScanState::Unauthorized, _) => {
                self.authorization = status;
                Vec::new()
            }
            _ if status.is_refused() => self.on_authorization_changed(status),
            _ => {
                self.authorization = status;
                Vec::new()
            }
        }
    }

    /// Forward a close request to the dismissal delegate
    pub fn request_dismiss(&mut self) {
        debug!("Dismiss requested");
        self.delegates.dismiss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Symbology;
    use crate::scanner::delegate::{DelegateEvent, EventQueue};
    use crate::scanner::state::OverlayLayout;

    fn qr(payload: &str) -> CapturedCode {
        CapturedCode::new(payload, Symbology::Qr)
    }

    fn scanner_with(decision: CaptureDecision, one_time_search: bool) -> (BarcodeScanner, EventQueue) {
        let config = ScannerConfig {
            one_time_search,
            ..ScannerConfig::default()
        };
        let mut scanner = BarcodeScanner::new(config);
        let queue = EventQueue::with_decision(decision);
        queue.install(scanner.delegates_mut());
        (scanner, queue)
    }

    #[test]
    fn test_initial_state() {
        let scanner = BarcodeScanner::new(ScannerConfig::default());
        assert_eq!(scanner.state(), ScanState::Scanning);
        assert!(scanner.accepts_captures());
        assert_eq!(scanner.appearance().layout, OverlayLayout::Collapsed);
    }

    #[test]
    fn test_processing_twice_starts_one_chain_each() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());
        let first = scanner.set_state(ScanState::Processing);
        let second = scanner.set_state(ScanState::Processing);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert!(scanner.appearance().border_visible);
    }

    #[test]
    fn test_leaving_processing_before_step_ends_chains() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());
        let timers = scanner.set_state(ScanState::Processing);
        scanner.set_state(ScanState::Scanning);

        for timer in timers {
            assert!(scanner.on_timer(timer).is_empty());
        }
        assert_eq!(scanner.animation().quarter_turns(), 0);
    }

    #[test]
    fn test_animation_continues_while_processing() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());
        let timers = scanner.set_state(ScanState::Processing);

        for timer in timers {
            assert_eq!(scanner.on_timer(timer).len(), 1);
        }
    }

    #[test]
    fn test_reset_with_error_text() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());

        scanner.reset_with_error(Some("X".to_string()));
        assert_eq!(scanner.state(), ScanState::NotFound);
        assert_eq!(scanner.appearance().text, "X");

        scanner.reset_with_error(None);
        let expected = scanner.config().display.not_found.text.clone();
        assert_eq!(scanner.appearance().text, expected);
    }

    #[test]
    fn test_custom_text_lasts_one_cycle() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());
        scanner.reset_with_error(Some("X".to_string()));
        scanner.reset();
        scanner.set_state(ScanState::NotFound);
        assert_ne!(scanner.appearance().text, "X");
    }

    #[test]
    fn test_not_found_expiry_only_for_its_cycle() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());

        let first = scanner.reset_with_error(None);
        let second = scanner.reset_with_error(None);
        assert_eq!(first.len(), 1);

        // The first cycle's timer is stale
        for timer in first {
            scanner.on_timer(timer);
        }
        assert_eq!(scanner.state(), ScanState::NotFound);

        for timer in second {
            scanner.on_timer(timer);
        }
        assert_eq!(scanner.state(), ScanState::Scanning);
    }

    #[test]
    fn test_not_found_timeout_disabled() {
        let config = ScannerConfig {
            not_found_timeout_ms: None,
            ..ScannerConfig::default()
        };
        let mut scanner = BarcodeScanner::new(config);
        assert!(scanner.reset_with_error(None).is_empty());
    }

    #[test]
    fn test_one_time_search_holds_until_reset() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::Hold, true);

        scanner.on_code_captured(qr("first"));
        assert_eq!(scanner.state(), ScanState::Processing);
        assert!(!scanner.accepts_captures());

        scanner.on_code_captured(qr("second"));
        assert_eq!(queue.drain(), vec![DelegateEvent::Captured(qr("first"))]);

        scanner.reset();
        scanner.on_code_captured(qr("third"));
        assert_eq!(queue.drain(), vec![DelegateEvent::Captured(qr("third"))]);
    }

    #[test]
    fn test_continuous_search_accepts_after_cycle() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::Hold, false);

        scanner.on_code_captured(qr("first"));
        assert_eq!(scanner.state(), ScanState::Scanning);
        scanner.on_code_captured(qr("second"));

        assert_eq!(queue.drain().len(), 2);
    }

    #[test]
    fn test_continuous_search_leaves_not_found_on_capture() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::NotFound(None), false);

        scanner.on_code_captured(qr("first"));
        assert_eq!(scanner.state(), ScanState::NotFound);
        assert!(scanner.accepts_captures());

        scanner.on_code_captured(qr("second"));
        assert_eq!(scanner.state(), ScanState::NotFound);
        assert_eq!(queue.drain().len(), 2);
    }

    #[test]
    fn test_one_time_search_ignores_codes_in_not_found() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::NotFound(Some("nope".into())), true);

        scanner.on_code_captured(qr("first"));
        assert_eq!(scanner.appearance().text, "nope");
        scanner.on_code_captured(qr("second"));

        assert_eq!(queue.drain().len(), 1);
        assert_eq!(scanner.state(), ScanState::NotFound);
    }

    #[test]
    fn test_dismiss_decision_notifies_dismissal() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::Dismiss, true);
        scanner.on_code_captured(qr("bye"));
        assert_eq!(
            queue.drain(),
            vec![
                DelegateEvent::Captured(qr("bye")),
                DelegateEvent::DismissRequested
            ]
        );
    }

    #[test]
    fn test_unrequested_symbology_is_ignored() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::Hold, true);
        scanner.on_code_captured(CapturedCode::new("123", Symbology::Code128));
        assert_eq!(scanner.state(), ScanState::Scanning);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_denied_authorization() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::Hold, true);
        scanner.on_authorization_changed(AuthorizationStatus::Denied);

        assert_eq!(scanner.state(), ScanState::Unauthorized);
        assert_eq!(scanner.appearance().layout, OverlayLayout::Collapsed);
        assert_eq!(
            scanner.appearance().text,
            scanner.config().display.unauthorized.text
        );
        assert_eq!(
            queue.drain(),
            vec![DelegateEvent::Error(ScannerError::PermissionDenied)]
        );
    }

    #[test]
    fn test_granted_is_recorded_only() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());
        scanner.set_state(ScanState::Unauthorized);
        scanner.on_authorization_changed(AuthorizationStatus::Granted);
        assert_eq!(scanner.state(), ScanState::Unauthorized);
        assert_eq!(scanner.authorization(), AuthorizationStatus::Granted);
    }

    #[test]
    fn test_foreground_recovers_from_unauthorized() {
        let mut scanner = BarcodeScanner::new(ScannerConfig::default());
        scanner.on_authorization_changed(AuthorizationStatus::Denied);

        scanner.on_foreground(AuthorizationStatus::Denied);
        assert_eq!(scanner.state(), ScanState::Unauthorized);

        scanner.on_foreground(AuthorizationStatus::Granted);
        assert_eq!(scanner.state(), ScanState::Scanning);
    }

    #[test]
    fn test_session_errors() {
        let (mut scanner, queue) = scanner_with(CaptureDecision::Hold, true);

        scanner.on_session_error(ScannerError::DeviceUnavailable("gone".into()));
        assert_eq!(scanner.state(), ScanState::Scanning);

        scanner.on_session_error(ScannerError::PermissionDenied);
        assert_eq!(scanner.state(), ScanState::Unauthorized);
        assert_eq!(queue.drain().len(), 2);
    }
}
