// SPDX-License-Identifier: GPL-3.0-only

//! Outbound notifications to the host application
//!
//! Three independent observers may be attached to a scanner. Each is optional
//! and an unset observer turns the notification into a no-op. Closures with
//! the matching signature implement the traits directly.

use crate::capture::CapturedCode;
use crate::errors::ScannerError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the scanner should do after the host looked at a captured code
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureDecision {
    /// Go back to scanning right away
    Resume,
    /// Show the not-found message, optionally with custom text
    NotFound(Option<String>),
    /// Ask the host to close the scanner
    Dismiss,
    /// Stay in processing until the host resets
    #[default]
    Hold,
}

/// Receives decoded codes
pub trait CodeDelegate: Send {
    fn did_capture(&mut self, code: &CapturedCode) -> CaptureDecision;
}

/// Receives scanner errors
pub trait ErrorDelegate: Send {
    fn did_receive_error(&mut self, error: &ScannerError);
}

/// Receives close requests
pub trait DismissalDelegate: Send {
    fn did_request_dismiss(&mut self);
}

impl<F> CodeDelegate for F
where
    F: FnMut(&CapturedCode) -> CaptureDecision + Send,
{
    fn did_capture(&mut self, code: &CapturedCode) -> CaptureDecision {
        self(code)
    }
}

impl<F> ErrorDelegate for F
where
    F: FnMut(&ScannerError) + Send,
{
    fn did_receive_error(&mut self, error: &ScannerError) {
        self(error)
    }
}

impl<F> DismissalDelegate for F
where
    F: FnMut() + Send,
{
    fn did_request_dismiss(&mut self) {
        self()
    }
}

/// The optional delegates of one scanner
#[derive(Default)]
pub struct Delegates {
    pub code: Option<Box<dyn CodeDelegate>>,
    pub error: Option<Box<dyn ErrorDelegate>>,
    pub dismissal: Option<Box<dyn DismissalDelegate>>,
}

impl Delegates {
    /// Notify the code delegate, `None` when no delegate is set
    pub fn capture(&mut self, code: &CapturedCode) -> Option<CaptureDecision> {
        self.code.as_mut().map(|delegate| delegate.did_capture(code))
    }

    pub fn error(&mut self, error: &ScannerError) {
        if let Some(delegate) = self.error.as_mut() {
            delegate.did_receive_error(error);
        }
    }

    pub fn dismiss(&mut self) {
        if let Some(delegate) = self.dismissal.as_mut() {
            delegate.did_request_dismiss();
        }
    }
}

impl std::fmt::Debug for Delegates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegates")
            .field("code", &self.code.is_some())
            .field("error", &self.error.is_some())
            .field("dismissal", &self.dismissal.is_some())
            .finish()
    }
}

/// A delegate notification as recorded by [`EventQueue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateEvent {
    Captured(CapturedCode),
    Error(ScannerError),
    DismissRequested,
}

/// Delegate that records every notification for later draining
///
/// Clones share the same queue, so one clone can be installed as all three
/// delegates while the host keeps another to drain events after each call
/// into the scanner.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<VecDeque<DelegateEvent>>>,
    decision: CaptureDecision,
}

impl EventQueue {
    /// Record events and answer every capture with `decision`
    pub fn with_decision(decision: CaptureDecision) -> Self {
        Self {
            events: Arc::default(),
            decision,
        }
    }

    /// Install clones of this queue as all three delegates
    pub fn install(&self, delegates: &mut Delegates) {
        delegates.code = Some(Box::new(self.clone()));
        delegates.error = Some(Box::new(self.clone()));
        delegates.dismissal = Some(Box::new(self.clone()));
    }

    /// Take all recorded events in order
    pub fn drain(&self) -> Vec<DelegateEvent> {
        match self.events.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn push(&self, event: DelegateEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push_back(event);
        }
    }
}

impl CodeDelegate for EventQueue {
    fn did_capture(&mut self, code: &CapturedCode) -> CaptureDecision {
        self.push(DelegateEvent::Captured(code.clone()));
        self.decision.clone()
    }
}

impl ErrorDelegate for EventQueue {
    fn did_receive_error(&mut self, error: &ScannerError) {
        self.push(DelegateEvent::Error(error.clone()));
    }
}

impl DismissalDelegate for EventQueue {
    fn did_request_dismiss(&mut self) {
        self.push(DelegateEvent::DismissRequested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Symbology;

    #[test]
    fn test_unset_delegates_are_noops() {
        let mut delegates = Delegates::default();
        let code = CapturedCode::new("hello", Symbology::Qr);
        assert_eq!(delegates.capture(&code), None);
        delegates.error(&ScannerError::PermissionDenied);
        delegates.dismiss();
    }

    #[test]
    fn test_closure_delegates() {
        let mut delegates = Delegates::default();
        delegates.code = Some(Box::new(|code: &CapturedCode| {
            if code.payload == "ok" {
                CaptureDecision::Resume
            } else {
                CaptureDecision::NotFound(None)
            }
        }));

        let decision = delegates.capture(&CapturedCode::new("ok", Symbology::Qr));
        assert_eq!(decision, Some(CaptureDecision::Resume));
    }

    #[test]
    fn test_event_queue_records_in_order() {
        let queue = EventQueue::with_decision(CaptureDecision::Dismiss);
        let mut delegates = Delegates::default();
        queue.install(&mut delegates);

        let code = CapturedCode::new("abc", Symbology::Qr);
        assert_eq!(delegates.capture(&code), Some(CaptureDecision::Dismiss));
        delegates.error(&ScannerError::PermissionDenied);
        delegates.dismiss();

        assert_eq!(
            queue.drain(),
            vec![
                DelegateEvent::Captured(code),
                DelegateEvent::Error(ScannerError::PermissionDenied),
                DelegateEvent::DismissRequested,
            ]
        );
        assert!(queue.drain().is_empty());
    }
}
