// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! Every message that concerns scanning is forwarded to the scanner. The
//! timer requests it returns become delayed tasks, and the delegate events it
//! recorded are drained afterwards by [`AppModel::sync_scanner`].

use crate::app::state::{AppModel, Message};
use crate::capture::{AuthorizationStatus, CapturedCode, check_camera_access};
use crate::config::Config;
use crate::constants::{host, ui};
use crate::errors::ScannerError;
use crate::scanner::{BarcodeScanner, DelegateEvent, ScanState, TimerRequest};
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use std::time::Duration;
use tracing::{debug, error, info, warn};

impl AppModel {
    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            Message::PreviewFrame(handle) => {
                self.preview = Some(handle);
                Task::none()
            }
            Message::CodeCaptured(code) => {
                let timers = self.scanner.on_code_captured(code);
                self.sync_scanner(timers)
            }
            Message::SessionError(error) => self.handle_session_error(error),
            Message::AuthorizationChecked(result) => self.handle_authorization_checked(result),
            Message::WindowFocused => Task::perform(check_camera_access(), |result| {
                cosmic::Action::App(Message::ForegroundChecked(result))
            }),
            Message::ForegroundChecked(result) => self.handle_foreground_checked(result),
            Message::Timer(generation, request) => {
                let timers =
                    deliver_timer(&mut self.scanner, self.scanner_generation, generation, request);
                self.sync_scanner(timers)
            }
            Message::ProcessingFinished(generation, code) => {
                self.handle_processing_finished(generation, code)
            }
            Message::ScanAgain => {
                info!("Scanning again");
                self.awaiting_rescan = false;
                let timers = self.scanner.reset();
                self.sync_scanner(timers)
            }
            Message::Close => {
                self.scanner.request_dismiss();
                self.sync_scanner(Vec::new())
            }
            Message::ToggleContinuous => self.handle_toggle_continuous(),
            Message::CopyCode(text) => {
                debug!(len = text.len(), "Copying captured code to clipboard");
                cosmic::iced::clipboard::write(text).map(|_: ()| cosmic::Action::App(Message::Noop))
            }
            Message::UpdateConfig(config) => self.handle_update_config(config),
            Message::Noop => Task::none(),
        }
    }

    /// Schedule scanner timers and act on recorded delegate events
    pub(crate) fn sync_scanner(&mut self, timers: Vec<TimerRequest>) -> Task<cosmic::Action<Message>> {
        let generation = self.scanner_generation;
        let mut tasks: Vec<_> = timers
            .into_iter()
            .map(|request| Self::delay_task(request.delay(), Message::Timer(generation, request)))
            .collect();

        for event in self.queue.drain() {
            match event {
                DelegateEvent::Captured(code) => {
                    if self.scanner.state() == ScanState::Processing {
                        tasks.push(Self::delay_task(
                            host::PROCESSING_HOLD,
                            Message::ProcessingFinished(generation, code),
                        ));
                    } else {
                        self.record_code(code);
                    }
                }
                DelegateEvent::Error(error) => {
                    warn!(%error, "Scanner reported an error");
                }
                DelegateEvent::DismissRequested => {
                    info!("Closing scanner window");
                    if let Some(id) = self.core.main_window_id() {
                        tasks.push(cosmic::iced::window::close(id));
                    }
                }
            }
        }

        if self.scanner.state() != ScanState::Processing {
            self.awaiting_rescan = false;
        }
        self.gate.set_open(self.scanner.accepts_captures());

        Task::batch(tasks)
    }

    /// Create a delayed task that sends a message after `delay`
    fn delay_task(delay: Duration, message: Message) -> Task<cosmic::Action<Message>> {
        Task::perform(
            async move {
                tokio::time::sleep(delay).await;
                message
            },
            cosmic::Action::App,
        )
    }

    /// Keep a captured code in the history list
    fn record_code(&mut self, code: CapturedCode) {
        self.history.retain(|existing| existing != &code);
        self.history.push_front(code);
        self.history.truncate(ui::HISTORY_LIMIT);
    }

    fn handle_session_error(&mut self, error: ScannerError) -> Task<cosmic::Action<Message>> {
        if error.is_permission_error() {
            self.camera_allowed = false;
            self.preview = None;
        }
        let timers = self.scanner.on_session_error(error);
        self.sync_scanner(timers)
    }

    fn handle_authorization_checked(
        &mut self,
        result: Result<AuthorizationStatus, ScannerError>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(status) => {
                self.camera_allowed = !status.is_refused();
                let timers = self.scanner.on_authorization_changed(status);
                self.sync_scanner(timers)
            }
            Err(error) => {
                // Still try the camera, the session reports its own failure
                self.camera_allowed = !error.is_permission_error();
                self.handle_session_error(error)
            }
        }
    }

    fn handle_foreground_checked(
        &mut self,
        result: Result<AuthorizationStatus, ScannerError>,
    ) -> Task<cosmic::Action<Message>> {
        let status = match result {
            Ok(status) => status,
            Err(error) => {
                debug!(%error, "Camera access re-check failed");
                return Task::none();
            }
        };

        let was_unauthorized = self.scanner.state() == ScanState::Unauthorized;
        let timers = self.scanner.on_foreground(status);

        if status.is_refused() {
            self.camera_allowed = false;
            self.preview = None;
        } else if was_unauthorized && self.scanner.state() == ScanState::Scanning {
            self.camera_allowed = true;
            self.session_generation += 1;
        }

        self.sync_scanner(timers)
    }

    fn handle_processing_finished(
        &mut self,
        generation: u64,
        code: CapturedCode,
    ) -> Task<cosmic::Action<Message>> {
        if generation != self.scanner_generation || self.scanner.state() != ScanState::Processing {
            return Task::none();
        }

        let timers = match hold_outcome(&code, self.scanner.config().one_time_search) {
            HoldOutcome::NotFound => self.scanner.reset_with_error(None),
            HoldOutcome::Resume => {
                self.record_code(code);
                self.scanner.reset()
            }
            HoldOutcome::AwaitRescan => {
                debug!("Holding captured code until the user scans again");
                self.record_code(code);
                self.awaiting_rescan = true;
                Vec::new()
            }
        };
        self.sync_scanner(timers)
    }

    fn handle_toggle_continuous(&mut self) -> Task<cosmic::Action<Message>> {
        self.config.one_time_search = !self.config.one_time_search;
        info!(one_time_search = self.config.one_time_search, "Scan mode changed");

        if let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, "Failed to save scan mode setting");
        }

        self.rebuild_scanner()
    }

    fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        if config == self.config {
            return Task::none();
        }
        info!("Configuration updated");
        self.config = config;
        self.rebuild_scanner()
    }

    /// Replace the scanner after a settings change, keeping the authorization
    fn rebuild_scanner(&mut self) -> Task<cosmic::Action<Message>> {
        let authorization = self.scanner.authorization();
        let was_unauthorized = self.scanner.state() == ScanState::Unauthorized;
        self.queue.drain();
        self.scanner = Self::build_scanner(&self.config, &self.queue);
        self.scanner_generation += 1;
        self.awaiting_rescan = false;

        let mut timers = self.scanner.on_authorization_changed(authorization);
        if was_unauthorized {
            timers.extend(self.scanner.set_state(ScanState::Unauthorized));
        }
        self.sync_scanner(timers)
    }
}

/// Feed a due timer to `scanner` unless it was requested by an earlier scanner
///
/// `generation` is the current scanner's, `requested_by` the one the timer
/// was scheduled for.
fn deliver_timer(
    scanner: &mut BarcodeScanner,
    generation: u64,
    requested_by: u64,
    request: TimerRequest,
) -> Vec<TimerRequest> {
    if requested_by != generation {
        debug!(?request, requested_by, generation, "Dropping timer of a replaced scanner");
        return Vec::new();
    }
    scanner.on_timer(request)
}

/// What follows once a held code has been shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoldOutcome {
    /// Record the code and scan on
    Resume,
    /// Nothing usable was captured
    NotFound,
    /// Record the code and stay put until the user scans again
    AwaitRescan,
}

fn hold_outcome(code: &CapturedCode, one_time_search: bool) -> HoldOutcome {
    if code.payload.trim().is_empty() {
        HoldOutcome::NotFound
    } else if one_time_search {
        HoldOutcome::AwaitRescan
    } else {
        HoldOutcome::Resume
    }
}
