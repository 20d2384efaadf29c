// SPDX-License-Identifier: GPL-3.0-only

//! Desktop barcode scanner application
//!
//! The application hosts a [`BarcodeScanner`](crate::scanner::BarcodeScanner):
//! camera session events, window focus changes and timers are turned into
//! messages and fed to the scanner, and the scanner's overlay is drawn on top
//! of the camera preview.
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message)
//! - `update`: Message handling
//! - `view`: Main view rendering
//! - `message_view`: Message overlay panel and loading border
//! - `preview`: Camera frame to image conversion

mod message_view;
mod preview;
mod state;
mod update;
mod view;

use crate::capture::{
    CaptureEvent, CodeDecoder, QrDecoder, ScanGate, SessionOptions, check_camera_access,
    run_session,
};
use crate::config::Config;
use crate::constants::capture;
use crate::fl;
use cosmic::cosmic_config::{self, CosmicConfigEntry};
use cosmic::iced::Subscription;
use cosmic::widget;
use cosmic::{ApplicationExt, Element, Task};
pub use state::{AppModel, Message};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info, warn};

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = "io.github.cosmic-utils.barcode-scanner";

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        // Load configuration
        let (config_handler, config) =
            match cosmic_config::Config::new(Self::APP_ID, Config::VERSION) {
                Ok(handler) => {
                    let config = match Config::get_entry(&handler) {
                        Ok(config) => config,
                        Err((errors, config)) => {
                            error!(?errors, "Errors loading config");
                            config
                        }
                    };
                    (Some(handler), config)
                }
                Err(err) => {
                    error!(%err, "Failed to create config handler");
                    (None, Config::default())
                }
            };

        let queue = AppModel::new_queue();
        let scanner = AppModel::build_scanner(&config, &queue);
        let title = scanner.config().title.clone();

        let mut app = AppModel {
            core,
            config,
            config_handler,
            scanner,
            scanner_generation: 0,
            awaiting_rescan: false,
            queue,
            gate: ScanGate::new(),
            decoder: Arc::new(QrDecoder::new()),
            preview: None,
            history: VecDeque::new(),
            camera_allowed: false,
            session_generation: 0,
        };

        app.set_header_title(title);

        let mut tasks = Vec::new();
        if let Some(id) = app.core.main_window_id() {
            tasks.push(app.set_window_title(fl!("app-title"), id));
        }

        info!("Checking camera access");
        tasks.push(Task::perform(check_camera_access(), |result| {
            cosmic::Action::App(Message::AuthorizationChecked(result))
        }));

        (app, Task::batch(tasks))
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        let mode_icon = if self.config.one_time_search {
            "media-playlist-consecutive-symbolic"
        } else {
            "media-playlist-repeat-symbolic"
        };

        vec![
            widget::button::icon(widget::icon::from_name(mode_icon))
                .on_press(Message::ToggleContinuous)
                .into(),
            widget::button::icon(widget::icon::from_name("window-close-symbolic"))
                .tooltip(fl!("close"))
                .on_press(Message::Close)
                .into(),
        ]
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        let focus_sub = cosmic::iced::event::listen_with(|event, _status, _id| match event {
            cosmic::iced::Event::Window(cosmic::iced::window::Event::Focused) => {
                Some(Message::WindowFocused)
            }
            _ => None,
        });

        let camera_sub = if self.camera_allowed {
            self.camera_subscription()
        } else {
            Subscription::none()
        };

        Subscription::batch([config_sub, focus_sub, camera_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}

impl AppModel {
    /// Camera session forwarding frames and captured codes
    ///
    /// Restarts when the camera, the mirroring or the session generation
    /// changes. Failed sessions are retried after a delay unless camera access
    /// was refused.
    fn camera_subscription(&self) -> Subscription<Message> {
        use cosmic::iced::futures::{SinkExt, StreamExt};

        let options = SessionOptions {
            camera_path: self.scanner.config().camera_path.clone(),
            symbologies: self.scanner.config().symbologies.clone(),
        };
        let decoder: Arc<dyn CodeDecoder> = self.decoder.clone();
        let gate = self.gate.clone();
        let mirrored = self.config.mirror_preview;

        Subscription::run_with_id(
            (
                "camera",
                options.camera_path.clone(),
                mirrored,
                self.session_generation,
            ),
            cosmic::iced::stream::channel(8, move |mut output| async move {
                info!(camera = ?options.camera_path, "Camera subscription started");

                loop {
                    let (event_tx, mut event_rx) = futures::channel::mpsc::channel(4);
                    let session = tokio::spawn(run_session(
                        options.clone(),
                        decoder.clone(),
                        gate.clone(),
                        event_tx,
                    ));

                    let mut refused = false;
                    while let Some(event) = event_rx.next().await {
                        let message = match event {
                            CaptureEvent::Frame(frame) => {
                                // Preview frames are dropped when the UI lags behind
                                let _ = output.try_send(Message::PreviewFrame(
                                    preview::frame_handle(&frame, mirrored),
                                ));
                                continue;
                            }
                            CaptureEvent::CodeCaptured(code) => Message::CodeCaptured(code),
                            CaptureEvent::SessionError(e) => {
                                refused = e.is_permission_error();
                                Message::SessionError(e)
                            }
                        };

                        if output.send(message).await.is_err() {
                            session.abort();
                            return;
                        }
                    }

                    if let Err(e) = session.await {
                        warn!(error = %e, "Camera session task failed");
                    }

                    if refused || output.is_closed() {
                        info!("Camera subscription stopped");
                        return;
                    }

                    warn!(delay = ?capture::RETRY_DELAY, "Camera session ended, retrying");
                    tokio::time::sleep(capture::RETRY_DELAY).await;
                }
            }),
        )
    }
}
