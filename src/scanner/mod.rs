// SPDX-License-Identifier: GPL-3.0-only

//! Scanning state machine and its presentation
//!
//! This module owns everything between the camera session and the view:
//!
//! - [`state`]: the scan states and their overlay layout
//! - [`display`]: the pure state to overlay mapping
//! - [`animation`]: the guarded loading animation chains
//! - [`delegate`]: optional host observers
//! - [`controller`]: the [`BarcodeScanner`] that ties them together
//! - [`timers`]: deferred callbacks for hosts without their own timer loop

pub mod animation;
pub mod controller;
pub mod delegate;
pub mod display;
pub mod state;
pub mod timers;

pub use animation::{AnimationKind, BlurIntensity, LoadingAnimation};
pub use controller::BarcodeScanner;
pub use delegate::{
    CaptureDecision, CodeDelegate, DelegateEvent, Delegates, DismissalDelegate, ErrorDelegate,
    EventQueue,
};
pub use display::{
    DisplayConfig, FontSpec, FontWeight, OverlayAppearance, Rgba, StateStyle, TextAlignment,
    limit_lines, render,
};
pub use state::{OverlayLayout, ScanState};
pub use timers::{TimerRequest, schedule};
