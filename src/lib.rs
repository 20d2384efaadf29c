// SPDX-License-Identifier: GPL-3.0-only

//! Barcode Scanner - A camera barcode scanner for the COSMIC desktop environment
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`scanner`]: The scanning state machine, overlay rendering and loading animation
//! - [`capture`]: Camera pipeline, authorization checks and code decoding
//! - [`app`]: Desktop application hosting a scanner
//! - [`config`]: Scanner and application configuration
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use barcode_scanner::config::ScannerConfig;
//! use barcode_scanner::scanner::{BarcodeScanner, ScanState};
//!
//! let mut scanner = BarcodeScanner::new(ScannerConfig::default());
//! scanner.set_code_delegate(|code: &barcode_scanner::capture::CapturedCode| {
//!     println!("{}", code.payload);
//!     barcode_scanner::scanner::CaptureDecision::Resume
//! });
//! assert_eq!(scanner.state(), ScanState::Scanning);
//! ```

pub mod app;
pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod scanner;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use capture::{CapturedCode, Symbology};
pub use config::{Config, ScannerConfig};
pub use errors::{ScannerError, ScannerResult};
pub use scanner::{BarcodeScanner, ScanState};
