// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for barcode scanning
//!
//! This module provides command-line functionality for:
//! - Decoding codes in image files
//! - Scanning codes from a camera without the GUI

use barcode_scanner::capture::{
    CaptureEvent, QrDecoder, ScanGate, SessionOptions, check_camera_access, decode_image,
    run_session,
};
use barcode_scanner::config::ScannerConfig;
use barcode_scanner::errors::ScannerError;
use barcode_scanner::scanner::{
    BarcodeScanner, CaptureDecision, DelegateEvent, EventQueue, ScanState, schedule,
};
use futures::StreamExt;
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::Arc;

/// Decode codes in image files
pub fn decode_images(images: Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = QrDecoder::new();
    let mut failed = 0;

    for path in &images {
        match decode_image(path, &decoder) {
            Ok(codes) if codes.is_empty() => {
                println!("{}: no code found", path.display());
            }
            Ok(codes) => {
                for code in codes {
                    println!("{}: [{}] {}", path.display(), code.symbology, code.payload);
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} images could not be read", failed, images.len()).into());
    }

    Ok(())
}

/// Scan codes from a camera until the first code, or until Ctrl+C when continuous
pub fn scan(
    camera: Option<String>,
    config_path: Option<PathBuf>,
    continuous: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = QrDecoder::new();

    let mut config = ScannerConfig::load_or_default(config_path.as_deref())?;
    if camera.is_some() {
        config.camera_path = camera;
    }
    if continuous {
        config.one_time_search = false;
    }
    let config = config.validate(&decoder)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_scan(config, Arc::new(decoder)))
}

async fn run_scan(
    config: ScannerConfig,
    decoder: Arc<QrDecoder>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = SessionOptions {
        camera_path: config.camera_path.clone(),
        symbologies: config.symbologies.clone(),
    };

    // Single capture ends the scan, continuous capture keeps going
    let decision = if config.one_time_search {
        CaptureDecision::Dismiss
    } else {
        CaptureDecision::Hold
    };
    let queue = EventQueue::with_decision(decision);
    let mut scanner = BarcodeScanner::new(config);
    queue.install(scanner.delegates_mut());

    eprintln!("{}", scanner.config().title);

    let (timer_tx, mut timer_rx) = tokio::sync::mpsc::unbounded_channel();

    match check_camera_access().await {
        Ok(status) => schedule(scanner.on_authorization_changed(status), &timer_tx),
        Err(e) => return Err(e.into()),
    }
    if scanner.state() == ScanState::Unauthorized {
        eprintln!("{}", scanner.appearance().text);
        return Err(ScannerError::PermissionDenied.into());
    }

    // Set up Ctrl+C handler
    let (stop_tx, mut stop_rx) = tokio::sync::mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let gate = ScanGate::new();
    let (event_tx, mut event_rx) = mpsc::channel(4);
    let session = tokio::spawn(run_session(options, decoder, gate.clone(), event_tx));

    let mut shown_state = None;
    let mut outcome: Result<(), Box<dyn std::error::Error>> = Ok(());

    loop {
        if shown_state != Some(scanner.state()) {
            shown_state = Some(scanner.state());
            eprintln!("{}", scanner.appearance().text);
        }

        tokio::select! {
            event = event_rx.next() => match event {
                Some(CaptureEvent::Frame(_)) => {}
                Some(CaptureEvent::CodeCaptured(code)) => {
                    println!("[{}] {}", code.symbology, code.payload);
                    schedule(scanner.on_code_captured(code), &timer_tx);
                }
                Some(CaptureEvent::SessionError(e)) => {
                    schedule(scanner.on_session_error(e.clone()), &timer_tx);
                    outcome = Err(e.into());
                    break;
                }
                None => break,
            },
            Some(request) = timer_rx.recv() => {
                schedule(scanner.on_timer(request), &timer_tx);
            }
            _ = stop_rx.recv() => {
                eprintln!("Stopping...");
                break;
            }
        }

        let dismissed = queue
            .drain()
            .into_iter()
            .any(|event| event == DelegateEvent::DismissRequested);
        if dismissed {
            break;
        }

        gate.set_open(scanner.accepts_captures());
    }

    session.abort();
    outcome
}
