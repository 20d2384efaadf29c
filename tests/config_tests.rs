// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use barcode_scanner::capture::Symbology;
use barcode_scanner::config::{Config, ScannerConfig};
use barcode_scanner::errors::ScannerError;
use barcode_scanner::scanner::{FontSpec, Rgba};
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "barcode-scanner-config-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.mirror_preview, "Mirror preview should be enabled by default");
    assert!(config.one_time_search, "Scanning should stop after the first code");
    assert!(config.last_camera_path.is_none());
}

#[test]
fn test_scanner_config_save_load() {
    let dir = scratch_dir("roundtrip");
    let path = dir.join("nested").join("scanner.json");

    let mut config = ScannerConfig {
        one_time_search: false,
        not_found_timeout_ms: None,
        symbologies: vec![Symbology::Qr, Symbology::Ean13],
        camera_path: Some("/dev/video2".to_string()),
        title: "Scan ticket".to_string(),
        ..ScannerConfig::default()
    };
    config.display.not_found.text = "Unknown ticket".to_string();
    config.display.not_found.font = FontSpec::bold(20.0);
    config.display.scanning.text_color = Rgba::rgb(1.0, 1.0, 1.0);

    config.save(&path).unwrap();
    let loaded = ScannerConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_load_missing_file_is_invalid() {
    let dir = scratch_dir("missing");
    let result = ScannerConfig::load(&dir.join("absent.json"));
    assert!(matches!(result, Err(ScannerError::ConfigurationInvalid(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_load_malformed_json_is_invalid() {
    let dir = scratch_dir("malformed");
    let path = dir.join("scanner.json");
    std::fs::write(&path, "{ one_time_search: ").unwrap();

    let result = ScannerConfig::load_or_default(Some(&path));
    assert!(matches!(result, Err(ScannerError::ConfigurationInvalid(_))));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = scratch_dir("partial");
    let path = dir.join("scanner.json");
    std::fs::write(&path, r#"{ "camera_path": "/dev/video1" }"#).unwrap();

    let config = ScannerConfig::load(&path).unwrap();
    assert_eq!(config.camera_path.as_deref(), Some("/dev/video1"));
    assert!(config.one_time_search);
    assert_eq!(config.symbologies, vec![Symbology::Qr]);

    let _ = std::fs::remove_dir_all(&dir);
}
