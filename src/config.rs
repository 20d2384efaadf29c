// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! [`ScannerConfig`] is what a [`BarcodeScanner`](crate::scanner::BarcodeScanner)
//! is built from. The command line loads it from a JSON file; the desktop
//! application persists the user facing subset in [`Config`] through
//! cosmic-config and maps it into a `ScannerConfig`.

use crate::capture::{CodeDecoder, Symbology};
use crate::errors::{ScannerError, ScannerResult};
use crate::fl;
use crate::scanner::DisplayConfig;
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration directory name under the user config dir
const CONFIG_DIR: &str = "barcode-scanner";

/// Configuration file name
const CONFIG_FILE: &str = "scanner.json";

/// Default not-found timeout in milliseconds
pub const DEFAULT_NOT_FOUND_TIMEOUT_MS: u64 = 2000;

/// Everything a scanner is configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Per-state texts, fonts and colors
    pub display: DisplayConfig,
    /// Stop after the first capture until explicitly reset
    pub one_time_search: bool,
    /// Revert from not-found to scanning after this long, never when `None`
    pub not_found_timeout_ms: Option<u64>,
    /// Symbologies to report
    pub symbologies: Vec<Symbology>,
    /// Camera device path or PipeWire target, default camera when `None`
    pub camera_path: Option<String>,
    /// Title shown above the camera preview
    pub title: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            one_time_search: true,
            not_found_timeout_ms: Some(DEFAULT_NOT_FOUND_TIMEOUT_MS),
            symbologies: vec![Symbology::Qr],
            camera_path: None,
            title: fl!("scan-title"),
        }
    }
}

impl ScannerConfig {
    pub fn not_found_timeout(&self) -> Option<Duration> {
        self.not_found_timeout_ms.map(Duration::from_millis)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load a config file
    pub fn load(path: &Path) -> ScannerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ScannerError::ConfigurationInvalid(format!("{}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&contents)?;
        info!(path = %path.display(), "Loaded scanner config");
        Ok(config)
    }

    /// Load `path`, or the default file when `None`
    ///
    /// A missing default file yields the default config; an explicitly named
    /// file must exist.
    pub fn load_or_default(path: Option<&Path>) -> ScannerResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => {
                    debug!("No scanner config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Save as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ScannerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Saved scanner config");
        Ok(())
    }

    /// Check the requested symbologies against a decoder
    ///
    /// Unsupported symbologies are dropped from the returned config. It is an
    /// error when none is left.
    pub fn validate(mut self, decoder: &dyn CodeDecoder) -> ScannerResult<Self> {
        let supported = decoder.supported_symbologies();
        let (kept, dropped): (Vec<_>, Vec<_>) = self
            .symbologies
            .into_iter()
            .partition(|symbology| supported.contains(symbology));

        if !dropped.is_empty() {
            debug!(?dropped, "Ignoring unsupported symbologies");
        }

        if kept.is_empty() {
            return Err(ScannerError::ConfigurationInvalid(format!(
                "none of the requested symbologies is supported (supported: {})",
                supported
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        self.symbologies = kept;
        Ok(self)
    }
}

/// Desktop application settings persisted with cosmic-config
#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Last used camera device path
    pub last_camera_path: Option<String>,
    /// Stop after the first capture until the user scans again
    pub one_time_search: bool,
    /// Not-found message timeout, never reverts when `None`
    pub not_found_timeout_ms: Option<u64>,
    /// Mirror camera preview horizontally
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_camera_path: None,
            one_time_search: true,
            not_found_timeout_ms: Some(DEFAULT_NOT_FOUND_TIMEOUT_MS),
            mirror_preview: true,
        }
    }
}

impl Config {
    /// Scanner configuration for these settings
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            one_time_search: self.one_time_search,
            not_found_timeout_ms: self.not_found_timeout_ms,
            camera_path: self.last_camera_path.clone(),
            ..ScannerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::QrDecoder;

    #[test]
    fn test_defaults() {
        let config = ScannerConfig::default();
        assert!(config.one_time_search);
        assert_eq!(config.not_found_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.symbologies, vec![Symbology::Qr]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ScannerConfig =
            serde_json::from_str(r#"{ "one_time_search": false, "not_found_timeout_ms": null }"#)
                .unwrap();
        assert!(!config.one_time_search);
        assert_eq!(config.not_found_timeout(), None);
        assert_eq!(config.symbologies, vec![Symbology::Qr]);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_validate_drops_unsupported() {
        let config = ScannerConfig {
            symbologies: vec![Symbology::Ean13, Symbology::Qr],
            ..ScannerConfig::default()
        };
        let config = config.validate(&QrDecoder::new()).unwrap();
        assert_eq!(config.symbologies, vec![Symbology::Qr]);
    }

    #[test]
    fn test_validate_rejects_all_unsupported() {
        let config = ScannerConfig {
            symbologies: vec![Symbology::Code128],
            ..ScannerConfig::default()
        };
        assert!(matches!(
            config.validate(&QrDecoder::new()),
            Err(ScannerError::ConfigurationInvalid(_))
        ));
    }

    #[test]
    fn test_gui_config_maps_to_scanner_config() {
        let config = Config {
            last_camera_path: Some("/dev/video0".to_string()),
            one_time_search: false,
            not_found_timeout_ms: None,
            ..Config::default()
        };
        let scanner = config.scanner_config();
        assert!(!scanner.one_time_search);
        assert_eq!(scanner.camera_path.as_deref(), Some("/dev/video0"));
        assert_eq!(scanner.not_found_timeout(), None);
    }
}
