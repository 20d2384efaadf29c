// SPDX-License-Identifier: MPL-2.0

//! Error types for the barcode scanner
//!
//! None of these errors is fatal: every one of them is recoverable by
//! returning to the scanning state, either explicitly or automatically.

use std::fmt;

/// Result type alias using ScannerError
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Scanner error taxonomy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerError {
    /// Camera access was refused by the user or the sandbox
    PermissionDenied,
    /// No usable camera, or the capture session failed
    DeviceUnavailable(String),
    /// Nothing usable was found for a captured code (host driven)
    DecodeFailed(Option<String>),
    /// A requested feature or option cannot be honored
    ConfigurationInvalid(String),
}

impl ScannerError {
    /// Whether this error should move the scanner to the unauthorized state
    pub fn is_permission_error(&self) -> bool {
        matches!(self, ScannerError::PermissionDenied)
    }
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::PermissionDenied => write!(f, "Camera permission denied"),
            ScannerError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            ScannerError::DecodeFailed(Some(msg)) => write!(f, "Decode failed: {}", msg),
            ScannerError::DecodeFailed(None) => write!(f, "Decode failed"),
            ScannerError::ConfigurationInvalid(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScannerError {}

impl From<std::io::Error> for ScannerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScannerError::PermissionDenied,
            _ => ScannerError::DeviceUnavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::ConfigurationInvalid(err.to_string())
    }
}

impl From<gstreamer::glib::Error> for ScannerError {
    fn from(err: gstreamer::glib::Error) -> Self {
        if err.matches(gstreamer::ResourceError::NotAuthorized) {
            ScannerError::PermissionDenied
        } else {
            ScannerError::DeviceUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_permission_maps_to_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(ScannerError::from(err), ScannerError::PermissionDenied);
    }

    #[test]
    fn test_io_not_found_maps_to_device_unavailable() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such device");
        assert!(matches!(
            ScannerError::from(err),
            ScannerError::DeviceUnavailable(_)
        ));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ScannerError::DecodeFailed(None).to_string(),
            "Decode failed"
        );
        assert_eq!(
            ScannerError::ConfigurationInvalid("torch".to_string()).to_string(),
            "Invalid configuration: torch"
        );
        assert!(ScannerError::PermissionDenied.is_permission_error());
        assert!(!ScannerError::DeviceUnavailable(String::new()).is_permission_error());
    }
}
