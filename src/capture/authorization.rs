// SPDX-License-Identifier: MPL-2.0

//! Camera access checks
//!
//! Inside Flatpak the camera is reached through the XDG camera portal, which
//! asks the user for permission. Outside the sandbox, access is decided by
//! the permissions of the `/dev/video*` nodes.

use crate::errors::{ScannerError, ScannerResult};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Camera authorization as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Granted,
    Denied,
    Restricted,
}

impl AuthorizationStatus {
    /// Whether access is refused and the user has to act
    pub fn is_refused(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted
        )
    }

    /// Map an XDG portal request response code
    pub fn from_portal_response(response: u32) -> Self {
        match response {
            0 => AuthorizationStatus::Granted,
            1 => AuthorizationStatus::Denied,
            _ => AuthorizationStatus::Restricted,
        }
    }
}

/// Check whether the camera may be used
///
/// Errors are reported for a missing camera or an unreachable portal. A
/// refusal is a status, not an error.
pub async fn check_camera_access() -> ScannerResult<AuthorizationStatus> {
    let status = if Path::new("/.flatpak-info").exists() {
        request_portal_access().await?
    } else {
        check_device_nodes(Path::new("/dev"))?
    };

    info!(?status, "Camera access checked");
    Ok(status)
}

/// Ask the camera portal for access
async fn request_portal_access() -> ScannerResult<AuthorizationStatus> {
    let connection = zbus::Connection::session()
        .await
        .map_err(|e| portal_error("Failed to connect to session D-Bus", e))?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DESTINATION, PORTAL_PATH, CAMERA_INTERFACE)
        .await
        .map_err(|e| portal_error("Failed to create camera portal proxy", e))?;

    let present: bool = camera
        .get_property("IsCameraPresent")
        .await
        .map_err(|e| portal_error("Failed to query camera presence", e))?;
    if !present {
        return Err(ScannerError::DeviceUnavailable("No camera found".to_string()));
    }

    // Subscribe to the response before asking, the portal may answer at once
    let token = format!("barcode_scanner_{}", std::process::id());
    let sender = connection
        .unique_name()
        .map(|name| name.trim_start_matches(':').replace('.', "_"))
        .ok_or_else(|| ScannerError::DeviceUnavailable("No D-Bus unique name".to_string()))?;
    let request_path = format!("{}/request/{}/{}", PORTAL_PATH, sender, token);

    let request = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        request_path.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(|e| portal_error("Failed to create request proxy", e))?;
    let mut responses = request
        .receive_signal("Response")
        .await
        .map_err(|e| portal_error("Failed to subscribe to portal response", e))?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));
    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(|e| portal_error("AccessCamera failed", e))?;
    debug!(handle = %handle.as_str(), "Camera access requested");

    let message = responses.next().await.ok_or_else(|| {
        ScannerError::DeviceUnavailable("Camera portal closed without answer".to_string())
    })?;

    let (response, _results): (u32, HashMap<String, OwnedValue>) = message
        .body()
        .deserialize()
        .map_err(|e| portal_error("Malformed portal response", e))?;

    Ok(AuthorizationStatus::from_portal_response(response))
}

fn portal_error(context: &str, err: impl std::fmt::Display) -> ScannerError {
    warn!(error = %err, "{}", context);
    ScannerError::DeviceUnavailable(format!("{}: {}", context, err))
}

/// Check the V4L2 device nodes in `dev_dir`
///
/// Granted when any capture node opens, denied when every node refuses
/// access, and an error when there is no node at all.
pub fn check_device_nodes(dev_dir: &Path) -> ScannerResult<AuthorizationStatus> {
    let mut nodes: Vec<_> = std::fs::read_dir(dev_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("video"))
        })
        .collect();
    nodes.sort();

    if nodes.is_empty() {
        return Err(ScannerError::DeviceUnavailable("No camera found".to_string()));
    }

    let mut last_error = None;
    for node in &nodes {
        match std::fs::File::open(node) {
            Ok(_) => {
                debug!(node = %node.display(), "Camera node accessible");
                return Ok(AuthorizationStatus::Granted);
            }
            Err(e) => {
                debug!(node = %node.display(), error = %e, "Camera node not accessible");
                last_error = Some(ScannerError::from(e));
            }
        }
    }

    match last_error {
        Some(ScannerError::PermissionDenied) => Ok(AuthorizationStatus::Denied),
        Some(err) => Err(err),
        None => Ok(AuthorizationStatus::NotDetermined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("barcode-scanner-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_portal_response_codes() {
        assert_eq!(
            AuthorizationStatus::from_portal_response(0),
            AuthorizationStatus::Granted
        );
        assert_eq!(
            AuthorizationStatus::from_portal_response(1),
            AuthorizationStatus::Denied
        );
        assert!(AuthorizationStatus::from_portal_response(2).is_refused());
        assert!(!AuthorizationStatus::NotDetermined.is_refused());
    }

    #[test]
    fn test_no_nodes_is_unavailable() {
        let dir = scratch_dir("empty");
        std::fs::write(dir.join("null"), b"").unwrap();

        let result = check_device_nodes(&dir);
        assert!(matches!(result, Err(ScannerError::DeviceUnavailable(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_readable_node_is_granted() {
        let dir = scratch_dir("granted");
        std::fs::write(dir.join("video0"), b"").unwrap();

        assert_eq!(
            check_device_nodes(&dir).unwrap(),
            AuthorizationStatus::Granted
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
