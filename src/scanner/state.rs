// SPDX-License-Identifier: GPL-3.0-only

//! Scanning state machine states

use serde::{Deserialize, Serialize};

/// Scanning mode driving all visual presentation
///
/// Exactly one state is active at a time. Transitions are driven from the
/// outside (capture events, authorization checks, explicit resets); the state
/// itself carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanState {
    /// Camera is live and codes are accepted
    #[default]
    Scanning,
    /// A code was captured and the host is handling it
    Processing,
    /// Camera access was refused
    Unauthorized,
    /// The host reported that nothing was found for the last code
    NotFound,
}

impl ScanState {
    /// All states, for iteration in tests and UI tables
    pub const ALL: [ScanState; 4] = [
        ScanState::Scanning,
        ScanState::Processing,
        ScanState::Unauthorized,
        ScanState::NotFound,
    ];

    /// Overlay arrangement used by this state
    pub fn layout(&self) -> OverlayLayout {
        match self {
            ScanState::Scanning | ScanState::Unauthorized => OverlayLayout::Collapsed,
            ScanState::Processing | ScanState::NotFound => OverlayLayout::Expanded,
        }
    }

    /// Whether the loading animation runs in this state
    pub fn is_loading(&self) -> bool {
        matches!(self, ScanState::Processing)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Scanning => write!(f, "scanning"),
            ScanState::Processing => write!(f, "processing"),
            ScanState::Unauthorized => write!(f, "unauthorized"),
            ScanState::NotFound => write!(f, "not found"),
        }
    }
}

/// The two mutually exclusive overlay arrangements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayLayout {
    /// Top banner
    Collapsed,
    /// Centered panel
    Expanded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_per_state() {
        assert_eq!(ScanState::Scanning.layout(), OverlayLayout::Collapsed);
        assert_eq!(ScanState::Unauthorized.layout(), OverlayLayout::Collapsed);
        assert_eq!(ScanState::Processing.layout(), OverlayLayout::Expanded);
        assert_eq!(ScanState::NotFound.layout(), OverlayLayout::Expanded);
    }

    #[test]
    fn test_only_processing_is_loading() {
        let loading: Vec<_> = ScanState::ALL.iter().filter(|s| s.is_loading()).collect();
        assert_eq!(loading, vec![&ScanState::Processing]);
    }

    #[test]
    fn test_default_is_scanning() {
        assert_eq!(ScanState::default(), ScanState::Scanning);
    }
}
