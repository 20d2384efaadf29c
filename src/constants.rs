// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Loading animation timing
///
/// Each step waits for its delay, then animates for its duration. The next
/// step is scheduled once both have elapsed.
pub mod animation {
    use super::Duration;

    /// Delay before each blur pulse step
    pub const BLUR_PULSE_DELAY: Duration = Duration::from_millis(500);

    /// Duration of each blur pulse step
    pub const BLUR_PULSE_DURATION: Duration = Duration::from_millis(2000);

    /// Delay before each border rotation step
    pub const BORDER_ROTATION_DELAY: Duration = Duration::from_millis(500);

    /// Duration of each border rotation step
    pub const BORDER_ROTATION_DURATION: Duration = Duration::from_millis(800);

    /// Background alpha of the message panel at `Light` blur intensity
    pub const LIGHT_BLUR_ALPHA: f32 = 0.82;

    /// Background alpha of the message panel at `ExtraLight` blur intensity
    pub const EXTRA_LIGHT_BLUR_ALPHA: f32 = 0.95;
}

/// Message overlay defaults
pub mod overlay {
    /// Line limit while the overlay is collapsed
    pub const COLLAPSED_MAX_LINES: usize = 3;

    /// Line limit while the overlay is expanded
    pub const EXPANDED_MAX_LINES: usize = 10;

    /// Regular message font size
    pub const REGULAR_FONT_SIZE: f32 = 14.0;

    /// Not-found message font size
    pub const ERROR_FONT_SIZE: f32 = 16.0;
}

/// UI Constants
pub mod ui {
    /// Height of the collapsed (top banner) message panel
    pub const COLLAPSED_HEIGHT: f32 = 86.0;

    /// Width of the expanded (centered) message panel
    pub const EXPANDED_WIDTH: f32 = 280.0;

    /// Height of the expanded (centered) message panel
    pub const EXPANDED_HEIGHT: f32 = 220.0;

    /// Size of the square loading border drawn around the icon
    pub const LOADING_BORDER_SIZE: f32 = 64.0;

    /// Width of the loading border stroke
    pub const LOADING_BORDER_WIDTH: f32 = 2.0;

    /// Accent segment width of the loading border
    pub const LOADING_ACCENT_WIDTH: f32 = 4.0;

    /// Message panel icon size
    pub const ICON_SIZE: u16 = 32;

    /// Side of the focus frame shown while scanning
    pub const FOCUS_FRAME_SIZE: f32 = 240.0;

    /// Focus frame border width
    pub const FOCUS_FRAME_BORDER: f32 = 2.0;

    /// Focus frame corner radius
    pub const FOCUS_FRAME_RADIUS: f32 = 8.0;

    /// Message panel corner radius
    pub const PANEL_RADIUS: f32 = 12.0;

    /// Captured code list text size
    pub const HISTORY_TEXT_SIZE: u16 = 12;

    /// Maximum number of captured codes kept in the history list
    pub const HISTORY_LIMIT: usize = 20;
}

/// Capture session constants
pub mod capture {
    use super::Duration;

    /// Minimum interval between two decode attempts
    pub const DECODE_INTERVAL: Duration = Duration::from_millis(200);

    /// Frames are downscaled to this dimension before decoding
    pub const DECODE_MAX_DIMENSION: u32 = 640;

    /// Frame channel capacity between the pipeline and the session loop
    pub const FRAME_CHANNEL_SIZE: usize = 4;

    /// Maximum appsink queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT: Duration = Duration::from_secs(5);

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);

    /// Frame receive timeout, bounds how long cancellation checks wait
    pub const FRAME_POLL_TIMEOUT: Duration = Duration::from_millis(16);

    /// Delay before retrying a failed pipeline
    pub const RETRY_DELAY: Duration = Duration::from_secs(5);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Host application timing
pub mod host {
    use super::Duration;

    /// How long the host keeps a captured code in the processing state
    pub const PROCESSING_HOLD: Duration = Duration::from_millis(1500);
}
