// SPDX-License-Identifier: GPL-3.0-only

//! Message overlay rendering
//!
//! The overlay's look is a pure function of the scan state, the host supplied
//! [`DisplayConfig`] and the optional text substituted for the current
//! not-found cycle. Nothing else feeds into [`render`].

use super::state::{OverlayLayout, ScanState};
use crate::constants::overlay;
use crate::fl;
use serde::{Deserialize, Serialize};

/// An RGBA color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);
    pub const ALERT_RED: Rgba = Rgba::rgb(0.96, 0.26, 0.21);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Font weight of the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font used for the message text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub weight: FontWeight,
    pub size: f32,
}

impl FontSpec {
    pub const fn regular(size: f32) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }
}

/// Horizontal alignment of the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlignment {
    #[default]
    Start,
    Center,
}

/// Presentation of a single state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStyle {
    /// Message text
    pub text: String,
    /// Message font
    pub font: FontSpec,
    /// Message text color
    pub text_color: Rgba,
    /// Tint applied to the panel icon
    pub icon_tint: Rgba,
    /// Horizontal alignment of the message
    pub alignment: TextAlignment,
    /// Maximum number of displayed lines
    pub max_lines: usize,
    /// Whether the animated loading border is shown
    pub border_visible: bool,
}

impl StateStyle {
    fn collapsed(text: String) -> Self {
        Self {
            text,
            font: FontSpec::regular(overlay::REGULAR_FONT_SIZE),
            text_color: Rgba::BLACK,
            icon_tint: Rgba::BLACK,
            alignment: TextAlignment::Start,
            max_lines: overlay::COLLAPSED_MAX_LINES,
            border_visible: false,
        }
    }

    fn expanded(text: String) -> Self {
        Self {
            alignment: TextAlignment::Center,
            max_lines: overlay::EXPANDED_MAX_LINES,
            ..Self::collapsed(text)
        }
    }
}

/// Per-state presentation table supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub scanning: StateStyle,
    pub processing: StateStyle,
    pub unauthorized: StateStyle,
    pub not_found: StateStyle,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            scanning: StateStyle::collapsed(fl!("info-text")),
            unauthorized: StateStyle::collapsed(fl!("settings-prompt-text")),
            processing: StateStyle {
                border_visible: true,
                ..StateStyle::expanded(fl!("loading-text"))
            },
            not_found: StateStyle {
                font: FontSpec::bold(overlay::ERROR_FONT_SIZE),
                icon_tint: Rgba::ALERT_RED,
                ..StateStyle::expanded(fl!("not-found-text"))
            },
        }
    }
}

impl DisplayConfig {
    /// Style entry for a state
    pub fn style(&self, state: ScanState) -> &StateStyle {
        match state {
            ScanState::Scanning => &self.scanning,
            ScanState::Processing => &self.processing,
            ScanState::Unauthorized => &self.unauthorized,
            ScanState::NotFound => &self.not_found,
        }
    }
}

/// Everything the view needs to draw the message overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayAppearance {
    pub state: ScanState,
    /// Displayed text, already cut to `max_lines`
    pub text: String,
    pub font: FontSpec,
    pub text_color: Rgba,
    pub icon_tint: Rgba,
    pub alignment: TextAlignment,
    pub max_lines: usize,
    pub border_visible: bool,
    pub layout: OverlayLayout,
    /// The focus frame is only shown while scanning
    pub focus_visible: bool,
}

/// Compute the overlay for a state
///
/// `not_found_text` replaces the configured text while in
/// [`ScanState::NotFound`] and is ignored in every other state.
pub fn render(
    state: ScanState,
    config: &DisplayConfig,
    not_found_text: Option<&str>,
) -> OverlayAppearance {
    let style = config.style(state);

    let text = match (state, not_found_text) {
        (ScanState::NotFound, Some(custom)) => custom,
        _ => style.text.as_str(),
    };

    OverlayAppearance {
        state,
        text: limit_lines(text, style.max_lines),
        font: style.font,
        text_color: style.text_color,
        icon_tint: style.icon_tint,
        alignment: style.alignment,
        max_lines: style.max_lines,
        border_visible: style.border_visible,
        layout: state.layout(),
        focus_visible: state == ScanState::Scanning,
    }
}

/// Keep at most `max_lines` lines of `text`
///
/// A limit of zero means unlimited.
pub fn limit_lines(text: &str, max_lines: usize) -> String {
    if max_lines == 0 {
        return text.to_string();
    }
    text.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}
