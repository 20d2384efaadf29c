// SPDX-License-Identifier: MPL-2.0

//! Message overlay panel
//!
//! Draws the scanner's [`OverlayAppearance`] either as a banner across the
//! top of the preview or as a centered panel. The processing state adds a
//! square border whose accent side advances with the loading animation.

use crate::app::state::{AppModel, Message};
use crate::constants::ui;
use crate::scanner::{FontWeight, OverlayLayout, Rgba, ScanState, TextAlignment};
use cosmic::iced::advanced::widget::Tree;
use cosmic::iced::advanced::{Layout, Widget, layout, mouse, renderer};
use cosmic::iced::alignment::{Horizontal, Vertical};
use cosmic::iced::{Background, Border, Color, Element, Length, Rectangle, Size};
use cosmic::widget;
use cosmic::{Renderer, Theme};

pub(crate) fn color(rgba: Rgba) -> Color {
    Color::from_rgba(rgba.r, rgba.g, rgba.b, rgba.a)
}

fn icon_name(state: ScanState) -> &'static str {
    match state {
        ScanState::Scanning => "camera-web-symbolic",
        ScanState::Processing => "content-loading-symbolic",
        ScanState::Unauthorized => "system-lock-screen-symbolic",
        ScanState::NotFound => "dialog-error-symbolic",
    }
}

impl AppModel {
    /// Message panel for the current scan state
    pub fn message_view(&self) -> cosmic::Element<'_, Message> {
        let appearance = self.scanner.appearance();
        let spacing = cosmic::theme::spacing();

        let font = match appearance.font.weight {
            FontWeight::Bold => cosmic::font::bold(),
            FontWeight::Regular => cosmic::font::default(),
        };
        let text_color = color(appearance.text_color);
        let text = widget::text(appearance.text.clone())
            .size(appearance.font.size)
            .font(font);
        let text = widget::container(text).style(move |_theme| widget::container::Style {
            text_color: Some(text_color),
            ..Default::default()
        });

        let icon_tint = color(appearance.icon_tint);
        let icon = widget::container(
            widget::icon::from_name(icon_name(appearance.state))
                .symbolic(true)
                .size(ui::ICON_SIZE)
                .icon(),
        )
        .style(move |_theme| widget::container::Style {
            text_color: Some(icon_tint),
            ..Default::default()
        });

        let icon: cosmic::Element<'_, Message> = if appearance.border_visible {
            cosmic::iced::widget::stack![
                LoadingBorder::new(self.scanner.animation().quarter_turns()),
                widget::container(icon)
                    .width(Length::Fixed(ui::LOADING_BORDER_SIZE))
                    .height(Length::Fixed(ui::LOADING_BORDER_SIZE))
                    .align_x(Horizontal::Center)
                    .align_y(Vertical::Center),
            ]
            .into()
        } else {
            icon.into()
        };

        let text_align = match appearance.alignment {
            TextAlignment::Start => Horizontal::Left,
            TextAlignment::Center => Horizontal::Center,
        };

        let alpha = self.scanner.animation().blur().alpha();
        let panel_style = move |_theme: &Theme| widget::container::Style {
            background: Some(Background::Color(Color::from_rgba(1.0, 1.0, 1.0, alpha))),
            border: Border {
                radius: ui::PANEL_RADIUS.into(),
                ..Default::default()
            },
            ..Default::default()
        };

        match appearance.layout {
            OverlayLayout::Collapsed => {
                let content = widget::row()
                    .push(icon)
                    .push(
                        widget::container(text)
                            .width(Length::Fill)
                            .align_x(text_align),
                    )
                    .spacing(spacing.space_s)
                    .align_y(cosmic::iced::Alignment::Center);

                widget::container(content)
                    .width(Length::Fill)
                    .height(Length::Fixed(ui::COLLAPSED_HEIGHT))
                    .padding(spacing.space_s)
                    .align_y(Vertical::Center)
                    .style(panel_style)
                    .into()
            }
            OverlayLayout::Expanded => {
                let content = widget::column()
                    .push(icon)
                    .push(
                        widget::container(text)
                            .width(Length::Fill)
                            .align_x(text_align),
                    )
                    .spacing(spacing.space_s)
                    .align_x(cosmic::iced::Alignment::Center);

                widget::container(content)
                    .width(Length::Fixed(ui::EXPANDED_WIDTH))
                    .height(Length::Fixed(ui::EXPANDED_HEIGHT))
                    .padding(spacing.space_m)
                    .align_x(Horizontal::Center)
                    .align_y(Vertical::Center)
                    .style(panel_style)
                    .into()
            }
        }
    }
}

/// Square border around the processing icon with one accented side
pub struct LoadingBorder {
    quarter_turns: u8,
}

impl LoadingBorder {
    pub fn new(quarter_turns: u8) -> Self {
        Self { quarter_turns }
    }
}

/// Accented side of the border: top, right, bottom, left
fn accent_bounds(bounds: Rectangle, quarter_turns: u8) -> Rectangle {
    let w = ui::LOADING_ACCENT_WIDTH;
    match quarter_turns % 4 {
        0 => Rectangle {
            height: w,
            ..bounds
        },
        1 => Rectangle {
            x: bounds.x + bounds.width - w,
            width: w,
            ..bounds
        },
        2 => Rectangle {
            y: bounds.y + bounds.height - w,
            height: w,
            ..bounds
        },
        _ => Rectangle { width: w, ..bounds },
    }
}

impl Widget<Message, Theme, Renderer> for LoadingBorder {
    fn size(&self) -> Size<Length> {
        Size::new(
            Length::Fixed(ui::LOADING_BORDER_SIZE),
            Length::Fixed(ui::LOADING_BORDER_SIZE),
        )
    }

    fn layout(
        &self,
        _tree: &mut Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        let size = limits.resolve(
            Length::Fixed(ui::LOADING_BORDER_SIZE),
            Length::Fixed(ui::LOADING_BORDER_SIZE),
            Size::new(ui::LOADING_BORDER_SIZE, ui::LOADING_BORDER_SIZE),
        );
        layout::Node::new(size)
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        use cosmic::iced::advanced::Renderer as _;

        let bounds = layout.bounds();
        let accent: Color = theme.cosmic().accent_color().into();

        renderer.fill_quad(
            renderer::Quad {
                bounds,
                border: Border {
                    color: Color::from_rgba(0.0, 0.0, 0.0, 0.2),
                    width: ui::LOADING_BORDER_WIDTH,
                    radius: 0.0.into(),
                },
                shadow: Default::default(),
            },
            Color::TRANSPARENT,
        );

        renderer.fill_quad(
            renderer::Quad {
                bounds: accent_bounds(bounds, self.quarter_turns),
                border: Border::default(),
                shadow: Default::default(),
            },
            accent,
        );
    }
}

impl<'a> From<LoadingBorder> for Element<'a, Message, Theme, Renderer> {
    fn from(widget: LoadingBorder) -> Self {
        Element::new(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Rectangle {
        Rectangle {
            x: 10.0,
            y: 20.0,
            width: 64.0,
            height: 64.0,
        }
    }

    #[test]
    fn test_accent_follows_quarter_turns() {
        let w = ui::LOADING_ACCENT_WIDTH;

        let top = accent_bounds(square(), 0);
        assert_eq!((top.x, top.y, top.width, top.height), (10.0, 20.0, 64.0, w));

        let right = accent_bounds(square(), 1);
        assert_eq!(right.x, 10.0 + 64.0 - w);
        assert_eq!(right.height, 64.0);

        let bottom = accent_bounds(square(), 2);
        assert_eq!(bottom.y, 20.0 + 64.0 - w);

        let left = accent_bounds(square(), 3);
        assert_eq!((left.x, left.width), (10.0, w));
    }

    #[test]
    fn test_accent_wraps_after_full_turn() {
        assert_eq!(accent_bounds(square(), 4), accent_bounds(square(), 0));
    }

    #[test]
    fn test_color_conversion() {
        let c = color(Rgba::ALERT_RED);
        assert_eq!(c, Color::from_rgba(0.96, 0.26, 0.21, 1.0));
    }

    #[test]
    fn test_every_state_has_an_icon() {
        for state in ScanState::ALL {
            assert!(icon_name(state).ends_with("-symbolic"));
        }
    }
}
