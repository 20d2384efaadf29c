// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! Layers, bottom to top: camera preview, focus frame, message panel, then the
//! scan-again button and the list of captured codes.

use crate::app::state::{AppModel, Message};
use crate::constants::ui;
use crate::fl;
use crate::scanner::OverlayLayout;
use cosmic::Element;
use cosmic::iced::alignment::{Horizontal, Vertical};
use cosmic::iced::{Background, Border, Color, Length};
use cosmic::widget;

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let preview: Element<'_, Message> = match &self.preview {
            Some(handle) => widget::container(
                widget::image::Image::new(handle.clone())
                    .content_fit(cosmic::iced::ContentFit::Cover)
                    .width(Length::Fill)
                    .height(Length::Fill),
            )
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            None => widget::container(widget::Space::new(Length::Fill, Length::Fill))
                .style(|_theme| widget::container::Style {
                    background: Some(Background::Color(Color::BLACK)),
                    ..Default::default()
                })
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
        };

        let appearance = self.scanner.appearance();
        let mut layers = cosmic::iced::widget::stack![preview];

        if appearance.focus_visible {
            layers = layers.push(self.focus_frame());
        }

        let panel_align = match appearance.layout {
            OverlayLayout::Collapsed => Vertical::Top,
            OverlayLayout::Expanded => Vertical::Center,
        };
        layers = layers.push(
            widget::container(self.message_view())
                .width(Length::Fill)
                .height(Length::Fill)
                .padding(cosmic::theme::spacing().space_s)
                .align_x(Horizontal::Center)
                .align_y(panel_align),
        );

        let mut bottom = widget::column().spacing(cosmic::theme::spacing().space_s);
        if self.awaiting_rescan {
            bottom = bottom.push(
                widget::container(
                    widget::button::suggested(fl!("scan-again")).on_press(Message::ScanAgain),
                )
                .width(Length::Fill)
                .align_x(Horizontal::Center),
            );
        }
        if !self.history.is_empty() {
            bottom = bottom.push(self.history_view());
        }
        layers = layers.push(
            widget::container(bottom)
                .width(Length::Fill)
                .height(Length::Fill)
                .align_y(Vertical::Bottom),
        );

        layers.into()
    }

    /// Square frame marking where codes are expected
    fn focus_frame(&self) -> Element<'_, Message> {
        let frame = widget::container(widget::Space::new(Length::Fill, Length::Fill))
            .width(Length::Fixed(ui::FOCUS_FRAME_SIZE))
            .height(Length::Fixed(ui::FOCUS_FRAME_SIZE))
            .style(|_theme| widget::container::Style {
                border: Border {
                    color: Color::WHITE,
                    width: ui::FOCUS_FRAME_BORDER,
                    radius: ui::FOCUS_FRAME_RADIUS.into(),
                },
                ..Default::default()
            });

        widget::container(frame)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(Horizontal::Center)
            .align_y(Vertical::Center)
            .into()
    }

    /// Captured codes with copy buttons
    fn history_view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let mut list = widget::column()
            .push(
                widget::text(fl!("captured-codes"))
                    .size(ui::HISTORY_TEXT_SIZE)
                    .font(cosmic::font::bold()),
            )
            .spacing(spacing.space_xxs);

        for code in &self.history {
            let row = widget::row()
                .push(
                    widget::text(format!("[{}] {}", code.symbology, code.payload))
                        .size(ui::HISTORY_TEXT_SIZE)
                        .width(Length::Fill),
                )
                .push(
                    widget::button::icon(widget::icon::from_name("edit-copy-symbolic"))
                        .tooltip(fl!("copy"))
                        .on_press(Message::CopyCode(code.payload.clone())),
                )
                .spacing(spacing.space_xs)
                .align_y(cosmic::iced::Alignment::Center);
            list = list.push(row);
        }

        widget::container(list)
            .width(Length::Fill)
            .padding(spacing.space_s)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.6))),
                text_color: Some(Color::WHITE),
                ..Default::default()
            })
            .into()
    }
}
