//! Link-asset modal: attach an archive clip to a report.

use crossterm::event::{Event, KeyCode};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::core::models::NewAsset;
use crate::tui::layout::centered_rect;
use crate::tui::theme;
use crate::tui::views::{key_press, ModalResult};
use crate::tui::widgets::input_buffer::InputBuffer;

const FIELD_COUNT: usize = 3;

pub(super) struct AssetModal {
    report_id: String,
    name: InputBuffer,
    asset_type: InputBuffer,
    url: InputBuffer,
    field: usize,
    submitting: bool,
    error: Option<String>,
}

impl AssetModal {
    pub fn new(report_id: &str) -> Self {
        Self {
            report_id: report_id.to_string(),
            name: InputBuffer::new(),
            asset_type: InputBuffer::with_text("video"),
            url: InputBuffer::new(),
            field: 0,
            submitting: false,
            error: None,
        }
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    pub fn submit_failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    fn focused_input(&mut self) -> &mut InputBuffer {
        match self.field {
            0 => &mut self.name,
            1 => &mut self.asset_type,
            _ => &mut self.url,
        }
    }

    pub fn handle_input(&mut self, event: &Event) -> ModalResult<NewAsset> {
        let Some(key) = key_press(event) else {
            return ModalResult::Consumed;
        };
        if key.code == KeyCode::Esc {
            return ModalResult::Close;
        }
        if self.submitting {
            return ModalResult::Consumed;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.field = (self.field + 1) % FIELD_COUNT,
            KeyCode::BackTab | KeyCode::Up => self.field = (self.field + FIELD_COUNT - 1) % FIELD_COUNT,
            KeyCode::Enter => {
                return match NewAsset::from_form(self.name.text(), self.asset_type.text(), self.url.text())
                {
                    Some(asset) => {
                        self.submitting = true;
                        self.error = None;
                        ModalResult::Submit(asset)
                    }
                    None => {
                        self.error = Some("Asset name and type are required".to_string());
                        ModalResult::Consumed
                    }
                };
            }
            _ => {
                self.focused_input().handle_key(key);
            }
        }
        ModalResult::Consumed
    }

    fn build_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::raw(""),
            self.name.render_line("Name", self.field == 0, "e.g. Tempelhof landing 1948"),
            self.asset_type.render_line("Type", self.field == 1, "video, image, audio..."),
            self.url.render_line("URL", self.field == 2, "Optional link"),
            Line::raw(""),
        ];
        if let Some(ref error) = self.error {
            lines.push(Line::from(Span::styled(
                format!("  {error}"),
                Style::default().fg(theme::ERROR),
            )));
        }
        lines.push(if self.submitting {
            Line::from(Span::styled("  Linking...", theme::muted()))
        } else {
            Line::from(vec![
                Span::styled("  Tab", theme::key_hint()),
                Span::raw(":field "),
                Span::styled("Enter", theme::key_hint()),
                Span::raw(":link "),
                Span::styled("Esc", theme::key_hint()),
                Span::raw(":cancel"),
            ])
        });
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 40, area);
        let block = Block::default()
            .title(" Link Clip ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(theme::border_focused());

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(self.build_lines()).block(block), modal);
    }
}
