//! Deep Research modal: query text plus optional file attachments.

use std::path::PathBuf;

use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::api::upload;
use crate::core::models::{Episode, Series};
use crate::core::research::ResearchCommand;
use crate::tui::layout::centered_rect;
use crate::tui::theme;
use crate::tui::views::{key_press, ModalResult};
use crate::tui::widgets::input_buffer::InputBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Query,
    Attach,
}

pub(super) struct ResearchModal {
    target: String,
    code: Option<String>,
    query: InputBuffer,
    path: InputBuffer,
    attachments: Vec<PathBuf>,
    current: usize,
    field: Field,
    submitting: bool,
    error: Option<String>,
}

impl ResearchModal {
    pub fn new(series: Option<&Series>, episode: Option<&Episode>) -> Self {
        let series_title = series.map(|s| s.title.as_str()).unwrap_or("No series");
        let target = match episode {
            Some(e) => format!("Targeting: {series_title} | {} {}", e.code, e.title),
            None => format!("Targeting: {series_title}"),
        };
        Self {
            target,
            code: episode.map(|e| e.code.clone()),
            query: InputBuffer::new(),
            path: InputBuffer::new(),
            attachments: Vec::new(),
            current: 0,
            field: Field::Query,
            submitting: false,
            error: None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    fn attach(&mut self) {
        let raw = self.path.text().trim().to_string();
        if raw.is_empty() {
            return;
        }
        let path = PathBuf::from(raw);
        match upload::validate(&path) {
            Ok(()) => {
                self.attachments.push(path);
                self.current = self.attachments.len() - 1;
                self.path.clear();
                self.error = None;
            }
            Err(message) => self.error = Some(message),
        }
    }

    /// Remove the attachment being shown, keeping the index in range.
    fn remove_current(&mut self) {
        if self.current >= self.attachments.len() {
            return;
        }
        let len = self.attachments.len();
        self.attachments.remove(self.current);
        if self.current >= len - 1 {
            self.current = len.saturating_sub(2);
        }
    }

    pub fn handle_input(&mut self, event: &Event) -> ModalResult<ResearchCommand> {
        let Some(key) = key_press(event) else {
            return ModalResult::Consumed;
        };
        if key.code == KeyCode::Esc {
            return ModalResult::Close;
        }
        if self.submitting {
            return ModalResult::Consumed;
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
                self.field = match self.field {
                    Field::Query => Field::Attach,
                    Field::Attach => Field::Query,
                };
            }
            (_, KeyCode::Up) => self.current = self.current.saturating_sub(1),
            (_, KeyCode::Down) => {
                if !self.attachments.is_empty() {
                    self.current = (self.current + 1).min(self.attachments.len() - 1);
                }
            }
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => self.remove_current(),
            (_, KeyCode::Enter) if self.field == Field::Attach => self.attach(),
            (_, KeyCode::Enter) => {
                let query = self.query.text().trim().to_string();
                if query.is_empty() {
                    self.error = Some("Research query is required".to_string());
                    return ModalResult::Consumed;
                }
                self.submitting = true;
                self.error = None;
                return ModalResult::Submit(ResearchCommand::Create {
                    query,
                    attachments: self.attachments.clone(),
                });
            }
            _ => {
                match self.field {
                    Field::Query => self.query.handle_key(key),
                    Field::Attach => self.path.handle_key(key),
                };
            }
        }
        ModalResult::Consumed
    }

    fn build_lines(&self) -> Vec<Line<'static>> {
        let placeholder = format!(
            "Research topic for {}...",
            self.code.as_deref().unwrap_or("episode")
        );
        let mut lines = vec![
            Line::from(Span::styled(format!(" {}", self.target), theme::muted())),
            Line::raw(""),
            self.query.render_line("Query", self.field == Field::Query, &placeholder),
            Line::raw(""),
            self.path.render_line(
                "Attach",
                self.field == Field::Attach,
                "Path to a file (optional)",
            ),
            Line::from(Span::styled(
                format!("            {}", upload::ALLOWED_EXTENSIONS.join(" ")),
                theme::dim(),
            )),
        ];

        if let Some(path) = self.attachments.get(self.current) {
            let many = self.attachments.len() > 1;
            lines.push(Line::raw(""));
            lines.push(Line::from(vec![
                Span::styled(if many { "  ◂ " } else { "    " }, theme::key_hint()),
                Span::styled(upload::file_name(path), Style::default().fg(theme::TEXT)),
                Span::styled(if many { " ▸" } else { "" }, theme::key_hint()),
                Span::styled("  ^R remove", theme::key_hint()),
            ]));
            if many {
                lines.push(Line::from(Span::styled(
                    format!("    {} of {} files", self.current + 1, self.attachments.len()),
                    theme::dim(),
                )));
            }
        }

        lines.push(Line::raw(""));
        if let Some(ref error) = self.error {
            lines.push(Line::from(Span::styled(
                format!("  {error}"),
                Style::default().fg(theme::ERROR),
            )));
        }
        lines.push(if self.submitting {
            Line::from(Span::styled("  Researching...", theme::muted()))
        } else {
            Line::from(vec![
                Span::styled("  Tab", theme::key_hint()),
                Span::raw(":field "),
                Span::styled("↑/↓", theme::key_hint()),
                Span::raw(":files "),
                Span::styled("Enter", theme::key_hint()),
                Span::raw(":research/attach "),
                Span::styled("Esc", theme::key_hint()),
                Span::raw(":cancel"),
            ])
        });
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(70, 55, area);
        let block = Block::default()
            .title(" Deep Research ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(theme::border_focused());

        frame.render_widget(Clear, modal);
        frame.render_widget(
            Paragraph::new(self.build_lines())
                .block(block)
                .wrap(Wrap { trim: false }),
            modal,
        );
    }
}
