//! New-project modal: name, type, description.

use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::core::models::{NewProject, ProjectType};
use crate::tui::layout::centered_rect;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

use super::{key_press, ModalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Type,
    Description,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Name => Field::Type,
            Field::Type => Field::Description,
            Field::Description => Field::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Name => Field::Description,
            Field::Type => Field::Name,
            Field::Description => Field::Type,
        }
    }
}

pub struct ProjectModal {
    name: InputBuffer,
    description: InputBuffer,
    project_type: ProjectType,
    field: Field,
    submitting: bool,
    error: Option<String>,
}

impl ProjectModal {
    pub fn new() -> Self {
        Self {
            name: InputBuffer::new(),
            description: InputBuffer::new(),
            project_type: ProjectType::Documentary,
            field: Field::Name,
            submitting: false,
            error: None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Called when the create request failed; the form keeps its input.
    pub fn submit_failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    pub fn handle_input(&mut self, event: &Event) -> ModalResult<NewProject> {
        let Some(key) = key_press(event) else {
            return ModalResult::Consumed;
        };
        if self.submitting {
            return match key.code {
                KeyCode::Esc => ModalResult::Close,
                _ => ModalResult::Consumed,
            };
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => return ModalResult::Close,
            (_, KeyCode::Tab) | (_, KeyCode::Down) => self.field = self.field.next(),
            (_, KeyCode::BackTab) | (_, KeyCode::Up) => self.field = self.field.prev(),
            (KeyModifiers::NONE, KeyCode::Enter) => {
                return match NewProject::from_form(
                    self.name.text(),
                    self.description.text(),
                    self.project_type,
                ) {
                    Some(project) => {
                        self.submitting = true;
                        self.error = None;
                        ModalResult::Submit(project)
                    }
                    None => {
                        self.error = Some("Project name is required".to_string());
                        self.field = Field::Name;
                        ModalResult::Consumed
                    }
                };
            }
            _ => match self.field {
                Field::Name => {
                    self.name.handle_key(key);
                }
                Field::Description => {
                    self.description.handle_key(key);
                }
                Field::Type => match key.code {
                    KeyCode::Left | KeyCode::Char('h') => {
                        self.project_type = self.project_type.prev()
                    }
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                        self.project_type = self.project_type.next()
                    }
                    _ => {}
                },
            },
        }
        ModalResult::Consumed
    }

    fn build_lines(&self) -> Vec<Line<'static>> {
        let type_style = if self.field == Field::Type {
            theme::heading()
        } else {
            theme::muted()
        };
        let mut type_spans = vec![Span::styled(format!("{:>10}: ", "Type"), type_style)];
        for t in ProjectType::ALL {
            let style = if t == self.project_type {
                theme::badge(theme::ACCENT)
            } else {
                theme::dim()
            };
            type_spans.push(Span::styled(format!(" {} ", t.label()), style));
            type_spans.push(Span::raw(" "));
        }

        let mut lines = vec![
            Line::raw(""),
            self.name
                .render_line("Name", self.field == Field::Name, "e.g. The Last Lighthouse"),
            Line::raw(""),
            Line::from(type_spans),
            Line::raw(""),
            self.description.render_line(
                "Summary",
                self.field == Field::Description,
                "Optional description",
            ),
            Line::raw(""),
        ];

        if let Some(ref error) = self.error {
            lines.push(Line::from(Span::styled(
                format!("  {error}"),
                ratatui::style::Style::default().fg(theme::ERROR),
            )));
            lines.push(Line::raw(""));
        }

        lines.push(if self.submitting {
            Line::from(Span::styled("  Creating project...", theme::muted()))
        } else {
            Line::from(vec![
                Span::styled("  Tab", theme::key_hint()),
                Span::raw(":field "),
                Span::styled("←/→", theme::key_hint()),
                Span::raw(":type "),
                Span::styled("Enter", theme::key_hint()),
                Span::raw(":create "),
                Span::styled("Esc", theme::key_hint()),
                Span::raw(":cancel"),
            ])
        });
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 50, area);
        let block = Block::default()
            .title(" New Project ")
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
