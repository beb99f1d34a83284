//! Production dashboard: project cards and the new-project modal.
//!
//! The project list lives in `ProjectContext`; this view only tracks the
//! highlighted card and the modal. Requests are issued by `AppState` from the
//! returned [`DashboardResult`].

use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::context::ProjectContext;
use crate::core::models::{NewProject, Project};
use crate::tui::theme;

use super::project_modal::ProjectModal;
use super::{key_press, truncate, ModalResult};

const PROGRESS_WIDTH: usize = 20;
/// Lines per project card, including the spacer.
const CARD_HEIGHT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardResult {
    Consumed,
    OpenProject(String),
    Refresh,
    CreateProject(NewProject),
}

pub struct DashboardState {
    selected: usize,
    modal: Option<ProjectModal>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            modal: None,
        }
    }

    pub fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    pub fn open_modal(&mut self) {
        self.modal = Some(ProjectModal::new());
    }

    /// Create request finished. Success closes the modal and highlights the
    /// new card; failure keeps the modal and its input.
    pub fn on_project_created(&mut self, result: Result<usize, String>) {
        match result {
            Ok(index) => {
                self.modal = None;
                self.selected = index;
            }
            Err(message) => {
                if let Some(ref mut modal) = self.modal {
                    modal.submit_failed(message);
                }
            }
        }
    }

    pub fn handle_input(&mut self, event: &Event, projects: &[Project]) -> Option<DashboardResult> {
        if let Some(ref mut modal) = self.modal {
            return match modal.handle_input(event) {
                ModalResult::Consumed => Some(DashboardResult::Consumed),
                ModalResult::Submit(project) => Some(DashboardResult::CreateProject(project)),
                ModalResult::Close => {
                    self.modal = None;
                    Some(DashboardResult::Consumed)
                }
            };
        }

        // The list may have shrunk since the last keypress
        self.selected = self.selected.min(projects.len().saturating_sub(1));

        let key = key_press(event)?;
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                if !projects.is_empty() {
                    self.selected = (self.selected + 1).min(projects.len() - 1);
                }
                Some(DashboardResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.selected = self.selected.saturating_sub(1);
                Some(DashboardResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                let project = projects.get(self.selected)?;
                Some(DashboardResult::OpenProject(project.id.clone()))
            }
            (KeyModifiers::NONE, KeyCode::Char('n')) => {
                self.open_modal();
                Some(DashboardResult::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => Some(DashboardResult::Refresh),
            _ => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect, ctx: &ProjectContext) {
        let block = Block::default()
            .title(" Dashboard ")
            .borders(Borders::ALL)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let selected = self.selected.min(ctx.projects().len().saturating_sub(1));
        let lines = build_lines(ctx, selected);

        // Header is 4 lines plus an optional 2-line error banner.
        let header = 4 + if ctx.error().is_some() { 2 } else { 0 };
        let selected_bottom = header + (selected + 1) * CARD_HEIGHT;
        let visible = inner.height as usize;
        let scroll = selected_bottom.saturating_sub(visible);

        frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), inner);

        if let Some(ref modal) = self.modal {
            modal.render(frame, area);
        }
    }
}

fn build_lines(ctx: &ProjectContext, selected: usize) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::raw(""),
        Line::from(Span::styled("  Production Dashboard", theme::title())),
        Line::from(Span::styled(
            format!("  Welcome back, {}. Manage your pipeline.", ctx.user().name),
            theme::muted(),
        )),
        Line::raw(""),
    ];

    if let Some(error) = ctx.error() {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(" ✗ ", theme::badge(theme::ERROR)),
            Span::styled(format!(" {error}"), Style::default().fg(theme::ERROR)),
        ]));
        lines.push(Line::raw(""));
    }

    if ctx.is_loading() {
        lines.push(Line::from(Span::styled("  Loading projects...", theme::muted())));
        return lines;
    }

    if ctx.projects().is_empty() {
        lines.push(Line::from(Span::styled("  No projects yet", theme::title())));
        lines.push(Line::from(Span::styled(
            "  Create your first documentary project to get started.",
            theme::muted(),
        )));
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("  n", theme::key_hint()),
            Span::raw(":create project"),
        ]));
        return lines;
    }

    for (i, project) in ctx.projects().iter().enumerate() {
        lines.extend(project_card_lines(project, i == selected));
    }

    lines.push(Line::from(vec![
        Span::styled("  j/k", theme::key_hint()),
        Span::raw(":select "),
        Span::styled("Enter", theme::key_hint()),
        Span::raw(":open "),
        Span::styled("n", theme::key_hint()),
        Span::raw(":new project "),
        Span::styled("r", theme::key_hint()),
        Span::raw(":refresh"),
    ]));
    lines
}

fn project_card_lines(project: &Project, is_selected: bool) -> Vec<Line<'static>> {
    let cursor = if is_selected { "▸ " } else { "  " };
    let name_style = if is_selected {
        theme::title().fg(theme::ACCENT)
    } else {
        theme::title()
    };

    let mut badges = vec![
        Span::styled(cursor.to_string(), Style::default().fg(theme::ACCENT)),
        Span::styled(format!(" {} ", project.project_type.badge()), theme::badge(theme::TEXT_MUTED)),
    ];
    if project.editing {
        badges.push(Span::raw(" "));
        badges.push(Span::styled(" Editing ", theme::badge(theme::ORANGE)));
    }

    let description = if project.description.trim().is_empty() {
        Span::styled("No description".to_string(), theme::dim())
    } else {
        Span::styled(truncate(&project.description, 70), theme::muted())
    };

    let progress = project.progress() as usize;
    let filled = progress * PROGRESS_WIDTH / 100;
    let bar = Line::from(vec![
        Span::raw("    "),
        Span::styled(
            format!("{:<12}", project.current_phase.label()),
            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("█".repeat(filled), Style::default().fg(theme::ACCENT)),
        Span::styled("░".repeat(PROGRESS_WIDTH - filled), theme::dim()),
        Span::styled(format!(" {progress}%"), theme::muted()),
    ]);

    vec![
        Line::from(badges),
        Line::from(vec![Span::raw("    "), Span::styled(project.name.clone(), name_style)]),
        Line::from(vec![Span::raw("    "), description]),
        bar,
        Line::raw(""),
    ]
}
