//! Collapsible left sidebar: brand, grouped navigation, user panel.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::core::models::User;

use super::events::{AreaFocus, Focus, SidebarGroup};
use super::layout::SidebarVisibility;
use super::theme;

/// Sidebar navigation state.
pub struct SidebarState {
    /// Whether the user has toggled collapse (Ctrl+B).
    pub user_collapsed: bool,
    /// Currently highlighted item index (into the visible items).
    pub selected: usize,
    /// Whether a project is open, which reveals the workflow group.
    in_project: bool,
}

impl SidebarState {
    pub fn new() -> Self {
        Self {
            user_collapsed: false,
            selected: 0,
            in_project: false,
        }
    }

    pub fn toggle_collapse(&mut self) {
        self.user_collapsed = !self.user_collapsed;
    }

    pub fn set_in_project(&mut self, in_project: bool) {
        self.in_project = in_project;
        let count = self.items().len();
        if self.selected >= count {
            self.selected = count - 1;
        }
    }

    pub fn items(&self) -> Vec<Focus> {
        Focus::visible(self.in_project)
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.items().len();
    }

    pub fn select_prev(&mut self) {
        let count = self.items().len();
        self.selected = (self.selected + count - 1) % count;
    }

    pub fn selected_focus(&self) -> Focus {
        let items = self.items();
        items[self.selected.min(items.len() - 1)]
    }

    /// Sync selection to match the active focus (e.g., after Tab navigation).
    pub fn sync_to_focus(&mut self, focus: Focus) {
        if let Some(idx) = self.items().iter().position(|&f| f == focus) {
            self.selected = idx;
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        visibility: SidebarVisibility,
        current_focus: Focus,
        area_focus: AreaFocus,
        user: &User,
    ) {
        match visibility {
            SidebarVisibility::Hidden => {}
            SidebarVisibility::Collapsed => {
                self.render_collapsed(frame, area, current_focus);
            }
            SidebarVisibility::Expanded => {
                self.render_expanded(frame, area, current_focus, area_focus, user);
            }
        }
    }

    fn render_collapsed(&self, frame: &mut Frame, area: Rect, current_focus: Focus) {
        let mut lines: Vec<Line> = vec![Line::from(Span::styled(" A", theme::heading()))];

        for view in self.items() {
            if lines.len() >= area.height as usize {
                break;
            }
            let style = if view == current_focus {
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT_MUTED)
            };
            lines.push(Line::from(Span::styled(format!(" {}", view.icon()), style)));
        }

        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)),
            area,
        );
    }

    fn render_expanded(
        &self,
        frame: &mut Frame,
        area: Rect,
        current_focus: Focus,
        area_focus: AreaFocus,
        user: &User,
    ) {
        let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).split(area);
        let lines = self.build_nav_lines(current_focus, area_focus, rows[0].width);
        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(build_user_lines(user)).style(Style::default().bg(theme::BG_SURFACE)),
            rows[1],
        );
    }

    fn build_nav_lines(&self, current_focus: Focus, area_focus: AreaFocus, width: u16) -> Vec<Line<'static>> {
        let sidebar_focused = area_focus == AreaFocus::Sidebar;
        let mut lines = vec![
            Line::from(vec![
                Span::styled(" AiM", theme::heading()),
                Span::styled(" Studio", theme::title()),
            ]),
            Line::from(Span::styled(" Intelligent Media v2.0", theme::dim())),
            Line::raw(""),
        ];

        let mut idx = 0usize;
        for group in SidebarGroup::ALL {
            if group == SidebarGroup::Workflow && !self.in_project {
                continue;
            }
            if group == SidebarGroup::Workflow {
                lines.push(Line::raw(""));
                lines.push(Line::from(Span::styled(
                    format!(" {}", group.label().to_uppercase()),
                    theme::dim().add_modifier(Modifier::BOLD),
                )));
            }

            for &view in group.views() {
                let is_current = view == current_focus;
                let is_selected = sidebar_focused && idx == self.selected;

                let (prefix, style) = match (is_selected, is_current) {
                    (true, true) => ("▸ ", theme::highlight().fg(theme::ACCENT)),
                    (true, false) => ("▸ ", theme::highlight()),
                    (false, true) => (
                        "  ",
                        Style::default()
                            .fg(theme::ACCENT)
                            .add_modifier(Modifier::BOLD),
                    ),
                    (false, false) => ("  ", Style::default().fg(theme::TEXT_MUTED)),
                };

                let label = format!("{prefix}{} {}", view.icon(), view.label());
                let padded = format!("{:<width$}", label, width = width as usize);
                lines.push(Line::from(Span::styled(padded, style)));
                idx += 1;
            }
        }
        lines
    }
}

fn build_user_lines(user: &User) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(" ─────────────────", theme::dim())),
        Line::from(vec![
            Span::styled(format!(" {} ", user.initial()), theme::badge(theme::ACCENT)),
            Span::raw(" "),
            Span::styled(user.name.clone(), theme::title()),
        ]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(user.role.clone(), theme::dim()),
            Span::styled("  ^L sign out", theme::key_hint()),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Phase;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_initial_state() {
        let state = SidebarState::new();
        assert!(!state.user_collapsed);
        assert_eq!(state.selected_focus(), Focus::Dashboard);
        assert_eq!(state.items().len(), 1);
    }

    #[test]
    fn test_select_next_wraps_over_visible_items() {
        let mut state = SidebarState::new();
        state.set_in_project(true);
        for _ in 0..state.items().len() {
            state.select_next();
        }
        assert_eq!(state.selected, 0);
        state.select_prev();
        assert_eq!(state.selected_focus(), Focus::Phase(Phase::Review));
    }

    #[test]
    fn test_closing_project_clamps_selection() {
        let mut state = SidebarState::new();
        state.set_in_project(true);
        state.sync_to_focus(Focus::Phase(Phase::Assembly));
        state.set_in_project(false);
        assert_eq!(state.selected_focus(), Focus::Dashboard);
    }

    #[test]
    fn test_workflow_group_only_in_project() {
        let mut state = SidebarState::new();
        let lines = state.build_nav_lines(Focus::Dashboard, AreaFocus::Main, 22);
        assert!(!text(&lines).contains("PROJECT WORKFLOW"));

        state.set_in_project(true);
        let out = text(&state.build_nav_lines(Focus::Dashboard, AreaFocus::Main, 22));
        assert!(out.contains("PROJECT WORKFLOW"));
        assert!(out.contains("1. Research"));
        assert!(out.contains("3b. Interviews"));
        assert!(out.contains("6. Review"));
    }

    #[test]
    fn test_user_panel() {
        let user = User {
            name: "Felix".into(),
            role: "PRODUCER".into(),
        };
        let out = text(&build_user_lines(&user));
        assert!(out.contains(" F "));
        assert!(out.contains("Felix"));
        assert!(out.contains("PRODUCER"));
    }
}
