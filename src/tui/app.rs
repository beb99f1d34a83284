use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use crate::core::context::ProjectContext;
use crate::core::models::{NewProject, Phase};

use super::events::{Action, AppEvent, AreaFocus, Focus, Notification, NotificationLevel};
use super::layout::{centered_rect, AppLayout};
use super::services::Services;
use super::sidebar::SidebarState;
use super::theme;
use super::views::dashboard::{DashboardResult, DashboardState};
use super::views::research::{ResearchPageState, ResearchSignal};

const MAX_NOTIFICATIONS: usize = 3;
const NOTIFICATION_TTL_TICKS: u32 = 100;

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Currently focused top-level page.
    pub focus: Focus,
    /// Whether sidebar or main content has input focus.
    pub area_focus: AreaFocus,
    pub sidebar: SidebarState,
    /// User, projects and the current project/series/episode.
    pub context: ProjectContext,
    pub dashboard: DashboardState,
    pub research: ResearchPageState,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    pub show_help: bool,
    /// Receiver for backend events.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Sender handed to spawned requests.
    event_tx: mpsc::UnboundedSender<AppEvent>,
    services: Services,
}

impl AppState {
    pub fn new(
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
        services: Services,
    ) -> Self {
        Self {
            running: true,
            focus: Focus::Dashboard,
            area_focus: AreaFocus::Main,
            sidebar: SidebarState::new(),
            context: ProjectContext::new(services.user.clone()),
            dashboard: DashboardState::new(),
            research: ResearchPageState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            event_rx,
            event_tx,
            services,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        self.refresh_projects();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    fn in_project(&self) -> bool {
        self.research.project_id().is_some()
    }

    // ── Event handling ──────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                // Priority 1: Ctrl+C always quits, even inside a form
                if is_force_quit(&crossterm_event) {
                    self.running = false;
                    return;
                }

                // Priority 2: Help modal
                if self.show_help {
                    if let Some(action) = self.map_help_input(&crossterm_event) {
                        self.handle_action(action);
                    }
                    return;
                }

                // Priority 3: Sidebar input (when focused)
                if self.area_focus == AreaFocus::Sidebar && self.handle_sidebar_input(&crossterm_event) {
                    return;
                }

                // Priority 4: Focused page
                if self.dispatch_view_input(&crossterm_event) {
                    return;
                }

                // Priority 5: Global keybindings
                if let Some(action) = self.map_input_to_action(crossterm_event) {
                    self.handle_action(action);
                }
            }
            AppEvent::Action(action) => self.handle_action(action),
            AppEvent::Tick => self.on_tick(),
            AppEvent::ProjectsLoaded(result) => {
                if let Err(ref e) = result {
                    self.push_notification(
                        format!("Failed to load projects: {e}"),
                        NotificationLevel::Error,
                    );
                }
                self.context.apply_projects(result);
            }
            AppEvent::ProjectOpened(result) => self.on_project_opened(result),
            AppEvent::ProjectCreated(result) => match result {
                Ok(project) => {
                    let name = project.name.clone();
                    let id = project.id.clone();
                    self.context.apply_created_project(project);
                    let index = self
                        .context
                        .projects()
                        .iter()
                        .position(|p| p.id == id)
                        .unwrap_or(0);
                    self.dashboard.on_project_created(Ok(index));
                    self.push_notification(
                        format!("Project \"{name}\" created"),
                        NotificationLevel::Success,
                    );
                }
                Err(e) => {
                    log::warn!("Failed to create project: {e}");
                    self.dashboard.on_project_created(Err(e.to_string()));
                    self.push_notification(
                        format!("Failed to create project: {e}"),
                        NotificationLevel::Error,
                    );
                }
            },
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Quit => {
                self.running = false;
            }
        }
    }

    fn on_project_opened(&mut self, result: Result<crate::core::models::Project, crate::api::ApiError>) {
        match result {
            Ok(project) => {
                if self.research.project_id() != Some(project.id.as_str()) {
                    log::debug!("Ignoring detail for project {} that is no longer open", project.id);
                    return;
                }
                self.context.apply_selected_project(Ok(project));
                // Re-opening keeps the page's selection; mirror it into the context.
                let selection = self.research.selection();
                self.context.select_series(selection.series().cloned());
                self.context.select_episode(selection.episode().cloned());
            }
            Err(e) => {
                self.push_notification(format!("Failed to open project: {e}"), NotificationLevel::Error);
                self.context.apply_selected_project(Err(e));
                self.close_project();
            }
        }
    }

    /// Dispatch input to the focused page. Returns true if consumed.
    fn dispatch_view_input(&mut self, event: &Event) -> bool {
        match self.focus {
            Focus::Dashboard => match self.dashboard.handle_input(event, self.context.projects()) {
                Some(DashboardResult::Consumed) => true,
                Some(DashboardResult::OpenProject(id)) => {
                    self.handle_action(Action::OpenProject(id));
                    true
                }
                Some(DashboardResult::Refresh) => {
                    self.handle_action(Action::RefreshProjects);
                    true
                }
                Some(DashboardResult::CreateProject(project)) => {
                    self.create_project(project);
                    true
                }
                None => false,
            },
            Focus::Phase(Phase::Research) if self.in_project() => {
                match self.research.handle_input(event, &self.services) {
                    Some(ResearchSignal::Consumed) => true,
                    Some(ResearchSignal::SeriesSelected(series)) => {
                        self.context.select_series(series);
                        true
                    }
                    Some(ResearchSignal::EpisodeSelected(episode)) => {
                        self.context.select_episode(episode);
                        true
                    }
                    None => false,
                }
            }
            Focus::Phase(_) => false,
        }
    }

    /// Handle sidebar-specific input. Returns true if consumed.
    fn handle_sidebar_input(&mut self, event: &Event) -> bool {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return false;
        };

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('j')) | (KeyModifiers::NONE, KeyCode::Down) => {
                self.sidebar.select_next();
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('k')) | (KeyModifiers::NONE, KeyCode::Up) => {
                self.sidebar.select_prev();
                true
            }
            (KeyModifiers::NONE, KeyCode::Enter) | (KeyModifiers::NONE, KeyCode::Char('l')) => {
                let focus = self.sidebar.selected_focus();
                self.handle_action(focus.to_action());
                self.area_focus = AreaFocus::Main;
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('h')) => {
                self.sidebar.user_collapsed = true;
                self.area_focus = AreaFocus::Main;
                true
            }
            (KeyModifiers::NONE, KeyCode::Esc) => {
                self.area_focus = AreaFocus::Main;
                true
            }
            _ => false,
        }
    }

    // ── Input mapping ───────────────────────────────────────────────────

    fn map_help_input(&self, event: &Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };
        match code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::CloseHelp),
            _ => None,
        }
    }

    fn map_input_to_action(&self, event: Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };

        match (modifiers, code) {
            (KeyModifiers::CONTROL, KeyCode::Char('b')) => Some(Action::ToggleSidebar),
            (KeyModifiers::CONTROL, KeyCode::Char('l')) => Some(Action::SignOut),
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => Some(Action::CloseProject),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, _) => match code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ShowHelp),
                KeyCode::Tab => Some(Action::TabNext),
                KeyCode::BackTab => Some(Action::TabPrev),
                KeyCode::Char('0') => Some(Action::FocusDashboard),
                KeyCode::Char(c @ '1'..='7') => {
                    let idx = c as usize - '1' as usize;
                    Some(Action::FocusPhase(Phase::ALL[idx]))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::FocusDashboard => self.set_focus(Focus::Dashboard),
            Action::FocusPhase(phase) => {
                if self.in_project() {
                    self.set_focus(Focus::Phase(phase));
                } else {
                    self.push_notification(
                        "Open a project from the dashboard".to_string(),
                        NotificationLevel::Warning,
                    );
                }
            }
            Action::TabNext => {
                self.focus = self.focus.next(self.in_project());
                self.sidebar.sync_to_focus(self.focus);
            }
            Action::TabPrev => {
                self.focus = self.focus.prev(self.in_project());
                self.sidebar.sync_to_focus(self.focus);
            }
            Action::ToggleSidebar => {
                self.sidebar.toggle_collapse();
                // If expanding, hand input to the sidebar
                if !self.sidebar.user_collapsed {
                    self.area_focus = AreaFocus::Sidebar;
                    self.sidebar.sync_to_focus(self.focus);
                }
            }
            Action::OpenProject(project_id) => self.open_project(project_id),
            Action::CloseProject => self.close_project(),
            Action::RefreshProjects => self.refresh_projects(),
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
            Action::SignOut => {
                log::info!("Signing out {}", self.context.user().name);
                self.context.reset();
                self.research.close();
                self.dashboard = DashboardState::new();
                self.sidebar.set_in_project(false);
                self.set_focus(Focus::Dashboard);
                self.push_notification("Signed out".to_string(), NotificationLevel::Info);
                self.refresh_projects();
            }
        }
    }

    /// Set focus and sync sidebar selection.
    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.sidebar.sync_to_focus(focus);
        self.area_focus = AreaFocus::Main;
    }

    // ── Projects ────────────────────────────────────────────────────────

    fn refresh_projects(&mut self) {
        self.context.begin_refresh();
        let api = self.services.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.list_projects().await;
            let _ = tx.send(AppEvent::ProjectsLoaded(result));
        });
    }

    fn open_project(&mut self, project_id: String) {
        log::info!("Opening project {project_id}");
        self.research.open_project(&project_id, &self.services);
        self.sidebar.set_in_project(true);
        self.set_focus(Focus::Phase(Phase::Research));

        let api = self.services.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.get_project(&project_id).await;
            let _ = tx.send(AppEvent::ProjectOpened(result));
        });
    }

    fn close_project(&mut self) {
        self.context.clear_project();
        self.research.close();
        self.sidebar.set_in_project(false);
        self.set_focus(Focus::Dashboard);
    }

    fn create_project(&mut self, project: NewProject) {
        let api = self.services.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.create_project(&project).await;
            let _ = tx.send(AppEvent::ProjectCreated(result));
        });
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message,
            level,
            ttl_ticks: NOTIFICATION_TTL_TICKS,
        });

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, dismiss expired, poll async data.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        self.research.poll(&self.services);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let (layout, visibility) = AppLayout::compute(area, self.sidebar.user_collapsed);

        if let Some(sidebar_area) = layout.sidebar {
            self.sidebar.render(
                frame,
                sidebar_area,
                visibility,
                self.focus,
                self.area_focus,
                self.context.user(),
            );
        }

        self.render_content(frame, layout.main);
        self.render_status_bar(frame, layout.status);

        // Overlays
        self.render_notifications(frame, area);

        if self.show_help {
            self.render_help_modal(frame, area);
        }
    }

    fn render_content(&self, frame: &mut Frame, area: Rect) {
        match self.focus {
            Focus::Dashboard => self.dashboard.render(frame, area, &self.context),
            Focus::Phase(Phase::Research) if self.in_project() => self.research.render(
                frame,
                area,
                &self.context,
                self.area_focus == AreaFocus::Main,
            ),
            other => self.render_stub_view(frame, area, other),
        }
    }

    fn render_stub_view(&self, frame: &mut Frame, area: Rect, focus: Focus) {
        let block = Block::default()
            .title(format!(" {} ", focus.label()))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::PRIMARY));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (headline, detail) = if self.in_project() {
            ("Coming soon", "This phase is under construction.")
        } else {
            ("No project open", "Open a project from the dashboard")
        };

        let lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                format!("{} {}", focus.icon(), focus.label()),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
            Line::from(Span::styled(headline, Style::default().fg(theme::TEXT_MUTED))),
            Line::raw(""),
            Line::from(Span::styled(detail, Style::default().fg(theme::TEXT_DIM))),
        ];

        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center),
            inner,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" AiM ", theme::brand_badge()),
            Span::raw(" "),
            Span::styled(
                self.focus.label(),
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(crumb) = breadcrumb(&self.context) {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(crumb, theme::muted()));
        }
        spans.extend([
            Span::raw(" │ "),
            Span::styled("API:", theme::key_hint()),
            Span::raw(" "),
            Span::styled(self.services.api.base_url().to_string(), theme::muted()),
            Span::raw(" │ "),
            Span::styled("Tab", theme::key_hint()),
            Span::raw(":nav "),
            Span::styled("Ctrl+B", theme::key_hint()),
            Span::raw(":sidebar "),
            Span::styled("?", theme::key_hint()),
            Span::raw(":help "),
            Span::styled("q", theme::key_hint()),
            Span::raw(":quit"),
        ]);

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 60.min(area.width.saturating_sub(2));
        let height = self.notifications.len() as u16;
        let x = area.width.saturating_sub(max_width + 1);
        let y = 1;

        let notification_area = Rect::new(x, y, max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", theme::INFO),
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {prefix} "),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(n.message.as_str()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(
            Paragraph::new(lines).style(Style::default().bg(theme::BG_SURFACE)),
            notification_area,
        );
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 80, area);

        let key_style = Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                " Keybindings",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
        ];

        for (key, desc) in KEYBINDINGS {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {key}"),
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("{:<22}", key), key_style),
                    Span::raw(*desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled("?", key_style),
            Span::raw(" or "),
            Span::styled("Esc", key_style),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

const KEYBINDINGS: &[(&str, &str)] = &[
    ("Global:", ""),
    ("q", "Quit application"),
    ("?", "Toggle this help"),
    ("Tab / Shift+Tab", "Next / previous page"),
    ("0", "Dashboard"),
    ("1-7", "Jump to workflow phase"),
    ("Ctrl+B", "Toggle sidebar collapse/expand"),
    ("Ctrl+W", "Close project"),
    ("Ctrl+L", "Sign out"),
    ("Ctrl+C", "Force quit"),
    ("", ""),
    ("Sidebar (when focused):", ""),
    ("j/k", "Navigate up/down"),
    ("Enter / l", "Select page"),
    ("h", "Collapse sidebar"),
    ("Esc", "Focus main content"),
    ("", ""),
    ("Dashboard:", ""),
    ("j/k", "Select project"),
    ("Enter", "Open project"),
    ("n", "New project"),
    ("r", "Refresh projects"),
    ("", ""),
    ("Research:", ""),
    ("h/l", "Move between panes"),
    ("j/k / Enter", "Navigate / select"),
    ("a", "Add series or episode / link clip"),
    ("n", "New research"),
    ("[ / ]", "AI Briefs / Knowledge Base"),
    ("r", "Refresh"),
    ("c", "Mark report complete"),
    ("e", "Edit producer notes (Ctrl+S save)"),
    ("f", "Add key finding to knowledge base"),
    ("b", "Toggle bibliography"),
];

/// "Project › Series › EP01 Title" for the status bar.
fn breadcrumb(ctx: &ProjectContext) -> Option<String> {
    let project = ctx.current_project()?;
    let mut parts = vec![project.name.clone()];
    if let Some(series) = ctx.current_series() {
        parts.push(series.title.clone());
    }
    if let Some(episode) = ctx.current_episode() {
        parts.push(format!("{} {}", episode.code, episode.title));
    }
    Some(parts.join(" › "))
}

fn is_force_quit(event: &Event) -> bool {
    matches!(
        event,
        Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            ..
        })
    )
}
