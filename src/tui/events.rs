use crate::api::ApiError;
use crate::core::models::{Phase, Project};

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for polling, notification TTLs, etc.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// A resolved action to execute.
    Action(Action),
    /// Project list fetched.
    ProjectsLoaded(Result<Vec<Project>, ApiError>),
    /// Project detail fetched after opening it.
    ProjectOpened(Result<Project, ApiError>),
    /// New project posted from the dashboard modal.
    ProjectCreated(Result<Project, ApiError>),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper or views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusDashboard,
    FocusPhase(Phase),
    TabNext,
    TabPrev,
    ToggleSidebar,

    // Projects
    OpenProject(String),
    CloseProject,
    RefreshProjects,

    // Modals
    ShowHelp,
    CloseHelp,

    // Application
    SignOut,
    Quit,
}

/// Which top-level page has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Dashboard,
    Phase(Phase),
}

impl Focus {
    pub const ALL: [Focus; 8] = [
        Focus::Dashboard,
        Focus::Phase(Phase::Research),
        Focus::Phase(Phase::Archive),
        Focus::Phase(Phase::Scripting),
        Focus::Phase(Phase::Interviews),
        Focus::Phase(Phase::Voiceover),
        Focus::Phase(Phase::Assembly),
        Focus::Phase(Phase::Review),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Focus::Dashboard => "Dashboard",
            Focus::Phase(phase) => phase.nav_label(),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Focus::Dashboard => "▦",
            Focus::Phase(Phase::Research) => "◎",
            Focus::Phase(Phase::Archive) => "▤",
            Focus::Phase(Phase::Scripting) => "✎",
            Focus::Phase(Phase::Interviews) => "☏",
            Focus::Phase(Phase::Voiceover) => "♪",
            Focus::Phase(Phase::Assembly) => "⧉",
            Focus::Phase(Phase::Review) => "✓",
        }
    }

    pub fn group(self) -> SidebarGroup {
        match self {
            Focus::Dashboard => SidebarGroup::Studio,
            Focus::Phase(_) => SidebarGroup::Workflow,
        }
    }

    pub fn to_action(self) -> Action {
        match self {
            Focus::Dashboard => Action::FocusDashboard,
            Focus::Phase(phase) => Action::FocusPhase(phase),
        }
    }

    /// Pages reachable right now. Workflow phases need an open project.
    pub fn visible(in_project: bool) -> Vec<Focus> {
        SidebarGroup::ALL
            .iter()
            .filter(|g| in_project || **g != SidebarGroup::Workflow)
            .flat_map(|g| g.views().iter().copied())
            .collect()
    }

    pub fn next(self, in_project: bool) -> Focus {
        let visible = Focus::visible(in_project);
        let idx = visible.iter().position(|&f| f == self).unwrap_or(0);
        visible[(idx + 1) % visible.len()]
    }

    pub fn prev(self, in_project: bool) -> Focus {
        let visible = Focus::visible(in_project);
        let idx = visible.iter().position(|&f| f == self).unwrap_or(0);
        visible[(idx + visible.len() - 1) % visible.len()]
    }
}

/// Sidebar navigation groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarGroup {
    Studio,
    Workflow,
}

impl SidebarGroup {
    pub const ALL: [SidebarGroup; 2] = [SidebarGroup::Studio, SidebarGroup::Workflow];

    pub fn label(self) -> &'static str {
        match self {
            SidebarGroup::Studio => "Studio",
            SidebarGroup::Workflow => "Project Workflow",
        }
    }

    pub fn views(self) -> &'static [Focus] {
        match self {
            SidebarGroup::Studio => &Focus::ALL[..1],
            SidebarGroup::Workflow => &Focus::ALL[1..],
        }
    }
}

/// Whether keyboard input goes to the sidebar or the main page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaFocus {
    Sidebar,
    Main,
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}
