//! Layout computation: the root shell (sidebar + main + status bar) and the
//! three-column research workspace.

use ratatui::layout::{Constraint, Layout, Rect};

/// Width of the expanded sidebar (brand, labeled items, user panel).
pub const SIDEBAR_EXPANDED_WIDTH: u16 = 22;
/// Width of the collapsed sidebar (single-char icons).
pub const SIDEBAR_COLLAPSED_WIDTH: u16 = 3;
/// Auto-collapse sidebar below this terminal width.
pub const AUTO_COLLAPSE_THRESHOLD: u16 = 60;
/// Hide sidebar entirely below this terminal width.
pub const HIDE_SIDEBAR_THRESHOLD: u16 = 20;
/// Below this main-area width the research page stacks its columns.
pub const RESEARCH_STACK_THRESHOLD: u16 = 90;

/// Computed layout regions for a single frame.
pub struct AppLayout {
    /// Sidebar area (None if hidden).
    pub sidebar: Option<Rect>,
    pub main: Rect,
    /// Status bar (bottom row).
    pub status: Rect,
}

/// Sidebar visibility state derived from terminal width and user preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarVisibility {
    Expanded,
    Collapsed,
    Hidden,
}

impl AppLayout {
    /// Compute layout regions from the terminal area and sidebar state.
    ///
    /// `user_collapsed`: user has toggled collapse with Ctrl+B.
    /// Returns the layout and effective sidebar visibility.
    pub fn compute(area: Rect, user_collapsed: bool) -> (Self, SidebarVisibility) {
        let visibility = if area.width < HIDE_SIDEBAR_THRESHOLD {
            SidebarVisibility::Hidden
        } else if user_collapsed || area.width < AUTO_COLLAPSE_THRESHOLD {
            SidebarVisibility::Collapsed
        } else {
            SidebarVisibility::Expanded
        };

        let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
        let content_area = rows[0];
        let status = rows[1];

        let sidebar_width = match visibility {
            SidebarVisibility::Hidden => 0,
            SidebarVisibility::Collapsed => SIDEBAR_COLLAPSED_WIDTH,
            SidebarVisibility::Expanded => SIDEBAR_EXPANDED_WIDTH,
        };

        let (sidebar, main) = if sidebar_width == 0 {
            (None, content_area)
        } else {
            let cols = Layout::horizontal([Constraint::Length(sidebar_width), Constraint::Min(1)])
                .split(content_area);
            (Some(cols[0]), cols[1])
        };

        (AppLayout { sidebar, main, status }, visibility)
    }
}

/// Regions of the research page below its header.
pub struct ResearchLayout {
    pub header: Rect,
    pub series: Rect,
    pub episodes: Rect,
    /// Active-context line, tab switcher and report list / knowledge base.
    pub reports: Rect,
    pub detail: Rect,
}

impl ResearchLayout {
    /// Selectors on the left, report list in the middle, detail on the
    /// right. Narrow areas stack the selectors above the list.
    pub fn compute(area: Rect) -> Self {
        let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).split(area);
        let header = rows[0];
        let body = rows[1];

        if area.width < RESEARCH_STACK_THRESHOLD {
            let cols = Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(body);
            let left = Layout::vertical([
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(50),
            ])
            .split(cols[0]);
            return Self {
                header,
                series: left[0],
                episodes: left[1],
                reports: left[2],
                detail: cols[1],
            };
        }

        let cols = Layout::horizontal([
            Constraint::Length(28),
            Constraint::Percentage(32),
            Constraint::Min(30),
        ])
        .split(body);
        let selectors = Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(cols[0]);

        Self {
            header,
            series: selectors[0],
            episodes: selectors[1],
            reports: cols[1],
            detail: cols[2],
        }
    }
}

/// A rect of `percent_x` × `percent_y` centered in `area`, for modals.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}
