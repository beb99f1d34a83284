//! Phase 1 research page.
//!
//! Series and episode selectors on the left, the report list (or knowledge
//! base) in the middle and the selected report on the right. Selection flows
//! top-down: a series scopes the episodes, an episode scopes the reports and
//! the knowledge base. Selection changes are reported to `AppState` through
//! [`ResearchSignal`] so the shared context stays in sync.
//!
//! Research commands run on spawned tasks via [`execute`]; results come back
//! tagged with the scope they were issued for and are dropped when the scope
//! has since changed.

mod asset_modal;
mod detail;
mod episodes;
mod knowledge;
mod reports;
mod research_modal;
mod series;

use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;

use crate::api::ApiError;
use crate::core::context::ProjectContext;
use crate::core::models::{Episode, ResearchReport, ResearchScope, Series};
use crate::core::research::{
    execute, ResearchCommand, ResearchData, ResearchOutcome, ResearchSelection,
};
use crate::tui::events::NotificationLevel;
use crate::tui::layout::ResearchLayout;
use crate::tui::services::Services;
use crate::tui::theme;

use self::asset_modal::AssetModal;
use self::detail::{DetailAction, ReportDetail};
use self::episodes::EpisodeSelector;
use self::research_modal::ResearchModal;
use self::series::SeriesSelector;
use super::{key_press, ModalResult};

/// Outcome of routing a key into a selector list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorResult<T> {
    /// Not a selector key; the page may handle it.
    Ignored,
    Consumed,
    Selected(T),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResearchSignal {
    Consumed,
    SeriesSelected(Option<Series>),
    EpisodeSelected(Option<Episode>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchTab {
    Briefs,
    Knowledge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Series,
    Episodes,
    Reports,
    Detail,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Series => Pane::Episodes,
            Pane::Episodes => Pane::Reports,
            Pane::Reports | Pane::Detail => Pane::Detail,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Series | Pane::Episodes => Pane::Series,
            Pane::Reports => Pane::Episodes,
            Pane::Detail => Pane::Reports,
        }
    }
}

type CommandResult = (ResearchScope, ResearchCommand, Result<ResearchOutcome, ApiError>);

pub struct ResearchPageState {
    project_id: Option<String>,
    pane: Pane,
    tab: ResearchTab,

    series: SeriesSelector,
    episodes: EpisodeSelector,
    selection: ResearchSelection,
    data: ResearchData,

    /// 0 is the "New Research" entry, `n` is `reports[n - 1]`.
    report_cursor: usize,
    kb_scroll: u16,
    detail: ReportDetail,

    research_modal: Option<ResearchModal>,
    asset_modal: Option<AssetModal>,

    data_tx: mpsc::UnboundedSender<CommandResult>,
    data_rx: mpsc::UnboundedReceiver<CommandResult>,
}

impl ResearchPageState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            project_id: None,
            pane: Pane::Series,
            tab: ResearchTab::Briefs,
            series: SeriesSelector::new(),
            episodes: EpisodeSelector::new(),
            selection: ResearchSelection::default(),
            data: ResearchData::new(),
            report_cursor: 0,
            kb_scroll: 0,
            detail: ReportDetail::new(),
            research_modal: None,
            asset_modal: None,
            data_tx,
            data_rx,
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn selection(&self) -> &ResearchSelection {
        &self.selection
    }

    pub fn data(&self) -> &ResearchData {
        &self.data
    }

    /// Whether keys should bypass the global bindings (text entry or modal).
    pub fn captures_input(&self) -> bool {
        self.research_modal.is_some()
            || self.asset_modal.is_some()
            || self.series.is_editing()
            || self.episodes.is_editing()
            || self.detail.is_editing()
    }

    /// Show `project_id`. Opening a different project resets the selection.
    pub fn open_project(&mut self, project_id: &str, services: &Services) {
        if self.project_id.as_deref() != Some(project_id) {
            self.close();
            self.project_id = Some(project_id.to_string());
        }
        self.series.load(project_id, services);
    }

    pub fn close(&mut self) {
        self.project_id = None;
        self.pane = Pane::Series;
        self.series.clear();
        self.episodes.clear();
        self.selection.clear();
        self.data.set_scope(None);
        self.report_cursor = 0;
        self.kb_scroll = 0;
        self.detail.reset();
        self.research_modal = None;
        self.asset_modal = None;
    }

    fn selected_report(&self) -> Option<&ResearchReport> {
        self.selection.report_id().and_then(|id| self.data.report(id))
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn dispatch(&mut self, command: ResearchCommand, services: &Services) {
        let Some(scope) = self.data.scope().cloned() else {
            services.report_error(command.describe(), &ApiError::MissingScope);
            return;
        };
        log::debug!("Dispatching research command: {}", command.describe());
        self.data.begin(&command);

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = execute(&api, &scope, command.clone()).await;
            let _ = tx.send((scope, command, result));
        });
    }

    fn fetch_all(&mut self, services: &Services) {
        if self.data.scope().is_some() {
            self.dispatch(ResearchCommand::FetchReports, services);
            self.dispatch(ResearchCommand::FetchKnowledgeBase, services);
        }
    }

    pub fn poll(&mut self, services: &Services) {
        self.series.poll(services);
        self.episodes.poll(services);
        while let Ok((scope, command, result)) = self.data_rx.try_recv() {
            self.apply_result(&scope, command, result, services);
        }
    }

    fn apply_result(
        &mut self,
        scope: &ResearchScope,
        command: ResearchCommand,
        result: Result<ResearchOutcome, ApiError>,
        services: &Services,
    ) {
        match result {
            Ok(outcome) => {
                let touched = match outcome {
                    ResearchOutcome::Report(ref report) => Some(report.id.clone()),
                    _ => None,
                };
                if !self.data.apply(scope, outcome) {
                    return;
                }
                if let Some(message) = command.success_message() {
                    services.notify(message, NotificationLevel::Success);
                }
                match command {
                    ResearchCommand::Create { .. } => {
                        self.research_modal = None;
                        if let Some(id) = touched {
                            self.select_report(&id);
                        }
                    }
                    ResearchCommand::LinkAsset { .. } => self.asset_modal = None,
                    ResearchCommand::UpdateNotes { ref report_id, .. } => {
                        self.detail.notes_saved(report_id)
                    }
                    ResearchCommand::FetchReports => {
                        let count = self.data.reports().len();
                        self.report_cursor = self.report_cursor.min(count);
                    }
                    _ => {}
                }
            }
            Err(e) => {
                if !self.data.apply_error(scope, &command, &e) {
                    return;
                }
                services.notify(
                    format!("Failed to {}: {e}", command.describe()),
                    NotificationLevel::Error,
                );
                match command {
                    ResearchCommand::Create { .. } => {
                        if let Some(ref mut modal) = self.research_modal {
                            modal.submit_failed(e.to_string());
                        }
                    }
                    ResearchCommand::LinkAsset { .. } => {
                        if let Some(ref mut modal) = self.asset_modal {
                            modal.submit_failed(e.to_string());
                        }
                    }
                    ResearchCommand::UpdateNotes { .. } => self.detail.notes_failed(),
                    _ => {}
                }
            }
        }
    }

    // ── Selection ────────────────────────────────────────────────────────

    fn select_series(&mut self, series: Series, services: &Services) -> ResearchSignal {
        if self.selection.select_series(Some(series.clone())) {
            self.data.set_scope(None);
            self.report_cursor = 0;
            self.detail.reset();
            if let Some(ref project_id) = self.project_id {
                self.episodes.load(project_id, &series.id, services);
            }
        }
        self.pane = Pane::Episodes;
        ResearchSignal::SeriesSelected(Some(series))
    }

    fn select_episode(&mut self, episode: Episode, services: &Services) -> ResearchSignal {
        if self.selection.select_episode(Some(episode.clone())) {
            self.report_cursor = 0;
            self.kb_scroll = 0;
            self.detail.reset();
            self.data
                .set_scope(self.selection.scope(self.project_id.as_deref()));
            self.fetch_all(services);
        }
        self.pane = Pane::Reports;
        ResearchSignal::EpisodeSelected(Some(episode))
    }

    fn select_report(&mut self, report_id: &str) {
        if self.selection.report_id() != Some(report_id) {
            self.detail.reset();
        }
        self.selection.select_report(Some(report_id.to_string()));
        if let Some(idx) = self.data.reports().iter().position(|r| r.id == report_id) {
            self.report_cursor = idx + 1;
        }
    }

    fn open_research_modal(&mut self, services: &Services) {
        if self.selection.episode().is_none() {
            services.notify("Select an episode to begin research", NotificationLevel::Warning);
            return;
        }
        self.research_modal = Some(ResearchModal::new(
            self.selection.series(),
            self.selection.episode(),
        ));
    }

    fn refresh(&mut self, services: &Services) {
        let Some(project_id) = self.project_id.clone() else {
            return;
        };
        self.series.load(&project_id, services);
        if let Some(series) = self.selection.series() {
            let series_id = series.id.clone();
            self.episodes.load(&project_id, &series_id, services);
        }
        self.fetch_all(services);
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> Option<ResearchSignal> {
        if let Some(result) = self.research_modal.as_mut().map(|m| m.handle_input(event)) {
            match result {
                ModalResult::Consumed => {}
                ModalResult::Submit(command) => self.dispatch(command, services),
                ModalResult::Close => self.research_modal = None,
            }
            return Some(ResearchSignal::Consumed);
        }

        if let Some((report_id, result)) = self
            .asset_modal
            .as_mut()
            .map(|m| (m.report_id().to_string(), m.handle_input(event)))
        {
            match result {
                ModalResult::Consumed => {}
                ModalResult::Submit(asset) => {
                    self.dispatch(ResearchCommand::LinkAsset { report_id, asset }, services)
                }
                ModalResult::Close => self.asset_modal = None,
            }
            return Some(ResearchSignal::Consumed);
        }

        let key = key_press(event)?;

        let pane_result = match self.pane {
            Pane::Series => match self.series.handle_input(key, services) {
                SelectorResult::Ignored => None,
                SelectorResult::Consumed => Some(ResearchSignal::Consumed),
                SelectorResult::Selected(series) => Some(self.select_series(series, services)),
            },
            Pane::Episodes => match self.episodes.handle_input(key, services) {
                SelectorResult::Ignored => None,
                SelectorResult::Consumed => Some(ResearchSignal::Consumed),
                SelectorResult::Selected(episode) => Some(self.select_episode(episode, services)),
            },
            Pane::Reports => self.handle_list_key(key.code, key.modifiers, services),
            Pane::Detail => match self.selected_report().cloned() {
                Some(report) => match self.detail.handle_input(event, &report) {
                    Some(DetailAction::Consumed) => Some(ResearchSignal::Consumed),
                    Some(DetailAction::Command(command)) => {
                        self.dispatch(command, services);
                        Some(ResearchSignal::Consumed)
                    }
                    Some(DetailAction::LinkAsset(report_id)) => {
                        self.asset_modal = Some(AssetModal::new(&report_id));
                        Some(ResearchSignal::Consumed)
                    }
                    None => None,
                },
                None => None,
            },
        };
        if pane_result.is_some() {
            return pane_result;
        }

        if key.modifiers != KeyModifiers::NONE && key.modifiers != KeyModifiers::SHIFT {
            return None;
        }
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.pane = self.pane.prev(),
            KeyCode::Char('l') | KeyCode::Right => self.pane = self.pane.next(),
            KeyCode::Char('[') => self.tab = ResearchTab::Briefs,
            KeyCode::Char(']') => self.tab = ResearchTab::Knowledge,
            KeyCode::Char('n') => self.open_research_modal(services),
            KeyCode::Char('r') => self.refresh(services),
            _ => return None,
        }
        Some(ResearchSignal::Consumed)
    }

    fn handle_list_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        services: &Services,
    ) -> Option<ResearchSignal> {
        if modifiers != KeyModifiers::NONE {
            return None;
        }
        match (self.tab, code) {
            (ResearchTab::Briefs, KeyCode::Char('j') | KeyCode::Down) => {
                self.report_cursor = (self.report_cursor + 1).min(self.data.reports().len());
            }
            (ResearchTab::Briefs, KeyCode::Char('k') | KeyCode::Up) => {
                self.report_cursor = self.report_cursor.saturating_sub(1);
            }
            (ResearchTab::Briefs, KeyCode::Enter) => {
                if self.report_cursor == 0 {
                    self.open_research_modal(services);
                } else {
                    let id = self.data.reports().get(self.report_cursor - 1)?.id.clone();
                    self.select_report(&id);
                    self.pane = Pane::Detail;
                }
            }
            (ResearchTab::Knowledge, KeyCode::Char('j') | KeyCode::Down) => {
                self.kb_scroll = self.kb_scroll.saturating_add(1);
            }
            (ResearchTab::Knowledge, KeyCode::Char('k') | KeyCode::Up) => {
                self.kb_scroll = self.kb_scroll.saturating_sub(1);
            }
            _ => return None,
        }
        Some(ResearchSignal::Consumed)
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect, ctx: &ProjectContext, focused: bool) {
        let layout = ResearchLayout::compute(area);
        let project_name = ctx.current_project().map(|p| p.name.as_str());
        frame.render_widget(Paragraph::new(build_header_lines(project_name)), layout.header);

        let active = |pane: Pane| focused && self.pane == pane;
        self.series.render(
            frame,
            layout.series,
            self.selection.series().map(|s| s.id.as_str()),
            active(Pane::Series),
        );
        self.episodes.render(
            frame,
            layout.episodes,
            self.selection.episode().map(|e| e.id.as_str()),
            active(Pane::Episodes),
        );
        self.render_reports(frame, layout.reports, active(Pane::Reports));
        self.detail.render(
            frame,
            layout.detail,
            self.selected_report(),
            self.selection.episode(),
            active(Pane::Detail),
        );

        if let Some(ref modal) = self.research_modal {
            modal.render(frame, area);
        }
        if let Some(ref modal) = self.asset_modal {
            modal.render(frame, area);
        }
    }

    fn render_reports(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = theme::block("Research", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(inner);
        frame.render_widget(
            Paragraph::new(reports::build_context_lines(self.selection.episode())),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(reports::build_tab_line(
                self.tab,
                self.data.reports().len(),
                self.data.knowledge_base().len(),
            )),
            rows[1],
        );

        if self.selection.episode().is_none() {
            return;
        }
        match self.tab {
            ResearchTab::Briefs => {
                let reports = self.data.reports();
                let lines = reports::build_report_list_lines(
                    reports,
                    self.data.is_loading(),
                    self.report_cursor,
                    self.selection.report_id(),
                    focused,
                );
                let cursor = reports::cursor_line(reports, self.report_cursor);
                let visible = rows[2].height as usize;
                let scroll = (cursor + 4).saturating_sub(visible);
                frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), rows[2]);
            }
            ResearchTab::Knowledge => {
                let lines =
                    knowledge::build_lines(self.data.knowledge_base(), self.data.is_kb_loading());
                frame.render_widget(Paragraph::new(lines).scroll((self.kb_scroll, 0)), rows[2]);
            }
        }
    }
}

fn build_header_lines(project_name: Option<&str>) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(" Phase 01: ", theme::heading()),
            Span::styled("Intelligent Discovery", theme::title()),
        ]),
        Line::from(vec![
            Span::styled(" Deep Research & Brief Generation", theme::muted()),
            Span::styled(" | ", theme::dim()),
            Span::styled(
                format!("Project: {}", project_name.unwrap_or("Loading...")),
                theme::muted().add_modifier(Modifier::ITALIC),
            ),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Bibliography, Phase, ReportStatus};
    use crate::tui::events::AppEvent;
    use crate::tui::services::test_support;
    use crate::tui::views::test_util::{lines_text, press};

    fn series(id: &str) -> Series {
        Series {
            id: id.into(),
            title: "Cold War".into(),
            description: None,
            order: None,
            created_at: None,
        }
    }

    fn episode(id: &str) -> Episode {
        Episode {
            id: id.into(),
            code: "EP01".into(),
            title: "Part One".into(),
            brief: None,
            current_phase: Phase::Research,
            phase_progress: 0,
            order: None,
        }
    }

    fn report(id: &str) -> ResearchReport {
        ResearchReport {
            id: id.into(),
            title: format!("Report {id}"),
            query: None,
            executive_summary: String::new(),
            key_findings: Vec::new(),
            producer_notes: String::new(),
            linked_assets: Vec::new(),
            bibliography: Bibliography::default(),
            status: ReportStatus::DeepResearch,
            attached_files: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn scope(episode: &str) -> ResearchScope {
        ResearchScope::new("p1", "s1", episode).unwrap()
    }

    /// Page with p1/s1/`episode` selected and the resulting fetches spawned.
    fn page_at(episode_id: &str, services: &Services) -> ResearchPageState {
        let mut page = ResearchPageState::new();
        page.project_id = Some("p1".into());
        page.select_series(series("s1"), services);
        page.select_episode(episode(episode_id), services);
        page
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<(NotificationLevel, String)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Notification(n) = event {
                out.push((n.level, n.message));
            }
        }
        out
    }

    #[test]
    fn test_header() {
        let text = lines_text(&build_header_lines(Some("Iron Curtain")));
        assert!(text.contains("Phase 01: Intelligent Discovery"));
        assert!(text.contains("Project: Iron Curtain"));
        assert!(lines_text(&build_header_lines(None)).contains("Project: Loading..."));
    }

    #[tokio::test]
    async fn test_episode_selection_scopes_and_fetches() {
        let (services, _rx) = test_support::services();
        let page = page_at("e1", &services);
        assert_eq!(page.data().scope(), Some(&scope("e1")));
        assert!(page.data().is_loading());
        assert!(page.data().is_kb_loading());
        assert_eq!(page.pane, Pane::Reports);
    }

    #[tokio::test]
    async fn test_series_change_clears_scope() {
        let (services, _rx) = test_support::services();
        let mut page = page_at("e1", &services);
        let signal = page.select_series(series("s2"), &services);
        assert!(matches!(signal, ResearchSignal::SeriesSelected(Some(ref s)) if s.id == "s2"));
        assert!(page.data().scope().is_none());
        assert!(page.selection().episode().is_none());
    }

    #[tokio::test]
    async fn test_created_report_is_selected_and_modal_closes() {
        let (services, mut rx) = test_support::services();
        let mut page = page_at("e1", &services);
        page.open_research_modal(&services);
        assert!(page.captures_input());

        let command = ResearchCommand::Create {
            query: "Airlift".into(),
            attachments: Vec::new(),
        };
        page.apply_result(
            &scope("e1"),
            command,
            Ok(ResearchOutcome::Report(report("r9"))),
            &services,
        );

        assert!(page.research_modal.is_none());
        assert_eq!(page.selection().report_id(), Some("r9"));
        assert_eq!(page.report_cursor, 1);
        assert!(drain(&mut rx)
            .iter()
            .any(|(level, msg)| *level == NotificationLevel::Success && msg == "Research report created"));
    }

    #[tokio::test]
    async fn test_failed_create_keeps_modal_open() {
        let (services, mut rx) = test_support::services();
        let mut page = page_at("e1", &services);
        page.open_research_modal(&services);
        page.apply_result(
            &scope("e1"),
            ResearchCommand::Create {
                query: "Airlift".into(),
                attachments: Vec::new(),
            },
            Err(ApiError::Status {
                status: 502,
                message: "Research service unavailable".into(),
            }),
            &services,
        );
        assert!(page.research_modal.is_some());
        assert!(drain(&mut rx).iter().any(|(level, msg)| *level == NotificationLevel::Error
            && msg == "Failed to create research: Research service unavailable"));
    }

    #[tokio::test]
    async fn test_results_for_previous_episode_are_ignored() {
        let (services, mut rx) = test_support::services();
        let mut page = page_at("e1", &services);
        page.select_episode(episode("e2"), &services);
        drain(&mut rx);

        page.apply_result(
            &scope("e1"),
            ResearchCommand::FetchReports,
            Ok(ResearchOutcome::Reports(vec![report("r1")])),
            &services,
        );
        page.apply_result(
            &scope("e1"),
            ResearchCommand::MarkComplete {
                report_id: "r1".into(),
            },
            Err(ApiError::Network("timeout".into())),
            &services,
        );
        assert!(page.data().reports().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_new_research_needs_an_episode() {
        let (services, mut rx) = test_support::services();
        let mut page = ResearchPageState::new();
        page.pane = Pane::Reports;
        page.handle_input(&press(KeyCode::Char('n')), &services);
        assert!(page.research_modal.is_none());
        assert!(drain(&mut rx)
            .iter()
            .any(|(level, _)| *level == NotificationLevel::Warning));
    }

    #[tokio::test]
    async fn test_enter_on_report_opens_detail() {
        let (services, _rx) = test_support::services();
        let mut page = page_at("e1", &services);
        page.apply_result(
            &scope("e1"),
            ResearchCommand::FetchReports,
            Ok(ResearchOutcome::Reports(vec![report("r1"), report("r2")])),
            &services,
        );
        page.handle_input(&press(KeyCode::Char('j')), &services);
        page.handle_input(&press(KeyCode::Char('j')), &services);
        page.handle_input(&press(KeyCode::Enter), &services);
        assert_eq!(page.selection().report_id(), Some("r2"));
        assert_eq!(page.pane, Pane::Detail);
        assert_eq!(page.selected_report().map(|r| r.id.as_str()), Some("r2"));
    }

    #[test]
    fn test_tabs_switch_only_on_keys() {
        let (services, _rx) = test_support::services();
        let mut page = ResearchPageState::new();
        page.pane = Pane::Reports;
        page.handle_input(&press(KeyCode::Char(']')), &services);
        assert_eq!(page.tab, ResearchTab::Knowledge);
        page.handle_input(&press(KeyCode::Char('[')), &services);
        assert_eq!(page.tab, ResearchTab::Briefs);
    }
}
