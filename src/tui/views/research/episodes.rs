//! Episode selector for the selected series.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;

use crate::api::ApiError;
use crate::core::models::{default_episode_code, upsert, Episode, NewEpisode};
use crate::tui::events::NotificationLevel;
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

use super::SelectorResult;

enum EpisodeDataEvent {
    Loaded(Result<Vec<Episode>, ApiError>),
    Created(Result<Episode, ApiError>),
}

/// (project id, series id) the request was made for.
type ParentKey = (String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Code,
    Title,
}

struct EpisodeForm {
    code: InputBuffer,
    title: InputBuffer,
    field: FormField,
}

impl EpisodeForm {
    fn new() -> Self {
        Self {
            code: InputBuffer::new(),
            title: InputBuffer::new(),
            field: FormField::Code,
        }
    }
}

pub struct EpisodeSelector {
    parent: Option<ParentKey>,
    items: Vec<Episode>,
    cursor: usize,
    loading: bool,
    form: Option<EpisodeForm>,
    creating: bool,

    data_tx: mpsc::UnboundedSender<(ParentKey, EpisodeDataEvent)>,
    data_rx: mpsc::UnboundedReceiver<(ParentKey, EpisodeDataEvent)>,
}

impl EpisodeSelector {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            parent: None,
            items: Vec::new(),
            cursor: 0,
            loading: false,
            form: None,
            creating: false,
            data_tx,
            data_rx,
        }
    }

    pub fn items(&self) -> &[Episode] {
        &self.items
    }

    pub fn is_editing(&self) -> bool {
        self.form.is_some()
    }

    pub fn load(&mut self, project_id: &str, series_id: &str, services: &Services) {
        let parent = (project_id.to_string(), series_id.to_string());
        if self.parent.as_ref() != Some(&parent) {
            self.clear();
            self.parent = Some(parent.clone());
        }
        self.loading = true;

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = api.list_episodes(&parent.0, &parent.1).await;
            let _ = tx.send((parent, EpisodeDataEvent::Loaded(result)));
        });
    }

    pub fn clear(&mut self) {
        self.parent = None;
        self.items.clear();
        self.cursor = 0;
        self.loading = false;
        self.form = None;
        self.creating = false;
    }

    pub fn poll(&mut self, services: &Services) {
        while let Ok((parent, event)) = self.data_rx.try_recv() {
            self.apply(&parent, event, services);
        }
    }

    fn apply(&mut self, parent: &ParentKey, event: EpisodeDataEvent, services: &Services) {
        if self.parent.as_ref() != Some(parent) {
            log::debug!("Dropping episode result for stale series {}", parent.1);
            return;
        }
        match event {
            EpisodeDataEvent::Loaded(Ok(episodes)) => {
                self.items = episodes;
                self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
                self.loading = false;
            }
            EpisodeDataEvent::Loaded(Err(e)) => {
                self.loading = false;
                services.report_error("load episodes", &e);
            }
            EpisodeDataEvent::Created(Ok(episode)) => {
                self.creating = false;
                self.form = None;
                let label = format!("{} {}", episode.code, episode.title);
                self.cursor = upsert(&mut self.items, episode);
                services.notify(format!("Episode {label} created"), NotificationLevel::Success);
            }
            EpisodeDataEvent::Created(Err(e)) => {
                self.creating = false;
                services.report_error("create episode", &e);
            }
        }
    }

    fn submit(&mut self, services: &Services) {
        let Some(ref form) = self.form else {
            return;
        };
        let Some(episode) = NewEpisode::from_form(form.title.text(), form.code.text(), self.items.len())
        else {
            return;
        };
        let Some(parent) = self.parent.clone() else {
            return;
        };
        self.creating = true;

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = api.create_episode(&parent.0, &parent.1, &episode).await;
            let _ = tx.send((parent, EpisodeDataEvent::Created(result)));
        });
    }

    pub fn handle_input(&mut self, key: &KeyEvent, services: &Services) -> SelectorResult<Episode> {
        if self.form.is_some() {
            match key.code {
                KeyCode::Esc => {
                    self.form = None;
                    self.creating = false;
                }
                _ if self.creating => {}
                KeyCode::Enter => self.submit(services),
                KeyCode::Tab | KeyCode::BackTab => {
                    if let Some(ref mut form) = self.form {
                        form.field = match form.field {
                            FormField::Code => FormField::Title,
                            FormField::Title => FormField::Code,
                        };
                    }
                }
                _ => {
                    if let Some(ref mut form) = self.form {
                        match form.field {
                            FormField::Code => form.code.handle_key(key),
                            FormField::Title => form.title.handle_key(key),
                        };
                    }
                }
            }
            return SelectorResult::Consumed;
        }

        if key.modifiers != KeyModifiers::NONE && key.modifiers != KeyModifiers::SHIFT {
            return SelectorResult::Ignored;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.items.is_empty() {
                    self.cursor = (self.cursor + 1).min(self.items.len() - 1);
                }
                SelectorResult::Consumed
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                SelectorResult::Consumed
            }
            KeyCode::Enter => match self.items.get(self.cursor) {
                Some(episode) => SelectorResult::Selected(episode.clone()),
                None => SelectorResult::Consumed,
            },
            KeyCode::Char('a') if self.parent.is_some() => {
                self.form = Some(EpisodeForm::new());
                SelectorResult::Consumed
            }
            _ => SelectorResult::Ignored,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    fn build_lines(&self, selected_id: Option<&str>, focused: bool) -> Vec<Line<'static>> {
        if self.parent.is_none() {
            return vec![Line::from(Span::styled(" Select a series first", theme::dim()))];
        }

        let mut lines = Vec::new();
        if self.loading && self.items.is_empty() {
            lines.push(Line::from(Span::styled(" Loading...", theme::muted())));
        }

        for (i, episode) in self.items.iter().enumerate() {
            let is_selected = selected_id == Some(episode.id.as_str());
            let marker = if is_selected { "● " } else { "  " };
            let style = match (focused && i == self.cursor, is_selected) {
                (true, _) => theme::highlight(),
                (false, true) => Style::default().fg(theme::ACCENT),
                (false, false) => Style::default().fg(theme::TEXT),
            };
            lines.push(Line::from(vec![
                Span::styled(marker.to_string(), Style::default().fg(theme::ACCENT)),
                Span::styled(format!("{:<6}", episode.code), Style::default().fg(theme::BLUE)),
                Span::styled(episode.title.clone(), style),
            ]));
        }

        match self.form {
            Some(ref form) => {
                let code_hint = default_episode_code(self.items.len());
                lines.push(Line::raw(""));
                lines.push(form.code.render_line("Code", form.field == FormField::Code, &code_hint));
                lines.push(form.title.render_line(
                    "Title",
                    form.field == FormField::Title,
                    "Episode title...",
                ));
                lines.push(Line::from(Span::styled(
                    if self.creating {
                        " Creating..."
                    } else {
                        " Tab:field  Enter:add  Esc:cancel"
                    },
                    theme::dim(),
                )));
            }
            None => lines.push(Line::from(Span::styled(" + Add Episode...", theme::dim()))),
        }
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, selected_id: Option<&str>, focused: bool) {
        let block = theme::block("2. Select Episode", focused);
        frame.render_widget(
            Paragraph::new(self.build_lines(selected_id, focused)).block(block),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Phase;
    use crate::tui::services::test_support;
    use crate::tui::views::test_util::lines_text;

    fn episode(id: &str, code: &str, title: &str) -> Episode {
        Episode {
            id: id.into(),
            code: code.into(),
            title: title.into(),
            brief: None,
            current_phase: Phase::Research,
            phase_progress: 0,
            order: None,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn parent(series: &str) -> ParentKey {
        ("p1".to_string(), series.to_string())
    }

    fn loaded(items: Vec<Episode>) -> EpisodeSelector {
        let (services, _rx) = test_support::services();
        let mut selector = EpisodeSelector::new();
        selector.parent = Some(parent("s1"));
        selector.apply(&parent("s1"), EpisodeDataEvent::Loaded(Ok(items)), &services);
        selector
    }

    #[test]
    fn test_without_series() {
        let selector = EpisodeSelector::new();
        assert!(lines_text(&selector.build_lines(None, false)).contains("Select a series first"));
    }

    #[test]
    fn test_lists_code_and_title() {
        let selector = loaded(vec![episode("e1", "EP01", "Part One")]);
        let text = lines_text(&selector.build_lines(Some("e1"), false));
        assert!(text.contains("EP01"));
        assert!(text.contains("Part One"));
        assert!(text.contains("Add Episode..."));
    }

    #[test]
    fn test_form_suggests_next_code() {
        let (services, _rx) = test_support::services();
        let mut selector = loaded(vec![episode("e1", "EP01", "Part One")]);
        selector.handle_input(&key(KeyCode::Char('a')), &services);
        let text = lines_text(&selector.build_lines(None, true));
        assert!(text.contains("EP02"));
        assert!(text.contains("Episode title..."));
    }

    #[test]
    fn test_form_fields_switch_with_tab() {
        let (services, _rx) = test_support::services();
        let mut selector = loaded(vec![]);
        selector.handle_input(&key(KeyCode::Char('a')), &services);
        selector.handle_input(&key(KeyCode::Char('X')), &services);
        selector.handle_input(&key(KeyCode::Tab), &services);
        selector.handle_input(&key(KeyCode::Char('Y')), &services);

        let form = selector.form.as_ref().unwrap();
        assert_eq!(form.code.text(), "X");
        assert_eq!(form.title.text(), "Y");
    }

    #[test]
    fn test_results_for_other_series_are_dropped() {
        let (services, _rx) = test_support::services();
        let mut selector = loaded(vec![]);
        selector.apply(
            &parent("s0"),
            EpisodeDataEvent::Loaded(Ok(vec![episode("e9", "EP09", "Old")])),
            &services,
        );
        assert!(selector.items().is_empty());
    }

    #[test]
    fn test_created_episode_is_appended() {
        let (services, _rx) = test_support::services();
        let mut selector = loaded(vec![episode("e1", "EP01", "Part One")]);
        selector.form = Some(EpisodeForm::new());
        selector.apply(
            &parent("s1"),
            EpisodeDataEvent::Created(Ok(episode("e2", "EP02", "Part Two"))),
            &services,
        );
        assert_eq!(selector.items().len(), 2);
        assert_eq!(selector.cursor, 1);
        assert!(!selector.is_editing());
    }

    #[test]
    fn test_enter_selects_highlighted() {
        let (services, _rx) = test_support::services();
        let mut selector = loaded(vec![episode("e1", "EP01", "Part One")]);
        assert_eq!(
            selector.handle_input(&key(KeyCode::Enter), &services),
            SelectorResult::Selected(episode("e1", "EP01", "Part One"))
        );
    }
}
