//! Series selector: list, select, and inline create.

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
use crate::core::models::{upsert, NewSeries, Series};
use crate::tui::events::NotificationLevel;
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

use super::SelectorResult;

// ── Internal async data events ─────────────────────────────────────────────

enum SeriesDataEvent {
    Loaded(Result<Vec<Series>, ApiError>),
    Created(Result<Series, ApiError>),
}

/// Tagged with the project the request was made for.
type SeriesMessage = (String, SeriesDataEvent);

pub struct SeriesSelector {
    project_id: Option<String>,
    items: Vec<Series>,
    cursor: usize,
    loading: bool,
    form: Option<InputBuffer>,
    creating: bool,

    data_tx: mpsc::UnboundedSender<SeriesMessage>,
    data_rx: mpsc::UnboundedReceiver<SeriesMessage>,
}

impl SeriesSelector {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            project_id: None,
            items: Vec::new(),
            cursor: 0,
            loading: false,
            form: None,
            creating: false,
            data_tx,
            data_rx,
        }
    }

    pub fn items(&self) -> &[Series] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the inline create form is capturing keys.
    pub fn is_editing(&self) -> bool {
        self.form.is_some()
    }

    /// Fetch the series of `project_id`. A different project drops the
    /// current list first.
    pub fn load(&mut self, project_id: &str, services: &Services) {
        if self.project_id.as_deref() != Some(project_id) {
            self.clear();
            self.project_id = Some(project_id.to_string());
        }
        self.loading = true;

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        let project_id = project_id.to_string();
        tokio::spawn(async move {
            let result = api.list_series(&project_id).await;
            let _ = tx.send((project_id, SeriesDataEvent::Loaded(result)));
        });
    }

    pub fn clear(&mut self) {
        self.project_id = None;
        self.items.clear();
        self.cursor = 0;
        self.loading = false;
        self.form = None;
        self.creating = false;
    }

    pub fn poll(&mut self, services: &Services) {
        while let Ok((project_id, event)) = self.data_rx.try_recv() {
            self.apply(&project_id, event, services);
        }
    }

    fn apply(&mut self, project_id: &str, event: SeriesDataEvent, services: &Services) {
        if self.project_id.as_deref() != Some(project_id) {
            log::debug!("Dropping series result for stale project {project_id}");
            return;
        }
        match event {
            SeriesDataEvent::Loaded(Ok(series)) => {
                self.items = series;
                self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
                self.loading = false;
            }
            SeriesDataEvent::Loaded(Err(e)) => {
                self.loading = false;
                services.report_error("load series", &e);
            }
            SeriesDataEvent::Created(Ok(series)) => {
                self.creating = false;
                self.form = None;
                let title = series.title.clone();
                self.cursor = upsert(&mut self.items, series);
                services.notify(format!("Series \"{title}\" created"), NotificationLevel::Success);
            }
            SeriesDataEvent::Created(Err(e)) => {
                self.creating = false;
                services.report_error("create series", &e);
            }
        }
    }

    fn submit(&mut self, services: &Services) {
        let Some(ref form) = self.form else {
            return;
        };
        let (Some(project_id), Some(series)) = (self.project_id.clone(), NewSeries::from_form(form.text()))
        else {
            return;
        };
        self.creating = true;

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = api.create_series(&project_id, &series).await;
            let _ = tx.send((project_id, SeriesDataEvent::Created(result)));
        });
    }

    pub fn handle_input(&mut self, key: &KeyEvent, services: &Services) -> SelectorResult<Series> {
        if self.form.is_some() {
            match key.code {
                KeyCode::Esc => {
                    self.form = None;
                    self.creating = false;
                }
                _ if self.creating => {}
                KeyCode::Enter => self.submit(services),
                _ => {
                    if let Some(ref mut form) = self.form {
                        form.handle_key(key);
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
                Some(series) => SelectorResult::Selected(series.clone()),
                None => SelectorResult::Consumed,
            },
            KeyCode::Char('a') if self.project_id.is_some() => {
                self.form = Some(InputBuffer::new());
                SelectorResult::Consumed
            }
            _ => SelectorResult::Ignored,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    fn build_lines(&self, selected_id: Option<&str>, focused: bool) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        if self.loading && self.items.is_empty() {
            lines.push(Line::from(Span::styled(" Loading...", theme::muted())));
        }

        for (i, series) in self.items.iter().enumerate() {
            let is_selected = selected_id == Some(series.id.as_str());
            let marker = if is_selected { "● " } else { "  " };
            let style = match (focused && i == self.cursor, is_selected) {
                (true, _) => theme::highlight(),
                (false, true) => Style::default().fg(theme::ACCENT),
                (false, false) => Style::default().fg(theme::TEXT),
            };
            lines.push(Line::from(vec![
                Span::styled(marker.to_string(), Style::default().fg(theme::ACCENT)),
                Span::styled(series.title.clone(), style),
            ]));
        }

        match self.form {
            Some(ref form) => {
                lines.push(Line::raw(""));
                lines.push(form.render_line("Title", true, "Series title..."));
                lines.push(Line::from(Span::styled(
                    if self.creating {
                        " Creating..."
                    } else {
                        " Enter:add  Esc:cancel"
                    },
                    theme::dim(),
                )));
            }
            None if self.project_id.is_some() => {
                lines.push(Line::from(Span::styled(" + Add Series...", theme::dim())));
            }
            None => {}
        }
        lines
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, selected_id: Option<&str>, focused: bool) {
        let block = theme::block("1. Select Series", focused);
        frame.render_widget(
            Paragraph::new(self.build_lines(selected_id, focused)).block(block),
            area,
        );
    }
}
