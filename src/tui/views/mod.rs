pub mod dashboard;
pub mod project_modal;
pub mod research;

use crossterm::event::{Event, KeyEvent, KeyEventKind};

/// Outcome of routing a key into a modal form.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalResult<T> {
    /// Input consumed, modal stays open.
    Consumed,
    /// Form validated; the caller performs the request.
    Submit(T),
    Close,
}

/// Key press events only; releases and repeats are ignored.
pub(crate) fn key_press(event: &Event) -> Option<&KeyEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(key),
        _ => None,
    }
}

/// Truncate to `max` characters, appending an ellipsis when cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
pub(crate) mod test_util {
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
    use ratatui::text::Line;

    pub fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    pub fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    pub fn type_str(s: &str) -> Vec<Event> {
        s.chars().map(|c| press(KeyCode::Char(c))).collect()
    }

    pub fn lines_text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
