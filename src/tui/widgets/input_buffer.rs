//! Single-line text input with cursor management, shared by every form
//! field in the modals and inline create forms.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::theme;

#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            content: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.content.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            let next = self.content[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.content.len());
            self.content.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.len() {
            self.cursor = self.content[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.content.len());
        }
    }

    /// Apply an editing key. Returns `false` for keys that are not editing
    /// keys (Enter, Tab, Esc, arrows up/down...) so the caller can handle them.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            _ => return false,
        }
        true
    }

    /// Take the content out, resetting the buffer.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Whitespace-only counts as empty.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    /// `label: value` line; the focused field shows a block cursor.
    pub fn render_line(&self, label: &str, focused: bool, placeholder: &str) -> Line<'static> {
        let label_style = if focused {
            theme::heading()
        } else {
            theme::muted()
        };
        let mut spans = vec![Span::styled(format!("{label:>10}: "), label_style)];

        if self.content.is_empty() {
            if focused {
                spans.push(Span::styled(
                    " ",
                    Style::default().fg(theme::TEXT).add_modifier(Modifier::REVERSED),
                ));
            }
            spans.push(Span::styled(placeholder.to_string(), theme::dim()));
            return Line::from(spans);
        }

        let text_style = Style::default().fg(theme::TEXT);
        if focused {
            let (before, after) = self.content.split_at(self.cursor);
            let mut rest = after.chars();
            let under = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
            spans.push(Span::styled(before.to_string(), text_style));
            spans.push(Span::styled(
                under,
                text_style.add_modifier(Modifier::REVERSED),
            ));
            spans.push(Span::styled(rest.as_str().to_string(), text_style));
        } else {
            spans.push(Span::styled(self.content.clone(), text_style));
        }
        Line::from(spans)
    }
}
