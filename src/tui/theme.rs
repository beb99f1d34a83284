//! AiM studio color theme: charcoal surfaces with a signal-red accent.
//!
//! All color constants are RGB truecolor. Views import from here
//! instead of using inline `Color::*` literals.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

use crate::core::models::{Confidence, KnowledgeCategory, ReportStatus};

// ── Accents ─────────────────────────────────────────────────────────────────

/// Signal red: brand, focused items, deep-research status.
pub const RED: Color = Color::Rgb(0xE5, 0x48, 0x4D);
/// Orange: in-progress status, attention.
pub const ORANGE: Color = Color::Rgb(0xF5, 0x9E, 0x0B);
/// Green: completion, high confidence.
pub const GREEN: Color = Color::Rgb(0x22, 0xC5, 0x5E);
/// Blue: links, informational highlights.
pub const BLUE: Color = Color::Rgb(0x3B, 0x82, 0xF6);
/// Violet: AI-generated material.
pub const VIOLET: Color = Color::Rgb(0xA7, 0x8B, 0xFA);

pub const PRIMARY: Color = RED;
pub const ACCENT: Color = RED;

// ── Backgrounds ─────────────────────────────────────────────────────────────

/// Near-black base background.
pub const BG_BASE: Color = Color::Rgb(0x0B, 0x0B, 0x0F);
/// Surface: elevated panels, sidebar.
pub const BG_SURFACE: Color = Color::Rgb(0x16, 0x16, 0x1D);
/// Selected row background.
pub const BG_SELECTED: Color = Color::Rgb(0x26, 0x26, 0x30);

// ── Text ────────────────────────────────────────────────────────────────────

pub const TEXT: Color = Color::Rgb(0xE4, 0xE4, 0xE7);
pub const TEXT_MUTED: Color = Color::Rgb(0x8A, 0x8A, 0x93);
pub const TEXT_DIM: Color = Color::Rgb(0x52, 0x52, 0x5B);

// ── Semantic ────────────────────────────────────────────────────────────────

pub const ERROR: Color = RED;
pub const SUCCESS: Color = GREEN;
pub const WARNING: Color = ORANGE;
pub const INFO: Color = BLUE;

// ── Domain ──────────────────────────────────────────────────────────────────

/// Status bar color of a report card. Unknown statuses read as in progress.
pub fn status_color(status: ReportStatus) -> Color {
    match status {
        ReportStatus::DeepResearch => RED,
        ReportStatus::Complete => GREEN,
        ReportStatus::InProgress | ReportStatus::Unknown => ORANGE,
    }
}

pub fn confidence_color(confidence: Confidence) -> Color {
    match confidence {
        Confidence::High => GREEN,
        Confidence::Medium => ORANGE,
        Confidence::Low => RED,
    }
}

pub fn category_color(category: KnowledgeCategory) -> Color {
    match category {
        KnowledgeCategory::Person => BLUE,
        KnowledgeCategory::Event => ORANGE,
        KnowledgeCategory::Location => GREEN,
        KnowledgeCategory::General => TEXT_MUTED,
    }
}

// ── Style helpers ───────────────────────────────────────────────────────────

/// Accent-colored bold text (titles, active items).
pub fn title() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}

/// Section header style.
pub fn heading() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn border_default() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Highlighted/selected item.
pub fn highlight() -> Style {
    Style::default()
        .fg(TEXT)
        .bg(BG_SELECTED)
        .add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(TEXT_MUTED)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Key hint style (e.g., "[n]:new").
pub fn key_hint() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn link() -> Style {
    Style::default().fg(BLUE).add_modifier(Modifier::UNDERLINED)
}

/// Small inverted badge, e.g. a project type.
pub fn badge(color: Color) -> Style {
    Style::default()
        .fg(BG_BASE)
        .bg(color)
        .add_modifier(Modifier::BOLD)
}

/// Status bar brand badge.
pub fn brand_badge() -> Style {
    badge(ACCENT)
}

// ── Block builders ──────────────────────────────────────────────────────────

pub fn block_focused(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_focused())
}

pub fn block_default(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_default())
}

/// Focused or default block depending on `focused`.
pub fn block(title: &str, focused: bool) -> Block<'_> {
    if focused {
        block_focused(title)
    } else {
        block_default(title)
    }
}
