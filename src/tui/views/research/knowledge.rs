//! Knowledge base tab: verified facts grouped by category.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::core::models::{KnowledgeBaseEntry, KnowledgeCategory};
use crate::tui::theme;

/// Group entries by category, categories in first-seen order.
pub(super) fn group_by_category(
    entries: &[KnowledgeBaseEntry],
) -> Vec<(KnowledgeCategory, Vec<&KnowledgeBaseEntry>)> {
    let mut groups: Vec<(KnowledgeCategory, Vec<&KnowledgeBaseEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(category, _)| *category == entry.category) {
            Some((_, items)) => items.push(entry),
            None => groups.push((entry.category, vec![entry])),
        }
    }
    groups
}

pub(super) fn build_lines(entries: &[KnowledgeBaseEntry], loading: bool) -> Vec<Line<'static>> {
    if loading && entries.is_empty() {
        return vec![Line::from(Span::styled(" Loading knowledge base...", theme::muted()))];
    }

    if entries.is_empty() {
        return vec![
            Line::raw(""),
            Line::from(Span::styled(" Knowledge Base Empty", theme::title())),
            Line::from(Span::styled(
                " Complete research reports to build up verified facts.",
                theme::muted(),
            )),
        ];
    }

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {} verified facts", entries.len()),
            theme::muted(),
        )),
        Line::raw(""),
    ];

    for (category, items) in group_by_category(entries) {
        lines.push(Line::from(Span::styled(
            format!(" {} ({})", category.label().to_uppercase(), items.len()),
            Style::default()
                .fg(theme::category_color(category))
                .add_modifier(Modifier::BOLD),
        )));
        for entry in items {
            lines.push(Line::from(vec![
                Span::styled("  • ", theme::dim()),
                Span::styled(entry.fact.clone(), Style::default().fg(theme::TEXT)),
            ]));

            let mut meta = vec![Span::raw("    ")];
            if let Some(confidence) = entry.confidence {
                meta.push(Span::styled(
                    format!(" {} ", confidence.label()),
                    theme::badge(theme::confidence_color(confidence)),
                ));
                meta.push(Span::raw(" "));
            }
            if !entry.source_indices.is_empty() {
                let indices: Vec<String> = entry.source_indices.iter().map(u32::to_string).collect();
                meta.push(Span::styled(
                    format!("[{}]", indices.join(", ")),
                    Style::default().fg(theme::BLUE),
                ));
            }
            if meta.len() > 1 {
                lines.push(Line::from(meta));
            }
        }
        lines.push(Line::raw(""));
    }
    lines
}
