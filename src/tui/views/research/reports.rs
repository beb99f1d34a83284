//! Active context line, tab switcher and the research report list.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::core::models::{Episode, ResearchReport};
use crate::tui::theme;
use crate::tui::views::truncate;

use super::ResearchTab;

const SUMMARY_EXCERPT: usize = 60;

pub(super) fn build_context_lines(episode: Option<&Episode>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        " ACTIVE CONTEXT",
        theme::dim().add_modifier(Modifier::BOLD),
    ))];
    lines.push(match episode {
        Some(episode) => Line::from(vec![
            Span::raw(" "),
            Span::styled(format!("{} ", episode.code), Style::default().fg(theme::BLUE)),
            Span::styled(episode.title.clone(), theme::title()),
        ]),
        None => Line::from(Span::styled(" Select an episode to begin research", theme::muted())),
    });
    lines
}

/// Tab labels carry a count only when it is non-zero.
pub(super) fn build_tab_line(active: ResearchTab, reports: usize, facts: usize) -> Line<'static> {
    let label = |name: &str, count: usize| {
        if count > 0 {
            format!(" {name} ({count}) ")
        } else {
            format!(" {name} ")
        }
    };
    let style = |tab: ResearchTab| {
        if tab == active {
            theme::badge(theme::ACCENT)
        } else {
            theme::muted()
        }
    };
    Line::from(vec![
        Span::raw(" "),
        Span::styled(label("AI Briefs", reports), style(ResearchTab::Briefs)),
        Span::raw(" "),
        Span::styled(label("Knowledge Base", facts), style(ResearchTab::Knowledge)),
    ])
}

/// Cursor 0 is the "New Research" entry; cursor `n` is `reports[n - 1]`.
pub(super) fn build_report_list_lines(
    reports: &[ResearchReport],
    loading: bool,
    cursor: usize,
    selected_id: Option<&str>,
    focused: bool,
) -> Vec<Line<'static>> {
    let new_style = if focused && cursor == 0 {
        theme::highlight().fg(theme::ACCENT)
    } else {
        Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)
    };
    let mut lines = vec![
        Line::from(Span::styled(" + New Research", new_style)),
        Line::raw(""),
    ];

    if loading && reports.is_empty() {
        lines.push(Line::from(Span::styled(" Loading reports...", theme::muted())));
        return lines;
    }

    if reports.is_empty() {
        lines.push(Line::from(Span::styled(" No research reports yet.", theme::muted())));
        lines.push(Line::from(Span::styled(
            " Press n or choose \"New Research\" to begin.",
            theme::dim(),
        )));
        return lines;
    }

    for (i, report) in reports.iter().enumerate() {
        let highlighted = focused && cursor == i + 1;
        let selected = selected_id == Some(report.id.as_str());
        lines.extend(report_card_lines(report, highlighted, selected));
    }
    lines
}

/// First line of the entry at `cursor` in [`build_report_list_lines`].
pub(super) fn cursor_line(reports: &[ResearchReport], cursor: usize) -> usize {
    let cards: usize = reports
        .iter()
        .take(cursor.saturating_sub(1))
        .map(card_height)
        .sum();
    if cursor == 0 {
        0
    } else {
        2 + cards
    }
}

fn card_height(report: &ResearchReport) -> usize {
    if report.executive_summary.trim().is_empty() {
        3
    } else {
        4
    }
}

fn report_card_lines(report: &ResearchReport, highlighted: bool, selected: bool) -> Vec<Line<'static>> {
    let color = theme::status_color(report.status);
    let bar = Span::styled("▌", Style::default().fg(color));
    let title_style = match (highlighted, selected) {
        (true, _) => theme::highlight(),
        (false, true) => theme::title().fg(theme::ACCENT),
        (false, false) => theme::title(),
    };
    let title = if report.title.trim().is_empty() {
        "Untitled report".to_string()
    } else {
        truncate(&report.title, SUMMARY_EXCERPT)
    };

    let mut lines = vec![Line::from(vec![
        bar.clone(),
        Span::raw(" "),
        Span::styled(title, title_style),
    ])];
    if !report.executive_summary.trim().is_empty() {
        lines.push(Line::from(vec![
            bar.clone(),
            Span::raw(" "),
            Span::styled(truncate(&report.executive_summary, SUMMARY_EXCERPT), theme::muted()),
        ]));
    }
    lines.push(Line::from(vec![
        bar,
        Span::raw(" "),
        Span::styled(report.status.label().to_string(), Style::default().fg(color)),
    ]));
    lines.push(Line::raw(""));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Bibliography, Phase, ReportStatus};
    use crate::tui::views::test_util::lines_text;

    fn report(id: &str, title: &str, summary: &str, status: ReportStatus) -> ResearchReport {
        ResearchReport {
            id: id.into(),
            title: title.into(),
            query: None,
            executive_summary: summary.into(),
            key_findings: Vec::new(),
            producer_notes: String::new(),
            linked_assets: Vec::new(),
            bibliography: Bibliography::default(),
            status,
            attached_files: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_context_line() {
        let text = lines_text(&build_context_lines(None));
        assert!(text.contains("Select an episode to begin research"));

        let episode = Episode {
            id: "e1".into(),
            code: "EP01".into(),
            title: "Part One".into(),
            brief: None,
            current_phase: Phase::Research,
            phase_progress: 0,
            order: None,
        };
        let text = lines_text(&build_context_lines(Some(&episode)));
        assert!(text.contains("EP01 Part One"));
    }

    #[test]
    fn test_tab_counts_only_when_positive() {
        let text = lines_text(&[build_tab_line(ResearchTab::Briefs, 0, 0)]);
        assert!(text.contains(" AI Briefs "));
        assert!(!text.contains('('));

        let text = lines_text(&[build_tab_line(ResearchTab::Knowledge, 3, 12)]);
        assert!(text.contains("AI Briefs (3)"));
        assert!(text.contains("Knowledge Base (12)"));
    }

    #[test]
    fn test_empty_and_loading_states() {
        let text = lines_text(&build_report_list_lines(&[], false, 0, None, true));
        assert!(text.contains("New Research"));
        assert!(text.contains("No research reports yet."));

        let text = lines_text(&build_report_list_lines(&[], true, 0, None, true));
        assert!(text.contains("Loading reports..."));
    }

    #[test]
    fn test_report_card_shows_status_label() {
        let reports = vec![
            report("r1", "Berlin Airlift", "Supply flights into West Berlin", ReportStatus::Complete),
            report("r2", "Checkpoint Charlie", "", ReportStatus::DeepResearch),
            report("r3", "", "", ReportStatus::Unknown),
        ];
        let text = lines_text(&build_report_list_lines(&reports, false, 1, Some("r1"), true));
        assert!(text.contains("Berlin Airlift"));
        assert!(text.contains("Supply flights"));
        assert!(text.contains("Complete"));
        assert!(text.contains("Deep Research"));
        assert!(text.contains("Untitled report"));
        assert!(text.contains("Unknown"));

        let lines = build_report_list_lines(&reports, false, 0, None, true);
        assert_eq!(cursor_line(&reports, 0), 0);
        assert_eq!(cursor_line(&reports, 1), 2);
        assert_eq!(cursor_line(&reports, 3), 2 + 4 + 3);
        let third = &lines[cursor_line(&reports, 3)];
        assert!(lines_text(std::slice::from_ref(third)).contains("Untitled report"));
    }
}
