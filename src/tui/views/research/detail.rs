//! Report detail: summary, key findings, producer notes, linked assets and
//! bibliography for the selected report.

use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use ratatui_textarea::TextArea;

use crate::core::models::{Bibliography, Episode, LinkedAsset, NewFact, ResearchReport};
use crate::core::research::ResearchCommand;
use crate::tui::theme;
use crate::tui::views::key_press;

const NOTES_EDITOR_HEIGHT: u16 = 8;

/// Requests the detail pane makes of the research page.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum DetailAction {
    Consumed,
    Command(ResearchCommand),
    /// Open the link-asset modal for the report with this id.
    LinkAsset(String),
}

/// How an external bibliography entry is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SourceKind {
    Link,
    Text,
}

pub(super) fn classify_source(source: &str) -> SourceKind {
    if source.starts_with("http") {
        SourceKind::Link
    } else {
        SourceKind::Text
    }
}

struct NotesEditor {
    report_id: String,
    original: String,
    textarea: TextArea<'static>,
    saving: bool,
}

impl NotesEditor {
    fn new(report: &ResearchReport) -> Self {
        let lines: Vec<String> = report.producer_notes.lines().map(String::from).collect();
        let original = lines.join("\n");
        let mut textarea = if lines.is_empty() {
            TextArea::default()
        } else {
            TextArea::new(lines)
        };
        textarea.set_placeholder_text("Add your notes and annotations here...");
        textarea.set_style(Style::default().fg(theme::TEXT));
        Self {
            report_id: report.id.clone(),
            original,
            textarea,
            saving: false,
        }
    }

    fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    fn is_modified(&self) -> bool {
        self.text() != self.original
    }

    fn title(&self) -> String {
        match (self.saving, self.is_modified()) {
            (true, _) => " Producer Notes · Saving... ".to_string(),
            (false, true) => " Producer Notes [modified] · Ctrl+S:save Esc:cancel ".to_string(),
            (false, false) => " Producer Notes · Esc:close ".to_string(),
        }
    }
}

pub(super) struct ReportDetail {
    notes: Option<NotesEditor>,
    bibliography_open: bool,
    finding_cursor: usize,
    scroll: u16,
}

impl ReportDetail {
    pub fn new() -> Self {
        Self {
            notes: None,
            bibliography_open: false,
            finding_cursor: 0,
            scroll: 0,
        }
    }

    /// Forget per-report state when another report is selected.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_editing(&self) -> bool {
        self.notes.is_some()
    }

    /// Notes were saved for `report_id`; close its editor.
    pub fn notes_saved(&mut self, report_id: &str) {
        if self.notes.as_ref().is_some_and(|n| n.report_id == report_id) {
            self.notes = None;
        }
    }

    /// Saving failed; keep the editor and its text.
    pub fn notes_failed(&mut self) {
        if let Some(ref mut notes) = self.notes {
            notes.saving = false;
        }
    }

    pub fn handle_input(&mut self, event: &Event, report: &ResearchReport) -> Option<DetailAction> {
        let key = key_press(event)?;

        if self.notes.is_some() && key.code == KeyCode::Esc {
            self.notes = None;
            return Some(DetailAction::Consumed);
        }
        if let Some(ref mut notes) = self.notes {
            match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                    if notes.saving || !notes.is_modified() {
                        return Some(DetailAction::Consumed);
                    }
                    notes.saving = true;
                    return Some(DetailAction::Command(ResearchCommand::UpdateNotes {
                        report_id: notes.report_id.clone(),
                        notes: notes.text(),
                    }));
                }
                _ if notes.saving => {}
                _ => {
                    notes.textarea.input(event.clone());
                }
            }
            return Some(DetailAction::Consumed);
        }

        if key.modifiers != KeyModifiers::NONE && key.modifiers != KeyModifiers::SHIFT {
            return None;
        }
        match key.code {
            KeyCode::Char('e') => {
                self.notes = Some(NotesEditor::new(report));
                Some(DetailAction::Consumed)
            }
            KeyCode::Char('c') => {
                if report.status.is_complete() {
                    return Some(DetailAction::Consumed);
                }
                Some(DetailAction::Command(ResearchCommand::MarkComplete {
                    report_id: report.id.clone(),
                }))
            }
            KeyCode::Char('a') => Some(DetailAction::LinkAsset(report.id.clone())),
            KeyCode::Char('b') => {
                self.bibliography_open = !self.bibliography_open;
                Some(DetailAction::Consumed)
            }
            KeyCode::Char('f') => {
                let finding = report.key_findings.get(self.finding_cursor)?;
                Some(DetailAction::Command(ResearchCommand::AddFact(
                    NewFact::from_finding(finding, &report.id),
                )))
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if !report.key_findings.is_empty() {
                    self.finding_cursor = (self.finding_cursor + 1).min(report.key_findings.len() - 1);
                }
                Some(DetailAction::Consumed)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.finding_cursor = self.finding_cursor.saturating_sub(1);
                Some(DetailAction::Consumed)
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(5);
                Some(DetailAction::Consumed)
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(5);
                Some(DetailAction::Consumed)
            }
            _ => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        report: Option<&ResearchReport>,
        episode: Option<&Episode>,
        focused: bool,
    ) {
        let block = theme::block("Report", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(report) = report else {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::raw(""),
                    Line::from(Span::styled(
                        " Select a research report to view details",
                        theme::muted(),
                    )),
                ]),
                inner,
            );
            return;
        };

        let (body, editor) = match self.notes {
            Some(_) => {
                let rows = Layout::vertical([Constraint::Min(3), Constraint::Length(NOTES_EDITOR_HEIGHT)])
                    .split(inner);
                (rows[0], Some(rows[1]))
            }
            None => (inner, None),
        };

        let lines = self.build_lines(report, episode, focused);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            body,
        );

        if let (Some(notes), Some(area)) = (self.notes.as_ref(), editor) {
            let mut textarea = notes.textarea.clone();
            textarea.set_block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(notes.title())
                    .border_style(theme::border_focused()),
            );
            frame.render_widget(&textarea, area);
        }
    }

    fn build_lines(
        &self,
        report: &ResearchReport,
        episode: Option<&Episode>,
        focused: bool,
    ) -> Vec<Line<'static>> {
        let complete = report.status.is_complete();
        let (button, button_style) = if complete {
            (" Completed ", theme::badge(theme::SUCCESS))
        } else {
            (" Mark Complete ", theme::badge(theme::TEXT_MUTED))
        };

        let mut lines = vec![
            Line::from(Span::styled(report.title.clone(), theme::title())),
            Line::from(vec![
                Span::styled(
                    format!(" {} ", report.status.label()),
                    theme::badge(theme::status_color(report.status)),
                ),
                Span::raw(" "),
                Span::styled(button, button_style),
                Span::styled(if complete { "" } else { " c" }, theme::key_hint()),
            ]),
        ];
        if let Some(episode) = episode {
            lines.push(Line::from(Span::styled(
                format!("Linked to: {}", episode.title),
                theme::dim(),
            )));
        }
        lines.push(Line::raw(""));

        lines.push(section("Executive Summary"));
        let summary = report.executive_summary.trim();
        lines.push(if summary.is_empty() {
            Line::from(Span::styled("No summary available.", theme::dim()))
        } else {
            Line::from(Span::styled(summary.to_string(), Style::default().fg(theme::TEXT)))
        });
        lines.push(Line::raw(""));

        if !report.key_findings.is_empty() {
            lines.push(section("Key Findings"));
            for (i, finding) in report.key_findings.iter().enumerate() {
                let highlighted = focused && i == self.finding_cursor;
                let mut spans = vec![
                    Span::styled(
                        if highlighted { "▸ " } else { "• " },
                        Style::default().fg(theme::ACCENT),
                    ),
                    Span::styled(
                        finding.name.clone(),
                        if highlighted {
                            theme::highlight()
                        } else {
                            theme::title()
                        },
                    ),
                ];
                if !finding.description.is_empty() {
                    spans.push(Span::styled(
                        format!(": {}", finding.description),
                        Style::default().fg(theme::TEXT),
                    ));
                }
                if !finding.source_indices.is_empty() {
                    spans.push(Span::styled(
                        format!(" [{}]", join_indices(&finding.source_indices)),
                        Style::default().fg(theme::BLUE),
                    ));
                }
                if let Some(confidence) = finding.confidence {
                    spans.push(Span::styled(
                        format!(" [{}]", confidence.label()),
                        Style::default().fg(theme::confidence_color(confidence)),
                    ));
                }
                lines.push(Line::from(spans));
            }
            lines.push(Line::raw(""));
        }

        if self.notes.is_none() {
            lines.push(section("Producer Notes & Annotations"));
            if report.producer_notes.trim().is_empty() {
                lines.push(Line::from(Span::styled("No notes yet.", theme::dim())));
            } else {
                for note in report.producer_notes.lines() {
                    lines.push(Line::from(Span::styled(note.to_string(), theme::muted())));
                }
            }
            lines.push(Line::raw(""));
        }

        lines.extend(linked_asset_lines(&report.linked_assets));
        lines.push(Line::raw(""));
        lines.extend(bibliography_lines(&report.bibliography, self.bibliography_open));

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("e", theme::key_hint()),
            Span::raw(":notes "),
            Span::styled("a", theme::key_hint()),
            Span::raw(":link clip "),
            Span::styled("f", theme::key_hint()),
            Span::raw(":add finding to KB "),
            Span::styled("b", theme::key_hint()),
            Span::raw(":sources"),
        ]));
        lines
    }
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_uppercase(),
        theme::muted().add_modifier(Modifier::BOLD),
    ))
}

fn join_indices(indices: &[u32]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn linked_asset_lines(assets: &[LinkedAsset]) -> Vec<Line<'static>> {
    let mut lines = vec![section("Linked Archive Assets")];
    if assets.is_empty() {
        lines.push(Line::from(Span::styled("No assets linked yet.", theme::dim())));
    }
    for asset in assets {
        let mut spans = vec![
            Span::styled("▶ ", Style::default().fg(theme::VIOLET)),
            Span::styled(asset.name.clone(), Style::default().fg(theme::TEXT)),
            Span::styled(format!(" ({})", asset.asset_type), theme::dim()),
        ];
        if let Some(ref url) = asset.url {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(url.clone(), theme::link()));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(vec![
        Span::styled("+ Link Clip", Style::default().fg(theme::ACCENT)),
        Span::styled(" a", theme::key_hint()),
    ]));
    lines
}

/// Collapsible source list. No sources renders nothing at all.
pub(super) fn bibliography_lines(bibliography: &Bibliography, expanded: bool) -> Vec<Line<'static>> {
    let total = bibliography.total();
    if total == 0 {
        return Vec::new();
    }

    let arrow = if expanded { "▾" } else { "▸" };
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{arrow} Bibliography & Sources ({total})"),
            theme::muted().add_modifier(Modifier::BOLD),
        ),
        Span::styled(" b", theme::key_hint()),
    ])];
    if !expanded {
        return lines;
    }

    if !bibliography.ai_generated.is_empty() {
        lines.push(Line::from(Span::styled("  AI Generated", theme::dim())));
        for source in &bibliography.ai_generated {
            lines.push(Line::from(Span::styled(format!("   • {source}"), theme::muted())));
        }
    }
    if !bibliography.external.is_empty() {
        lines.push(Line::from(Span::styled("  External References", theme::dim())));
        for source in &bibliography.external {
            let style = match classify_source(source) {
                SourceKind::Link => theme::link(),
                SourceKind::Text => theme::muted(),
            };
            lines.push(Line::from(vec![
                Span::styled("   • ", theme::muted()),
                Span::styled(source.clone(), style),
            ]));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Confidence, KeyFinding, KnowledgeCategory, Phase, ReportStatus};
    use crate::tui::views::test_util::{ctrl, lines_text, press, type_str};
    use rstest::rstest;

    fn report(status: ReportStatus) -> ResearchReport {
        ResearchReport {
            id: "r1".into(),
            title: "Berlin Airlift".into(),
            query: Some("How did the airlift work?".into()),
            executive_summary: String::new(),
            key_findings: vec![
                KeyFinding {
                    name: "Operation Vittles".into(),
                    description: "US codename".into(),
                    confidence: Some(Confidence::High),
                    source_indices: vec![1, 3],
                },
                KeyFinding {
                    name: "Tempelhof".into(),
                    description: String::new(),
                    confidence: None,
                    source_indices: vec![],
                },
            ],
            producer_notes: "Call the archive".into(),
            linked_assets: Vec::new(),
            bibliography: Bibliography::default(),
            status,
            attached_files: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn episode() -> Episode {
        Episode {
            id: "e1".into(),
            code: "EP01".into(),
            title: "Part One".into(),
            brief: None,
            current_phase: Phase::Research,
            phase_progress: 0,
            order: None,
        }
    }

    #[rstest]
    #[case("https://archive.org/berlin", SourceKind::Link)]
    #[case("http://example.com", SourceKind::Link)]
    #[case("Smith, The Airlift (1998)", SourceKind::Text)]
    #[case("see http://example.com", SourceKind::Text)]
    fn test_classify_source(#[case] source: &str, #[case] expected: SourceKind) {
        assert_eq!(classify_source(source), expected);
    }

    #[test]
    fn test_empty_bibliography_renders_nothing() {
        assert!(bibliography_lines(&Bibliography::default(), true).is_empty());
    }

    #[test]
    fn test_bibliography_sections() {
        let bib = Bibliography {
            ai_generated: vec!["Model summary".into()],
            external: vec!["https://archive.org/x".into(), "Smith 1998".into()],
        };
        let collapsed = lines_text(&bibliography_lines(&bib, false));
        assert!(collapsed.contains("Bibliography & Sources (3)"));
        assert!(!collapsed.contains("AI Generated"));

        let lines = bibliography_lines(&bib, true);
        let text = lines_text(&lines);
        assert!(text.contains("AI Generated"));
        assert!(text.contains("External References"));
        let link_span = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "https://archive.org/x")
            .unwrap();
        assert_eq!(link_span.style, theme::link());
        let text_span = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "Smith 1998")
            .unwrap();
        assert_eq!(text_span.style, theme::muted());
    }

    #[test]
    fn test_detail_content() {
        let detail = ReportDetail::new();
        let text = lines_text(&detail.build_lines(&report(ReportStatus::InProgress), Some(&episode()), true));
        assert!(text.contains("Berlin Airlift"));
        assert!(text.contains("Mark Complete"));
        assert!(text.contains("Linked to: Part One"));
        assert!(text.contains("No summary available."));
        assert!(text.contains("Operation Vittles: US codename [1, 3] [high]"));
        assert!(text.contains("Call the archive"));
        assert!(text.contains("No assets linked yet."));
        assert!(!text.contains("Bibliography"));
    }

    #[test]
    fn test_completed_report_shows_green_badge() {
        let detail = ReportDetail::new();
        let lines = detail.build_lines(&report(ReportStatus::Complete), None, false);
        let text = lines_text(&lines);
        assert!(text.contains("Completed"));
        assert!(text.contains("Complete"));
        let status = lines[1].spans.first().unwrap();
        assert_eq!(status.style.bg, Some(theme::GREEN));
    }

    #[test]
    fn test_mark_complete_only_when_not_complete() {
        let mut detail = ReportDetail::new();
        assert_eq!(
            detail.handle_input(&press(KeyCode::Char('c')), &report(ReportStatus::InProgress)),
            Some(DetailAction::Command(ResearchCommand::MarkComplete {
                report_id: "r1".into()
            }))
        );
        assert_eq!(
            detail.handle_input(&press(KeyCode::Char('c')), &report(ReportStatus::Complete)),
            Some(DetailAction::Consumed)
        );
    }

    #[test]
    fn test_promote_highlighted_finding() {
        let mut detail = ReportDetail::new();
        let r = report(ReportStatus::Complete);
        detail.handle_input(&press(KeyCode::Char('j')), &r);
        match detail.handle_input(&press(KeyCode::Char('f')), &r) {
            Some(DetailAction::Command(ResearchCommand::AddFact(fact))) => {
                assert_eq!(fact.fact, "Tempelhof");
                assert_eq!(fact.category, KnowledgeCategory::General);
                assert_eq!(fact.source_report_id.as_deref(), Some("r1"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_notes_save_only_when_modified() {
        let mut detail = ReportDetail::new();
        let r = report(ReportStatus::InProgress);
        detail.handle_input(&press(KeyCode::Char('e')), &r);
        assert!(detail.is_editing());
        assert_eq!(detail.handle_input(&ctrl('s'), &r), Some(DetailAction::Consumed));

        for e in type_str("!") {
            detail.handle_input(&e, &r);
        }
        match detail.handle_input(&ctrl('s'), &r) {
            Some(DetailAction::Command(ResearchCommand::UpdateNotes { report_id, notes })) => {
                assert_eq!(report_id, "r1");
                assert_ne!(notes, "Call the archive");
                assert!(notes.contains('!'));
            }
            other => panic!("unexpected action: {other:?}"),
        }

        detail.notes_failed();
        assert!(detail.is_editing());
        detail.notes_saved("r1");
        assert!(!detail.is_editing());
    }

    #[rstest]
    #[case("Call the archive\n")]
    #[case("Call the archive\r\nthen Tempelhof")]
    #[case("Call the archive\r\nthen Tempelhof\r\n")]
    fn test_stored_line_endings_are_not_edits(#[case] stored: &str) {
        let mut detail = ReportDetail::new();
        let mut r = report(ReportStatus::InProgress);
        r.producer_notes = stored.into();
        detail.handle_input(&press(KeyCode::Char('e')), &r);
        let notes = detail.notes.as_ref().unwrap();
        assert!(!notes.is_modified());
        assert!(!notes.title().contains("[modified]"));
        assert_eq!(detail.handle_input(&ctrl('s'), &r), Some(DetailAction::Consumed));
    }

    #[test]
    fn test_escape_discards_notes() {
        let mut detail = ReportDetail::new();
        let r = report(ReportStatus::InProgress);
        detail.handle_input(&press(KeyCode::Char('e')), &r);
        detail.handle_input(&press(KeyCode::Char('x')), &r);
        detail.handle_input(&press(KeyCode::Esc), &r);
        assert!(!detail.is_editing());
    }
}
