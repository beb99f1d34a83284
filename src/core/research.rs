//! Research reports and knowledge base for one episode.
//!
//! [`ResearchData`] holds the collections for a single [`ResearchScope`].
//! Operations are described by [`ResearchCommand`] and run by [`execute`],
//! which the TUI spawns on a tokio task; the returned [`ResearchOutcome`] is
//! applied back with [`ResearchData::apply`]. Outcomes for a scope other than
//! the current one are dropped.
//!
//! [`ResearchSelection`] is the top-down series/episode/report selection of
//! the research page.

use std::path::PathBuf;

use crate::api::{ApiClient, ApiError, UploadTarget};
use crate::core::models::{
    upsert, AttachedFile, Episode, KnowledgeBaseEntry, NewAsset, NewFact, NewResearch,
    ReportUpdate, ResearchReport, ResearchScope, Series,
};

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ResearchCommand {
    FetchReports,
    FetchKnowledgeBase,
    /// Upload each local attachment, then post the query.
    Create {
        query: String,
        attachments: Vec<PathBuf>,
    },
    MarkComplete {
        report_id: String,
    },
    UpdateNotes {
        report_id: String,
        notes: String,
    },
    LinkAsset {
        report_id: String,
        asset: NewAsset,
    },
    AddFact(NewFact),
}

impl ResearchCommand {
    /// Short description used in log lines and error notifications.
    pub fn describe(&self) -> &'static str {
        match self {
            ResearchCommand::FetchReports => "fetch research reports",
            ResearchCommand::FetchKnowledgeBase => "fetch knowledge base",
            ResearchCommand::Create { .. } => "create research",
            ResearchCommand::MarkComplete { .. } => "mark report complete",
            ResearchCommand::UpdateNotes { .. } => "save producer notes",
            ResearchCommand::LinkAsset { .. } => "link asset",
            ResearchCommand::AddFact(_) => "add fact to knowledge base",
        }
    }

    /// Notification text shown when a mutation succeeds. Fetches are silent.
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            ResearchCommand::FetchReports | ResearchCommand::FetchKnowledgeBase => None,
            ResearchCommand::Create { .. } => Some("Research report created"),
            ResearchCommand::MarkComplete { .. } => Some("Report marked complete"),
            ResearchCommand::UpdateNotes { .. } => Some("Producer notes saved"),
            ResearchCommand::LinkAsset { .. } => Some("Asset linked"),
            ResearchCommand::AddFact(_) => Some("Fact added to knowledge base"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    Reports(Vec<ResearchReport>),
    KnowledgeBase(Vec<KnowledgeBaseEntry>),
    /// A created or updated report, merged by id.
    Report(ResearchReport),
    Entry(KnowledgeBaseEntry),
}

/// Run one command against the backend.
#[tracing::instrument(
    name = "research",
    skip_all,
    fields(command = command.describe(), episode = scope.episode_id())
)]
pub async fn execute(
    api: &ApiClient,
    scope: &ResearchScope,
    command: ResearchCommand,
) -> Result<ResearchOutcome, ApiError> {
    let result = send(api, scope, command).await;
    match &result {
        Ok(_) => tracing::debug!("research command finished"),
        Err(e) => tracing::warn!(error = %e, "research command failed"),
    }
    result
}

async fn send(
    api: &ApiClient,
    scope: &ResearchScope,
    command: ResearchCommand,
) -> Result<ResearchOutcome, ApiError> {
    match command {
        ResearchCommand::FetchReports => api.list_reports(scope).await.map(ResearchOutcome::Reports),
        ResearchCommand::FetchKnowledgeBase => api
            .list_knowledge_base(scope)
            .await
            .map(ResearchOutcome::KnowledgeBase),
        ResearchCommand::Create { query, attachments } => {
            let target = UploadTarget::from(scope);
            let mut attached_files: Vec<AttachedFile> = Vec::with_capacity(attachments.len());
            for path in &attachments {
                let uploaded = api.upload_file(path, &target).await?;
                attached_files.push(uploaded.into());
            }
            let research = NewResearch {
                query,
                attached_files,
            };
            api.create_research(scope, &research)
                .await
                .map(ResearchOutcome::Report)
        }
        ResearchCommand::MarkComplete { report_id } => api
            .mark_complete(scope, &report_id)
            .await
            .map(ResearchOutcome::Report),
        ResearchCommand::UpdateNotes { report_id, notes } => api
            .update_research(scope, &report_id, &ReportUpdate { producer_notes: notes })
            .await
            .map(ResearchOutcome::Report),
        ResearchCommand::LinkAsset { report_id, asset } => api
            .link_asset(scope, &report_id, &asset)
            .await
            .map(ResearchOutcome::Report),
        ResearchCommand::AddFact(fact) => api
            .add_to_knowledge_base(scope, &fact)
            .await
            .map(ResearchOutcome::Entry),
    }
}

// ============================================================================
// Scoped collections
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ResearchData {
    scope: Option<ResearchScope>,
    reports: Vec<ResearchReport>,
    knowledge_base: Vec<KnowledgeBaseEntry>,
    loading: bool,
    kb_loading: bool,
    error: Option<String>,
}

impl ResearchData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> Option<&ResearchScope> {
        self.scope.as_ref()
    }

    pub fn reports(&self) -> &[ResearchReport] {
        &self.reports
    }

    pub fn knowledge_base(&self) -> &[KnowledgeBaseEntry] {
        &self.knowledge_base
    }

    pub fn report(&self, id: &str) -> Option<&ResearchReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_kb_loading(&self) -> bool {
        self.kb_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Point at a new scope. Changing scope empties both collections.
    pub fn set_scope(&mut self, scope: Option<ResearchScope>) {
        if self.scope != scope {
            *self = Self {
                scope,
                ..Self::default()
            };
        }
    }

    fn is_current(&self, scope: &ResearchScope) -> bool {
        self.scope.as_ref() == Some(scope)
    }

    /// Mark the matching collection as loading before a fetch is spawned.
    pub fn begin(&mut self, command: &ResearchCommand) {
        match command {
            ResearchCommand::FetchReports => self.loading = true,
            ResearchCommand::FetchKnowledgeBase => self.kb_loading = true,
            _ => {}
        }
    }

    /// Apply a successful outcome. Returns `false` when `scope` is stale.
    pub fn apply(&mut self, scope: &ResearchScope, outcome: ResearchOutcome) -> bool {
        if !self.is_current(scope) {
            log::debug!("Dropping research result for stale scope {scope:?}");
            return false;
        }
        self.error = None;
        match outcome {
            ResearchOutcome::Reports(reports) => {
                self.reports = reports;
                self.loading = false;
            }
            ResearchOutcome::KnowledgeBase(entries) => {
                self.knowledge_base = entries;
                self.kb_loading = false;
            }
            ResearchOutcome::Report(report) => {
                upsert(&mut self.reports, report);
            }
            ResearchOutcome::Entry(entry) => {
                upsert(&mut self.knowledge_base, entry);
            }
        }
        true
    }

    /// Record a failed command. Returns `false` when `scope` is stale.
    pub fn apply_error(
        &mut self,
        scope: &ResearchScope,
        command: &ResearchCommand,
        error: &ApiError,
    ) -> bool {
        if !self.is_current(scope) {
            return false;
        }
        log::warn!("Failed to {}: {error}", command.describe());
        match command {
            ResearchCommand::FetchReports => self.loading = false,
            ResearchCommand::FetchKnowledgeBase => self.kb_loading = false,
            _ => {}
        }
        self.error = Some(error.to_string());
        true
    }

    /// Run a command inline and apply its result.
    pub async fn run(&mut self, api: &ApiClient, command: ResearchCommand) -> Result<(), ApiError> {
        let scope = self.scope.clone().ok_or(ApiError::MissingScope)?;
        self.begin(&command);
        match execute(api, &scope, command.clone()).await {
            Ok(outcome) => {
                self.apply(&scope, outcome);
                Ok(())
            }
            Err(e) => {
                self.apply_error(&scope, &command, &e);
                Err(e)
            }
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Series → episode → report selection, reset top-down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchSelection {
    series: Option<Series>,
    episode: Option<Episode>,
    report_id: Option<String>,
}

impl ResearchSelection {
    pub fn series(&self) -> Option<&Series> {
        self.series.as_ref()
    }

    pub fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    pub fn report_id(&self) -> Option<&str> {
        self.report_id.as_deref()
    }

    /// Returns `true` when the selection changed. A different series clears
    /// the episode and report.
    pub fn select_series(&mut self, series: Option<Series>) -> bool {
        if self.series.as_ref().map(|s| &s.id) == series.as_ref().map(|s| &s.id) {
            self.series = series;
            return false;
        }
        self.series = series;
        self.episode = None;
        self.report_id = None;
        true
    }

    /// Returns `true` when the selection changed. A different episode clears
    /// the report.
    pub fn select_episode(&mut self, episode: Option<Episode>) -> bool {
        if self.episode.as_ref().map(|e| &e.id) == episode.as_ref().map(|e| &e.id) {
            self.episode = episode;
            return false;
        }
        self.episode = episode;
        self.report_id = None;
        true
    }

    pub fn select_report(&mut self, report_id: Option<String>) {
        self.report_id = report_id;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn scope(&self, project_id: Option<&str>) -> Option<ResearchScope> {
        ResearchScope::from_parts(
            project_id,
            self.series.as_ref().map(|s| s.id.as_str()),
            self.episode.as_ref().map(|e| e.id.as_str()),
        )
        .ok()
    }
}
