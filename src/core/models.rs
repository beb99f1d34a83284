//! Entities exchanged with the production backend.
//!
//! The server is authoritative for every field. Types here describe what the
//! client reads (`Project`, `Series`, ...) and what it writes (`NewProject`,
//! `ReportUpdate`, ...). Optional or null fields decode to their defaults so a
//! sparse document never fails a whole list fetch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::api::ApiError;

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Null, non-string and unrecognised values become `None`.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok()))
}

fn lenient_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    Ok(lenient_option(deserializer)?.unwrap_or_default())
}

/// Lower-case with spaces and hyphens folded to underscores.
fn normalize_tag(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

// ============================================================================
// Enums
// ============================================================================

/// The seven fixed stages of the production workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Research,
    Archive,
    Scripting,
    Interviews,
    Voiceover,
    Assembly,
    Review,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Research,
        Phase::Archive,
        Phase::Scripting,
        Phase::Interviews,
        Phase::Voiceover,
        Phase::Assembly,
        Phase::Review,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Phase::Research => "research",
            Phase::Archive => "archive",
            Phase::Scripting => "scripting",
            Phase::Interviews => "interviews",
            Phase::Voiceover => "voiceover",
            Phase::Assembly => "assembly",
            Phase::Review => "review",
        }
    }

    /// Short label used on project cards.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Research => "Research",
            Phase::Archive => "Archive",
            Phase::Scripting => "Script",
            Phase::Interviews => "Interviews",
            Phase::Voiceover => "Voice Over",
            Phase::Assembly => "Assembly",
            Phase::Review => "Review",
        }
    }

    /// Numbered label used in the workflow navigation.
    pub fn nav_label(self) -> &'static str {
        match self {
            Phase::Research => "1. Research",
            Phase::Archive => "2. Archive",
            Phase::Scripting => "3. Script",
            Phase::Interviews => "3b. Interviews",
            Phase::Voiceover => "4. Voice Over",
            Phase::Assembly => "5. Assembly",
            Phase::Review => "6. Review",
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = normalize_tag(s);
        Phase::ALL
            .into_iter()
            .find(|p| p.id() == tag)
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

/// Kind of production. Stored upper-case by the backend; any casing is
/// accepted and anything else decodes as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum ProjectType {
    #[default]
    Documentary,
    Series,
    Feature,
    /// A type this client does not offer in the new-project form.
    Other,
}

impl ProjectType {
    pub const ALL: [ProjectType; 3] = [
        ProjectType::Documentary,
        ProjectType::Series,
        ProjectType::Feature,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProjectType::Documentary => "Documentary",
            ProjectType::Series => "Series",
            ProjectType::Feature => "Feature",
            ProjectType::Other => "Other",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            ProjectType::Documentary => "DOCUMENTARY",
            ProjectType::Series => "SERIES",
            ProjectType::Feature => "FEATURE",
            ProjectType::Other => "OTHER",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl FromStr for ProjectType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "DOCUMENTARY" => ProjectType::Documentary,
            "SERIES" => ProjectType::Series,
            "FEATURE" => ProjectType::Feature,
            _ => ProjectType::Other,
        })
    }
}

impl From<String> for ProjectType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(project_type) => project_type,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    DeepResearch,
    #[default]
    InProgress,
    Complete,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ReportStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::DeepResearch => "Deep Research",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::Complete => "Complete",
            ReportStatus::Unknown => "Unknown",
        }
    }

    pub fn is_complete(self) -> bool {
        self == ReportStatus::Complete
    }
}

impl FromStr for ReportStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match normalize_tag(s).as_str() {
            "deep_research" => ReportStatus::DeepResearch,
            "in_progress" => ReportStatus::InProgress,
            "complete" => ReportStatus::Complete,
            _ => ReportStatus::Unknown,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn label(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            other => Err(format!("unknown confidence: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeCategory {
    Person,
    Event,
    Location,
    #[default]
    #[serde(other)]
    General,
}

impl KnowledgeCategory {
    pub fn label(self) -> &'static str {
        match self {
            KnowledgeCategory::Person => "Person",
            KnowledgeCategory::Event => "Event",
            KnowledgeCategory::Location => "Location",
            KnowledgeCategory::General => "General",
        }
    }
}

impl FromStr for KnowledgeCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "person" => KnowledgeCategory::Person,
            "event" => KnowledgeCategory::Event,
            "location" => KnowledgeCategory::Location,
            _ => KnowledgeCategory::General,
        })
    }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_default")]
    pub project_type: ProjectType,
    #[serde(default, deserialize_with = "lenient_default")]
    pub current_phase: Phase,
    #[serde(default, deserialize_with = "null_default")]
    pub phase_progress: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub editing: bool,
    #[serde(default)]
    pub producer: Option<Producer>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Project {
    /// Phase progress clamped to 0..=100 for display.
    pub fn progress(&self) -> u16 {
        self.phase_progress.clamp(0, 100) as u16
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub brief: Option<String>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub current_phase: Phase,
    #[serde(default, deserialize_with = "null_default")]
    pub phase_progress: i64,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_option")]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "null_default")]
    pub source_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedAsset {
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub asset_type: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bibliography {
    #[serde(default, deserialize_with = "null_default")]
    pub ai_generated: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub external: Vec<String>,
}

impl Bibliography {
    pub fn total(&self) -> usize {
        self.ai_generated.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// File descriptor attached to a research query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "null_default")]
    pub key_findings: Vec<KeyFinding>,
    #[serde(default, deserialize_with = "null_default")]
    pub producer_notes: String,
    #[serde(default, deserialize_with = "null_default")]
    pub linked_assets: Vec<LinkedAsset>,
    #[serde(default, deserialize_with = "null_default")]
    pub bibliography: Bibliography,
    #[serde(default, deserialize_with = "lenient_default")]
    pub status: ReportStatus,
    #[serde(default, deserialize_with = "null_default")]
    pub attached_files: Vec<AttachedFile>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub fact: String,
    #[serde(default, deserialize_with = "lenient_default")]
    pub category: KnowledgeCategory,
    #[serde(default, deserialize_with = "lenient_option")]
    pub confidence: Option<Confidence>,
    #[serde(default, deserialize_with = "null_default")]
    pub source_indices: Vec<u32>,
    #[serde(default)]
    pub source_report_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `file` field of the `/upload` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub content_type: String,
}

impl From<UploadedFile> for AttachedFile {
    fn from(file: UploadedFile) -> Self {
        AttachedFile {
            name: file.name,
            file_type: file.content_type,
            url: Some(file.url),
        }
    }
}

/// The signed-in user. Static; comes from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub role: String,
}

impl User {
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
}

impl NewProject {
    /// Build from form input. `None` when the name is blank.
    pub fn from_form(name: &str, description: &str, project_type: ProjectType) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            description: description.trim().to_string(),
            project_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_progress: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSeries {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewSeries {
    pub fn from_form(title: &str) -> Option<Self> {
        let title = title.trim();
        (!title.is_empty()).then(|| Self {
            title: title.to_string(),
            description: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Code suggested for the next episode of a series holding `existing` episodes.
pub fn default_episode_code(existing: usize) -> String {
    format!("EP{:02}", existing + 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEpisode {
    pub title: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
}

impl NewEpisode {
    /// Build from form input. A blank code falls back to the next sequence
    /// code; a blank title yields `None`.
    pub fn from_form(title: &str, code: &str, existing: usize) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let code = match code.trim() {
            "" => default_episode_code(existing),
            c => c.to_string(),
        };
        Some(Self {
            title: title.to_string(),
            code,
            brief: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_progress: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewResearch {
    pub query: String,
    pub attached_files: Vec<AttachedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportUpdate {
    pub producer_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAsset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NewAsset {
    /// Build from form input. Name and type are required; url is optional.
    pub fn from_form(name: &str, asset_type: &str, url: &str) -> Option<Self> {
        let (name, asset_type, url) = (name.trim(), asset_type.trim(), url.trim());
        if name.is_empty() || asset_type.is_empty() {
            return None;
        }
        Some(Self {
            asset_id: None,
            name: name.to_string(),
            asset_type: asset_type.to_string(),
            url: (!url.is_empty()).then(|| url.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFact {
    pub fact: String,
    pub category: KnowledgeCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub source_indices: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_report_id: Option<String>,
}

impl NewFact {
    /// Promote a key finding of `report_id` into a knowledge-base fact.
    pub fn from_finding(finding: &KeyFinding, report_id: &str) -> Self {
        let fact = if finding.description.trim().is_empty() {
            finding.name.clone()
        } else {
            format!("{}: {}", finding.name, finding.description)
        };
        Self {
            fact,
            category: KnowledgeCategory::General,
            confidence: Some(finding.confidence.unwrap_or(Confidence::Medium)),
            source_indices: finding.source_indices.clone(),
            source_report_id: Some(report_id.to_string()),
        }
    }
}

// ============================================================================
// Scope & collection helpers
// ============================================================================

/// The (project, series, episode) triple that every research and
/// knowledge-base request is nested under. Cannot exist with a blank id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResearchScope {
    project_id: String,
    series_id: String,
    episode_id: String,
}

impl ResearchScope {
    pub fn new(
        project_id: impl Into<String>,
        series_id: impl Into<String>,
        episode_id: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let scope = Self {
            project_id: project_id.into(),
            series_id: series_id.into(),
            episode_id: episode_id.into(),
        };
        if scope.project_id.is_empty() || scope.series_id.is_empty() || scope.episode_id.is_empty() {
            return Err(ApiError::MissingScope);
        }
        Ok(scope)
    }

    /// Resolve a scope from a partially made selection.
    pub fn from_parts(
        project_id: Option<&str>,
        series_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<Self, ApiError> {
        match (project_id, series_id, episode_id) {
            (Some(p), Some(s), Some(e)) => Self::new(p, s, e),
            _ => Err(ApiError::MissingScope),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }
}

/// Entities addressed by a backend-assigned id.
pub trait Identified {
    fn id(&self) -> &str;
}

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_identified!(Project, Series, Episode, ResearchReport, KnowledgeBaseEntry);

/// Replace the item with the same id in place, or append it.
/// Returns the index the item ended up at.
pub fn upsert<T: Identified>(items: &mut Vec<T>, item: T) -> usize {
    match items.iter().position(|existing| existing.id() == item.id()) {
        Some(idx) => {
            items[idx] = item;
            idx
        }
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}
