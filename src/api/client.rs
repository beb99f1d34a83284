//! REST client for the production backend.
//!
//! One method per backend operation. Every call is a single attempt: no
//! retry and no caching. Non-2xx responses become [`ApiError::Status`].

use std::path::Path;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::core::models::{
    Episode, EpisodeUpdate, KnowledgeBaseEntry, NewAsset, NewEpisode, NewFact, NewProject,
    NewResearch, NewSeries, Project, ProjectUpdate, ReportUpdate, ResearchReport, ResearchScope,
    Series, SeriesUpdate, UploadedFile,
};

use super::error::{ApiError, Result};
use super::upload::{self, UploadTarget};

// ============================================================================
// List envelopes
// ============================================================================

#[derive(Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Deserialize)]
struct SeriesList {
    #[serde(default)]
    series: Vec<Series>,
}

#[derive(Deserialize)]
struct EpisodeList {
    #[serde(default)]
    episodes: Vec<Episode>,
}

#[derive(Deserialize)]
struct ReportList {
    #[serde(default)]
    reports: Vec<ResearchReport>,
}

#[derive(Deserialize)]
struct EntryList {
    #[serde(default)]
    entries: Vec<KnowledgeBaseEntry>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join path segments onto the base url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn research_url(&self, scope: &ResearchScope, tail: &[&str]) -> String {
        let mut segments = vec![
            "projects",
            scope.project_id(),
            "series",
            scope.series_id(),
            "episodes",
            scope.episode_id(),
        ];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.bytes().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &body);
            log::warn!("{} from {}: {}", status.as_u16(), url, err);
            return Err(err);
        }
        Ok(body.to_vec())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.execute(request).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    // ========================================================================
    // Projects
    // ========================================================================

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let list: ProjectList = self.send(self.http.get(self.url(&["projects"]))).await?;
        Ok(list.projects)
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.send(self.http.get(self.url(&["projects", project_id])))
            .await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project> {
        self.send(self.http.post(self.url(&["projects"])).json(project))
            .await
    }

    pub async fn update_project(&self, project_id: &str, update: &ProjectUpdate) -> Result<Project> {
        self.send(self.http.put(self.url(&["projects", project_id])).json(update))
            .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.send_empty(self.http.delete(self.url(&["projects", project_id])))
            .await
    }

    // ========================================================================
    // Series
    // ========================================================================

    pub async fn list_series(&self, project_id: &str) -> Result<Vec<Series>> {
        let list: SeriesList = self
            .send(self.http.get(self.url(&["projects", project_id, "series"])))
            .await?;
        Ok(list.series)
    }

    pub async fn create_series(&self, project_id: &str, series: &NewSeries) -> Result<Series> {
        let url = self.url(&["projects", project_id, "series"]);
        self.send(self.http.post(url).json(series)).await
    }

    pub async fn update_series(
        &self,
        project_id: &str,
        series_id: &str,
        update: &SeriesUpdate,
    ) -> Result<Series> {
        let url = self.url(&["projects", project_id, "series", series_id]);
        self.send(self.http.put(url).json(update)).await
    }

    pub async fn delete_series(&self, project_id: &str, series_id: &str) -> Result<()> {
        let url = self.url(&["projects", project_id, "series", series_id]);
        self.send_empty(self.http.delete(url)).await
    }

    // ========================================================================
    // Episodes
    // ========================================================================

    pub async fn list_episodes(&self, project_id: &str, series_id: &str) -> Result<Vec<Episode>> {
        let url = self.url(&["projects", project_id, "series", series_id, "episodes"]);
        let list: EpisodeList = self.send(self.http.get(url)).await?;
        Ok(list.episodes)
    }

    pub async fn create_episode(
        &self,
        project_id: &str,
        series_id: &str,
        episode: &NewEpisode,
    ) -> Result<Episode> {
        let url = self.url(&["projects", project_id, "series", series_id, "episodes"]);
        self.send(self.http.post(url).json(episode)).await
    }

    pub async fn update_episode(
        &self,
        project_id: &str,
        series_id: &str,
        episode_id: &str,
        update: &EpisodeUpdate,
    ) -> Result<Episode> {
        let url = self.url(&[
            "projects", project_id, "series", series_id, "episodes", episode_id,
        ]);
        self.send(self.http.put(url).json(update)).await
    }

    pub async fn delete_episode(
        &self,
        project_id: &str,
        series_id: &str,
        episode_id: &str,
    ) -> Result<()> {
        let url = self.url(&[
            "projects", project_id, "series", series_id, "episodes", episode_id,
        ]);
        self.send_empty(self.http.delete(url)).await
    }

    // ========================================================================
    // Research reports
    // ========================================================================

    pub async fn list_reports(&self, scope: &ResearchScope) -> Result<Vec<ResearchReport>> {
        let list: ReportList = self
            .send(self.http.get(self.research_url(scope, &["research"])))
            .await?;
        Ok(list.reports)
    }

    pub async fn get_report(&self, scope: &ResearchScope, report_id: &str) -> Result<ResearchReport> {
        let url = self.research_url(scope, &["research", report_id]);
        self.send(self.http.get(url)).await
    }

    pub async fn create_research(
        &self,
        scope: &ResearchScope,
        research: &NewResearch,
    ) -> Result<ResearchReport> {
        let url = self.research_url(scope, &["research"]);
        self.send(self.http.post(url).json(research)).await
    }

    pub async fn update_research(
        &self,
        scope: &ResearchScope,
        report_id: &str,
        update: &ReportUpdate,
    ) -> Result<ResearchReport> {
        let url = self.research_url(scope, &["research", report_id]);
        self.send(self.http.put(url).json(update)).await
    }

    /// POST with no body.
    pub async fn mark_complete(&self, scope: &ResearchScope, report_id: &str) -> Result<ResearchReport> {
        let url = self.research_url(scope, &["research", report_id, "complete"]);
        self.send(self.http.post(url)).await
    }

    pub async fn link_asset(
        &self,
        scope: &ResearchScope,
        report_id: &str,
        asset: &NewAsset,
    ) -> Result<ResearchReport> {
        let url = self.research_url(scope, &["research", report_id, "link-asset"]);
        self.send(self.http.post(url).json(asset)).await
    }

    // ========================================================================
    // Knowledge base
    // ========================================================================

    pub async fn list_knowledge_base(&self, scope: &ResearchScope) -> Result<Vec<KnowledgeBaseEntry>> {
        let list: EntryList = self
            .send(self.http.get(self.research_url(scope, &["knowledge-base"])))
            .await?;
        Ok(list.entries)
    }

    pub async fn add_to_knowledge_base(
        &self,
        scope: &ResearchScope,
        fact: &NewFact,
    ) -> Result<KnowledgeBaseEntry> {
        let url = self.research_url(scope, &["knowledge-base"]);
        self.send(self.http.post(url).json(fact)).await
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Upload a local file as multipart form data. The content type header
    /// is left to reqwest so it carries the boundary.
    pub async fn upload_file(&self, path: &Path, target: &UploadTarget) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(path).await?;
        let name = upload::file_name(path);
        let part = Part::bytes(bytes)
            .file_name(name)
            .mime_str(upload::content_type_for(path))?;

        let mut form = Form::new().part("file", part);
        for (key, value) in [
            ("project_id", &target.project_id),
            ("series_id", &target.series_id),
            ("episode_id", &target.episode_id),
        ] {
            if let Some(value) = value {
                form = form.text(key, value.clone());
            }
        }

        let response: UploadResponse = self
            .send(self.http.post(self.url(&["upload"])).multipart(form))
            .await?;
        log::info!("Uploaded {} ({} bytes)", response.file.name, response.file.size);
        Ok(response.file)
    }
}
