//! Application-wide project state.
//!
//! `ProjectContext` is owned by the TUI's `AppState`. The event loop applies
//! results from spawned tasks through the `begin_*`/`apply_*` methods; the
//! async methods run the same transitions inline for non-TUI callers.

use crate::api::{ApiClient, ApiError};
use crate::core::models::{upsert, Episode, NewProject, Project, Series, User};

#[derive(Debug, Clone)]
pub struct ProjectContext {
    user: User,
    projects: Vec<Project>,
    current_project: Option<Project>,
    current_series: Option<Series>,
    current_episode: Option<Episode>,
    loading: bool,
    error: Option<String>,
}

impl ProjectContext {
    pub fn new(user: User) -> Self {
        Self {
            user,
            projects: Vec::new(),
            current_project: None,
            current_series: None,
            current_episode: None,
            loading: false,
            error: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current_project.as_ref()
    }

    pub fn current_series(&self) -> Option<&Series> {
        self.current_series.as_ref()
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.current_episode.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    pub fn begin_refresh(&mut self) {
        self.loading = true;
    }

    pub fn apply_projects(&mut self, result: Result<Vec<Project>, ApiError>) {
        self.loading = false;
        match result {
            Ok(projects) => {
                log::debug!("Loaded {} projects", projects.len());
                self.projects = projects;
                self.error = None;
            }
            Err(e) => {
                log::warn!("Failed to fetch projects: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Apply a fetched project detail. Clears the series and episode
    /// selection on success.
    pub fn apply_selected_project(&mut self, result: Result<Project, ApiError>) {
        match result {
            Ok(project) => {
                upsert(&mut self.projects, project.clone());
                self.current_project = Some(project);
                self.current_series = None;
                self.current_episode = None;
            }
            Err(e) => {
                log::warn!("Failed to fetch project: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn clear_project(&mut self) {
        self.current_project = None;
        self.current_series = None;
        self.current_episode = None;
    }

    /// Select a series. Choosing a different series clears the episode.
    pub fn select_series(&mut self, series: Option<Series>) {
        let changed = self.current_series.as_ref().map(|s| &s.id) != series.as_ref().map(|s| &s.id);
        self.current_series = series;
        if changed {
            self.current_episode = None;
        }
    }

    pub fn select_episode(&mut self, episode: Option<Episode>) {
        self.current_episode = episode;
    }

    /// Merge a project returned by the backend into the list.
    pub fn apply_created_project(&mut self, project: Project) {
        log::info!("Created project {} ({})", project.name, project.id);
        upsert(&mut self.projects, project);
    }

    /// Sign-out: drop everything except the static user.
    pub fn reset(&mut self) {
        *self = Self::new(self.user.clone());
    }

    // ========================================================================
    // Inline operations
    // ========================================================================

    pub async fn refresh(&mut self, api: &ApiClient) {
        self.begin_refresh();
        let result = api.list_projects().await;
        self.apply_projects(result);
    }

    /// Fetch the project list once at startup.
    pub async fn init(&mut self, api: &ApiClient) {
        self.refresh(api).await;
    }

    /// Select a project by id, or clear the selection with `None`.
    pub async fn select_project(&mut self, api: &ApiClient, project_id: Option<&str>) {
        match project_id {
            Some(id) => {
                let result = api.get_project(id).await;
                self.apply_selected_project(result);
            }
            None => self.clear_project(),
        }
    }

    pub async fn create_project(
        &mut self,
        api: &ApiClient,
        project: &NewProject,
    ) -> Result<Project, ApiError> {
        let created = api.create_project(project).await?;
        self.apply_created_project(created.clone());
        Ok(created)
    }
}
