//! Local-file helpers for `/upload`.

use std::path::Path;

use crate::core::models::ResearchScope;

/// Extensions the backend accepts, lower-case.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "mp4", "mov", "mp3", "wav", "doc", "docx", "txt",
];

/// Ownership fields sent alongside the file part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadTarget {
    pub project_id: Option<String>,
    pub series_id: Option<String>,
    pub episode_id: Option<String>,
}

impl From<&ResearchScope> for UploadTarget {
    fn from(scope: &ResearchScope) -> Self {
        Self {
            project_id: Some(scope.project_id().to_string()),
            series_id: Some(scope.series_id().to_string()),
            episode_id: Some(scope.episode_id().to_string()),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_allowed(path: &Path) -> bool {
    extension(path).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

pub fn content_type_for(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Check a path before queueing it as an attachment.
pub fn validate(path: &Path) -> Result<(), String> {
    if !is_allowed(path) {
        return Err(format!(
            "File type not allowed: {} (allowed: {})",
            file_name(path),
            ALLOWED_EXTENSIONS.join(", ")
        ));
    }
    if !path.is_file() {
        return Err(format!("Not a file: {}", path.display()));
    }
    Ok(())
}
