//! Integration tests for the REST client against a mocked backend.
//!
//! Every test starts its own `wiremock` server and points an `ApiClient` at
//! `{server}/api`, so nothing here needs a running studio backend.
//!
//! ```bash
//! cargo test --test api_client
//! ```

use aim_studio::api::{ApiClient, ApiError, UploadTarget, GENERIC_FAILURE};
use aim_studio::core::models::{
    Confidence, KnowledgeCategory, NewAsset, NewEpisode, NewProject, NewSeries, Phase,
    ProjectType, ReportStatus, ResearchScope,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&format!("{}/api", server.uri()));
    (server, client)
}

fn scope() -> ResearchScope {
    ResearchScope::new("p1", "s1", "e1").unwrap()
}

fn report_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Berlin Airlift",
        "executive_summary": "Supply flights into West Berlin",
        "key_findings": [
            {"name": "Operation Vittles", "description": "US codename", "confidence": "high", "source_indices": [1, 2]}
        ],
        "producer_notes": null,
        "linked_assets": [],
        "bibliography": {"ai_generated": ["Encyclopedia entry"], "external": []},
        "status": status
    })
}

// ============================================================================
// Projects
// ============================================================================

#[tokio::test]
async fn test_list_projects_unwraps_envelope() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [{
                "id": "p1",
                "name": "Iron Curtain",
                "description": null,
                "type": "series",
                "current_phase": "archive",
                "phase_progress": 140
            }]
        })))
        .mount(&server)
        .await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    let project = &projects[0];
    assert_eq!(project.name, "Iron Curtain");
    assert_eq!(project.description, "");
    assert_eq!(project.project_type, ProjectType::Series);
    assert_eq!(project.current_phase, Phase::Archive);
    assert_eq!(project.progress(), 100);
}

#[tokio::test]
async fn test_missing_envelope_field_is_empty_list() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(client.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Project not found"})),
        )
        .mount(&server)
        .await;

    let err = client.get_project("missing").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "Project not found".into()
        }
    );
}

#[tokio::test]
async fn test_non_json_error_uses_generic_message() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client.list_projects().await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), GENERIC_FAILURE);
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(matches!(
        client.get_project("p1").await,
        Err(ApiError::Decode(_))
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api");
    assert!(matches!(
        client.list_projects().await,
        Err(ApiError::Network(_))
    ));
}

#[tokio::test]
async fn test_create_project_sends_upper_case_type() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .and(body_json(json!({
            "name": "Iron Curtain",
            "description": "Cold War archive series",
            "type": "SERIES"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p9",
            "name": "Iron Curtain",
            "type": "SERIES"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let new_project =
        NewProject::from_form(" Iron Curtain ", "Cold War archive series", ProjectType::Series)
            .unwrap();
    let created = client.create_project(&new_project).await.unwrap();
    assert_eq!(created.id, "p9");
    assert_eq!(created.current_phase, Phase::Research);
}

#[tokio::test]
async fn test_unrecognised_project_type_keeps_list() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [
                {"id": "p1", "name": "Iron Curtain", "type": "SERIES"},
                {"id": "p2", "name": "Night Shift", "type": "Podcast", "current_phase": null}
            ]
        })))
        .mount(&server)
        .await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].project_type, ProjectType::Other);
    assert_eq!(projects[1].current_phase, Phase::Research);
}

// ============================================================================
// Series & episodes
// ============================================================================

#[tokio::test]
async fn test_series_and_episode_creation() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/p1/series"))
        .and(body_json(json!({"title": "Cold War"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s1", "title": "Cold War"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/projects/p1/series/s1/episodes"))
        .and(body_json(json!({"title": "Part One", "code": "EP01"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "e1",
            "code": "EP01",
            "title": "Part One"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = client
        .create_series("p1", &NewSeries::from_form("Cold War").unwrap())
        .await
        .unwrap();
    let episode = client
        .create_episode("p1", &series.id, &NewEpisode::from_form("Part One", "", 0).unwrap())
        .await
        .unwrap();
    assert_eq!(episode.code, "EP01");
    assert_eq!(episode.current_phase, Phase::Research);
}

#[tokio::test]
async fn test_created_series_is_listed_once() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/p1/series"))
        .and(body_json(json!({"title": "Cold War"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s1", "title": "Cold War"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "series": [{"id": "s1", "title": "Cold War"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p2/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let created = client
        .create_series("p1", &NewSeries::from_form("Cold War").unwrap())
        .await
        .unwrap();
    let listed = client.list_series("p1").await.unwrap();
    let matching: Vec<_> = listed.iter().filter(|s| s.id == created.id).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].title, "Cold War");

    assert!(client.list_series("p2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_episodes_path() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1/series/s1/episodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "episodes": [
                {"id": "e1", "code": "EP01", "title": "Part One"},
                {"id": "e2", "code": "EP02", "title": "Part Two"}
            ]
        })))
        .mount(&server)
        .await;

    let episodes = client.list_episodes("p1", "s1").await.unwrap();
    let codes: Vec<_> = episodes.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, ["EP01", "EP02"]);
}

// ============================================================================
// Research
// ============================================================================

#[tokio::test]
async fn test_reports_tolerate_nulls_and_unknown_status() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1/series/s1/episodes/e1/research"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reports": [report_json("r1", "archived")]
        })))
        .mount(&server)
        .await;

    let reports = client.list_reports(&scope()).await.unwrap();
    let report = &reports[0];
    assert_eq!(report.status, ReportStatus::Unknown);
    assert_eq!(report.producer_notes, "");
    assert_eq!(report.key_findings[0].source_indices, vec![1, 2]);
    assert_eq!(report.bibliography.total(), 1);
}

#[tokio::test]
async fn test_reports_tolerate_odd_confidence_values() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1/series/s1/episodes/e1/research"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reports": [{
                "id": "r1",
                "title": "Berlin Airlift",
                "key_findings": [
                    {"name": "Operation Vittles", "confidence": "High"},
                    {"name": "Candy bombers", "confidence": "very likely"},
                    {"name": "Tempelhof", "confidence": null}
                ],
                "status": "Complete"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1/series/s1/episodes/e1/knowledge-base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [
                {"id": "k1", "fact": "Tempelhof airport", "category": null, "confidence": "Medium"}
            ]
        })))
        .mount(&server)
        .await;

    let reports = client.list_reports(&scope()).await.unwrap();
    assert_eq!(reports.len(), 1);
    let levels: Vec<_> = reports[0].key_findings.iter().map(|f| f.confidence).collect();
    assert_eq!(levels, [Some(Confidence::High), None, None]);
    assert_eq!(reports[0].status, ReportStatus::Complete);

    let entries = client.list_knowledge_base(&scope()).await.unwrap();
    assert_eq!(entries[0].category, KnowledgeCategory::General);
    assert_eq!(entries[0].confidence, Some(Confidence::Medium));
}

#[tokio::test]
async fn test_mark_complete() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/p1/series/s1/episodes/e1/research/r1/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_json("r1", "complete")))
        .expect(1)
        .mount(&server)
        .await;

    let report = client.mark_complete(&scope(), "r1").await.unwrap();
    assert!(report.status.is_complete());
}

#[tokio::test]
async fn test_link_asset_body() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/p1/series/s1/episodes/e1/research/r1/link-asset"))
        .and(body_json(json!({"name": "Airlift newsreel", "type": "video"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_json("r1", "in_progress")))
        .expect(1)
        .mount(&server)
        .await;

    let asset = NewAsset::from_form("Airlift newsreel", "video", "").unwrap();
    let report = client.link_asset(&scope(), "r1", &asset).await.unwrap();
    assert_eq!(report.status, ReportStatus::InProgress);
}

#[tokio::test]
async fn test_knowledge_base_defaults_category() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1/series/s1/episodes/e1/knowledge-base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [
                {"id": "k1", "fact": "Tempelhof airport", "category": "location", "confidence": "high"},
                {"id": "k2", "fact": "Berlin blockade", "category": "weather"}
            ]
        })))
        .mount(&server)
        .await;

    let entries = client.list_knowledge_base(&scope()).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].category.label(), "General");
    assert!(entries[1].confidence.is_none());
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_sends_multipart_with_scope_fields() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"memo.pdf\""))
        .and(body_string_contains("name=\"episode_id\""))
        .and(body_string_contains("airlift memo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "name": "memo.pdf",
                "url": "/uploads/memo.pdf",
                "size": 12,
                "content_type": "application/pdf"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("memo.pdf");
    std::fs::write(&file, b"airlift memo").unwrap();

    let uploaded = client
        .upload_file(&file, &UploadTarget::from(&scope()))
        .await
        .unwrap();
    assert_eq!(uploaded.url, "/uploads/memo.pdf");
    assert_eq!(uploaded.size, 12);
}

#[tokio::test]
async fn test_upload_missing_file_is_file_error() {
    let (_server, client) = setup().await;
    let err = client
        .upload_file(
            std::path::Path::new("/nonexistent/memo.pdf"),
            &UploadTarget::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::File(_)));
}
