//! End-to-end research workflow against a mocked backend: open a project,
//! add a series and episode, run Deep Research with an attachment, then
//! complete the report and promote a finding to the knowledge base.

use aim_studio::api::{ApiClient, ApiError};
use aim_studio::config::AppConfig;
use aim_studio::core::context::ProjectContext;
use aim_studio::core::models::{
    NewEpisode, NewFact, NewProject, NewSeries, ProjectType, ReportStatus, ResearchScope,
};
use aim_studio::core::research::{ResearchCommand, ResearchData, ResearchSelection};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESEARCH: &str = "/api/projects/p1/series/s1/episodes/e1/research";
const KNOWLEDGE: &str = "/api/projects/p1/series/s1/episodes/e1/knowledge-base";

fn report(status: &str, notes: &str) -> serde_json::Value {
    json!({
        "id": "r1",
        "title": "Berlin Airlift logistics",
        "query": "Berlin Airlift logistics",
        "executive_summary": "Allied supply flights, 1948-1949",
        "key_findings": [
            {"name": "Operation Vittles", "description": "US codename", "confidence": "high", "source_indices": [1]}
        ],
        "producer_notes": notes,
        "status": status,
        "attached_files": [{"name": "memo.pdf", "type": "application/pdf", "url": "/uploads/memo.pdf"}]
    })
}

async fn mount_project(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projects": []})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "name": "Iron Curtain",
            "type": "SERIES",
            "current_phase": "research"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "name": "Iron Curtain",
            "type": "SERIES"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_project_context_lifecycle() {
    let server = MockServer::start().await;
    mount_project(&server).await;
    let api = ApiClient::new(&format!("{}/api", server.uri()));

    let mut ctx = ProjectContext::new(AppConfig::default().user());
    ctx.init(&api).await;
    assert!(ctx.projects().is_empty());
    assert!(!ctx.is_loading());
    assert!(ctx.error().is_none());

    let new_project = NewProject::from_form("Iron Curtain", "", ProjectType::Series).unwrap();
    let created = ctx.create_project(&api, &new_project).await.unwrap();
    assert_eq!(created.id, "p1");
    assert_eq!(ctx.projects().len(), 1);

    ctx.select_project(&api, Some("p1")).await;
    assert_eq!(ctx.current_project().map(|p| p.name.as_str()), Some("Iron Curtain"));
    // Re-fetched project replaces the listed one instead of duplicating it
    assert_eq!(ctx.projects().len(), 1);

    ctx.select_project(&api, None).await;
    assert!(ctx.current_project().is_none());
}

#[tokio::test]
async fn test_project_context_keeps_list_on_refresh_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [{"id": "p1", "name": "Iron Curtain", "type": "SERIES"}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "database offline"})))
        .mount(&server)
        .await;
    let api = ApiClient::new(&format!("{}/api", server.uri()));

    let mut ctx = ProjectContext::new(AppConfig::default().user());
    ctx.init(&api).await;
    assert_eq!(ctx.projects().len(), 1);

    ctx.refresh(&api).await;
    assert_eq!(ctx.projects().len(), 1);
    assert_eq!(ctx.error(), Some("database offline"));
}

#[tokio::test]
async fn test_deep_research_workflow() {
    let server = MockServer::start().await;
    mount_project(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/projects/p1/series"))
        .and(body_json(json!({"title": "Cold War"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "s1", "title": "Cold War"})))
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
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(RESEARCH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reports": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(KNOWLEDGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {"name": "memo.pdf", "url": "/uploads/memo.pdf", "size": 12, "content_type": "application/pdf"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RESEARCH))
        .and(body_json(json!({
            "query": "Berlin Airlift logistics",
            "attached_files": [{"name": "memo.pdf", "type": "application/pdf", "url": "/uploads/memo.pdf"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(report("deep_research", "")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{RESEARCH}/r1/complete")))
        .respond_with(ResponseTemplate::new(200).set_body_json(report("complete", "")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{RESEARCH}/r1")))
        .and(body_json(json!({"producer_notes": "Check the Tempelhof footage"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(report("complete", "Check the Tempelhof footage")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(KNOWLEDGE))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "k1",
            "fact": "Operation Vittles: US codename",
            "category": "general",
            "confidence": "high",
            "source_indices": [1],
            "source_report_id": "r1"
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&format!("{}/api", server.uri()));

    // Series and episode
    let series = api
        .create_series("p1", &NewSeries::from_form("Cold War").unwrap())
        .await
        .unwrap();
    let episode = api
        .create_episode("p1", &series.id, &NewEpisode::from_form("Part One", "", 0).unwrap())
        .await
        .unwrap();
    assert_eq!(episode.code, "EP01");

    let mut selection = ResearchSelection::default();
    assert!(selection.scope(Some("p1")).is_none());
    selection.select_series(Some(series));
    selection.select_episode(Some(episode));
    let scope = selection.scope(Some("p1")).unwrap();
    assert_eq!(scope, ResearchScope::new("p1", "s1", "e1").unwrap());

    // Initial fetch
    let mut data = ResearchData::new();
    data.set_scope(Some(scope));
    data.run(&api, ResearchCommand::FetchReports).await.unwrap();
    data.run(&api, ResearchCommand::FetchKnowledgeBase).await.unwrap();
    assert!(data.reports().is_empty());
    assert!(!data.is_loading());

    // Deep Research with one attachment
    let dir = tempfile::tempdir().unwrap();
    let memo = dir.path().join("memo.pdf");
    std::fs::write(&memo, b"airlift memo").unwrap();
    data.run(
        &api,
        ResearchCommand::Create {
            query: "Berlin Airlift logistics".into(),
            attachments: vec![memo],
        },
    )
    .await
    .unwrap();
    assert_eq!(data.reports().len(), 1);
    assert_eq!(data.reports()[0].status, ReportStatus::DeepResearch);

    // Complete, annotate, promote a finding
    data.run(&api, ResearchCommand::MarkComplete { report_id: "r1".into() })
        .await
        .unwrap();
    data.run(
        &api,
        ResearchCommand::UpdateNotes {
            report_id: "r1".into(),
            notes: "Check the Tempelhof footage".into(),
        },
    )
    .await
    .unwrap();
    let report = data.report("r1").unwrap().clone();
    assert!(report.status.is_complete());
    assert_eq!(report.producer_notes, "Check the Tempelhof footage");
    assert_eq!(data.reports().len(), 1);

    let fact = NewFact::from_finding(&report.key_findings[0], &report.id);
    data.run(&api, ResearchCommand::AddFact(fact)).await.unwrap();
    assert_eq!(data.knowledge_base().len(), 1);
    assert_eq!(data.knowledge_base()[0].source_report_id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_failed_upload_aborts_research() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({"message": "File too large"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RESEARCH))
        .respond_with(ResponseTemplate::new(201).set_body_json(report("deep_research", "")))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiClient::new(&format!("{}/api", server.uri()));
    let dir = tempfile::tempdir().unwrap();
    let memo = dir.path().join("memo.pdf");
    std::fs::write(&memo, b"airlift memo").unwrap();

    let mut data = ResearchData::new();
    data.set_scope(Some(ResearchScope::new("p1", "s1", "e1").unwrap()));
    let err = data
        .run(
            &api,
            ResearchCommand::Create {
                query: "Berlin Airlift logistics".into(),
                attachments: vec![memo],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "File too large");
    assert_eq!(data.error(), Some("File too large"));
    assert!(data.reports().is_empty());
}

#[tokio::test]
async fn test_run_without_scope_is_rejected() {
    let api = ApiClient::new("http://127.0.0.1:9/api");
    let mut data = ResearchData::new();
    let err = data
        .run(&api, ResearchCommand::FetchReports)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::MissingScope);
}
