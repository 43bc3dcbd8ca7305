mod common;

use common::FakeBackend;
use serde_json::json;
use shaker_core::models::{NewDocumentation, NewHeartbeat, Task};
use shaker_core::{ApiClient, ApiError, ListFilter, Stores};

#[tokio::test]
async fn test_base_url_accepts_api_suffix() {
    let backend = FakeBackend::spawn().await;
    let config = shaker_core::CoreConfig::new(format!("{}/api/", backend.url()));
    let api = ApiClient::new(&config).unwrap();

    assert_eq!(api.base_url(), format!("{}/api", backend.url()));
    let tasks: Vec<Task> = api.list(&ListFilter::new()).await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_status_error_carries_body() {
    let backend = FakeBackend::spawn().await;
    let api = ApiClient::new(&backend.config()).unwrap();

    let err = api.get::<Task>("missing").await.unwrap_err();

    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "Not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_heartbeat_history_is_limited() {
    let backend = FakeBackend::spawn().await;
    let stores = Stores::new(&ApiClient::new(&backend.config()).unwrap());

    for status in ["active", "busy", "idle"] {
        stores
            .standups
            .record_heartbeat(&NewHeartbeat::new("a1", status))
            .await
            .unwrap();
    }
    stores
        .standups
        .record_heartbeat(&NewHeartbeat::new("a2", "active"))
        .await
        .unwrap();

    let all = stores.standups.agent_heartbeats("a1", None).await.unwrap();
    assert_eq!(all.len(), 3);
    let hit = backend.hits().into_iter().last().unwrap();
    assert_eq!(hit.path, "agents/a1/heartbeats");
    assert_eq!(hit.query.get("limit").map(String::as_str), Some("50"));

    let recent = stores.standups.agent_heartbeats("a1", Some(2)).await.unwrap();
    assert_eq!(recent.len(), 2);

    let none = stores.standups.agent_heartbeats("a9", None).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_heartbeat_failure_is_raised() {
    let backend = FakeBackend::spawn().await;
    let stores = Stores::new(&ApiClient::new(&backend.config()).unwrap());

    backend.fail_next(503, "maintenance");
    let err = stores.standups.agent_heartbeats("a1", None).await.unwrap_err();

    assert_eq!(err.user_message().as_deref(), Some("maintenance"));
    assert!(stores.standups.error().is_none());
}

#[tokio::test]
async fn test_task_documentation_round_trip() {
    let backend = FakeBackend::spawn().await;
    let api = ApiClient::new(&backend.config()).unwrap();

    let created = api
        .create_documentation(&NewDocumentation {
            task_id: "t1".to_string(),
            content: "# Notes".to_string(),
            created_by: "a1".to_string(),
        })
        .await
        .unwrap();
    assert!(!created.id.is_empty());

    let docs = api.task_documentation("t1").await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content, "# Notes");
    assert!(api.task_documentation("t2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_is_passed_through() {
    let backend = FakeBackend::spawn().await;
    backend.seed("dashboard", vec![json!({ "projects": 2, "active_agents": 5 })]);
    let api = ApiClient::new(&backend.config()).unwrap();

    let stats = api.dashboard().await.unwrap();

    assert_eq!(stats[0]["active_agents"], 5);
}

#[tokio::test]
async fn test_health_endpoint() {
    let backend = FakeBackend::spawn().await;
    let api = ApiClient::new(&backend.config()).unwrap();

    assert!(api.check_health().await);
    backend.set_healthy(false);
    assert!(!api.check_health().await);
}
