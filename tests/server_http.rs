//! REST endpoint tests against a live listener

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::net::TcpListener;

use thread_tutor::catalog::InMemoryCatalog;
use thread_tutor::connection::SessionSettings;
use thread_tutor::server::{serve_on, AppState};

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let catalog = Arc::new(InMemoryCatalog::builtin().unwrap());
    let state = AppState::new(catalog, SessionSettings::default());
    tokio::spawn(serve_on(listener, state));
    addr
}

async fn get(addr: SocketAddr, path: &str) -> (u16, Value) {
    let response = reqwest::get(format!("http://{}{}", addr, path)).await.unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn test_list_concepts() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/api/concepts").await;

    assert_eq!(status, 200);
    let concepts = body.as_array().unwrap();
    assert_eq!(concepts.len(), 4);

    let titles: Vec<&str> = concepts.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec!["Synchronization", "Deadlock", "Producer-Consumer", "Semaphore"]
    );
    for concept in concepts {
        assert!(concept["id"].is_i64());
        assert!(concept["threadConfig"]["defaultThreads"].is_u64());
    }
}

#[tokio::test]
async fn test_get_concept_by_id() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/api/concepts/2").await;

    assert_eq!(status, 200);
    assert_eq!(body["id"], 2);
    assert_eq!(body["title"], "Deadlock");
    assert_eq!(body["threadConfig"]["minThreads"], 2);
    assert_eq!(body["threadConfig"]["maxThreads"], 2);
}

#[tokio::test]
async fn test_missing_concept_is_404() {
    let addr = spawn_server().await;

    let (status, body) = get(addr, "/api/concepts/99").await;
    assert_eq!(status, 404);
    assert_eq!(body, serde_json::json!({"message": "Concept not found"}));

    let (status, body) = get(addr, "/concepts/abc").await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Concept not found");
}

#[tokio::test]
async fn test_root_mount_matches_api_mount() {
    let addr = spawn_server().await;
    let (_, api) = get(addr, "/api/concepts/3").await;
    let (status, root) = get(addr, "/concepts/3").await;
    assert_eq!(status, 200);
    assert_eq!(api, root);
}

#[tokio::test]
async fn test_health() {
    let addr = spawn_server().await;
    let (status, body) = get(addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}
