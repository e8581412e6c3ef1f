use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A config with no catalog: the API serves, scraping is unavailable.
fn minimal_config(port: u16, dir: &Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[scraper]
enabled = false

[[sources]]
name = "nyaa"
kind = "anime"
backend = "torznab"
url = "http://127.0.0.1:9/api"
indexer = "nyaasi"
api_key = "supersecretkey"
"#,
        port,
        dir.join("scrapeyard.db").display()
    )
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_scrapeyard"))
        .env("SCRAPEYARD_CONFIG", config_path)
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn start() -> (TempDir, u16, tokio::process::Child) {
    let dir = TempDir::new().unwrap();
    let port = get_available_port();
    let config_path = write_config(&dir, &minimal_config(port, dir.path()));
    let server = spawn_server(&config_path).await;
    assert!(
        wait_for_server(port, 60).await,
        "Server did not start in time"
    );
    (dir, port, server)
}

async fn get_json(port: u16, path: &str) -> serde_json::Value {
    let response = Client::new()
        .get(format!("http://127.0.0.1:{}{}", port, path))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success(), "GET {} failed", path);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, port, mut server) = start().await;

    let json = get_json(port, "/api/v1/health").await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_hides_api_keys() {
    let (_dir, port, mut server) = start().await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(!body.contains("supersecretkey"));

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["sources"][0]["name"], "nyaa");
    assert_eq!(json["sources"][0]["api_key_configured"], true);
    assert_eq!(json["metadata"]["trakt_configured"], false);
    assert_eq!(json["config_hash"].as_str().map(str::len), Some(16));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_status_is_idle_without_catalog() {
    let (_dir, port, mut server) = start().await;

    let json = get_json(port, "/api/v1/status").await;
    assert_eq!(json["status"], "Idle");
    assert_eq!(json["available"], false);
    assert_eq!(json["content_count"], 0);
    assert!(json["last_updated"].is_null());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_trigger_without_catalog_is_unavailable() {
    let (_dir, port, mut server) = start().await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/api/v1/scrape", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status().as_u16(), 503);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_errors_endpoint_starts_empty() {
    let (_dir, port, mut server) = start().await;

    let json = get_json(port, "/api/v1/errors?limit=5000&kind=not_found").await;
    assert_eq!(json["total"], 0);
    assert_eq!(json["limit"], 1000);
    assert_eq!(json["entries"].as_array().map(Vec::len), Some(0));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (_dir, port, mut server) = start().await;

    // One request so the HTTP counters have a sample.
    get_json(port, "/api/v1/health").await;

    let body = Client::new()
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .unwrap();
    assert!(body.contains("scrapeyard_http_requests_total"));
    assert!(body.contains("scrapeyard_content_records 0"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_scrapeyard"))
            .env("SCRAPEYARD_CONFIG", "/nonexistent/config.toml")
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(
        &dir,
        r#"
[server]
port = 8080

[[sources]]
name = "nyaa"
kind = "anime"
backend = "torznab"
url = "http://127.0.0.1:9/api"
"#,
    );

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_scrapeyard"))
            .env("SCRAPEYARD_CONFIG", &config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
