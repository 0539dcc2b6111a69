//! Full run requests through the REST application and the real engine

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use volley_config::VolleyConfig;
use volley_engine::HttpLoadEngine;
use volley_execution::{JobRegistry, ResultStore, RunOrchestrator};
use volley_rest_api::{create_rest_app, AppConfig, AppContext};

use common::spawn_target;

fn app(data_dir: &std::path::Path) -> Router {
    let config = VolleyConfig::default();
    let orchestrator = RunOrchestrator::new(
        Arc::new(HttpLoadEngine::new(config.engine.clone())),
        Arc::new(JobRegistry::new()),
        ResultStore::new(data_dir),
    );
    create_rest_app(AppContext::new(Arc::new(orchestrator)), AppConfig::from(&config.server))
}

async fn send(app: &Router, method: &str, uri: &str, body: String) -> Result<(StatusCode, Value)> {
    let request = Request::builder().method(method).uri(uri).body(Body::from(body))?;
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_sync_run_counts_every_call() -> Result<()> {
    let (addr, recorded) = spawn_target().await;
    let dir = tempfile::tempdir()?;
    let app = app(dir.path());

    let uri = format!("/volley/rest/run?url=http://{}/echo&n=25&qps=-1&c=5", addr);
    let (status, results) = send(&app, "GET", &uri, String::new()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["RunType"], "HTTP");
    assert_eq!(results["RequestedQPS"], "max");
    assert_eq!(results["DurationHistogram"]["Count"], 25);
    assert_eq!(results["RetCodes"]["200"], 25);
    assert_eq!(results["RetCodes"].as_object().unwrap().len(), 1);
    assert_eq!(recorded.len(), 25);
    Ok(())
}

#[tokio::test]
async fn test_paced_duration_run_counts_every_call() -> Result<()> {
    let (addr, _) = spawn_target().await;
    let dir = tempfile::tempdir()?;
    let app = app(dir.path());

    let uri = format!("/volley/rest/run?url=http://{}/teapot&qps=100&t=2s", addr);
    let (status, results) = send(&app, "GET", &uri, String::new()).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["RequestedQPS"], "100");
    assert_eq!(results["Exactly"], 200);
    assert_eq!(results["DurationHistogram"]["Count"], 200);
    assert_eq!(results["RetCodes"]["418"], 200);
    assert_eq!(results["RetCodes"].as_object().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_body_and_query_merged_for_real_run() -> Result<()> {
    let (addr, recorded) = spawn_target().await;
    let dir = tempfile::tempdir()?;
    let app = app(dir.path());

    let body = json!({
        "metadata": {
            "url": format!("http://{}/echo", addr),
            "n": "200",
            "qps": "-1",
            "headers": ["Foo: Bar", "Blah: BlahV"]
        }
    });
    let (status, results) = send(
        &app,
        "POST",
        "/volley/rest/run?jsonPath=.metadata&n=10&H=Third:HeaderV",
        body.to_string(),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["RetCodes"]["200"], 10);
    for seen in recorded.all() {
        assert_eq!(seen.headers["foo"], "Bar");
        assert_eq!(seen.headers["blah"], "BlahV");
        assert_eq!(seen.headers["third"], "HeaderV");
    }
    Ok(())
}

#[tokio::test]
async fn test_async_run_until_stopped() -> Result<()> {
    let (addr, _) = spawn_target().await;
    let dir = tempfile::tempdir()?;
    let app = app(dir.path());

    let uri = format!("/volley/rest/run?url=http://{}/echo&async=on&t=on&qps=100&save=on", addr);
    let (status, reply) = send(&app, "GET", &uri, String::new()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["Message"], "started");
    let run_id = reply["RunID"].as_u64().unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (status, stop) = send(&app, "POST", "/volley/rest/stop", String::new()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stop["StoppedCount"], 1);

    let status_uri = format!("/volley/rest/status?runid={}", run_id);
    let mut record = Value::Null;
    for _ in 0..100 {
        record = send(&app, "GET", &status_uri, String::new()).await?.1;
        if record["Status"] == "stopped" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(record["Status"], "stopped");

    let result = &record["Result"];
    assert!(result["DurationHistogram"]["Count"].as_u64().unwrap() > 0);
    let saved_id = record["ResultID"].as_str().unwrap();
    assert!(dir.path().join(format!("{}.json", saved_id)).exists());
    Ok(())
}
