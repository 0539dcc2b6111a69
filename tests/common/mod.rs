//! Local HTTP target shared by the end-to-end tests

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// One request as seen by the target
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Requests received by the target, in arrival order
#[derive(Debug, Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<Seen>>>);

impl Recorded {
    pub fn all(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

async fn echo(State(recorded): State<Recorded>, method: Method, headers: HeaderMap, body: Bytes) -> Bytes {
    recorded.0.lock().unwrap().push(Seen {
        method,
        headers,
        body: body.clone(),
    });
    body
}

async fn teapot() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}

/// Serve `/echo` (always 200, echoes the body) and `/teapot` (always 418)
/// on an ephemeral port
pub async fn spawn_target() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/echo", any(echo))
        .route("/teapot", get(teapot))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}
