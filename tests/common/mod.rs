//! Shared helpers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use clashdock::config::AppConfig;
use clashdock::retry::Pause;
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

static TEST_ID: AtomicU64 = AtomicU64::new(0);

pub const GEOIP_BYTES: &[u8] = b"MMDB\x00\x01fake-country-database";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let id = TEST_ID.fetch_add(1, Ordering::Relaxed);
    let dir = env::temp_dir().join(format!("clashdock-{}-{}-{}", prefix, std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Settings with every path inside `dir`.
pub fn config_in(dir: &PathBuf) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.input_dir = dir.clone();
    config.paths.secret_file = dir.join("clash_secret.txt");
    config.paths.output_config = dir.join("config").join("config.yaml");
    config.paths.geoip_db = dir.join("Country.mmdb");
    config
}

/// Pauses are recorded, never slept.
#[derive(Default)]
pub struct CountingPause {
    pub pauses: Mutex<Vec<Duration>>,
}

impl CountingPause {
    pub fn count(&self) -> usize {
        self.pauses.lock().unwrap().len()
    }
}

#[async_trait]
impl Pause for CountingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

pub fn sample_proxies() -> Value {
    json!({
        "proxies": {
            "Proxy": {"type": "Selector", "now": "HK 01", "all": ["HK 01", "JP 02"]},
            "Streaming": {"type": "Selector", "now": "JP 02", "all": ["JP 02"]},
            "HK 01": {"type": "Shadowsocks", "history": []},
            "JP 02": {"type": "Vmess", "history": []},
            "DIRECT": {"type": "Direct"}
        }
    })
}

#[derive(Clone)]
struct MockState {
    token: String,
    body: Value,
    hits: Arc<AtomicU32>,
}

/// Local stand-in for the daemon's controller and for the sites reached
/// through its proxy port.
pub struct MockServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
}

impl MockServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests served by `/proxies`
    pub fn controller_hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn proxies(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", state.token);
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(Json(state.body.clone())),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub async fn spawn_mock(token: &str) -> MockServer {
    let hits = Arc::new(AtomicU32::new(0));
    let state = MockState {
        token: token.to_string(),
        body: sample_proxies(),
        hits: hits.clone(),
    };

    let app = Router::new()
        .route("/proxies", get(proxies))
        .route("/ok", get(|| async { "ok" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/ip", get(|| async { "203.0.113.9\n" }))
        .route("/blank", get(|| async { "  \n" }))
        .route("/Country.mmdb", get(|| async { GEOIP_BYTES.to_vec() }))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer { addr, hits }
}

/// A local address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A listener that accepts each connection and closes it unanswered, the
/// way a daemon still starting up behaves. Returns its address and a
/// counter of accepted connections.
pub async fn hang_up_listener() -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicU32::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });
    (addr, accepted)
}
