//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use todo_server::config::{ListenerConfig, ServerConfig};
use todo_server::http::middleware::{LogRecord, RecordSink, RequestLogger};
use todo_server::lifecycle::{startup, LifecycleError, LifecycleManager, LifecycleState};
use todo_server::net::{Acceptor, Listener};
use todo_server::store;

pub const USER: &str = "station";
pub const PASSWORD: &str = "s3cret";

/// Sink that keeps every access log record.
#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl CollectingSink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl RecordSink for CollectingSink {
    fn emit(&self, record: &LogRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// A server running on an ephemeral port under a lifecycle manager.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: watch::Receiver<LifecycleState>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), LifecycleError>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Deliver the termination signal.
    pub fn trigger_shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Wait for the manager to report its final outcome.
    pub async fn join(self) -> Result<(), LifecycleError> {
        self.handle.await.expect("lifecycle task panicked")
    }
}

/// Serve `app` with the given drain deadline.
pub async fn spawn_app(app: Router, shutdown_timeout: Duration) -> TestServer {
    let listener = Listener::bind(&ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_connections: 64,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let manager = LifecycleManager::new(shutdown_timeout);
    let mut state = manager.state().subscribe();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        manager
            .run(listener, app, async move {
                let _ = stopped.await;
            })
            .await
    });

    // The manager only reports Serving once its task has been polled.
    state
        .wait_for(|s| *s != LifecycleState::Starting)
        .await
        .expect("lifecycle task exited before serving");

    TestServer {
        addr,
        state,
        stop: Some(stop),
        handle,
    }
}

/// Serve the real application backed by an in-memory store.
pub async fn spawn_todo_server() -> (TestServer, Arc<CollectingSink>) {
    let mut config = ServerConfig::default();
    config.auth.user_id = USER.to_string();
    config.auth.password = PASSWORD.to_string();
    config.health.delay_ms = 50;

    let sink = Arc::new(CollectingSink::default());
    let logger = Arc::new(RequestLogger::new(chrono_tz::Asia::Tokyo, sink.clone()));
    let pool = store::open_in_memory().await.unwrap();
    let app = startup::build_app(&config, pool, logger);

    (spawn_app(app, Duration::from_secs(5)).await, sink)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
