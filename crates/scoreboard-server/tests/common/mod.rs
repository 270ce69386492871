//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use axum_test::TestServer;
use scoreboard_server::{
    AppState, Config, CorsConfig, LoggingConfig, ServerConfig, StoreBackend, StoreConfig,
    build_cors_layer, router,
};
use tempfile::TempDir;

/// Configuration pointing the chosen backend into `dir`.
pub fn test_config(dir: &TempDir, backend: StoreBackend) -> Config {
    Config {
        server: ServerConfig {
            bind: "127.0.0.1".into(),
            port: 0,
            static_path: None,
        },
        store: StoreConfig {
            backend,
            path: dir.path().join("db").to_string_lossy().into(),
            url: format!("sqlite://{}", dir.path().join("scores.db").display()),
            ..StoreConfig::default()
        },
        cors: CorsConfig::default(),
        logging: LoggingConfig::default(),
    }
}

/// Router plus CORS, as the binary assembles it.
pub async fn build_app(config: &Config) -> anyhow::Result<(AppState, Router)> {
    let state = AppState::from_config(config).await?;
    let app = router(state.clone()).layer(build_cors_layer(&config.cors));
    Ok((state, app))
}

/// Test application wrapper that manages a temporary store.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _temp_dir: TempDir, // Keep alive for test duration
}

impl TestApp {
    /// Fresh application over the document store.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_backend(StoreBackend::Document).await
    }

    /// Fresh application over the given backend.
    pub async fn with_backend(backend: StoreBackend) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = test_config(&temp_dir, backend);
        let (state, app) = build_app(&config).await?;
        let server = TestServer::new(app)?;
        Ok(Self {
            server,
            state,
            _temp_dir: temp_dir,
        })
    }

    /// POST a JSON body to `/scores/add`.
    pub async fn add(&self, body: serde_json::Value) -> axum_test::TestResponse {
        self.server.post("/scores/add").json(&body).await
    }

    /// Add a score that must succeed.
    pub async fn add_ok(&self, name: &str, count: i64) -> serde_json::Value {
        let response = self.add(serde_json::json!({ "name": name, "count": count })).await;
        response.assert_status_ok();
        response.json()
    }
}

/// A server listening on a real local port, for HTTP client tests.
pub struct LiveServer {
    pub addr: SocketAddr,
    pub state: AppState,
    handle: tokio::task::JoinHandle<()>,
    _temp_dir: TempDir,
}

impl LiveServer {
    pub async fn start() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = test_config(&temp_dir, StoreBackend::Document);
        let (state, app) = build_app(&config).await?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            handle,
            _temp_dir: temp_dir,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An address nothing listens on.
pub async fn dead_addr() -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}
