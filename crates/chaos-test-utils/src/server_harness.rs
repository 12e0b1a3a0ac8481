//! Test server harness for E2E testing
//!
//! Provides `TestChaosServer` for spawning the real router in tests, wired to
//! the in-memory providers.

use chaos_service::config::Config;
use chaos_service::providers::mock::{MockComputeFleet, MockLoadBalancing, MockMetricsSource};
use chaos_service::providers::Providers;
use chaos_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The fake providers behind a test server.
///
/// Kept as concrete types so tests can read call counters after requests.
#[derive(Clone, Default)]
pub struct MockProviders {
    pub compute: Arc<MockComputeFleet>,
    pub load_balancing: Arc<MockLoadBalancing>,
    pub metrics: Arc<MockMetricsSource>,
}

impl MockProviders {
    pub fn new(
        compute: MockComputeFleet,
        load_balancing: MockLoadBalancing,
        metrics: MockMetricsSource,
    ) -> Self {
        Self {
            compute: Arc::new(compute),
            load_balancing: Arc::new(load_balancing),
            metrics: Arc::new(metrics),
        }
    }

    pub fn with_compute(compute: MockComputeFleet) -> Self {
        Self {
            compute: Arc::new(compute),
            ..Self::default()
        }
    }

    /// The same fakes as the service sees them.
    pub fn providers(&self) -> Providers {
        Providers::new(
            self.compute.clone(),
            self.load_balancing.clone(),
            self.metrics.clone(),
        )
    }
}

/// Test harness for spawning the Chaos Service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let server = TestChaosServer::spawn(MockProviders::default()).await?;
/// let response = server
///     .client()
///     .post(format!("{}/api/v1/targets/select", server.url()))
///     .json(&serde_json::json!({"autoScalingGroupName": "web-asg"}))
///     .send()
///     .await?;
/// ```
pub struct TestChaosServer {
    addr: SocketAddr,
    config: Config,
    mocks: MockProviders,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestChaosServer {
    /// Spawn a server with default configuration.
    pub async fn spawn(mocks: MockProviders) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(mocks, HashMap::new()).await
    }

    /// Spawn a server with extra configuration variables.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with_vars(
        mocks: MockProviders,
        extra_vars: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AWS_REGION".to_string(), "us-east-1".to_string()),
        ]);
        vars.extend(extra_vars);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState::new(config.clone(), mocks.providers()));

        // Recorder is built but not installed; /metrics renders an empty page.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            mocks,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fakes backing the server.
    pub fn mocks(&self) -> &MockProviders {
        &self.mocks
    }

    /// Shared HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST a JSON body to `path` and return status and parsed body.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(u16, serde_json::Value), anyhow::Error> {
        let response = self
            .client
            .post(format!("{}{}", self.url(), path))
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let json = response.json().await?;
        Ok((status, json))
    }

    /// GET `path` and return status and parsed body.
    pub async fn get_json(&self, path: &str) -> Result<(u16, serde_json::Value), anyhow::Error> {
        let response = self
            .client
            .get(format!("{}{}", self.url(), path))
            .send()
            .await?;
        let status = response.status().as_u16();
        let json = response.json().await?;
        Ok((status, json))
    }
}

impl Drop for TestChaosServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
