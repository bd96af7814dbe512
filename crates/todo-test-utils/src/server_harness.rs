//! Test server harness for E2E testing
//!
//! Provides `TestApiServer` for spawning real Todo API instances whose key
//! set is served by a wiremock certificate endpoint.

use crate::crypto_fixtures::test_key_set_json;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use todo_api::auth::{ClaimPolicy, HttpKeySetFetcher, TokenVerifier};
use todo_api::config::Config;
use todo_api::routes::{self, AppState};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Firebase project ID used by the test server.
pub const TEST_PROJECT_ID: &str = "todo-test-project";

/// Path of the mock certificate endpoint.
pub const TEST_CERTS_PATH: &str = "/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// What the mock certificate endpoint serves.
pub enum CertEndpoint {
    /// 200 with this JSON body.
    KeySet(serde_json::Value),
    /// An empty response with this status.
    Status(u16),
}

/// Test harness for spawning the Todo API in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<(), anyhow::Error> {
///     let server = TestApiServer::spawn().await?;
///     let response = reqwest::get(format!("{}/api/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestApiServer {
    addr: SocketAddr,
    config: Config,
    certs_server: MockServer,
    _handle: JoinHandle<()>,
}

impl TestApiServer {
    /// Spawn a server whose certificate endpoint serves the fixture key set.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(CertEndpoint::KeySet(test_key_set_json())).await
    }

    /// Spawn a server with a custom certificate endpoint.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Fetch signing certificates from a fresh wiremock server
    /// - Start the HTTP server in the background
    pub async fn spawn_with(endpoint: CertEndpoint) -> Result<Self, anyhow::Error> {
        let certs_server = MockServer::start().await;
        let response = match endpoint {
            CertEndpoint::KeySet(body) => ResponseTemplate::new(200).set_body_json(body),
            CertEndpoint::Status(status) => ResponseTemplate::new(status),
        };
        Mock::given(method("GET"))
            .and(path(TEST_CERTS_PATH))
            .respond_with(response)
            .mount(&certs_server)
            .await;

        let vars = HashMap::from([
            (
                "FIREBASE_PROJECT_ID".to_string(),
                TEST_PROJECT_ID.to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "FIREBASE_CERTS_URL".to_string(),
                format!("{}{}", certs_server.uri(), TEST_CERTS_PATH),
            ),
            ("KEY_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
            ("BUILD_VERSION".to_string(), "test".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let fetcher = Arc::new(HttpKeySetFetcher::with_timeout(
            config.firebase_certs_url.clone(),
            config.key_fetch_timeout(),
        ));
        let policy = ClaimPolicy::new(config.firebase_project_id.clone())
            .with_clock_skew(config.jwt_clock_skew());
        let verifier = Arc::new(TokenVerifier::new(fetcher, policy));

        let state = Arc::new(AppState {
            config: config.clone(),
            verifier,
        });

        // A local recorder handle; the global recorder may only be installed once per process
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            certs_server,
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

    /// Get the mock certificate endpoint.
    pub fn certs_server(&self) -> &MockServer {
        &self.certs_server
    }
}

impl Drop for TestApiServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
