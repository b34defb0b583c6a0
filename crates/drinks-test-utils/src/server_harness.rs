//! Test server harness for E2E testing
//!
//! Provides `TestDrinksServer` for spawning the real drinks router on a
//! random port with an in-memory store.

use drinks_service::config::Config;
use drinks_service::models::{Drink, Ingredient, NewDrink};
use drinks_service::observability::metrics::init_metrics_recorder;
use drinks_service::repositories::{DrinkStore, InMemoryDrinkStore};
use drinks_service::routes::{self, AppState};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Identity provider domain the harness configures.
pub const TEST_DOMAIN: &str = "drinks-test.us.auth0.com";

/// API audience the harness configures.
pub const TEST_AUDIENCE: &str = "http://www.coffee-shop-api.com";

/// Global metrics handle for test servers.
///
/// The Prometheus recorder can only be installed once per process.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the drinks service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list() -> Result<()> {
///     let jwks = MockJwksServer::start().await;
///     let server = TestDrinksServer::spawn(&jwks.jwks_url()).await?;
///
///     let response = reqwest::get(format!("{}/drinks", server.url())).await?;
///     assert_eq!(response.status(), 404);
///     Ok(())
/// }
/// ```
pub struct TestDrinksServer {
    addr: SocketAddr,
    store: Arc<InMemoryDrinkStore>,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestDrinksServer {
    /// Spawn a server that fetches signing keys from `jwks_url`.
    pub async fn spawn(jwks_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(jwks_url, HashMap::new()).await
    }

    /// Spawn with extra environment-style overrides (e.g. `JWT_LEEWAY_SECONDS`).
    pub async fn spawn_with_vars(
        jwks_url: &str,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("AUTH0_DOMAIN".to_string(), TEST_DOMAIN.to_string()),
            ("API_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("JWKS_URL".to_string(), jwks_url.to_string()),
            ("STORE_BACKEND".to_string(), "memory".to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(InMemoryDrinkStore::new());
        let state = Arc::new(AppState {
            config: config.clone(),
            store: store.clone(),
        });

        let app = routes::build_routes(state, test_metrics_handle());

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
            store,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The server's store, for seeding and failure injection.
    pub fn store(&self) -> &InMemoryDrinkStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Insert a drink directly into the store.
    pub async fn seed_drink(
        &self,
        title: &str,
        ingredients: &[(&str, &str, u32)],
    ) -> Result<Drink, anyhow::Error> {
        let recipe = ingredients
            .iter()
            .map(|(name, color, parts)| Ingredient {
                name: name.to_string(),
                color: color.to_string(),
                parts: *parts,
            })
            .collect();

        self.store
            .insert(NewDrink {
                title: title.to_string(),
                recipe,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed drink: {}", e))
    }
}

impl Drop for TestDrinksServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
