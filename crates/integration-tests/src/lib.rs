//! Integration test harness for Zaulimi24.
//!
//! [`TestApp::spawn`] serves the real storefront router on an ephemeral
//! local port with fresh in-memory state, so tests run in parallel without
//! sharing carts, users, or products.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p zaulimi-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use tokio::net::TcpListener;

use zaulimi_client::ApiClient;
use zaulimi_storefront::config::StorefrontConfig;
use zaulimi_storefront::state::AppState;

/// Token secret used by every test server.
pub const TEST_TOKEN_SECRET: &str = "k8Zq2vLr9TfX4mWp7YhBn3CjD6sGa1Ue";

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "maize-and-beans";

/// A storefront served on a local port for the duration of a test.
pub struct TestApp {
    pub base_url: String,
    pub http: Client,
}

impl TestApp {
    /// Serve a fresh storefront with default test configuration.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Serve a fresh storefront after adjusting its configuration.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn_with(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let mut config = StorefrontConfig::new(SecretString::from(TEST_TOKEN_SECRET));
        config.host = Ipv4Addr::LOCALHOST.into();
        config.port = 0;
        config.auth_rate_burst = 1_000;
        config.catalog_timeout = Duration::from_secs(5);
        configure(&mut config);

        let listener = TcpListener::bind(config.socket_addr())
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener has an address");

        let app = zaulimi_storefront::app(AppState::new(config));
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("test server crashed");
        });

        Self {
            base_url: format!("http://{addr}"),
            http: Client::new(),
        }
    }

    /// Absolute URL for `path`, which must start with `/`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// An API client that is not signed in.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is invalid, which it never is.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url).expect("valid base url")
    }

    /// Register a new account and return a client signed in as it.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn signed_in(&self, email: &str, role: &str) -> ApiClient {
        let mut client = self.client();
        client
            .register("Test User", email, TEST_PASSWORD, role)
            .await
            .expect("registration succeeds");
        client
    }
}
