//! Typed HTTP client for the Zaulimi24 API.

use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use zaulimi_core::{CartSummary, ProductId};

use crate::error::ClientError;
use crate::types::{AuthSession, ErrorBody, Health, Product, UserProfile};

/// Client for one API server, optionally signed in as one user.
///
/// Cloning is cheap; clones share the connection pool and carry their own
/// copy of the token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g. `http://127.0.0.1:5000`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{base_url} cannot carry a path"
            )));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            token: None,
        })
    }

    /// Use `token` for subsequent requests.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Whether a bearer token is set.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    // =========================================================================
    // Service
    // =========================================================================

    /// `GET /api/health`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server is unhealthy.
    pub async fn health(&self) -> Result<Health, ClientError> {
        self.send(self.request(Method::GET, &["api", "health"])?).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register and keep the returned token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 for invalid input and 409
    /// if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<AuthSession, ClientError> {
        let body = json!({ "name": name, "email": email, "password": password, "role": role });
        let session: AuthSession = self
            .send(self.request(Method::POST, &["api", "auth", "register"])?.json(&body))
            .await?;
        self.token = Some(SecretString::from(session.token.clone()));
        Ok(session)
    }

    /// Log in and keep the returned token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let body = json!({ "email": email, "password": password });
        let session: AuthSession = self
            .send(self.request(Method::POST, &["api", "auth", "login"])?.json(&body))
            .await?;
        self.token = Some(SecretString::from(session.token.clone()));
        Ok(session)
    }

    /// Log out and forget the token.
    ///
    /// The token is dropped even if the request fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let request = self.request(Method::POST, &["api", "auth", "logout"])?;
        self.token = None;
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }

    /// `GET /api/auth/profile`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 without a valid token.
    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.send(self.request(Method::GET, &["api", "auth", "profile"])?)
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// `GET /api/products`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.send(self.request(Method::GET, &["api", "products"])?)
            .await
    }

    /// `GET /api/products/{id}`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 for an unknown id.
    pub async fn product(&self, id: &ProductId) -> Result<Product, ClientError> {
        self.send(self.request(Method::GET, &["api", "products", id.as_str()])?)
            .await
    }

    /// `POST /api/products` (sellers only).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 403 for non-sellers and 400 for
    /// an invalid listing.
    pub async fn create_product(&self, draft: &impl Serialize) -> Result<Product, ClientError> {
        self.send(self.request(Method::POST, &["api", "products"])?.json(draft))
            .await
    }

    /// `PUT /api/products/{id}` (sellers only).
    ///
    /// # Errors
    ///
    /// As [`ApiClient::create_product`], plus 404 for an unknown id.
    pub async fn update_product(
        &self,
        id: &ProductId,
        draft: &impl Serialize,
    ) -> Result<Product, ClientError> {
        self.send(
            self.request(Method::PUT, &["api", "products", id.as_str()])?
                .json(draft),
        )
        .await
    }

    /// `DELETE /api/products/{id}` (sellers only).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 403 for non-sellers and 404 for
    /// an unknown id.
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ClientError> {
        let response = self
            .execute(self.request(Method::DELETE, &["api", "products", id.as_str()])?)
            .await?;
        debug!(status = response.status().as_u16(), "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// `GET /api/cart`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 401 without a valid token.
    pub async fn get_cart(&self) -> Result<CartSummary, ClientError> {
        self.send(self.request(Method::GET, &["api", "cart"])?).await
    }

    /// `POST /api/cart/items`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 400 for a bad quantity and 404
    /// for an unknown product.
    #[instrument(skip(self))]
    pub async fn add_item(&self, product_id: &str, quantity: i64) -> Result<CartSummary, ClientError> {
        let body = json!({ "productId": product_id, "quantity": quantity });
        self.send(self.request(Method::POST, &["api", "cart", "items"])?.json(&body))
            .await
    }

    /// `PUT /api/cart/items/{productId}`
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 if the cart has no such line
    /// and `quantity` is positive.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Result<CartSummary, ClientError> {
        let body = json!({ "quantity": quantity });
        self.send(
            self.request(Method::PUT, &["api", "cart", "items", product_id])?
                .json(&body),
        )
        .await
    }

    /// `DELETE /api/cart/items/{productId}`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: &str) -> Result<CartSummary, ClientError> {
        self.send(self.request(Method::DELETE, &["api", "cart", "items", product_id])?)
            .await
    }

    /// `DELETE /api/cart`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn clear_cart(&self) -> Result<CartSummary, ClientError> {
        self.send(self.request(Method::DELETE, &["api", "cart"])?)
            .await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Build a request for the path made of `segments`, each percent-encoded.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(segments)?;
        let request = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, turning non-success statuses into `ClientError::Api`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), status.canonical_reason(), &text))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))
    }
}

/// Build an API error from a failed response's status and body.
fn api_error(status: u16, reason: Option<&str>, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| reason.unwrap_or("request failed").to_string(),
        |b| b.message,
    );
    ClientError::Api { status, message }
}
