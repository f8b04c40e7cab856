//! HTTP gateway.
//!
//! reqwest-backed implementation of [`RemoteGateway`] for the administrative
//! API. Each method issues one logical request; reads and deletes retry
//! transport failures, creates and updates are sent exactly once.

use async_trait::async_trait;
use converge_rbac::{AssignRole, NewRole, RemoteRole, RolePatch};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::config::{ApiEndpoint, GatewayConfig};
use crate::gateway::RemoteGateway;
use crate::response::{GatewayResponse, GatewayResult, TransportError};
use crate::retry::{with_retry_if, RetryConfig};

/// HTTP client for the administrative API.
#[derive(Clone)]
pub struct HttpGateway {
    /// HTTP client instance.
    client: Client,

    /// API endpoint configuration.
    endpoint: ApiEndpoint,

    /// Parsed base URL; request paths are appended segment by segment.
    base: Url,

    /// Retry policy for idempotent requests.
    retry: RetryConfig,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.endpoint.base_url)
            .field("has_auth", &self.endpoint.has_auth())
            .field("retry", &self.retry)
            .finish()
    }
}

impl HttpGateway {
    /// Create a gateway from configuration.
    ///
    /// The configuration is validated first, so a base URL without an
    /// http(s) scheme fails here rather than on every request.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        let base = Url::parse(&config.endpoint.base_url).map_err(|e| {
            TransportError::InvalidUrl(format!("{}: {}", config.endpoint.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                config.endpoint.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            base,
            retry: config.retry(),
        })
    }

    /// Override the retry policy for idempotent requests.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build a URL under the base from raw path segments.
    ///
    /// Every segment is percent-encoded, so `/`, `?` and `#` inside an
    /// identifier stay inside that segment. Empty and dot segments are
    /// rejected because the URL parser would drop or resolve them.
    fn url_for(&self, segments: &[&str]) -> GatewayResult<Url> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(TransportError::InvalidUrl(format!(
                "path segment {:?} is not a valid identifier",
                segment
            )));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments.iter());
        Ok(url)
    }

    /// Start a request with authentication applied.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.client.request(method, url);

        if let Some(ref api_key) = self.endpoint.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        request
    }

    /// Send a request that is safe to repeat, retrying transport failures.
    async fn send_idempotent(&self, method: Method, segments: &[&str]) -> GatewayResult<Response> {
        let url = self.url_for(segments)?;

        with_retry_if(
            &self.retry,
            || {
                let request = self.request(method.clone(), url.clone());
                async move { request.send().await.map_err(TransportError::from) }
            },
            TransportError::is_retryable,
        )
        .await
    }

    /// Sort a response into a [`GatewayResponse`] carrying a decoded payload.
    ///
    /// A success status whose body does not decode is `Unexpected`.
    async fn decode<T>(response: Response) -> GatewayResponse<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if !status.is_success() {
            return Self::failure(status, response).await;
        }

        match response.json::<T>().await {
            Ok(payload) => GatewayResponse::Ok(payload),
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "Undecodable response payload");
                GatewayResponse::unexpected(
                    status.as_u16(),
                    format!("Invalid response payload: {}", e),
                )
            }
        }
    }

    /// Sort a response whose success body is irrelevant.
    async fn expect_empty(response: Response) -> GatewayResponse<()> {
        let status = response.status();

        if status.is_success() {
            return GatewayResponse::Ok(());
        }

        Self::failure(status, response).await
    }

    /// Map a non-success response to `NotFound` or `Unexpected`.
    async fn failure<T>(status: StatusCode, response: Response) -> GatewayResponse<T> {
        if status == StatusCode::NOT_FOUND {
            return GatewayResponse::NotFound;
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!(status = status.as_u16(), "Administrative API rejected credentials");
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("Administrative API error ({}): {}", status.as_u16(), message);

        GatewayResponse::unexpected(status.as_u16(), message)
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    #[instrument(skip(self), fields(role_id = %id))]
    async fn fetch_role(&self, id: &str) -> GatewayResult<GatewayResponse<RemoteRole>> {
        debug!("Fetching role {}", id);

        let response = self
            .send_idempotent(Method::GET, &["api", "roles", id])
            .await?;
        Ok(Self::decode(response).await)
    }

    #[instrument(skip(self, role), fields(name = %role.name))]
    async fn create_role(&self, role: &NewRole) -> GatewayResult<GatewayResponse<RemoteRole>> {
        debug!("Creating role {}", role.name);

        let url = self.url_for(&["api", "roles"])?;
        let response = self.request(Method::POST, url).json(role).send().await?;
        Ok(Self::decode(response).await)
    }

    #[instrument(skip(self, patch), fields(role_id = %id))]
    async fn update_role(
        &self,
        id: &str,
        patch: &RolePatch,
    ) -> GatewayResult<GatewayResponse<RemoteRole>> {
        debug!("Updating role {}", id);

        let url = self.url_for(&["api", "roles", id])?;
        let response = self
            .request(Method::PUT, url)
            .json(patch)
            .send()
            .await?;
        Ok(Self::decode(response).await)
    }

    #[instrument(skip(self), fields(role_id = %id))]
    async fn delete_role(&self, id: &str) -> GatewayResult<GatewayResponse<()>> {
        debug!("Deleting role {}", id);

        let response = self
            .send_idempotent(Method::DELETE, &["api", "roles", id])
            .await?;
        Ok(Self::expect_empty(response).await)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_roles_for_user(
        &self,
        user_id: &str,
    ) -> GatewayResult<GatewayResponse<Vec<RemoteRole>>> {
        debug!("Listing roles for user {}", user_id);

        let response = self
            .send_idempotent(Method::GET, &["api", "users", user_id, "roles"])
            .await?;
        Ok(Self::decode(response).await)
    }

    #[instrument(skip(self), fields(user_id = %user_id, role_id = %role_id))]
    async fn create_assignment(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> GatewayResult<GatewayResponse<()>> {
        debug!("Assigning role {} to user {}", role_id, user_id);

        let body = AssignRole {
            role_id: role_id.to_string(),
        };
        let url = self.url_for(&["api", "users", user_id, "roles"])?;
        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await?;
        Ok(Self::expect_empty(response).await)
    }

    #[instrument(skip(self), fields(user_id = %user_id, role_id = %role_id))]
    async fn delete_assignment(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> GatewayResult<GatewayResponse<()>> {
        debug!("Removing role {} from user {}", role_id, user_id);

        let response = self
            .send_idempotent(Method::DELETE, &["api", "users", user_id, "roles", role_id])
            .await?;
        Ok(Self::expect_empty(response).await)
    }
}
