//! GraphQL client for the post API.
//!
//! ### Endpoints
//!
//! - **Primary** (`https://v3.velog.io/graphql`): post listing and the
//!   signed-in user.
//! - **Legacy** (`https://v2.velog.io/graphql`): per-post stats and the
//!   edit read.
//!
//! ### Contract
//!
//! - Every call is a JSON POST carrying `query`, `variables` and, for named
//!   operations, `operationName`.
//! - Session credentials are ambient: a configured cookie header is sent
//!   verbatim, nothing else is managed here.
//! - Non-success statuses fail with `RemoteError::Status`. Nothing is retried.

pub mod request;
pub mod response;

pub use request::GraphqlRequest;
pub use response::GraphqlResponse;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use serde::de::DeserializeOwned;

use postmirror_core::config::AppConfig;
use postmirror_core::model::{EditedFields, Item, StatSnapshot};
use postmirror_core::remote::{ItemsPage, RemoteError, RemoteSource};

/// Default primary endpoint.
const DEFAULT_ENDPOINT: &str = "https://v3.velog.io/graphql";

/// Default endpoint for stats and edit reads.
const DEFAULT_LEGACY_ENDPOINT: &str = "https://v2.velog.io/graphql";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "postmirror/0.1";

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct GraphqlConfig {
    /// Listing and identity endpoint.
    pub endpoint: String,
    /// Stats and edit-read endpoint.
    pub legacy_endpoint: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: postmirror/0.1).
    pub user_agent: String,
    /// Cookie header attached to every request.
    pub session_cookie: Option<String>,
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            legacy_endpoint: DEFAULT_LEGACY_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session_cookie: None,
        }
    }
}

impl From<&AppConfig> for GraphqlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            endpoint: config.api_endpoint.clone(),
            legacy_endpoint: config.legacy_api_endpoint.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            session_cookie: config.session_cookie.clone(),
        }
    }
}

/// Map a transport failure onto the remote error taxonomy.
pub fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() { RemoteError::Timeout } else { RemoteError::Network(err.to_string()) }
}

/// GraphQL client implementing [`RemoteSource`].
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    config: GraphqlConfig,
}

impl GraphqlClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GraphqlConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(transport_error)?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &GraphqlConfig {
        &self.config
    }

    /// POST one GraphQL request and decode its `data`.
    async fn execute<V, D>(&self, endpoint: &str, body: &GraphqlRequest<V>) -> Result<D, RemoteError>
    where
        V: Serialize + Sync,
        D: DeserializeOwned,
    {
        let start = Instant::now();
        let operation = body.operation_name.unwrap_or("anonymous");

        let mut request = self
            .http
            .post(endpoint)
            .header(header::ACCEPT, "application/json")
            .json(body);

        if let Some(cookie) = &self.config.session_cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let http_response = request.send().await.map_err(transport_error)?;

        let status = http_response.status();
        if !status.is_success() {
            tracing::debug!(operation, status = status.as_u16(), "graphql request failed");
            return Err(RemoteError::Status { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await.map_err(transport_error)?;
        let envelope: GraphqlResponse<D> =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Parse(e.to_string()))?;

        tracing::debug!(operation, elapsed_ms = start.elapsed().as_millis() as u64, "graphql request completed");

        envelope.into_data()
    }
}

#[async_trait]
impl RemoteSource for GraphqlClient {
    async fn fetch_items_page(
        &self, owner_id: &str, limit: usize, cursor: Option<&str>,
    ) -> Result<ItemsPage, RemoteError> {
        let body = request::posts(owner_id, limit, cursor);
        let data: response::PostsData = self.execute(&self.config.endpoint, &body).await?;

        let items: Vec<Item> = data.posts.into_iter().map(Item::from).collect();
        Ok(ItemsPage::from_items(items, limit))
    }

    async fn fetch_stats(&self, item_id: &str) -> Result<StatSnapshot, RemoteError> {
        let body = request::get_stats(item_id);
        let data: response::StatsData = self.execute(&self.config.legacy_endpoint, &body).await?;

        data.get_stats
            .map(StatSnapshot::from)
            .ok_or_else(|| RemoteError::Parse(format!("no stats returned for post {item_id}")))
    }

    async fn fetch_edited_fields(&self, item_id: &str) -> Result<EditedFields, RemoteError> {
        let body = request::read_post_for_edit(item_id);
        let data: response::PostData = self.execute(&self.config.legacy_endpoint, &body).await?;

        data.post
            .map(EditedFields::from)
            .ok_or_else(|| RemoteError::Parse(format!("post {item_id} missing from edit read")))
    }

    async fn resolve_acting_identity(&self) -> Result<Option<String>, RemoteError> {
        let body = request::current_user();
        let data: response::CurrentUserData = self.execute(&self.config.endpoint, &body).await?;

        Ok(data.current_user.map(|user| user.username))
    }
}
