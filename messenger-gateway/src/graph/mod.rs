//! Outbound Graph API client.
//!
//! Thin request/response wrappers over the platform's REST endpoints. Every
//! call carries the page access token (and the optional debug level) as query
//! parameters. Failures are returned once; nothing is retried.

pub mod broadcast;
pub mod handover;
pub mod profile;
pub mod send;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GraphError;
use crate::Config;

pub use broadcast::{
    BroadcastRequest, BroadcastResponse, MessageCreativeRequest, MessageCreativeResponse,
    MessageTag, NotificationType,
};
pub use handover::{HandoverResponse, SecondaryReceiver, INBOX_APP_ID};
pub use profile::Profile;
pub use send::{MessagingType, SendMessage, SendResponse};

/// Debug level requested from the Graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugType {
    All,
    Info,
    Warning,
}

impl DebugType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugType::All => "all",
            DebugType::Info => "info",
            DebugType::Warning => "warning",
        }
    }
}

impl fmt::Display for DebugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebugType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(DebugType::All),
            "info" => Ok(DebugType::Info),
            "warning" => Ok(DebugType::Warning),
            other => Err(format!("unknown debug type: {}", other)),
        }
    }
}

/// Error body returned by the Graph API on non-200 responses.
#[derive(Debug, Default, Deserialize)]
struct RawError {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    code: i64,
}

/// Graph API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    access_token: String,
    debug: Option<DebugType>,
}

impl GraphClient {
    /// Create a client from the application configuration.
    pub fn new(config: &Config) -> Result<Self, GraphError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.graph_api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            debug: config.graph_api_debug,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        let request = self.request(Method::GET, path).query(query);
        self.execute(request, path).await
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GraphError> {
        let body = serde_json::to_vec(body)?;
        let request = self.request(Method::POST, path).body(body);
        self.execute(request, path).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .query(&[("access_token", self.access_token.as_str())]);

        if let Some(debug) = self.debug {
            request = request.query(&[("debug", debug.as_str())]);
        }

        request
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, GraphError> {
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(path = path, error = %e, "graph_request_failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            let raw: RawError = serde_json::from_slice(&body).unwrap_or_default();
            warn!(
                path = path,
                status_code = status.as_u16(),
                error_type = %raw.error.kind,
                error_code = raw.error.code,
                error_message = %raw.error.message,
                "graph_request_rejected"
            );
            return Err(GraphError::Api {
                status: status.as_u16(),
                message: raw.error.message,
                kind: raw.error.kind,
                code: raw.error.code,
            });
        }

        info!(
            path = path,
            status_code = status.as_u16(),
            body_length = body.len(),
            "graph_request_complete"
        );

        Ok(serde_json::from_slice(&body)?)
    }
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
