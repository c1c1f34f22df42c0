//! HTTP client for the CloudKarafka customer API.
//!
//! [`Client`] owns the credentials and a pooled `reqwest` client. Every call goes
//! through [`Client::request`], which returns the raw status and body; the typed
//! helpers decode the body into the success shape when the status matches what
//! the endpoint promises, and classify everything else with [`classify`].
//!
//! The endpoint families live in submodules and are implemented as inherent
//! methods on [`Client`].

use reqwest::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ClientConfig, ExpectedStatus, PollConfig};
use crate::error::ProviderError;

pub mod acl;
pub mod instance;
pub mod kafka_config;
pub mod topic;
pub mod user;
pub mod vpc;

pub use acl::{AclRule, DeleteReport};
pub use instance::{ClusterStatus, CreateInstanceRequest, Instance, UpdateInstanceRequest, Vpc as InstanceVpc};
pub use kafka_config::KafkaConfig;
pub use topic::{Topic, TopicConfig, UpdateTopicRequest};
pub use user::User;
pub use vpc::{CreateVpcRequest, UpdateVpcRequest, Vpc};

/// Fallback message when an error body carries nothing usable.
pub const UNKNOWN_ERROR: &str = "unknown error response";

/// Message attached to every 401.
pub const INVALID_API_KEY: &str = "invalid API key used";

/// Raw response of one API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Return `self` if the status matches, else the classified error.
    pub fn expect(self, expected: u16) -> Result<Self, ProviderError> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(classify(self.status, &self.body))
        }
    }
}

/// Error-shaped response bodies.
///
/// The API answers either `{"error": "..."}` or
/// `{"errors": [{"field": "message"}, ...]}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl ErrorBody {
    fn message(self) -> String {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return error;
        }
        self.errors
            .into_iter()
            .find_map(|fields| fields.into_iter().next())
            .map(|(_, value)| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }
}

/// Extract a human-readable message from an error body.
pub fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .unwrap_or_default()
        .message()
}

/// Turn an unexpected status into a typed error.
pub fn classify(status: u16, body: &[u8]) -> ProviderError {
    match status {
        400 => ProviderError::Validation(error_message(body)),
        401 => ProviderError::PermissionDenied(INVALID_API_KEY.to_string()),
        404 => ProviderError::NotFound(error_message(body)),
        _ => ProviderError::Api {
            status,
            message: error_message(body),
        },
    }
}

/// `parent` followed by `name` as a single percent-encoded path segment.
pub fn child_path(parent: &str, name: &str) -> Result<String, ProviderError> {
    let invalid = || ProviderError::InvalidRequest(format!("cannot build a path for {:?}", name));
    let mut url = reqwest::Url::parse("http://localhost/").map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|()| invalid())?
        .clear()
        .push(name);
    Ok(format!("{}{}", parent.trim_end_matches('/'), url.path()))
}

/// Authenticated client for one customer API deployment.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Build a client from its configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            ProviderError::Configuration(format!("invalid user agent: {}", e))
        })?;
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Expected success statuses.
    pub fn expected(&self) -> &ExpectedStatus {
        &self.config.expected
    }

    /// Readiness polling cadence.
    pub fn poll_config(&self) -> &PollConfig {
        &self.config.poll
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Issue one request and return the raw status and body.
    ///
    /// Transport failures are returned as [`ProviderError::Transport`]; any HTTP
    /// status, including errors, comes back as `Ok`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse, ProviderError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "API request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .basic_auth("", Some(&self.config.api_key));
        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Text(text)) => builder
                .header(CONTENT_TYPE, "text/plain")
                .body(text),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(method = %method, url = %url, status, "API response");
        Ok(ApiResponse { status, body })
    }

    /// GET `path` and decode the body when the status is the read status.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        self.request(Method::GET, path, None)
            .await?
            .expect(self.config.expected.read)?
            .json()
    }

    /// Send a JSON body and check for the expected status.
    pub async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        expected: u16,
    ) -> Result<ApiResponse, ProviderError> {
        let value = serde_json::to_value(body)?;
        self.request(method, path, Some(RequestBody::Json(value)))
            .await?
            .expect(expected)
    }

    /// Send a plain-text body and check for the expected status.
    pub async fn send_text(
        &self,
        method: Method,
        path: &str,
        text: String,
        expected: u16,
    ) -> Result<ApiResponse, ProviderError> {
        self.request(method, path, Some(RequestBody::Text(text)))
            .await?
            .expect(expected)
    }

    /// DELETE `path` and check for the expected status.
    pub async fn delete(&self, path: &str, expected: u16) -> Result<(), ProviderError> {
        self.request(Method::DELETE, path, None)
            .await?
            .expect(expected)?;
        Ok(())
    }
}

/// Outgoing request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as `application/json`.
    Json(serde_json::Value),
    /// Sent verbatim as `text/plain`.
    Text(String),
}
