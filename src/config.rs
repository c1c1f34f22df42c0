//! Provider configuration.
//!
//! The host hands the provider block to [`crate::ProviderService::configure`] as
//! JSON; it is decoded into a [`ProviderConfig`] and turned into a
//! [`ClientConfig`] for the API client.

use std::time::Duration;

use serde::Deserialize;

use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variable overriding the API base URL.
pub const HOST_ENV: &str = "CLOUDKARAFKA_HOST";

/// Customer API base URL used when nothing else is configured.
pub const DEFAULT_HOST: &str = "https://customer.cloudkarafka.com";

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("cloudkarafka-provider/", env!("CARGO_PKG_VERSION"));

/// The provider block as written by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// API key for the customer API.
    #[serde(default)]
    pub apikey: Option<String>,
    /// Base URL of the customer API.
    #[serde(default)]
    pub host: Option<String>,
    /// User agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ProviderConfig {
    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Interact with CloudKarafka.")
            .with_attribute(
                "apikey",
                Attribute::required_string()
                    .sensitive()
                    .with_description("API key for the CloudKarafka customer API."),
            )
            .with_attribute(
                "host",
                Attribute::optional_string().with_description(format!(
                    "Base URL of the customer API. Defaults to ${} or {}.",
                    HOST_ENV, DEFAULT_HOST
                )),
            )
            .with_attribute(
                "user_agent",
                Attribute::optional_string().with_description("User-Agent header override."),
            )
    }

    /// Check the block for problems that would prevent building a client.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.apikey.as_deref().map_or(true, |k| k.trim().is_empty()) {
            diagnostics.push(
                Diagnostic::error("Missing CloudKarafka API key")
                    .with_detail(
                        "The provider cannot create the CloudKarafka API client as there is a \
                         missing or empty value for the CloudKarafka API key.",
                    )
                    .with_attribute("apikey"),
            );
        }
        diagnostics
    }

    /// Resolve the effective base URL: explicit value, then environment, then default.
    pub fn resolved_host(&self) -> String {
        self.host
            .clone()
            .filter(|h| !h.is_empty())
            .or_else(|| std::env::var(HOST_ENV).ok().filter(|h| !h.is_empty()))
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    /// Build the client configuration. Call [`Self::diagnostics`] first.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(
            self.resolved_host(),
            self.apikey.clone().unwrap_or_default(),
        );
        if let Some(user_agent) = self.user_agent.as_ref().filter(|u| !u.is_empty()) {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }
}

/// Everything the API client needs to talk to one deployment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// API key, sent as the Basic Auth password.
    pub api_key: String,
    /// User-Agent header value.
    pub user_agent: String,
    /// Readiness polling cadence.
    pub poll: PollConfig,
    /// Success status expected per endpoint.
    pub expected: ExpectedStatus,
}

impl ClientConfig {
    /// Create a configuration with default polling and status expectations.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            poll: PollConfig::default(),
            expected: ExpectedStatus::default(),
        }
    }

    /// Override the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the polling cadence.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Override the expected success statuses.
    pub fn with_expected_status(mut self, expected: ExpectedStatus) -> Self {
        self.expected = expected;
        self
    }
}

/// Readiness polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between cluster status checks.
    pub instance_interval: Duration,
    /// Delay between topic status checks.
    pub topic_interval: Duration,
    /// Unsuccessful topic checks tolerated before giving up.
    pub topic_max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            instance_interval: Duration::from_secs(10),
            topic_interval: Duration::from_secs(5),
            topic_max_attempts: 36,
        }
    }
}

/// HTTP status each endpoint answers with on success.
///
/// Older API deployments disagree on some of these, so they are data, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedStatus {
    /// Any GET.
    pub read: u16,
    /// `POST /api/instances`.
    pub instance_create: u16,
    /// `PUT /api/instances/{id}`.
    pub instance_update: u16,
    /// `DELETE /api/instances/{id}`.
    pub instance_delete: u16,
    /// Topic, user and ACL creation.
    pub child_create: u16,
    /// `PUT /api/instances/{id}/topics/{name}`.
    pub topic_update: u16,
    /// Topic, user and ACL deletion.
    pub child_delete: u16,
    /// `POST /api/instances/{id}/config/kafka`.
    pub config_write: u16,
    /// VPC creation.
    pub vpc_create: u16,
    /// VPC update.
    pub vpc_update: u16,
    /// VPC deletion.
    pub vpc_delete: u16,
}

impl Default for ExpectedStatus {
    fn default() -> Self {
        Self {
            read: 200,
            instance_create: 200,
            instance_update: 200,
            instance_delete: 204,
            child_create: 201,
            topic_update: 200,
            child_delete: 200,
            config_write: 200,
            vpc_create: 200,
            vpc_update: 200,
            vpc_delete: 204,
        }
    }
}
