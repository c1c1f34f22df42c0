//! [`CloudKarafkaProvider`]: the [`ProviderService`] implementation.
//!
//! Calls are dispatched by resource type name to the reconcilers in
//! [`crate::resources`]. The API client is built by `configure` and shared
//! read-only by every later call.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::Client;
use crate::config::{ClientConfig, ExpectedStatus, PollConfig, ProviderConfig};
use crate::error::ProviderError;
use crate::resources::{self, acl, decode, encode, instance, kafka_config, topic, user, vpc};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation;

/// Provider name reported in metadata.
pub const PROVIDER_NAME: &str = "cloudkarafka";

/// Provider for the CloudKarafka customer API.
#[derive(Debug, Default)]
pub struct CloudKarafkaProvider {
    client: RwLock<Option<Arc<Client>>>,
    poll: Option<PollConfig>,
    expected: Option<ExpectedStatus>,
}

impl CloudKarafkaProvider {
    /// Create an unconfigured provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that already holds a client, skipping `configure`.
    pub fn with_client(client: Client) -> Self {
        Self {
            client: RwLock::new(Some(Arc::new(client))),
            ..Self::default()
        }
    }

    /// Override the readiness polling cadence used by clients built in `configure`.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Override the expected success statuses used by clients built in `configure`.
    pub fn with_expected_status(mut self, expected: ExpectedStatus) -> Self {
        self.expected = Some(expected);
        self
    }

    async fn client(&self) -> Result<Arc<Client>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider is not configured".to_string())
        })
    }

    fn resource_schema(&self, resource_type: &str) -> Result<Schema, ProviderError> {
        resources::schemas()
            .into_iter()
            .find(|(name, _)| *name == resource_type)
            .map(|(_, schema)| schema)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn client_config(&self, config: &ProviderConfig) -> ClientConfig {
        let mut client_config = config.client_config();
        if let Some(poll) = self.poll {
            client_config = client_config.with_poll(poll);
        }
        if let Some(expected) = self.expected {
            client_config = client_config.with_expected_status(expected);
        }
        client_config
    }
}

fn unknown(resource_type: &str) -> ProviderError {
    ProviderError::UnknownResource(resource_type.to_string())
}

#[async_trait::async_trait]
impl ProviderService for CloudKarafkaProvider {
    fn schema(&self) -> ProviderSchema {
        resources::schemas().into_iter().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, (name, resource)| schema.with_resource(name, resource),
        )
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: PROVIDER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            resources: resources::schemas()
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect(),
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if !diagnostics.is_empty() {
            return Ok(diagnostics);
        }
        let config: ProviderConfig = serde_json::from_value(config)?;
        Ok(config.diagnostics())
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = self.validate_provider_config(config.clone()).await?;
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let config: ProviderConfig = serde_json::from_value(config)?;
        let client_config = self.client_config(&config);
        info!(host = %client_config.base_url, "Configuring CloudKarafka client");
        let client = Client::new(client_config)?;
        *self.client.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        debug!("Provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.resource_schema(resource_type)?;
        Ok(validation::validate(&schema, &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource_schema(resource_type)?;
        PlanResult::from_schema(&schema, prior_state.as_ref(), proposed_state)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let client = client.as_ref();
        match resource_type {
            instance::TYPE_NAME => {
                encode(&instance::create(client, decode(resource_type, planned_state)?).await?)
            },
            topic::TYPE_NAME => encode(&topic::create(client, decode(resource_type, planned_state)?).await?),
            user::TYPE_NAME => encode(&user::create(client, decode(resource_type, planned_state)?).await?),
            acl::TYPE_NAME => encode(&acl::create(client, decode(resource_type, planned_state)?).await?),
            kafka_config::TYPE_NAME => {
                encode(&kafka_config::create(client, decode(resource_type, planned_state)?).await?)
            },
            vpc::TYPE_NAME => encode(&vpc::create(client, decode(resource_type, planned_state)?).await?),
            _ => Err(unknown(resource_type)),
        }
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let client = client.as_ref();
        match resource_type {
            instance::TYPE_NAME => {
                encode(&instance::read(client, decode(resource_type, current_state)?).await?)
            },
            topic::TYPE_NAME => encode(&topic::read(client, decode(resource_type, current_state)?).await?),
            user::TYPE_NAME => encode(&user::read(client, decode(resource_type, current_state)?).await?),
            acl::TYPE_NAME => encode(&acl::read(client, decode(resource_type, current_state)?).await?),
            kafka_config::TYPE_NAME => {
                encode(&kafka_config::read(client, decode(resource_type, current_state)?).await?)
            },
            vpc::TYPE_NAME => encode(&vpc::read(client, decode(resource_type, current_state)?).await?),
            _ => Err(unknown(resource_type)),
        }
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        let client = client.as_ref();
        match resource_type {
            instance::TYPE_NAME => encode(
                &instance::update(
                    client,
                    decode(resource_type, prior_state)?,
                    decode(resource_type, planned_state)?,
                )
                .await?,
            ),
            topic::TYPE_NAME => encode(&topic::update(client, decode(resource_type, planned_state)?).await?),
            // Every attribute forces replacement; nothing can change in place.
            user::TYPE_NAME => encode(&user::read(client, decode(resource_type, planned_state)?).await?),
            acl::TYPE_NAME => encode(&acl::read(client, decode(resource_type, planned_state)?).await?),
            kafka_config::TYPE_NAME => {
                encode(&kafka_config::update(client, decode(resource_type, planned_state)?).await?)
            },
            vpc::TYPE_NAME => encode(
                &vpc::update(
                    client,
                    decode(resource_type, prior_state)?,
                    decode(resource_type, planned_state)?,
                )
                .await?,
            ),
            _ => Err(unknown(resource_type)),
        }
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        if resource_type == kafka_config::TYPE_NAME {
            kafka_config::delete(decode(resource_type, current_state)?);
            return Ok(());
        }

        let client = self.client().await?;
        let client = client.as_ref();
        match resource_type {
            instance::TYPE_NAME => instance::delete(client, decode(resource_type, current_state)?).await,
            topic::TYPE_NAME => topic::delete(client, decode(resource_type, current_state)?).await,
            user::TYPE_NAME => user::delete(client, decode(resource_type, current_state)?).await,
            acl::TYPE_NAME => acl::delete(client, decode(resource_type, current_state)?).await,
            vpc::TYPE_NAME => vpc::delete(client, decode(resource_type, current_state)?).await,
            _ => Err(unknown(resource_type)),
        }
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let client = self.client().await?;
        let client = client.as_ref();
        let state = match resource_type {
            instance::TYPE_NAME => encode(&instance::import(client, id).await?)?,
            topic::TYPE_NAME => encode(&topic::import(client, id).await?)?,
            user::TYPE_NAME => encode(&user::import(client, id).await?)?,
            acl::TYPE_NAME => encode(&acl::import(client, id).await?)?,
            kafka_config::TYPE_NAME => encode(&kafka_config::import(client, id).await?)?,
            vpc::TYPE_NAME => encode(&vpc::import(client, id).await?)?,
            _ => return Err(unknown(resource_type)),
        };
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}
