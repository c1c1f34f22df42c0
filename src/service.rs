//! The host-facing provider contract.

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};

/// Trait that a provider implements for the host's plan/apply engine.
///
/// States travel as `Value` objects shaped by the resource's
/// [`crate::schema::Schema`].
///
/// # Example
///
/// ```ignore
/// use cloudkarafka_provider::{CloudKarafkaProvider, ProviderService};
/// use serde_json::json;
///
/// let provider = CloudKarafkaProvider::new();
/// provider.configure(json!({"apikey": "secret"})).await?;
/// let state = provider
///     .create("cloudkarafka_user", json!({"instance_id": 42, "name": "alice"}))
///     .await?;
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Discovery
    // =========================================================================

    /// Provider block schema plus every resource schema.
    fn schema(&self) -> ProviderSchema;

    /// Resource names, taken from [`ProviderService::schema`] unless overridden.
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.schema().resources.keys().cloned().collect(),
            ..Default::default()
        }
    }

    // =========================================================================
    // Provider block
    // =========================================================================

    /// Check a provider block without applying it.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Apply a provider block. Error diagnostics leave the provider unconfigured.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Drop the configured client.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Check a resource configuration against its schema.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Diff `prior_state` against `proposed_state`. `None` prior means create.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create the resource and return its state after readiness.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Refresh from the API. A vanished resource is [`ProviderError::NotFound`].
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Apply an in-place change.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Remove the resource.
    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError>;

    /// Adopt an existing resource by its import id.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::InvalidRequest(format!(
            "{} cannot be imported",
            resource_type
        )))
    }
}
