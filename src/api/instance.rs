//! Instance endpoints: `/api/instances`.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Client;
use crate::error::ProviderError;
use crate::poll::Poller;

/// VPC placement of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    /// VPC id; 0 when the instance lives outside a dedicated VPC.
    #[serde(default)]
    pub id: i64,
    /// CIDR subnet of the VPC.
    #[serde(default)]
    pub subnet: String,
}

/// An instance as returned by `GET /api/instances/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Instance {
    /// Server-assigned id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Plan tier.
    pub plan: String,
    /// Hosting region, `<cloud>::<region>`.
    pub region: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Kafka version.
    #[serde(default)]
    pub kafka_version: String,
    /// Disk size per broker, in GB.
    #[serde(default)]
    pub disk_size: Option<i64>,
    /// API key of the instance itself.
    #[serde(default, rename = "apikey")]
    pub api_key: String,
    /// Bootstrap broker list.
    #[serde(default, rename = "brokers")]
    pub broker_url: String,
    /// SASL user name.
    #[serde(default)]
    pub username: String,
    /// SASL password.
    #[serde(default)]
    pub password: String,
    /// VPC placement, if any.
    #[serde(default)]
    pub vpc: Option<Vpc>,
}

/// `GET /api/instances/{id}/cluster/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ClusterStatus {
    /// Brokers are up.
    #[serde(default)]
    pub ready: bool,
    /// Configuration has been applied.
    #[serde(default)]
    pub configured: bool,
}

impl ClusterStatus {
    /// Provisioning is finished only once both flags are set.
    pub fn is_ready(&self) -> bool {
        self.ready && self.configured
    }
}

/// Body of `POST /api/instances`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateInstanceRequest {
    /// Display name.
    pub name: String,
    /// Plan tier.
    pub plan: String,
    /// Hosting region.
    pub region: String,
    /// Tags, omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Kafka version; the API picks its default when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_version: Option<String>,
    /// Disk size per broker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
    /// Existing VPC to place the instance in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<i64>,
    /// Subnet for a new dedicated VPC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_subnet: Option<String>,
}

/// Body of `PUT /api/instances/{id}`. Region and VPC cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateInstanceRequest {
    /// Display name.
    pub name: String,
    /// Plan tier.
    pub plan: String,
    /// Full replacement tag list.
    pub tags: Vec<String>,
    /// Disk size per broker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

impl Client {
    /// Provision an instance and wait until the cluster is ready.
    ///
    /// Returns the instance as read back after provisioning.
    pub async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<Instance, ProviderError> {
        let created: Created = self
            .send_json(
                Method::POST,
                "/api/instances",
                request,
                self.expected().instance_create,
            )
            .await?
            .json()?;
        info!(instance_id = created.id, "Instance accepted, waiting for cluster");

        self.wait_until_ready(created.id).await?;
        self.read_instance(created.id).await
    }

    /// Fetch one instance.
    pub async fn read_instance(&self, id: i64) -> Result<Instance, ProviderError> {
        self.get_json(&format!("/api/instances/{}", id))
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => {
                    ProviderError::NotFound(format!("Instance with id {} not found", id))
                },
                other => other,
            })
    }

    /// Change name, plan or tags, then wait for the reconfiguration to settle.
    pub async fn update_instance(
        &self,
        id: i64,
        request: &UpdateInstanceRequest,
    ) -> Result<(), ProviderError> {
        self.send_json(
            Method::PUT,
            &format!("/api/instances/{}", id),
            request,
            self.expected().instance_update,
        )
        .await?;
        info!(instance_id = id, "Instance update accepted, waiting for cluster");
        self.wait_until_ready(id).await
    }

    /// Delete an instance, optionally keeping its dedicated VPC.
    pub async fn delete_instance(&self, id: i64, keep_vpc: bool) -> Result<(), ProviderError> {
        self.delete(
            &format!("/api/instances/{}?keep_vpc={}", id, keep_vpc),
            self.expected().instance_delete,
        )
        .await
    }

    /// Fetch the provisioning status of an instance.
    pub async fn cluster_status(&self, id: i64) -> Result<ClusterStatus, ProviderError> {
        self.get_json(&format!("/api/instances/{}/cluster/status", id))
            .await
    }

    /// Block until the cluster reports both `ready` and `configured`.
    ///
    /// There is no attempt cap; the wait ends on readiness or on the first
    /// failing status request.
    pub async fn wait_until_ready(&self, id: i64) -> Result<(), ProviderError> {
        let poller = Poller::unbounded(self.poll_config().instance_interval);
        let attempts = poller
            .wait_until(
                || async move { self.cluster_status(id).await.map(|s| s.is_ready()) },
                |attempts| {
                    ProviderError::ReadinessTimeout(format!(
                        "instance {} not ready after {} checks",
                        id, attempts
                    ))
                },
            )
            .await?;
        info!(instance_id = id, attempts, "Cluster ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cluster_status_needs_both_flags() {
        let status: ClusterStatus =
            serde_json::from_value(json!({"name": "c1", "ready": true, "configured": false})).unwrap();
        assert!(!status.is_ready());

        let status: ClusterStatus =
            serde_json::from_value(json!({"ready": false, "configured": true})).unwrap();
        assert!(!status.is_ready());

        let status: ClusterStatus =
            serde_json::from_value(json!({"ready": true, "configured": true})).unwrap();
        assert!(status.is_ready());
    }

    #[test]
    fn test_create_request_omits_unset_fields() {
        let request = CreateInstanceRequest {
            name: "prod".to_string(),
            plan: "bat-1".to_string(),
            region: "amazon-web-services::us-east-1".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "prod",
                "plan": "bat-1",
                "region": "amazon-web-services::us-east-1"
            })
        );
    }

    #[test]
    fn test_instance_decodes_api_field_names() {
        let instance: Instance = serde_json::from_value(json!({
            "id": 42,
            "name": "prod",
            "plan": "bat-1",
            "region": "amazon-web-services::us-east-1",
            "tags": ["team-a"],
            "kafka_version": "3.7.0",
            "apikey": "instance-key",
            "brokers": "b1:9094,b2:9094",
            "username": "u",
            "password": "p",
            "vpc": {"id": 7, "subnet": "10.56.72.0/24"}
        }))
        .unwrap();
        assert_eq!(instance.api_key, "instance-key");
        assert_eq!(instance.broker_url, "b1:9094,b2:9094");
        assert_eq!(
            instance.vpc,
            Some(Vpc {
                id: 7,
                subnet: "10.56.72.0/24".to_string()
            })
        );
    }
}
