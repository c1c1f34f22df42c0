//! Standalone VPC endpoints: `/api/vpcs`.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Client;
use crate::error::ProviderError;

/// A standalone VPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Vpc {
    /// Server-assigned id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Hosting region, `<cloud>::<region>`.
    pub region: String,
    /// CIDR subnet.
    pub subnet: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name of the VPC at the cloud provider.
    #[serde(default)]
    pub vpc_name: String,
}

/// Body of `POST /api/vpcs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateVpcRequest {
    /// Display name.
    pub name: String,
    /// Hosting region.
    pub region: String,
    /// CIDR subnet.
    pub subnet: String,
    /// Tags, omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Body of `PUT /api/vpcs/{id}`. Region and subnet cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateVpcRequest {
    /// Display name.
    pub name: String,
    /// Full replacement tag list.
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

impl Client {
    /// Create a VPC and return it as read back.
    pub async fn create_vpc(&self, request: &CreateVpcRequest) -> Result<Vpc, ProviderError> {
        let created: Created = self
            .send_json(Method::POST, "/api/vpcs", request, self.expected().vpc_create)
            .await?
            .json()?;
        info!(vpc_id = created.id, "VPC created");
        self.read_vpc(created.id).await
    }

    /// Fetch one VPC.
    pub async fn read_vpc(&self, id: i64) -> Result<Vpc, ProviderError> {
        self.get_json(&format!("/api/vpcs/{}", id))
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => {
                    ProviderError::NotFound(format!("VPC with id {} not found", id))
                },
                other => other,
            })
    }

    /// Rename or retag a VPC.
    pub async fn update_vpc(&self, id: i64, request: &UpdateVpcRequest) -> Result<(), ProviderError> {
        self.send_json(
            Method::PUT,
            &format!("/api/vpcs/{}", id),
            request,
            self.expected().vpc_update,
        )
        .await?;
        Ok(())
    }

    /// Delete a VPC.
    pub async fn delete_vpc(&self, id: i64) -> Result<(), ProviderError> {
        self.delete(&format!("/api/vpcs/{}", id), self.expected().vpc_delete)
            .await
    }
}
