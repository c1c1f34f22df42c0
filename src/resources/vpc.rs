//! `cloudkarafka_vpc`: a standalone VPC that instances can be placed in.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{parse_id, require_id};
use crate::api::{Client, CreateVpcRequest, UpdateVpcRequest, Vpc};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Constraint, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "cloudkarafka_vpc";

/// Host-side state of a VPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcState {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Hosting region.
    pub region: String,
    /// CIDR subnet.
    pub subnet: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name given by the cloud provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_name: Option<String>,
}

impl From<Vpc> for VpcState {
    fn from(vpc: Vpc) -> Self {
        Self {
            id: Some(vpc.id),
            name: vpc.name,
            region: vpc.region,
            subnet: vpc.subnet,
            tags: vpc.tags,
            vpc_name: Some(vpc.vpc_name).filter(|n| !n.is_empty()),
        }
    }
}

/// Schema of `cloudkarafka_vpc`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manage a standalone VPC.")
        .with_attribute("id", Attribute::computed_int64().with_description("VPC ID."))
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Name of the VPC instance"),
        )
        .with_attribute(
            "region",
            Attribute::required_string()
                .with_force_new()
                .with_constraint(Constraint::Region)
                .with_description("The hosted region for the standalone VPC instance"),
        )
        .with_attribute(
            "subnet",
            Attribute::required_string()
                .with_force_new()
                .with_constraint(Constraint::Cidr)
                .with_description("The VPC subnet"),
        )
        .with_attribute(
            "tags",
            Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::optional())
                .with_description("Tag the VPC instance with optional tags"),
        )
        .with_attribute(
            "vpc_name",
            Attribute::computed_string()
                .with_description("VPC name given when hosted at the cloud provider"),
        )
}

/// Create a VPC.
#[instrument(skip(client, planned), fields(name = %planned.name, region = %planned.region))]
pub async fn create(client: &Client, planned: VpcState) -> Result<VpcState, ProviderError> {
    let request = CreateVpcRequest {
        name: planned.name,
        region: planned.region,
        subnet: planned.subnet,
        tags: planned.tags,
    };
    let vpc = client.create_vpc(&request).await?;
    Ok(vpc.into())
}

/// Refresh a VPC from the API.
#[instrument(skip(client, current), fields(id = ?current.id))]
pub async fn read(client: &Client, current: VpcState) -> Result<VpcState, ProviderError> {
    let id = require_id(TYPE_NAME, current.id)?;
    Ok(client.read_vpc(id).await?.into())
}

/// Rename or retag a VPC.
#[instrument(skip(client, prior, planned), fields(id = ?prior.id))]
pub async fn update(
    client: &Client,
    prior: VpcState,
    planned: VpcState,
) -> Result<VpcState, ProviderError> {
    let id = require_id(TYPE_NAME, prior.id)?;
    let request = UpdateVpcRequest {
        name: planned.name,
        tags: planned.tags,
    };
    client.update_vpc(id, &request).await?;
    Ok(client.read_vpc(id).await?.into())
}

/// Delete a VPC.
#[instrument(skip(client, current), fields(id = ?current.id))]
pub async fn delete(client: &Client, current: VpcState) -> Result<(), ProviderError> {
    let id = require_id(TYPE_NAME, current.id)?;
    client.delete_vpc(id).await?;
    info!(vpc_id = id, "VPC deleted");
    Ok(())
}

/// Import a VPC by its numeric id.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<VpcState, ProviderError> {
    let id = parse_id(TYPE_NAME, id)?;
    Ok(client.read_vpc(id).await?.into())
}
