//! `cloudkarafka_instance`: a hosted Kafka cluster.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{parse_id, require_id};
use crate::api::{Client, CreateInstanceRequest, Instance, UpdateInstanceRequest};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Constraint, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "cloudkarafka_instance";

/// Smallest disk size the API accepts, in GB.
pub const MIN_DISK_SIZE: i64 = 128;

/// Host-side state of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Plan tier.
    pub plan: String,
    /// Hosting region.
    pub region: String,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Kafka version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka_version: Option<String>,
    /// Disk size per broker, in GB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
    /// VPC the instance lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<i64>,
    /// Subnet of that VPC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_subnet: Option<String>,
    /// Keep the dedicated VPC when the instance is deleted.
    #[serde(default)]
    pub keep_vpc: bool,
    /// Bootstrap broker list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brokers: Option<String>,
    /// SASL user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// SASL password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// API key of the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apikey: Option<String>,
}

impl InstanceState {
    fn from_api(instance: Instance, keep_vpc: bool) -> Self {
        let vpc = instance.vpc.filter(|v| v.id != 0);
        Self {
            id: Some(instance.id),
            name: instance.name,
            plan: instance.plan,
            region: instance.region,
            tags: instance.tags,
            kafka_version: non_empty(instance.kafka_version),
            disk_size: instance.disk_size,
            vpc_id: vpc.as_ref().map(|v| v.id),
            vpc_subnet: vpc.and_then(|v| non_empty(v.subnet)),
            keep_vpc,
            brokers: non_empty(instance.broker_url),
            username: non_empty(instance.username),
            password: non_empty(instance.password),
            apikey: non_empty(instance.api_key),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

/// Schema of `cloudkarafka_instance`.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manage an instance.")
        .with_attribute(
            "id",
            Attribute::computed_int64().with_description("Instance ID."),
        )
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Name of instance."),
        )
        .with_attribute(
            "plan",
            Attribute::required_string().with_description("What plan to use."),
        )
        .with_attribute(
            "region",
            Attribute::required_string()
                .with_force_new()
                .with_constraint(Constraint::Region)
                .with_description("Which region to use, e.g. amazon-web-services::us-east-1."),
        )
        .with_attribute(
            "tags",
            Attribute::new(AttributeType::set(AttributeType::String), AttributeFlags::optional())
                .with_description("Instance tags."),
        )
        .with_attribute(
            "kafka_version",
            Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                .with_force_new()
                .with_constraint(Constraint::Version)
                .with_description("Which Apache Kafka version to use."),
        )
        .with_attribute(
            "disk_size",
            Attribute::optional_int64()
                .with_constraint(Constraint::AtLeast(MIN_DISK_SIZE))
                .with_description("Disk size for each broker, in GB."),
        )
        .with_attribute(
            "vpc_id",
            Attribute::new(AttributeType::Int64, AttributeFlags::optional_computed())
                .with_force_new()
                .with_description("ID of an existing VPC to place the instance in."),
        )
        .with_attribute(
            "vpc_subnet",
            Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                .with_force_new()
                .with_constraint(Constraint::Cidr)
                .with_description("Subnet for a dedicated VPC."),
        )
        .with_attribute(
            "keep_vpc",
            Attribute::optional_bool()
                .with_default(serde_json::Value::Bool(false))
                .with_description("Keep the VPC when the instance is deleted."),
        )
        .with_attribute(
            "brokers",
            Attribute::computed_string().with_description("Bootstrap broker list."),
        )
        .with_attribute(
            "username",
            Attribute::computed_string().with_description("SASL user name."),
        )
        .with_attribute(
            "password",
            Attribute::computed_string()
                .sensitive()
                .with_description("SASL password."),
        )
        .with_attribute(
            "apikey",
            Attribute::computed_string()
                .sensitive()
                .with_description("API key of the instance."),
        )
}

/// Provision an instance and block until the cluster is ready.
#[instrument(skip(client, planned), fields(name = %planned.name, plan = %planned.plan))]
pub async fn create(client: &Client, planned: InstanceState) -> Result<InstanceState, ProviderError> {
    let request = CreateInstanceRequest {
        name: planned.name,
        plan: planned.plan,
        region: planned.region,
        tags: planned.tags,
        kafka_version: planned.kafka_version,
        disk_size: planned.disk_size,
        vpc_id: planned.vpc_id,
        vpc_subnet: planned.vpc_subnet,
    };
    let instance = client.create_instance(&request).await?;
    info!(instance_id = instance.id, "Instance created");
    Ok(InstanceState::from_api(instance, planned.keep_vpc))
}

/// Refresh an instance from the API.
#[instrument(skip(client, current), fields(id = ?current.id))]
pub async fn read(client: &Client, current: InstanceState) -> Result<InstanceState, ProviderError> {
    let id = require_id(TYPE_NAME, current.id)?;
    let instance = client.read_instance(id).await?;
    Ok(InstanceState::from_api(instance, current.keep_vpc))
}

/// Apply name, plan, tag and disk changes, then wait for the cluster to settle.
#[instrument(skip(client, prior, planned), fields(id = ?prior.id))]
pub async fn update(
    client: &Client,
    prior: InstanceState,
    planned: InstanceState,
) -> Result<InstanceState, ProviderError> {
    let id = require_id(TYPE_NAME, prior.id)?;
    let request = UpdateInstanceRequest {
        name: planned.name,
        plan: planned.plan,
        tags: planned.tags,
        disk_size: planned.disk_size,
    };
    client.update_instance(id, &request).await?;
    let instance = client.read_instance(id).await?;
    Ok(InstanceState::from_api(instance, planned.keep_vpc))
}

/// Delete an instance, keeping its VPC when `keep_vpc` is set.
#[instrument(skip(client, current), fields(id = ?current.id, keep_vpc = current.keep_vpc))]
pub async fn delete(client: &Client, current: InstanceState) -> Result<(), ProviderError> {
    let id = require_id(TYPE_NAME, current.id)?;
    client.delete_instance(id, current.keep_vpc).await?;
    info!(instance_id = id, "Instance deleted");
    Ok(())
}

/// Import an instance by its numeric id.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<InstanceState, ProviderError> {
    let id = parse_id(TYPE_NAME, id)?;
    let instance = client.read_instance(id).await?;
    Ok(InstanceState::from_api(instance, false))
}
