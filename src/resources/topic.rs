//! `cloudkarafka_topic`: a topic on an instance.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::parse_child_id;
use crate::api::{Client, Topic, TopicConfig, UpdateTopicRequest};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Constraint, NestedBlock, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "cloudkarafka_topic";

/// Host-side state of a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicState {
    /// Instance the topic lives on.
    pub instance_id: i64,
    /// Topic name.
    pub name: String,
    /// Partition count.
    pub partitions: i64,
    /// Replication factor.
    pub replication_factor: i64,
    /// Per-topic overrides; only the keys set here are tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TopicConfigState>,
}

/// The `config` block of a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TopicConfigState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_retention_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_bytes: Option<i64>,
}

impl From<&TopicConfig> for TopicConfigState {
    fn from(config: &TopicConfig) -> Self {
        Self {
            cleanup_policy: config.cleanup_policy.clone(),
            delete_retention_ms: config.delete_retention_ms,
            min_insync_replicas: config.min_insync_replicas,
            retention_bytes: config.retention_bytes,
            retention_ms: config.retention_ms,
            segment_bytes: config.segment_bytes,
        }
    }
}

impl From<&TopicConfigState> for TopicConfig {
    fn from(state: &TopicConfigState) -> Self {
        Self {
            cleanup_policy: state.cleanup_policy.as_ref().map(|p| p.to_lowercase()),
            min_insync_replicas: state.min_insync_replicas,
            retention_bytes: state.retention_bytes,
            retention_ms: state.retention_ms,
            segment_bytes: state.segment_bytes,
            delete_retention_ms: state.delete_retention_ms,
        }
    }
}

impl TopicConfigState {
    /// Keep only the keys `tracked` sets, so broker defaults the user never
    /// configured don't show up as drift.
    fn restricted_to(self, tracked: &TopicConfigState) -> Self {
        fn keep<T>(value: Option<T>, tracked: &Option<impl Sized>) -> Option<T> {
            value.filter(|_| tracked.is_some())
        }
        Self {
            cleanup_policy: keep(self.cleanup_policy, &tracked.cleanup_policy),
            delete_retention_ms: keep(self.delete_retention_ms, &tracked.delete_retention_ms),
            min_insync_replicas: keep(self.min_insync_replicas, &tracked.min_insync_replicas),
            retention_bytes: keep(self.retention_bytes, &tracked.retention_bytes),
            retention_ms: keep(self.retention_ms, &tracked.retention_ms),
            segment_bytes: keep(self.segment_bytes, &tracked.segment_bytes),
        }
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl TopicState {
    fn from_api(instance_id: i64, topic: Topic, tracked: Option<&TopicConfigState>) -> Self {
        let config = TopicConfigState::from(&topic.config);
        let config = tracked.map(|tracked| config.restricted_to(tracked));
        Self {
            instance_id,
            name: topic.name,
            partitions: topic.partitions,
            replication_factor: topic.replicas,
            config,
        }
    }

    fn api_config(&self) -> TopicConfig {
        self.config.as_ref().map(TopicConfig::from).unwrap_or_default()
    }
}

/// Schema of `cloudkarafka_topic`.
pub fn schema() -> Schema {
    let config = Block::new()
        .with_attribute(
            "cleanup_policy",
            Attribute::optional_string()
                .with_constraint(Constraint::one_of(&["delete", "compact"]))
                .with_description("Delete or compact when records hit their retention."),
        )
        .with_attribute(
            "delete_retention_ms",
            Attribute::optional_int64()
                .with_description("How long delete tombstones are kept on compacted topics."),
        )
        .with_attribute(
            "min_insync_replicas",
            Attribute::optional_int64()
                .with_constraint(Constraint::AtLeast(1))
                .with_description("Minimum in-sync replicas for acks=all producers."),
        )
        .with_attribute(
            "retention_bytes",
            Attribute::optional_int64().with_description("Maximum partition size."),
        )
        .with_attribute(
            "retention_ms",
            Attribute::optional_int64().with_description("Maximum record age."),
        )
        .with_attribute(
            "segment_bytes",
            Attribute::optional_int64().with_description("Size of one log segment."),
        );

    Schema::v0()
        .with_description("Manage a topic.")
        .with_attribute(
            "instance_id",
            Attribute::required_int64()
                .with_force_new()
                .with_description("Id of the instance where we want to manage the topic."),
        )
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_force_new()
                .with_description("Name of topic."),
        )
        .with_attribute(
            "partitions",
            Attribute::required_int64()
                .with_constraint(Constraint::AtLeast(1))
                .with_description("Number of partitions for the topic."),
        )
        .with_attribute(
            "replication_factor",
            Attribute::required_int64()
                .with_force_new()
                .with_constraint(Constraint::AtLeast(1))
                .with_description("Replication factor for the topic."),
        )
        .with_block("config", NestedBlock::single(config))
}

/// Create a topic and block until the API reports it ready.
#[instrument(skip(client, planned), fields(instance_id = planned.instance_id, name = %planned.name))]
pub async fn create(client: &Client, planned: TopicState) -> Result<TopicState, ProviderError> {
    let topic = Topic {
        name: planned.name.clone(),
        partitions: planned.partitions,
        replicas: planned.replication_factor,
        status: None,
        config: planned.api_config(),
    };
    let created = client.create_topic(planned.instance_id, &topic).await?;
    Ok(TopicState::from_api(
        planned.instance_id,
        created,
        planned.config.as_ref(),
    ))
}

/// Refresh a topic from the instance's topic listing.
#[instrument(skip(client, current), fields(instance_id = current.instance_id, name = %current.name))]
pub async fn read(client: &Client, current: TopicState) -> Result<TopicState, ProviderError> {
    let topic = client.read_topic(current.instance_id, &current.name).await?;
    Ok(TopicState::from_api(
        current.instance_id,
        topic,
        current.config.as_ref(),
    ))
}

/// Change partitions and config.
#[instrument(skip(client, planned), fields(instance_id = planned.instance_id, name = %planned.name))]
pub async fn update(client: &Client, planned: TopicState) -> Result<TopicState, ProviderError> {
    let request = UpdateTopicRequest {
        partitions: planned.partitions,
        config: planned.api_config(),
    };
    client
        .update_topic(planned.instance_id, &planned.name, &request)
        .await?;
    info!("Topic updated");
    read(client, planned).await
}

/// Delete a topic.
#[instrument(skip(client, current), fields(instance_id = current.instance_id, name = %current.name))]
pub async fn delete(client: &Client, current: TopicState) -> Result<(), ProviderError> {
    client
        .delete_topic(current.instance_id, &current.name)
        .await?;
    info!("Topic deleted");
    Ok(())
}

/// Import a topic from `<instance_id>,<name>`, tracking every config key the
/// API reports.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<TopicState, ProviderError> {
    let (instance_id, name) = parse_child_id(TYPE_NAME, id)?;
    let topic = client.read_topic(instance_id, name).await?;
    let config = Some(TopicConfigState::from(&topic.config)).filter(|c| !c.is_empty());
    let mut state = TopicState::from_api(instance_id, topic, None);
    state.config = config;
    Ok(state)
}
