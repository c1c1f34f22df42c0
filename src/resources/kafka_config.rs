//! `cloudkarafka_kafkaconfig`: broker-level Kafka settings of an instance.
//!
//! There is no remote delete. Deleting the resource only drops it from the
//! host's state; the broker keeps whatever was last written.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::parse_id;
use crate::api::kafka_config::UNSET;
use crate::api::{Client, KafkaConfig};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Constraint, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "cloudkarafka_kafkaconfig";

/// Host-side state of the broker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaConfigState {
    /// Instance to configure.
    pub instance_id: i64,
    /// Let brokers create topics on first use.
    #[serde(default)]
    pub auto_create_topics_enable: bool,
    /// `min.insync.replicas`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_insync_replicas: Option<i64>,
    /// `log.retention.bytes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retention_bytes: Option<i64>,
    /// `log.retention.ms`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_retention_ms: Option<i64>,
    /// `log.segment.bytes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_segment_bytes: Option<i64>,
    /// `num.network.threads`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_network_threads: Option<i64>,
    /// `num.io.threads`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_io_threads: Option<i64>,
    /// `message.max.bytes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_max_bytes: Option<i64>,
}

fn set(value: i64) -> Option<i64> {
    Some(value).filter(|v| *v != UNSET)
}

impl KafkaConfigState {
    fn to_api(&self) -> KafkaConfig {
        KafkaConfig {
            auto_create_topics_enable: self.auto_create_topics_enable,
            min_insync_replicas: self.min_insync_replicas.unwrap_or(UNSET),
            log_retention_bytes: self.log_retention_bytes.unwrap_or(UNSET),
            log_retention_ms: self.log_retention_ms.unwrap_or(UNSET),
            log_segment_bytes: self.log_segment_bytes.unwrap_or(UNSET),
            num_network_threads: self.num_network_threads.unwrap_or(UNSET),
            num_io_threads: self.num_io_threads.unwrap_or(UNSET),
            message_max_bytes: self.message_max_bytes.unwrap_or(UNSET),
        }
    }

    fn from_api(instance_id: i64, config: KafkaConfig) -> Self {
        Self {
            instance_id,
            auto_create_topics_enable: config.auto_create_topics_enable,
            min_insync_replicas: set(config.min_insync_replicas),
            log_retention_bytes: set(config.log_retention_bytes),
            log_retention_ms: set(config.log_retention_ms),
            log_segment_bytes: set(config.log_segment_bytes),
            num_network_threads: set(config.num_network_threads),
            num_io_threads: set(config.num_io_threads),
            message_max_bytes: set(config.message_max_bytes),
        }
    }
}

fn optional_computed_int64(description: &str) -> Attribute {
    Attribute::new(AttributeType::Int64, AttributeFlags::optional_computed())
        .with_description(description)
}

/// Schema of `cloudkarafka_kafkaconfig`.
///
/// Integer settings are optional and computed: broker defaults reported by the
/// API fill them in when the configuration leaves them out. `-1` is how the API
/// says "not set", so Kafka's own `-1` (unlimited) cannot be written and is
/// rejected.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manage the Kafka configuration.")
        .with_attribute(
            "instance_id",
            Attribute::required_int64()
                .with_force_new()
                .with_description("Id of the instance to configure."),
        )
        .with_attribute(
            "auto_create_topics_enable",
            Attribute::optional_bool()
                .with_default(serde_json::Value::Bool(false))
                .with_description("Enable auto creation of topic on the server."),
        )
        .with_attribute(
            "min_insync_replicas",
            optional_computed_int64("Minimum insync replicas available with ACKing.")
                .with_constraint(Constraint::AtLeast(1)),
        )
        .with_attribute(
            "log_retention_bytes",
            optional_computed_int64("The maximum size of the log before deleting it.")
                .with_constraint(Constraint::AtLeast(0)),
        )
        .with_attribute(
            "log_retention_ms",
            optional_computed_int64("The number of milliseconds to keep a log file before deleting it.")
                .with_constraint(Constraint::AtLeast(0)),
        )
        .with_attribute(
            "log_segment_bytes",
            optional_computed_int64("The maximum size of a single log file.")
                .with_constraint(Constraint::AtLeast(1)),
        )
        .with_attribute(
            "num_io_threads",
            optional_computed_int64("Threads the broker uses for processing requests.")
                .with_constraint(Constraint::AtLeast(1)),
        )
        .with_attribute(
            "num_network_threads",
            optional_computed_int64("Threads the broker uses for network requests.")
                .with_constraint(Constraint::AtLeast(1)),
        )
        .with_attribute(
            "message_max_bytes",
            optional_computed_int64("Max size of message.")
                .with_constraint(Constraint::AtLeast(1)),
        )
}

/// Write the configuration, then read it back.
#[instrument(skip(client, planned), fields(instance_id = planned.instance_id))]
pub async fn create(client: &Client, planned: KafkaConfigState) -> Result<KafkaConfigState, ProviderError> {
    client
        .write_kafka_config(planned.instance_id, &planned.to_api())
        .await?;
    read(client, planned).await
}

/// Read the configuration of the instance.
#[instrument(skip(client, current), fields(instance_id = current.instance_id))]
pub async fn read(client: &Client, current: KafkaConfigState) -> Result<KafkaConfigState, ProviderError> {
    let config = client.read_kafka_config(current.instance_id).await?;
    Ok(KafkaConfigState::from_api(current.instance_id, config))
}

/// Rewrite the configuration.
pub async fn update(client: &Client, planned: KafkaConfigState) -> Result<KafkaConfigState, ProviderError> {
    create(client, planned).await
}

/// Forget the configuration. Nothing is sent to the API.
#[instrument(skip(current), fields(instance_id = current.instance_id))]
pub fn delete(current: KafkaConfigState) {
    info!(
        instance_id = current.instance_id,
        "Kafka config removed from state; broker settings are left unchanged"
    );
}

/// Import the configuration of instance `id`.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<KafkaConfigState, ProviderError> {
    let instance_id = parse_id(TYPE_NAME, id)?;
    let config = client.read_kafka_config(instance_id).await?;
    Ok(KafkaConfigState::from_api(instance_id, config))
}
