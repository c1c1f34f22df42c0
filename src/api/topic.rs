//! Topic endpoints: `/api/instances/{id}/topics`.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::{child_path, Client};
use crate::error::ProviderError;
use crate::poll::Poller;

/// Status value of a topic that is fully created.
pub const TOPIC_READY: &str = "ready";

/// Per-topic overrides of broker defaults, keyed by their Kafka names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    /// `delete` or `compact`.
    #[serde(
        rename = "cleanup.policy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cleanup_policy: Option<String>,
    /// Minimum in-sync replicas for acks=all producers.
    #[serde(
        rename = "min.insync.replicas",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_insync_replicas: Option<i64>,
    /// Maximum partition size before old segments are dropped.
    #[serde(
        rename = "retention.bytes",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub retention_bytes: Option<i64>,
    /// Maximum age of a record.
    #[serde(
        rename = "retention.ms",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub retention_ms: Option<i64>,
    /// Size of a single log segment file.
    #[serde(
        rename = "segment.bytes",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub segment_bytes: Option<i64>,
    /// How long delete tombstones are retained on compacted topics.
    #[serde(
        rename = "delete.retention.ms",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub delete_retention_ms: Option<i64>,
}

impl TopicConfig {
    /// True when no override is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A topic as listed by the API, and the body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic name; the lookup key.
    pub name: String,
    /// Partition count.
    pub partitions: i64,
    /// Replication factor.
    pub replicas: i64,
    /// Creation status, `ready` once usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Config overrides.
    #[serde(default, skip_serializing_if = "TopicConfig::is_empty")]
    pub config: TopicConfig,
}

impl Topic {
    /// Whether the API reports the topic as created.
    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some(TOPIC_READY)
    }
}

/// Body of `PUT /api/instances/{id}/topics/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTopicRequest {
    /// New partition count.
    pub partitions: i64,
    /// Replacement config overrides.
    #[serde(skip_serializing_if = "TopicConfig::is_empty")]
    pub config: TopicConfig,
}

/// Accept integers, integral floats and numeric strings; the API is not
/// consistent about which it returns.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {}", n))),
        Some(serde_json::Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected integer, got \"{}\"", s))),
        Some(other) => Err(D::Error::custom(format!("expected integer, got {}", other))),
    }
}

fn topics_path(instance_id: i64) -> String {
    format!("/api/instances/{}/topics", instance_id)
}

impl Client {
    /// List every topic of an instance.
    pub async fn list_topics(&self, instance_id: i64) -> Result<Vec<Topic>, ProviderError> {
        self.get_json(&topics_path(instance_id)).await
    }

    /// Find one topic by name.
    pub async fn read_topic(&self, instance_id: i64, name: &str) -> Result<Topic, ProviderError> {
        self.list_topics(instance_id)
            .await?
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ProviderError::NotFound(format!("topic {} not found", name)))
    }

    /// Create a topic and wait until the API reports it ready.
    ///
    /// Returns the topic as listed after creation.
    pub async fn create_topic(&self, instance_id: i64, topic: &Topic) -> Result<Topic, ProviderError> {
        let body = Topic {
            status: None,
            ..topic.clone()
        };
        self.send_json(
            Method::POST,
            &topics_path(instance_id),
            &body,
            self.expected().child_create,
        )
        .await?;
        info!(instance_id, topic = %topic.name, "Topic accepted, waiting for it to become ready");

        self.wait_until_topic_ready(instance_id, &topic.name).await?;
        self.read_topic(instance_id, &topic.name).await
    }

    /// Change partitions and config of an existing topic.
    pub async fn update_topic(
        &self,
        instance_id: i64,
        name: &str,
        request: &UpdateTopicRequest,
    ) -> Result<(), ProviderError> {
        self.send_json(
            Method::PUT,
            &child_path(&topics_path(instance_id), name)?,
            request,
            self.expected().topic_update,
        )
        .await?;
        Ok(())
    }

    /// Delete a topic.
    pub async fn delete_topic(&self, instance_id: i64, name: &str) -> Result<(), ProviderError> {
        self.delete(
            &child_path(&topics_path(instance_id), name)?,
            self.expected().child_delete,
        )
        .await
    }

    /// Poll the topic listing until `name` reports `ready`.
    ///
    /// Gives up after the configured number of unsuccessful checks.
    pub async fn wait_until_topic_ready(
        &self,
        instance_id: i64,
        name: &str,
    ) -> Result<(), ProviderError> {
        let poll = self.poll_config();
        let poller = Poller::bounded(poll.topic_interval, poll.topic_max_attempts);
        let attempts = poller
            .wait_until(
                || async move {
                    self.read_topic(instance_id, name)
                        .await
                        .map(|t| t.is_ready())
                },
                |attempts| {
                    ProviderError::ReadinessTimeout(format!(
                        "Something appears to be failing waiting on topic {} to be created \
                         ({} checks), please contact support",
                        name, attempts
                    ))
                },
            )
            .await?;
        info!(instance_id, topic = %name, attempts, "Topic ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_uses_kafka_keys() {
        let config = TopicConfig {
            cleanup_policy: Some("compact".to_string()),
            retention_ms: Some(86_400_000),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"cleanup.policy": "compact", "retention.ms": 86400000})
        );
    }

    #[test]
    fn test_config_accepts_numbers_floats_and_strings() {
        let config: TopicConfig = serde_json::from_value(json!({
            "retention.bytes": 1048576,
            "retention.ms": 604800000.0,
            "segment.bytes": "1073741824",
            "unclean.leader.election.enable": false
        }))
        .unwrap();
        assert_eq!(config.retention_bytes, Some(1_048_576));
        assert_eq!(config.retention_ms, Some(604_800_000));
        assert_eq!(config.segment_bytes, Some(1_073_741_824));
        assert_eq!(config.min_insync_replicas, None);
    }

    #[test]
    fn test_config_rejects_fractional_values() {
        let result: Result<TopicConfig, _> =
            serde_json::from_value(json!({"retention.ms": 1.5}));
        assert!(result.is_err());
    }

    #[test]
    fn test_topic_body_skips_empty_config_and_status() {
        let topic = Topic {
            name: "orders".to_string(),
            partitions: 3,
            replicas: 2,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&topic).unwrap(),
            json!({"name": "orders", "partitions": 3, "replicas": 2})
        );
    }

    #[test]
    fn test_topic_ready() {
        let topic: Topic = serde_json::from_value(json!({
            "name": "orders", "partitions": 3, "replicas": 2, "status": "ready"
        }))
        .unwrap();
        assert!(topic.is_ready());

        let topic: Topic = serde_json::from_value(json!({
            "name": "orders", "partitions": 3, "replicas": 2, "status": "creating"
        }))
        .unwrap();
        assert!(!topic.is_ready());
    }
}
