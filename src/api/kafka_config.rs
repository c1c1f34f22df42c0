//! Broker configuration: `/api/instances/{id}/config/kafka`.
//!
//! Reads return a list of `{"name": ..., "value": ...}` entries; writes take a
//! Java properties document with one `key=value` line per set field.

use std::fmt::Write as _;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Client;
use crate::error::ProviderError;

/// Value of an integer field that is not set.
pub const UNSET: i64 = -1;

/// Broker-level Kafka settings.
///
/// Integer fields use [`UNSET`] for "leave the broker default alone";
/// `auto_create_topics_enable` is only written when true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// `auto.create.topics.enable`
    pub auto_create_topics_enable: bool,
    /// `min.insync.replicas`
    pub min_insync_replicas: i64,
    /// `log.retention.bytes`
    pub log_retention_bytes: i64,
    /// `log.retention.ms`
    pub log_retention_ms: i64,
    /// `log.segment.bytes`
    pub log_segment_bytes: i64,
    /// `num.network.threads`
    pub num_network_threads: i64,
    /// `num.io.threads`
    pub num_io_threads: i64,
    /// `message.max.bytes`
    pub message_max_bytes: i64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            auto_create_topics_enable: false,
            min_insync_replicas: UNSET,
            log_retention_bytes: UNSET,
            log_retention_ms: UNSET,
            log_segment_bytes: UNSET,
            num_network_threads: UNSET,
            num_io_threads: UNSET,
            message_max_bytes: UNSET,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Entry {
    name: String,
    value: serde_json::Value,
}

impl KafkaConfig {
    fn integer_fields(&self) -> [(&'static str, i64); 7] {
        [
            ("min.insync.replicas", self.min_insync_replicas),
            ("log.retention.bytes", self.log_retention_bytes),
            ("log.retention.ms", self.log_retention_ms),
            ("log.segment.bytes", self.log_segment_bytes),
            ("num.network.threads", self.num_network_threads),
            ("num.io.threads", self.num_io_threads),
            ("message.max.bytes", self.message_max_bytes),
        ]
    }

    fn integer_field_mut(&mut self, key: &str) -> Option<&mut i64> {
        match key {
            "min.insync.replicas" => Some(&mut self.min_insync_replicas),
            "log.retention.bytes" => Some(&mut self.log_retention_bytes),
            "log.retention.ms" => Some(&mut self.log_retention_ms),
            "log.segment.bytes" => Some(&mut self.log_segment_bytes),
            "num.network.threads" => Some(&mut self.num_network_threads),
            "num.io.threads" => Some(&mut self.num_io_threads),
            "message.max.bytes" => Some(&mut self.message_max_bytes),
            _ => None,
        }
    }

    /// Render as a properties document, skipping unset fields.
    pub fn as_properties(&self) -> String {
        let mut out = String::new();
        if self.auto_create_topics_enable {
            out.push_str("auto.create.topics.enable=true\n");
        }
        for (key, value) in self.integer_fields() {
            if value != UNSET {
                let _ = writeln!(out, "{}={}", key, value);
            }
        }
        out
    }

    /// Parse the structured read form.
    ///
    /// Keys missing from `body` stay unset. Unknown keys are rejected.
    pub fn from_entries(body: &[u8]) -> Result<Self, ProviderError> {
        let entries: Vec<Entry> = serde_json::from_slice(body)?;
        let mut config = Self::default();
        for entry in entries {
            if entry.name == "auto.create.topics.enable" {
                config.auto_create_topics_enable = parse_bool(&entry)?;
                continue;
            }
            let value = parse_int(&entry)?;
            match config.integer_field_mut(&entry.name) {
                Some(field) => *field = value,
                None => {
                    return Err(ProviderError::InvalidRequest(format!(
                        "Unhandled config value {}",
                        entry.name
                    )))
                },
            }
        }
        Ok(config)
    }
}

fn type_error(entry: &Entry, expected: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!(
        "config value {} is not {}: {}",
        entry.name, expected, entry.value
    ))
}

fn parse_bool(entry: &Entry) -> Result<bool, ProviderError> {
    match &entry.value {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::String(s) => s.parse().map_err(|_| type_error(entry, "a boolean")),
        _ => Err(type_error(entry, "a boolean")),
    }
}

fn parse_int(entry: &Entry) -> Result<i64, ProviderError> {
    match &entry.value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| type_error(entry, "an integer")),
        serde_json::Value::String(s) => s.parse().map_err(|_| type_error(entry, "an integer")),
        _ => Err(type_error(entry, "an integer")),
    }
}

fn config_path(instance_id: i64) -> String {
    format!("/api/instances/{}/config/kafka", instance_id)
}

impl Client {
    /// Fetch the broker configuration of an instance.
    pub async fn read_kafka_config(&self, instance_id: i64) -> Result<KafkaConfig, ProviderError> {
        let response = self
            .request(Method::GET, &config_path(instance_id), None)
            .await?
            .expect(self.expected().read)?;
        KafkaConfig::from_entries(&response.body)
    }

    /// Replace the broker configuration of an instance.
    pub async fn write_kafka_config(
        &self,
        instance_id: i64,
        config: &KafkaConfig,
    ) -> Result<(), ProviderError> {
        self.send_text(
            Method::POST,
            &config_path(instance_id),
            config.as_properties(),
            self.expected().config_write,
        )
        .await?;
        info!(instance_id, "Kafka config written");
        Ok(())
    }
}
