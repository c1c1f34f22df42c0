//! Resource reconcilers.
//!
//! One module per resource type. Each exposes the resource's [`Schema`], a typed
//! state model, and `create`/`read`/`update`/`delete`/`import` functions that
//! drive the [`crate::api::Client`]. States are never cached: every call
//! re-fetches from the API.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::Schema;

pub mod acl;
pub mod instance;
pub mod kafka_config;
pub mod topic;
pub mod user;
pub mod vpc;

/// Every resource type name with its schema.
pub fn schemas() -> Vec<(&'static str, Schema)> {
    vec![
        (instance::TYPE_NAME, instance::schema()),
        (topic::TYPE_NAME, topic::schema()),
        (user::TYPE_NAME, user::schema()),
        (acl::TYPE_NAME, acl::schema()),
        (kafka_config::TYPE_NAME, kafka_config::schema()),
        (vpc::TYPE_NAME, vpc::schema()),
    ]
}

/// Decode a host state into a resource model.
pub fn decode<T: DeserializeOwned>(resource_type: &str, state: Value) -> Result<T, ProviderError> {
    serde_json::from_value(state).map_err(|e| {
        ProviderError::InvalidRequest(format!("invalid {} state: {}", resource_type, e))
    })
}

/// Encode a resource model as a host state.
pub fn encode<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// Server id of a resource that must already exist.
pub(crate) fn require_id(resource_type: &str, id: Option<i64>) -> Result<i64, ProviderError> {
    id.ok_or_else(|| ProviderError::InvalidRequest(format!("{} state has no id", resource_type)))
}

/// Parse a numeric import id.
pub(crate) fn parse_id(resource_type: &str, id: &str) -> Result<i64, ProviderError> {
    id.trim().parse().map_err(|_| {
        ProviderError::InvalidRequest(format!(
            "invalid {} import id {:?}: expected a numeric id",
            resource_type, id
        ))
    })
}

/// Parse an `<instance_id>,<name>` import id.
pub(crate) fn parse_child_id<'a>(
    resource_type: &str,
    id: &'a str,
) -> Result<(i64, &'a str), ProviderError> {
    let invalid = || {
        ProviderError::InvalidRequest(format!(
            "invalid {} import id {:?}: expected <instance_id>,<name>",
            resource_type, id
        ))
    };
    let (instance_id, name) = id.split_once(',').ok_or_else(invalid)?;
    let instance_id = instance_id.trim().parse().map_err(|_| invalid())?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    Ok((instance_id, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        let names: Vec<_> = schemas().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "cloudkarafka_instance",
                "cloudkarafka_topic",
                "cloudkarafka_user",
                "cloudkarafka_aclrule",
                "cloudkarafka_kafkaconfig",
                "cloudkarafka_vpc",
            ]
        );
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("cloudkarafka_instance", " 42 ").unwrap(), 42);
        assert!(parse_id("cloudkarafka_instance", "abc").is_err());
    }

    #[test]
    fn test_parse_child_id() {
        assert_eq!(
            parse_child_id("cloudkarafka_topic", "42,orders").unwrap(),
            (42, "orders")
        );
        assert!(parse_child_id("cloudkarafka_topic", "42").is_err());
        assert!(parse_child_id("cloudkarafka_topic", "x,orders").is_err());
        assert!(parse_child_id("cloudkarafka_topic", "42,").is_err());
    }

    #[test]
    fn test_decode_reports_resource_type() {
        let err = decode::<instance::InstanceState>("cloudkarafka_instance", Value::Null)
            .unwrap_err();
        assert!(err.to_string().contains("invalid cloudkarafka_instance state"));
    }
}
