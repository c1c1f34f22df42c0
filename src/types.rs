//! Plan, import and metadata types exchanged with the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::schema::{AttributeType, Block, Constraint, Schema};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    fn between(path: &str, before: &Value, after: &Value) -> Self {
        match (before.is_null(), after.is_null()) {
            (true, _) => Self::added(path, after.clone()),
            (_, true) => Self::removed(path, before.clone()),
            _ => Self::modified(path, before.clone(), after.clone()),
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Diff `prior` against `proposed` using the attribute flags of `schema`.
    ///
    /// - A null `proposed` plans a destroy; every prior value is removed.
    /// - Without a prior state every configured value is an addition.
    /// - Otherwise attributes and nested blocks are compared one by one.
    ///   Computed-only attributes never count as changes, and computed values
    ///   the configuration leaves unset are carried over from `prior`. Any
    ///   change to a `force_new` attribute or block requires replacement, in
    ///   which case computed values are left for the server to assign.
    ///
    /// Attribute defaults are applied to `proposed` before diffing.
    pub fn from_schema(
        schema: &Schema,
        prior: Option<&Value>,
        proposed: Value,
    ) -> Result<Self, ProviderError> {
        let prior = prior.filter(|p| !p.is_null());

        if proposed.is_null() {
            let changes = prior
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .filter(|(_, v)| !v.is_null())
                        .map(|(k, v)| AttributeChange::removed(k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();
            return Ok(Self::with_changes(Value::Null, changes, false));
        }

        let mut planned = as_object(proposed, "proposed")?;
        apply_defaults(&schema.block, &mut planned);
        canonicalize(&schema.block, &mut planned);

        let Some(prior) = prior else {
            let changes = configurable(&schema.block)
                .filter_map(|name| {
                    planned
                        .get(name)
                        .filter(|v| !v.is_null())
                        .map(|v| AttributeChange::added(name, v.clone()))
                })
                .collect();
            return Ok(Self::with_changes(Value::Object(planned), changes, false));
        };
        let prior = prior
            .as_object()
            .ok_or_else(|| ProviderError::InvalidRequest("prior state is not an object".into()))?;

        let mut changes = Vec::new();
        let mut requires_replace = false;

        for (name, attr) in &schema.block.attributes {
            if attr.flags.is_computed_only() {
                continue;
            }
            let before = prior.get(name).unwrap_or(&Value::Null);
            let after = planned.get(name).unwrap_or(&Value::Null);
            if attr.flags.computed && after.is_null() {
                continue;
            }
            if before == after {
                continue;
            }
            if matches!(attr.attr_type, AttributeType::Set(_)) && same_elements(before, after) {
                planned.insert(name.clone(), before.clone());
                continue;
            }
            changes.push(AttributeChange::between(name, before, after));
            requires_replace |= attr.force_new;
        }

        for (name, nested) in &schema.block.blocks {
            let before = strip_computed(&nested.block, prior.get(name).unwrap_or(&Value::Null));
            let after = strip_computed(&nested.block, planned.get(name).unwrap_or(&Value::Null));
            if before != after {
                changes.push(AttributeChange::between(name, &before, &after));
                requires_replace |= nested.force_new;
            } else if let Some(value) = prior.get(name) {
                planned.insert(name.clone(), value.clone());
            }
        }

        if !requires_replace {
            for (name, attr) in &schema.block.attributes {
                let unset = planned.get(name).map_or(true, Value::is_null);
                if attr.flags.computed && unset {
                    if let Some(value) = prior.get(name) {
                        planned.insert(name.clone(), value.clone());
                    }
                }
            }
        }

        Ok(Self::with_changes(
            Value::Object(planned),
            changes,
            requires_replace,
        ))
    }
}

fn as_object(value: Value, what: &str) -> Result<Map<String, Value>, ProviderError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::InvalidRequest(format!(
            "{} state is not an object: {}",
            what, other
        ))),
    }
}

fn configurable(block: &Block) -> impl Iterator<Item = &str> {
    block
        .attributes
        .iter()
        .filter(|(_, a)| !a.flags.is_computed_only())
        .map(|(k, _)| k.as_str())
        .chain(block.blocks.keys().map(String::as_str))
}

fn apply_defaults(block: &Block, fields: &mut Map<String, Value>) {
    for (name, attr) in &block.attributes {
        if let Some(default) = &attr.default {
            let unset = fields.get(name).map_or(true, Value::is_null);
            if unset {
                fields.insert(name.clone(), default.clone());
            }
        }
    }
}

/// Rewrite `one_of` values to their listed spelling, matching what the API stores.
fn canonicalize(block: &Block, fields: &mut Map<String, Value>) {
    for (name, attr) in &block.attributes {
        let Some(Value::String(value)) = fields.get_mut(name) else {
            continue;
        };
        for constraint in &attr.constraints {
            if let Constraint::OneOf(allowed) = constraint {
                let listed = allowed
                    .iter()
                    .find(|a| a.eq_ignore_ascii_case(value.as_str()))
                    .cloned();
                if let Some(listed) = listed {
                    *value = listed;
                }
            }
        }
    }
    for (name, nested) in &block.blocks {
        match fields.get_mut(name) {
            Some(Value::Object(inner)) => canonicalize(&nested.block, inner),
            Some(Value::Array(items)) => {
                for item in items.iter_mut() {
                    if let Value::Object(inner) = item {
                        canonicalize(&nested.block, inner);
                    }
                }
            },
            _ => {},
        }
    }
}

/// Set equality: same elements regardless of order.
fn same_elements(a: &Value, b: &Value) -> bool {
    let (Some(a), Some(b)) = (a.as_array(), b.as_array()) else {
        return false;
    };
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<String> = a.iter().map(Value::to_string).collect();
    let mut b: Vec<String> = b.iter().map(Value::to_string).collect();
    a.sort();
    b.sort();
    a == b
}

/// Drop computed-only attributes so server-assigned values don't show up as
/// differences.
fn strip_computed(block: &Block, value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(k, _)| {
                    block
                        .attributes
                        .get(k.as_str())
                        .map_or(true, |a| !a.flags.is_computed_only())
                })
                .map(|(k, v)| match block.blocks.get(k.as_str()) {
                    Some(nested) => (k.clone(), strip_computed(&nested.block, v)),
                    None => (k.clone(), v.clone()),
                })
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| strip_computed(block, v)).collect())
        },
        other => other.clone(),
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Provider name.
    pub name: String,
    /// Provider version.
    pub version: String,
    /// List of resource type names.
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, NestedBlock};
    use serde_json::json;

    fn topic_schema() -> Schema {
        Schema::v0()
            .with_attribute("instance_id", Attribute::required_int64().with_force_new())
            .with_attribute("name", Attribute::required_string().with_force_new())
            .with_attribute("partitions", Attribute::required_int64())
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("cleanup", Attribute::optional_string().with_default(json!("delete")))
    }

    fn acl_schema() -> Schema {
        Schema::v0()
            .with_attribute("username", Attribute::required_string().with_force_new())
            .with_block(
                "rules",
                NestedBlock::list(
                    Block::new()
                        .with_attribute("id", Attribute::computed_int64())
                        .with_attribute("operation", Attribute::required_string()),
                )
                .with_force_new(),
            )
    }

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("test"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("test")));

        let removed = AttributeChange::removed("name", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("count", json!(1), json!(2));
        assert_eq!(modified.before, Some(json!(1)));
        assert_eq!(modified.after, Some(json!(2)));
    }

    #[test]
    fn test_plan_create_applies_defaults() {
        let plan = PlanResult::from_schema(
            &topic_schema(),
            None,
            json!({"instance_id": 1, "name": "orders", "partitions": 3}),
        )
        .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["cleanup"], "delete");
        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["cleanup", "instance_id", "name", "partitions"]);
    }

    #[test]
    fn test_plan_in_place_carries_computed() {
        let prior = json!({
            "instance_id": 1, "name": "orders", "partitions": 3,
            "id": "1,orders", "cleanup": "delete"
        });
        let plan = PlanResult::from_schema(
            &topic_schema(),
            Some(&prior),
            json!({"instance_id": 1, "name": "orders", "partitions": 6}),
        )
        .unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].path, "partitions");
        assert_eq!(plan.planned_state["id"], "1,orders");
    }

    #[test]
    fn test_plan_force_new_requires_replace() {
        let prior = json!({
            "instance_id": 1, "name": "orders", "partitions": 3,
            "id": "1,orders", "cleanup": "delete"
        });
        let plan = PlanResult::from_schema(
            &topic_schema(),
            Some(&prior),
            json!({"instance_id": 1, "name": "payments", "partitions": 3}),
        )
        .unwrap();
        assert!(plan.requires_replace);
        assert!(plan.planned_state.get("id").is_none());
    }

    #[test]
    fn test_plan_no_change() {
        let prior = json!({
            "instance_id": 1, "name": "orders", "partitions": 3,
            "id": "1,orders", "cleanup": "delete"
        });
        let plan = PlanResult::from_schema(
            &topic_schema(),
            Some(&prior),
            json!({"instance_id": 1, "name": "orders", "partitions": 3}),
        )
        .unwrap();
        assert!(plan.changes.is_empty());
        assert_eq!(plan.planned_state, prior);
    }

    #[test]
    fn test_plan_nested_block_ignores_server_ids() {
        let prior = json!({"username": "alice", "rules": [{"id": 12, "operation": "read"}]});
        let plan = PlanResult::from_schema(
            &acl_schema(),
            Some(&prior),
            json!({"username": "alice", "rules": [{"operation": "read"}]}),
        )
        .unwrap();
        assert!(plan.changes.is_empty());
        assert_eq!(plan.planned_state["rules"][0]["id"], 12);

        let plan = PlanResult::from_schema(
            &acl_schema(),
            Some(&prior),
            json!({"username": "alice", "rules": [{"operation": "write"}]}),
        )
        .unwrap();
        assert!(plan.requires_replace);
    }

    #[test]
    fn test_plan_reordered_tags_are_not_a_change() {
        let schema = crate::resources::instance::schema();
        let prior = json!({
            "id": 7, "name": "prod", "plan": "bat-1",
            "region": "amazon-web-services::us-east-1", "tags": ["b", "a"]
        });
        let plan = PlanResult::from_schema(
            &schema,
            Some(&prior),
            json!({
                "name": "prod", "plan": "bat-1",
                "region": "amazon-web-services::us-east-1", "tags": ["a", "b"]
            }),
        )
        .unwrap();
        assert!(plan.changes.iter().all(|c| c.path != "tags"), "{:?}", plan.changes);
        assert_eq!(plan.planned_state["tags"], json!(["b", "a"]));

        let plan = PlanResult::from_schema(
            &schema,
            Some(&prior),
            json!({
                "name": "prod", "plan": "bat-1",
                "region": "amazon-web-services::us-east-1", "tags": ["a", "c"]
            }),
        )
        .unwrap();
        assert!(plan.changes.iter().any(|c| c.path == "tags"));
    }

    #[test]
    fn test_plan_one_of_case_matches_stored_value() {
        let prior = json!({
            "instance_id": 1, "username": "alice",
            "rules": [{"id": 12, "operation": "read", "resource": "topic",
                       "resource_pattern": "orders", "resource_pattern_type": "literal"}]
        });
        let plan = PlanResult::from_schema(
            &crate::resources::acl::schema(),
            Some(&prior),
            json!({
                "instance_id": 1, "username": "alice",
                "rules": [{"operation": "Read", "resource": "Topic",
                           "resource_pattern": "orders", "resource_pattern_type": "LITERAL"}]
            }),
        )
        .unwrap();
        assert!(plan.changes.is_empty(), "{:?}", plan.changes);
        assert!(!plan.requires_replace);

        let plan = PlanResult::from_schema(
            &crate::resources::user::schema(),
            None,
            json!({"instance_id": 1, "name": "alice", "type": "SASL"}),
        )
        .unwrap();
        assert_eq!(plan.planned_state["type"], "sasl");
    }

    #[test]
    fn test_plan_destroy() {
        let prior = json!({"instance_id": 1, "name": "orders", "id": null});
        let plan = PlanResult::from_schema(&topic_schema(), Some(&prior), Value::Null).unwrap();
        assert!(plan.planned_state.is_null());
        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_plan_rejects_non_object() {
        let err = PlanResult::from_schema(&topic_schema(), None, json!([1, 2])).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("cloudkarafka_instance", json!({"id": 42}));
        assert_eq!(imported.resource_type, "cloudkarafka_instance");
        assert_eq!(imported.state["id"], 42);
    }
}
