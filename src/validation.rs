//! Schema validation helpers.
//!
//! Checks a resource configuration (`serde_json::Value`) against its [`Schema`]
//! before anything is sent to the API: presence of required attributes, value
//! types, nested block cardinality and per-attribute [`Constraint`]s.
//!
//! # Example
//!
//! ```
//! use cloudkarafka_provider::schema::{Attribute, Constraint, Schema};
//! use cloudkarafka_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "partitions",
//!         Attribute::required_int64().with_constraint(Constraint::AtLeast(1)),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"name": "orders", "partitions": 3}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "orders", "partitions": 0}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("partitions".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Constraint, Diagnostic, DiagnosticSeverity,
    NestedBlock, Schema,
};
use ipnet::IpNet;
use serde_json::Value;

/// Region prefixes accepted by the customer API.
const REGION_CLOUDS: [&str; 3] = [
    "amazon-web-services",
    "azure-arm",
    "google-compute-engine",
];

/// Check `value` against `schema` and return every problem found.
///
/// Absent and `null` are the same thing. Computed-only attributes are never
/// checked, since the API owns them. Constraints run only on values whose type
/// already matched, so one bad value yields one diagnostic.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// [`validate`], as a `Result`.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// True when [`validate`] finds nothing.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested_block, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Required attribute '{}' is not set", path))
                        .with_detail("Set this attribute in the resource configuration.")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            // Constraints only make sense on well-typed values.
            if diagnostics.len() == before {
                for constraint in &attr.constraints {
                    if let Some(diag) = check_constraint(constraint, v, path) {
                        diagnostics.push(diag);
                    }
                }
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
    }
}

fn check_constraint(constraint: &Constraint, value: &Value, path: &str) -> Option<Diagnostic> {
    let violation = match constraint {
        Constraint::OneOf(allowed) => {
            let s = value.as_str()?;
            if allowed.iter().any(|a| a.eq_ignore_ascii_case(s)) {
                return None;
            }
            format!("must be one of [{}], got \"{}\"", allowed.join(", "), s)
        },
        Constraint::AtLeast(min) => {
            let n = value.as_i64()?;
            if n >= *min {
                return None;
            }
            format!("must be at least {}, got {}", min, n)
        },
        Constraint::Cidr => {
            let s = value.as_str()?;
            match s.parse::<IpNet>() {
                Ok(_) => return None,
                Err(e) => format!("\"{}\" is not a valid CIDR subnet: {}", s, e),
            }
        },
        Constraint::Region => {
            let s = value.as_str()?;
            if is_region(s) {
                return None;
            }
            format!("\"{}\" must be a valid region identifier", s)
        },
        Constraint::Version => {
            let s = value.as_str()?;
            if is_version(s) {
                return None;
            }
            format!("\"{}\" must be of format X.X.X", s)
        },
    };

    Some(
        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
            .with_detail(violation)
            .with_attribute(path),
    )
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (nested.nesting_mode, value) {
        (_, None | Some(Value::Null)) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        (BlockNestingMode::Single, Some(v)) => {
            validate_block(&nested.block, v, path, diagnostics);
        },
        (BlockNestingMode::List, Some(Value::Array(arr))) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // 0 means unlimited
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        (BlockNestingMode::List, Some(v)) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        },
        _ => false,
    }
}

/// `<cloud>::<region>` where region is lowercase alphanumerics and dashes.
fn is_region(s: &str) -> bool {
    let Some((cloud, region)) = s.split_once("::") else {
        return false;
    };
    REGION_CLOUDS.contains(&cloud)
        && !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_version(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_missing_user_name() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "test"})).is_empty());

        for missing in [json!({}), json!({"name": null})] {
            let diagnostics = validate(&schema, &missing);
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].summary, "Required attribute 'name' is not set");
            assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));
        }

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_server_assigned_id_not_checked() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_int64());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": "not a number"})).is_empty());
    }

    #[test]
    fn test_partitions_must_be_whole() {
        let schema = Schema::v0().with_attribute("partitions", Attribute::required_int64());

        assert!(validate(&schema, &json!({"partitions": 3})).is_empty());
        assert!(validate(&schema, &json!({"partitions": 3.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"partitions": 3.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"partitions": "3"})).len(), 1);
    }

    #[test]
    fn test_tags_set_element_path() {
        let schema = Schema::v0().with_attribute(
            "tags",
            Attribute::new(
                AttributeType::set(AttributeType::String),
                AttributeFlags::optional(),
            ),
        );

        assert!(validate(&schema, &json!({"tags": ["prod", "eu"]})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"tags": ["prod", 1]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tags.1".to_string()));
    }

    #[test]
    fn test_one_of_is_case_insensitive() {
        let schema = Schema::v0().with_attribute(
            "type",
            Attribute::optional_string().with_constraint(Constraint::one_of(&["sasl", "ssl"])),
        );

        assert!(validate(&schema, &json!({"type": "SASL"})).is_empty());
        let diagnostics = validate(&schema, &json!({"type": "kerberos"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("must be one of [sasl, ssl]"));
    }

    #[test]
    fn test_at_least() {
        let schema = Schema::v0().with_attribute(
            "disk_size",
            Attribute::optional_int64().with_constraint(Constraint::AtLeast(128)),
        );

        assert!(validate(&schema, &json!({"disk_size": 128})).is_empty());
        assert_eq!(validate(&schema, &json!({"disk_size": 64})).len(), 1);
    }

    #[test]
    fn test_constraint_skipped_on_type_error() {
        let schema = Schema::v0().with_attribute(
            "partitions",
            Attribute::required_int64().with_constraint(Constraint::AtLeast(1)),
        );

        let diagnostics = validate(&schema, &json!({"partitions": "zero"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_cidr() {
        let schema = Schema::v0().with_attribute(
            "subnet",
            Attribute::required_string().with_constraint(Constraint::Cidr),
        );

        assert!(validate(&schema, &json!({"subnet": "10.56.72.0/24"})).is_empty());
        assert!(validate(&schema, &json!({"subnet": "fd00::/64"})).is_empty());
        assert_eq!(validate(&schema, &json!({"subnet": "10.56.72.0"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"subnet": "10.56.72.0/40"})).len(), 1);
    }

    #[test]
    fn test_region_and_version() {
        assert!(is_region("amazon-web-services::us-east-1"));
        assert!(is_region("google-compute-engine::europe-west1"));
        assert!(!is_region("amazon-web-services::"));
        assert!(!is_region("digital-ocean::nyc1"));
        assert!(!is_region("azure-arm::West-Europe"));

        assert!(is_version("3.7.0"));
        assert!(!is_version("3.7"));
        assert!(!is_version("3.x.0"));
    }

    #[test]
    fn test_topic_config_block() {
        let schema = Schema::v0().with_block(
            "config",
            NestedBlock::single(Block::new().with_attribute(
                "cleanup_policy",
                Attribute::optional_string().with_constraint(Constraint::one_of(&["delete", "compact"])),
            )),
        );

        assert!(validate(&schema, &json!({"config": {"cleanup_policy": "compact"}})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());

        let diagnostics = validate(&schema, &json!({"config": {"cleanup_policy": "keep"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("config.cleanup_policy".to_string())
        );
    }

    #[test]
    fn test_acl_rules_item_bounds() {
        let schema = Schema::v0().with_block(
            "rules",
            NestedBlock::list(
                Block::new().with_attribute("resource_pattern", Attribute::required_string()),
            )
            .with_min_items(1)
            .with_max_items(2),
        );

        assert!(validate(&schema, &json!({"rules": [{"resource_pattern": "orders"}]})).is_empty());

        let diagnostics = validate(&schema, &json!({"rules": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"rules": [
                {"resource_pattern": "a"},
                {"resource_pattern": "b"},
                {"resource_pattern": "c"}
            ]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 2"));

        let diagnostics = validate(&schema, &json!({"rules": [{}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("rules.0.resource_pattern".to_string())
        );

        let diagnostics = validate(&schema, &json!({"rules": "all"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_every_bad_attribute_reported() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("partitions", Attribute::required_int64())
            .with_attribute("enabled", Attribute::optional_bool());

        let diagnostics = validate(
            &schema,
            &json!({"name": 123, "partitions": "three", "enabled": "yes"}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_helpers_and_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "test"})));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &json!({"name": "test"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
        assert!(diagnostics[0].attribute.is_none());
    }
}
