//! `cloudkarafka_aclrule`: the ACL rules of one user.
//!
//! Rules have no in-place update. The whole rule list forces replacement, so a
//! change deletes every rule of the resource and creates the new list.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::parse_child_id;
use crate::api::{AclRule, Client};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Constraint, NestedBlock, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "cloudkarafka_aclrule";

/// Operations a rule can grant.
pub const OPERATIONS: &[&str] = &[
    "read",
    "write",
    "create",
    "delete",
    "alter",
    "describe",
    "clusteraction",
    "describeconfigs",
    "alterconfigs",
    "idempotentwrite",
    "createtokens",
    "describetokens",
    "all",
];

/// Resources a rule can apply to.
pub const RESOURCES: &[&str] = &["cluster", "topic", "group"];

/// How a resource pattern matches.
pub const PATTERN_TYPES: &[&str] = &["literal", "prefixed"];

/// Host-side state of a user's rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclState {
    /// Instance the rules live on.
    pub instance_id: i64,
    /// User the rules apply to.
    pub username: String,
    /// The rules.
    #[serde(default)]
    pub rules: Vec<AclRuleState>,
}

/// One entry of `rules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRuleState {
    /// Server id, known after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Operation, one of [`OPERATIONS`].
    pub operation: String,
    /// Resource kind, one of [`RESOURCES`].
    pub resource: String,
    /// Name or prefix to match.
    pub resource_pattern: String,
    /// One of [`PATTERN_TYPES`].
    pub resource_pattern_type: String,
}

impl AclRuleState {
    fn to_api(&self, user: &str) -> AclRule {
        AclRule {
            id: 0,
            user: user.to_string(),
            operation: self.operation.to_lowercase(),
            resource: self.resource.to_lowercase(),
            resource_pattern: self.resource_pattern.clone(),
            resource_pattern_type: self.resource_pattern_type.to_lowercase(),
            created_at: None,
        }
    }
}

impl From<AclRule> for AclRuleState {
    fn from(rule: AclRule) -> Self {
        Self {
            id: Some(rule.id),
            operation: rule.operation,
            resource: rule.resource,
            resource_pattern: rule.resource_pattern,
            resource_pattern_type: rule.resource_pattern_type,
        }
    }
}

/// Schema of `cloudkarafka_aclrule`.
pub fn schema() -> Schema {
    let rule = Block::new()
        .with_attribute(
            "id",
            Attribute::computed_int64().with_description("Rule ID."),
        )
        .with_attribute(
            "operation",
            Attribute::required_string()
                .with_constraint(Constraint::one_of(OPERATIONS))
                .with_description("Which operation to set the rule on."),
        )
        .with_attribute(
            "resource",
            Attribute::required_string()
                .with_constraint(Constraint::one_of(RESOURCES))
                .with_description(
                    "Which resource to set the rule on, cluster, topic or group are valid values.",
                ),
        )
        .with_attribute(
            "resource_pattern",
            Attribute::required_string().with_description("Which resource to match."),
        )
        .with_attribute(
            "resource_pattern_type",
            Attribute::required_string()
                .with_constraint(Constraint::one_of(PATTERN_TYPES))
                .with_description("How to apply the resource_pattern, literal or prefixed."),
        );

    Schema::v0()
        .with_description("Manage an ACL rule.")
        .with_attribute(
            "instance_id",
            Attribute::required_int64()
                .with_force_new()
                .with_description("Id of the instance where we want to manage the rules."),
        )
        .with_attribute(
            "username",
            Attribute::required_string()
                .with_force_new()
                .with_description("Name of the user to apply the rules on."),
        )
        .with_block(
            "rules",
            NestedBlock::list(rule).with_min_items(1).with_force_new(),
        )
}

async fn refresh(client: &Client, instance_id: i64, username: String) -> Result<AclState, ProviderError> {
    let rules = client.acl_rules_for_user(instance_id, &username).await?;
    Ok(AclState {
        instance_id,
        username,
        rules: rules.into_iter().map(AclRuleState::from).collect(),
    })
}

/// Create every rule in order, then list the user's rules.
///
/// A failing rule stops the loop; rules created before it are kept.
#[instrument(skip(client, planned), fields(instance_id = planned.instance_id, username = %planned.username, rules = planned.rules.len()))]
pub async fn create(client: &Client, planned: AclState) -> Result<AclState, ProviderError> {
    for rule in &planned.rules {
        client
            .create_acl_rule(planned.instance_id, &planned.username, &rule.to_api(&planned.username))
            .await?;
    }
    refresh(client, planned.instance_id, planned.username).await
}

/// List the user's rules.
#[instrument(skip(client, current), fields(instance_id = current.instance_id, username = %current.username))]
pub async fn read(client: &Client, current: AclState) -> Result<AclState, ProviderError> {
    refresh(client, current.instance_id, current.username).await
}

/// Delete every rule with a known id.
///
/// Keeps going after a failed delete and reports all failures at the end;
/// rules already deleted are not restored.
#[instrument(skip(client, current), fields(instance_id = current.instance_id, username = %current.username))]
pub async fn delete(client: &Client, current: AclState) -> Result<(), ProviderError> {
    let ids: Vec<i64> = current.rules.iter().filter_map(|r| r.id).collect();
    let report = client.delete_acl_rules(current.instance_id, &ids).await;
    info!(
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "ACL rules deleted"
    );
    report.into_result()
}

/// Import the rules of a user from `<instance_id>,<username>`.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<AclState, ProviderError> {
    let (instance_id, username) = parse_child_id(TYPE_NAME, id)?;
    let state = refresh(client, instance_id, username.to_string()).await?;
    if state.rules.is_empty() {
        return Err(ProviderError::NotFound(format!(
            "no ACL rules for user {} on instance {}",
            username, instance_id
        )));
    }
    Ok(state)
}
