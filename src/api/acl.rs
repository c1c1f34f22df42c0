//! ACL rule endpoints: `/api/instances/{id}/acls`.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Client;
use crate::error::ProviderError;

/// One ACL rule.
///
/// The API has no update for rules; changing any field means deleting the
/// rule and creating a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRule {
    /// Server-assigned id, 0 before creation.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    /// User the rule applies to.
    #[serde(rename = "name", default)]
    pub user: String,
    /// Operation, e.g. `read` or `describeconfigs`.
    pub operation: String,
    /// `cluster`, `topic` or `group`.
    pub resource: String,
    /// Name or prefix of the resource.
    pub resource_pattern: String,
    /// `literal` or `prefixed`.
    pub resource_pattern_type: String,
    /// Creation timestamp, as reported by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

impl AclRule {
    /// Whether two rules grant the same thing, ignoring id and timestamps.
    pub fn same(&self, other: &AclRule) -> bool {
        self.user == other.user
            && self.operation == other.operation
            && self.resource == other.resource
            && self.resource_pattern == other.resource_pattern
            && self.resource_pattern_type == other.resource_pattern_type
    }
}

/// Outcome of deleting a batch of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Rules removed.
    pub deleted: Vec<i64>,
    /// Rules that could not be removed, with the reason.
    pub failed: Vec<(i64, String)>,
}

impl DeleteReport {
    /// Total number of rules attempted.
    pub fn total(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    /// `Ok` when every rule was deleted, else a [`ProviderError::PartialFailure`].
    pub fn into_result(self) -> Result<(), ProviderError> {
        if self.failed.is_empty() {
            return Ok(());
        }
        Err(ProviderError::PartialFailure {
            failed: self.failed.len(),
            total: self.total(),
            messages: self
                .failed
                .into_iter()
                .map(|(id, message)| format!("rule {}: {}", id, message))
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateAclRequest<'a> {
    user: &'a str,
    rules: [&'a AclRule; 1],
}

fn acls_path(instance_id: i64) -> String {
    format!("/api/instances/{}/acls", instance_id)
}

impl Client {
    /// List every ACL rule of an instance.
    pub async fn list_acl_rules(&self, instance_id: i64) -> Result<Vec<AclRule>, ProviderError> {
        self.get_json(&acls_path(instance_id)).await
    }

    /// Find one rule by id.
    pub async fn read_acl_rule(&self, instance_id: i64, id: i64) -> Result<AclRule, ProviderError> {
        self.list_acl_rules(instance_id)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ProviderError::NotFound(format!("No rule found with id={}", id)))
    }

    /// Every rule that belongs to `user`.
    pub async fn acl_rules_for_user(
        &self,
        instance_id: i64,
        user: &str,
    ) -> Result<Vec<AclRule>, ProviderError> {
        Ok(self
            .list_acl_rules(instance_id)
            .await?
            .into_iter()
            .filter(|r| r.user == user)
            .collect())
    }

    /// Create a rule for `user` and return the id the server gave it.
    ///
    /// The create call does not return the id, so the rule is looked up in the
    /// listing afterwards. Exactly one listed rule must match.
    pub async fn create_acl_rule(
        &self,
        instance_id: i64,
        user: &str,
        rule: &AclRule,
    ) -> Result<i64, ProviderError> {
        let wanted = AclRule {
            id: 0,
            user: user.to_string(),
            created_at: None,
            ..rule.clone()
        };
        let body = CreateAclRequest {
            user,
            rules: [&wanted],
        };
        self.send_json(
            Method::POST,
            &acls_path(instance_id),
            &body,
            self.expected().child_create,
        )
        .await?;

        let matches: Vec<i64> = self
            .list_acl_rules(instance_id)
            .await?
            .into_iter()
            .filter(|r| r.same(&wanted))
            .map(|r| r.id)
            .collect();
        match matches.as_slice() {
            [id] => {
                info!(instance_id, user, rule_id = id, "ACL rule created");
                Ok(*id)
            },
            [] => Err(ProviderError::Api {
                status: 0,
                message: "failed to create rule".to_string(),
            }),
            ids => Err(ProviderError::Api {
                status: 0,
                message: format!(
                    "ambiguous rule: {} existing rules match ({:?})",
                    ids.len(),
                    ids
                ),
            }),
        }
    }

    /// Delete one rule.
    pub async fn delete_acl_rule(&self, instance_id: i64, id: i64) -> Result<(), ProviderError> {
        self.delete(
            &format!("{}/{}", acls_path(instance_id), id),
            self.expected().child_delete,
        )
        .await
    }

    /// Delete every rule in `ids`, continuing past failures.
    ///
    /// Rules already deleted stay deleted when a later one fails.
    pub async fn delete_acl_rules(&self, instance_id: i64, ids: &[i64]) -> DeleteReport {
        let mut report = DeleteReport::default();
        for &id in ids {
            match self.delete_acl_rule(instance_id, id).await {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    warn!(instance_id, rule_id = id, error = %e, "Failed to delete ACL rule");
                    report.failed.push((id, e.to_string()));
                },
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(pattern_type: &str) -> AclRule {
        AclRule {
            user: "alice".to_string(),
            operation: "read".to_string(),
            resource: "topic".to_string(),
            resource_pattern: "orders".to_string(),
            resource_pattern_type: pattern_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_ignores_id_and_timestamp() {
        let mut listed = rule("literal");
        listed.id = 12;
        listed.created_at = Some("2024-01-01T00:00:00Z".to_string());
        assert!(listed.same(&rule("literal")));
    }

    #[test]
    fn test_same_compares_pattern_type() {
        assert!(!rule("prefixed").same(&rule("literal")));
    }

    #[test]
    fn test_rule_wire_format() {
        let value = serde_json::to_value(rule("literal")).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "alice",
                "operation": "read",
                "resource": "topic",
                "resource_pattern": "orders",
                "resource_pattern_type": "literal"
            })
        );
    }

    #[test]
    fn test_delete_report() {
        let report = DeleteReport {
            deleted: vec![1, 3],
            failed: vec![(2, "API error (500): boom".to_string())],
        };
        assert_eq!(report.total(), 3);
        match report.into_result().unwrap_err() {
            ProviderError::PartialFailure {
                failed,
                total,
                messages,
            } => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
                assert_eq!(messages, vec!["rule 2: API error (500): boom".to_string()]);
            },
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(DeleteReport::default().into_result().is_ok());
    }
}
