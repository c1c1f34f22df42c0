//! User endpoints: `/api/instances/{id}/users`.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{child_path, Client};
use crate::error::ProviderError;

/// A Kafka user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User name; the lookup key.
    pub name: String,
    /// Authentication type, `sasl` or `ssl`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

fn users_path(instance_id: i64) -> String {
    format!("/api/instances/{}/users", instance_id)
}

impl Client {
    /// List every user of an instance.
    pub async fn list_users(&self, instance_id: i64) -> Result<Vec<User>, ProviderError> {
        self.get_json(&users_path(instance_id)).await
    }

    /// Find one user by name.
    pub async fn read_user(&self, instance_id: i64, name: &str) -> Result<User, ProviderError> {
        self.list_users(instance_id)
            .await?
            .into_iter()
            .find(|u| u.name == name)
            .ok_or_else(|| ProviderError::NotFound(format!("user {} not found", name)))
    }

    /// Create a user.
    pub async fn create_user(&self, instance_id: i64, user: &User) -> Result<(), ProviderError> {
        self.send_json(
            Method::POST,
            &users_path(instance_id),
            user,
            self.expected().child_create,
        )
        .await?;
        Ok(())
    }

    /// Delete a user.
    pub async fn delete_user(&self, instance_id: i64, name: &str) -> Result<(), ProviderError> {
        self.delete(
            &child_path(&users_path(instance_id), name)?,
            self.expected().child_delete,
        )
        .await
    }
}
