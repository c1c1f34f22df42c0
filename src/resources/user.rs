//! `cloudkarafka_user`: a Kafka user on an instance.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::parse_child_id;
use crate::api::{Client, User};
use crate::error::ProviderError;
use crate::schema::{Attribute, Constraint, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "cloudkarafka_user";

/// Host-side state of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    /// Instance the user belongs to.
    pub instance_id: i64,
    /// User name.
    pub name: String,
    /// `sasl` or `ssl`; the API default when unset.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

impl UserState {
    fn from_api(instance_id: i64, user: User, configured: Option<String>) -> Self {
        Self {
            instance_id,
            name: user.name,
            user_type: user.user_type.or(configured),
        }
    }
}

/// Schema of `cloudkarafka_user`. Every attribute forces replacement.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description("Manage a user.")
        .with_attribute(
            "instance_id",
            Attribute::required_int64()
                .with_force_new()
                .with_description("Id of the instance where we want to manage the user."),
        )
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_force_new()
                .with_description("Name of user."),
        )
        .with_attribute(
            "type",
            Attribute::optional_string()
                .with_force_new()
                .with_constraint(Constraint::one_of(&["sasl", "ssl"]))
                .with_description("Type of user, either sasl or ssl."),
        )
}

/// Create a user.
#[instrument(skip(client, planned), fields(instance_id = planned.instance_id, name = %planned.name))]
pub async fn create(client: &Client, planned: UserState) -> Result<UserState, ProviderError> {
    let user = User {
        name: planned.name.clone(),
        user_type: planned.user_type.as_ref().map(|t| t.to_lowercase()),
    };
    client.create_user(planned.instance_id, &user).await?;
    info!("User created");
    read(client, planned).await
}

/// Refresh a user from the instance's user listing.
#[instrument(skip(client, current), fields(instance_id = current.instance_id, name = %current.name))]
pub async fn read(client: &Client, current: UserState) -> Result<UserState, ProviderError> {
    let user = client.read_user(current.instance_id, &current.name).await?;
    Ok(UserState::from_api(current.instance_id, user, current.user_type))
}

/// Delete a user.
#[instrument(skip(client, current), fields(instance_id = current.instance_id, name = %current.name))]
pub async fn delete(client: &Client, current: UserState) -> Result<(), ProviderError> {
    client.delete_user(current.instance_id, &current.name).await?;
    info!("User deleted");
    Ok(())
}

/// Import a user from `<instance_id>,<name>`.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<UserState, ProviderError> {
    let (instance_id, name) = parse_child_id(TYPE_NAME, id)?;
    let user = client.read_user(instance_id, name).await?;
    Ok(UserState::from_api(instance_id, user, None))
}
