//! CloudKarafka Provider
//!
//! An infrastructure provider that manages hosted Kafka clusters through the
//! CloudKarafka customer API. The host computes desired state, calls
//! [`ProviderService::plan`] to diff it against the last known state, and then
//! applies the plan with create, update or delete.
//!
//! # Overview
//!
//! - **API client** ([`api`]): one typed method per customer API endpoint
//! - **Readiness polling** ([`poll`]): waits until instances and topics are usable
//! - **Resources** ([`resources`]): instance, topic, user, ACL rules, Kafka config and VPC
//! - **Schema and validation** ([`schema`], [`validation`]): attribute types, constraints and diagnostics
//! - **Planning** ([`types::PlanResult`]): attribute diffs and replacement decisions
//! - **ProviderService** ([`service`]): the trait the host drives, implemented by [`CloudKarafkaProvider`]
//!
//! # Quick Start
//!
//! ```ignore
//! use cloudkarafka_provider::{CloudKarafkaProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     cloudkarafka_provider::init_logging();
//!
//!     let provider = CloudKarafkaProvider::new();
//!     provider.configure(json!({"apikey": std::env::var("CLOUDKARAFKA_APIKEY")?})).await?;
//!
//!     let planned = json!({
//!         "name": "prod",
//!         "plan": "bat-1",
//!         "region": "amazon-web-services::us-east-1"
//!     });
//!     let plan = provider
//!         .plan("cloudkarafka_instance", None, planned.clone(), planned)
//!         .await?;
//!     let state = provider.create("cloudkarafka_instance", plan.planned_state).await?;
//!     println!("brokers: {}", state["brokers"]);
//!     Ok(())
//! }
//! ```
//!
//! # Resource Types
//!
//! | Type | Identity |
//! |------|----------|
//! | `cloudkarafka_instance` | numeric instance id |
//! | `cloudkarafka_topic` | `<instance_id>,<name>` |
//! | `cloudkarafka_user` | `<instance_id>,<name>` |
//! | `cloudkarafka_aclrule` | `<instance_id>,<username>` |
//! | `cloudkarafka_kafkaconfig` | instance id |
//! | `cloudkarafka_vpc` | numeric VPC id |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use api::Client;
pub use config::{ClientConfig, ExpectedStatus, PollConfig, ProviderConfig};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use poll::Poller;
pub use provider::CloudKarafkaProvider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
