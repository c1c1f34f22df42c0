//! In-process mock of the CloudKarafka customer API.
//!
//! The mock keeps its state behind a shared lock so tests can seed data,
//! script readiness and inspect what the provider sent.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cloudkarafka_provider::{Client, ClientConfig, PollConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Everything the mock knows.
#[derive(Debug, Default)]
pub struct MockState {
    next_id: i64,
    /// Instances by id, in API shape.
    pub instances: BTreeMap<i64, Value>,
    /// Cluster status answers as `(ready, configured)`; ready once drained.
    pub cluster_status: VecDeque<(bool, bool)>,
    /// Number of cluster status checks served.
    pub status_checks: u32,
    /// Topics per instance, in API shape.
    pub topics: BTreeMap<i64, Vec<Value>>,
    /// Listings after creation before a topic turns `ready`; `None` never.
    pub topic_ready_after: Option<u32>,
    /// Topic listings served.
    pub topic_listings: u32,
    /// Users per instance.
    pub users: BTreeMap<i64, Vec<Value>>,
    /// ACL rules per instance.
    pub acls: BTreeMap<i64, Vec<Value>>,
    /// Rule ids whose delete answers 500.
    pub acl_delete_failures: BTreeSet<i64>,
    /// Copies stored per ACL create; 0 simulates a create that vanished.
    pub acl_copies: usize,
    /// Broker config entries per instance.
    pub kafka_config: BTreeMap<i64, Vec<Value>>,
    /// Last properties document written.
    pub last_config_body: Option<String>,
    /// Standalone VPCs.
    pub vpcs: BTreeMap<i64, Value>,
    /// Answer every request with this status and body.
    pub fail_with: Option<(u16, Value)>,
    /// `METHOD path?query` of every request served.
    pub requests: Vec<String>,
}

impl MockState {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Seed a ready instance and return its id.
    pub fn seed_instance(&mut self, name: &str) -> i64 {
        let id = self.id();
        self.instances.insert(id, instance_json(id, name, &json!({})));
        id
    }

    /// Seed an ACL rule and return its id.
    pub fn seed_acl(&mut self, instance_id: i64, user: &str, operation: &str, pattern: &str) -> i64 {
        let id = self.id();
        self.acls.entry(instance_id).or_default().push(json!({
            "id": id,
            "name": user,
            "operation": operation,
            "resource": "topic",
            "resource_pattern": pattern,
            "resource_pattern_type": "literal",
            "created_at": "2024-05-01T10:00:00Z"
        }));
        id
    }

    /// Count requests whose line starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.requests.iter().filter(|r| r.starts_with(prefix)).count()
    }
}

pub type Shared = Arc<Mutex<MockState>>;

/// A running mock server.
pub struct MockApi {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockApi {
    /// Start a mock server on an OS-assigned port.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState {
            topic_ready_after: Some(1),
            acl_copies: 1,
            ..Default::default()
        }));

        let router = Router::new()
            .route("/api/instances", post(create_instance))
            .route(
                "/api/instances/{id}",
                get(read_instance).put(update_instance).delete(delete_instance),
            )
            .route("/api/instances/{id}/cluster/status", get(cluster_status))
            .route("/api/instances/{id}/topics", get(list_topics).post(create_topic))
            .route(
                "/api/instances/{id}/topics/{name}",
                put(update_topic).delete(delete_topic),
            )
            .route("/api/instances/{id}/users", get(list_users).post(create_user))
            .route(
                "/api/instances/{id}/users/{name}",
                axum::routing::delete(delete_user),
            )
            .route("/api/instances/{id}/acls", get(list_acls).post(create_acl))
            .route(
                "/api/instances/{id}/acls/{rule}",
                axum::routing::delete(delete_acl),
            )
            .route(
                "/api/instances/{id}/config/kafka",
                get(read_config).post(write_config),
            )
            .route("/api/vpcs", post(create_vpc))
            .route(
                "/api/vpcs/{id}",
                get(read_vpc).put(update_vpc).delete(delete_vpc),
            )
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self { addr, state }
    }

    /// Base URL of the mock.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client with fast polling.
    pub fn client(&self) -> Client {
        Client::new(ClientConfig::new(self.url(), "test-key").with_poll(fast_poll()))
            .expect("Failed to build client")
    }
}

/// Millisecond polling with the production topic budget.
pub fn fast_poll() -> PollConfig {
    PollConfig {
        instance_interval: Duration::from_millis(5),
        topic_interval: Duration::from_millis(5),
        topic_max_attempts: 36,
    }
}

fn instance_json(id: i64, name: &str, body: &Value) -> Value {
    let mut instance = json!({
        "id": id,
        "name": name,
        "plan": body.get("plan").cloned().unwrap_or(json!("bat-1")),
        "region": body.get("region").cloned().unwrap_or(json!("amazon-web-services::us-east-1")),
        "tags": body.get("tags").cloned().unwrap_or(json!([])),
        "kafka_version": body.get("kafka_version").cloned().unwrap_or(json!("3.5.1")),
        "apikey": format!("instance-key-{}", id),
        "brokers": format!("b1-{}.example.com:9094", id),
        "username": format!("user{}", id),
        "password": "secret"
    });
    if let Some(disk) = body.get("disk_size") {
        instance["disk_size"] = disk.clone();
    }
    if let Some(subnet) = body.get("vpc_subnet") {
        instance["vpc"] = json!({"id": 100 + id, "subnet": subnet});
    } else if let Some(vpc_id) = body.get("vpc_id") {
        instance["vpc"] = json!({"id": vpc_id, "subnet": "10.0.0.0/24"});
    }
    instance
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let line = format!(
        "{} {}",
        request.method(),
        request
            .uri()
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or_default()
    );
    let fail = {
        let mut state = state.lock().await;
        state.requests.push(line);
        state.fail_with.clone()
    };
    match fail {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).expect("Invalid status");
            (status, Json(body)).into_response()
        },
        None => next.run(request).await,
    }
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": message}))).into_response()
}

async fn create_instance(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().await;
    let id = state.id();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let instance = instance_json(id, &name, &body);
    state.instances.insert(id, instance.clone());
    Json(instance).into_response()
}

async fn read_instance(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().await.instances.get(&id) {
        Some(instance) => Json(instance.clone()).into_response(),
        None => not_found("Not found"),
    }
}

async fn update_instance(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let Some(instance) = state.instances.get_mut(&id) else {
        return not_found("Not found");
    };
    for key in ["name", "plan", "tags", "disk_size"] {
        if let Some(value) = body.get(key) {
            instance[key] = value.clone();
        }
    }
    Json(json!({})).into_response()
}

#[derive(Debug, Deserialize)]
struct DeleteInstanceQuery {
    #[serde(default)]
    keep_vpc: bool,
}

async fn delete_instance(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Query(_query): Query<DeleteInstanceQuery>,
) -> Response {
    match state.lock().await.instances.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found("Not found"),
    }
}

async fn cluster_status(State(state): State<Shared>, Path(_id): Path<i64>) -> Response {
    let mut state = state.lock().await;
    state.status_checks += 1;
    let (ready, configured) = state.cluster_status.pop_front().unwrap_or((true, true));
    Json(json!({"name": "cluster", "ready": ready, "configured": configured})).into_response()
}

async fn list_topics(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().await;
    state.topic_listings += 1;
    let ready_after = state.topic_ready_after;
    let topics = state.topics.entry(id).or_default();
    for topic in topics.iter_mut() {
        let seen = topic["listings"].as_u64().unwrap_or(0) as u32 + 1;
        topic["listings"] = json!(seen);
        if ready_after.is_some_and(|n| seen >= n) {
            topic["status"] = json!("ready");
        }
    }
    Json(topics.clone()).into_response()
}

async fn create_topic(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(mut body): Json<Value>,
) -> Response {
    body["status"] = json!("creating");
    body["listings"] = json!(0);
    state.lock().await.topics.entry(id).or_default().push(body);
    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn update_topic(
    State(state): State<Shared>,
    Path((id, name)): Path<(i64, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let topics = state.topics.entry(id).or_default();
    let Some(topic) = topics.iter_mut().find(|t| t["name"] == name.as_str()) else {
        return not_found("Topic not found");
    };
    topic["partitions"] = body["partitions"].clone();
    if let Some(config) = body.get("config") {
        topic["config"] = config.clone();
    }
    Json(json!({})).into_response()
}

async fn delete_topic(
    State(state): State<Shared>,
    Path((id, name)): Path<(i64, String)>,
) -> Response {
    let mut state = state.lock().await;
    let topics = state.topics.entry(id).or_default();
    let before = topics.len();
    topics.retain(|t| t["name"] != name.as_str());
    if topics.len() == before {
        return not_found("Topic not found");
    }
    StatusCode::OK.into_response()
}

async fn list_users(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    Json(state.lock().await.users.entry(id).or_default().clone()).into_response()
}

async fn create_user(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    state.lock().await.users.entry(id).or_default().push(body);
    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn delete_user(
    State(state): State<Shared>,
    Path((id, name)): Path<(i64, String)>,
) -> Response {
    let mut state = state.lock().await;
    state
        .users
        .entry(id)
        .or_default()
        .retain(|u| u["name"] != name.as_str());
    StatusCode::OK.into_response()
}

async fn list_acls(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    Json(state.lock().await.acls.entry(id).or_default().clone()).into_response()
}

async fn create_acl(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let user = body["user"].clone();
    let rules = body["rules"].as_array().cloned().unwrap_or_default();
    for _ in 0..state.acl_copies {
        for rule in &rules {
            let rule_id = state.id();
            let mut rule = rule.clone();
            rule["id"] = json!(rule_id);
            rule["name"] = user.clone();
            rule["created_at"] = json!("2024-05-01T10:00:00Z");
            state.acls.entry(id).or_default().push(rule);
        }
    }
    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn delete_acl(
    State(state): State<Shared>,
    Path((id, rule)): Path<(i64, i64)>,
) -> Response {
    let mut state = state.lock().await;
    if state.acl_delete_failures.contains(&rule) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "rule is locked"})),
        )
            .into_response();
    }
    state
        .acls
        .entry(id)
        .or_default()
        .retain(|r| r["id"] != rule);
    StatusCode::OK.into_response()
}

async fn read_config(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    Json(state.lock().await.kafka_config.entry(id).or_default().clone()).into_response()
}

async fn write_config(State(state): State<Shared>, Path(id): Path<i64>, body: String) -> Response {
    let mut state = state.lock().await;
    let entries: Vec<Value> = body
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| value.parse::<bool>().map(Value::from))
                .unwrap_or_else(|_| Value::from(value));
            json!({"name": key, "value": value})
        })
        .collect();
    state.kafka_config.insert(id, entries);
    state.last_config_body = Some(body);
    Json(json!({})).into_response()
}

async fn create_vpc(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().await;
    let id = state.id();
    let vpc = json!({
        "id": id,
        "name": body["name"],
        "region": body["region"],
        "subnet": body["subnet"],
        "tags": body.get("tags").cloned().unwrap_or(json!([])),
        "vpc_name": format!("vpc-{:08x}", id)
    });
    state.vpcs.insert(id, vpc);
    Json(json!({"id": id})).into_response()
}

async fn read_vpc(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().await.vpcs.get(&id) {
        Some(vpc) => Json(vpc.clone()).into_response(),
        None => not_found("Not found"),
    }
}

async fn update_vpc(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().await;
    let Some(vpc) = state.vpcs.get_mut(&id) else {
        return not_found("Not found");
    };
    vpc["name"] = body["name"].clone();
    vpc["tags"] = body["tags"].clone();
    Json(json!({})).into_response()
}

async fn delete_vpc(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().await.vpcs.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found("Not found"),
    }
}
