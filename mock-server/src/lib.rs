use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};

pub const CODE_INVALID_PARAMS: i64 = 1003;
pub const CODE_AUTH_FAILED: i64 = 1004;
pub const CODE_NO_TARGET: i64 = 1011;
pub const CODE_UNKNOWN_DEVICE: i64 = 7002;

pub const RATE_LIMIT: u64 = 600;
pub const RATE_LIMIT_RESET_SECS: u64 = 60;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub tags: BTreeSet<String>,
    pub alias: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Deserialize)]
struct DeviceUpdate {
    tags: Option<Value>,
    alias: Option<String>,
    mobile: Option<String>,
}

/// In-memory stand-in for the push service.
pub struct MockJPush {
    authorization: String,
    devices: RwLock<HashMap<String, Device>>,
    delivered: RwLock<Vec<Value>>,
    validated: RwLock<Vec<Value>>,
    next_msg_id: AtomicU64,
    push_calls: AtomicU64,
}

pub type Shared = Arc<MockJPush>;

impl MockJPush {
    pub fn new(app_key: &str, master_secret: &str) -> Self {
        Self {
            authorization: format!(
                "Basic {}",
                STANDARD.encode(format!("{app_key}:{master_secret}"))
            ),
            devices: RwLock::new(HashMap::new()),
            delivered: RwLock::new(Vec::new()),
            validated: RwLock::new(Vec::new()),
            next_msg_id: AtomicU64::new(1_000_000),
            push_calls: AtomicU64::new(0),
        }
    }

    pub fn with_device(mut self, registration_id: &str, device: Device) -> Self {
        self.devices
            .get_mut()
            .insert(registration_id.to_string(), device);
        self
    }

    /// Payloads accepted by `/v3/push`. Must not be called from async code.
    pub fn delivered(&self) -> Vec<Value> {
        self.delivered.blocking_read().clone()
    }

    /// Payloads accepted by `/v3/push/validate`. Must not be called from async code.
    pub fn validated(&self) -> Vec<Value> {
        self.validated.blocking_read().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == self.authorization)
    }
}

pub fn app(state: Shared) -> Router {
    Router::new()
        .route("/v3/push", post(push))
        .route("/v3/push/validate", post(validate_push))
        .route("/v3/devices/{id}", get(get_device).post(update_device))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn error(status: StatusCode, code: i64, message: &str) -> Response {
    (status, Json(json!({"error": {"code": code, "message": message}}))).into_response()
}

async fn push(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    accept_push(&state, &headers, body, true).await
}

async fn validate_push(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    accept_push(&state, &headers, body, false).await
}

async fn accept_push(
    state: &MockJPush,
    headers: &HeaderMap,
    body: Value,
    deliver: bool,
) -> Response {
    if !state.authorized(headers) {
        warn!("push rejected: bad credentials");
        return error(StatusCode::UNAUTHORIZED, CODE_AUTH_FAILED, "Authen failed");
    }
    if body.get("platform").is_none() || body.get("audience").is_none() {
        return error(
            StatusCode::BAD_REQUEST,
            CODE_INVALID_PARAMS,
            "platform and audience are required",
        );
    }
    if let Some(ids) = body["audience"].get("registration_id").and_then(Value::as_array) {
        let devices = state.devices.read().await;
        let known = ids
            .iter()
            .filter_map(Value::as_str)
            .any(|id| devices.contains_key(id));
        if !known {
            return error(
                StatusCode::BAD_REQUEST,
                CODE_NO_TARGET,
                "cannot find user by this audience",
            );
        }
    }

    let calls = state.push_calls.fetch_add(1, Ordering::Relaxed) + 1;
    let msg_id = state.next_msg_id.fetch_add(1, Ordering::Relaxed);
    let sendno = match &body["options"]["sendno"] {
        Value::Number(n) => n.to_string(),
        _ => "0".to_string(),
    };

    if deliver {
        state.delivered.write().await.push(body);
    } else {
        state.validated.write().await.push(body);
    }
    info!(msg_id, deliver, "push accepted");

    let rate_headers = [
        ("X-Rate-Limit-Limit", RATE_LIMIT.to_string()),
        (
            "X-Rate-Limit-Remaining",
            RATE_LIMIT.saturating_sub(calls).to_string(),
        ),
        ("X-Rate-Limit-Reset", RATE_LIMIT_RESET_SECS.to_string()),
    ];
    (
        StatusCode::OK,
        rate_headers,
        Json(json!({"sendno": sendno, "msg_id": msg_id.to_string()})),
    )
        .into_response()
}

async fn get_device(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !state.authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, CODE_AUTH_FAILED, "Authen failed");
    }
    match state.devices.read().await.get(&id) {
        Some(device) => Json(device.clone()).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            CODE_UNKNOWN_DEVICE,
            "registration_id not found",
        ),
    }
}

async fn update_device(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, CODE_AUTH_FAILED, "Authen failed");
    }
    let update: DeviceUpdate = match serde_json::from_value(body) {
        Ok(update) => update,
        Err(e) => return error(StatusCode::BAD_REQUEST, CODE_INVALID_PARAMS, &e.to_string()),
    };

    let mut devices = state.devices.write().await;
    let Some(device) = devices.get_mut(&id) else {
        return error(
            StatusCode::NOT_FOUND,
            CODE_UNKNOWN_DEVICE,
            "registration_id not found",
        );
    };

    if let Some(tags) = update.tags {
        if let Err(message) = apply_tags(device, &tags) {
            return error(StatusCode::BAD_REQUEST, CODE_INVALID_PARAMS, message);
        }
    }
    if let Some(alias) = update.alias {
        device.alias = Some(alias).filter(|a| !a.is_empty());
    }
    if let Some(mobile) = update.mobile {
        device.mobile = Some(mobile).filter(|m| !m.is_empty());
    }
    info!(registration_id = %id, "device updated");
    StatusCode::OK.into_response()
}

fn apply_tags(device: &mut Device, tags: &Value) -> Result<(), &'static str> {
    let names = |v: &Value| -> Vec<String> {
        v.as_array()
            .map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    };
    match tags {
        Value::String(s) if s.is_empty() => {
            device.tags.clear();
            Ok(())
        }
        Value::Object(change) => {
            for tag in change.get("add").map(names).unwrap_or_default() {
                device.tags.insert(tag);
            }
            for tag in change.get("remove").map(names).unwrap_or_default() {
                device.tags.remove(&tag);
            }
            Ok(())
        }
        _ => Err("tags must be \"\" or an add/remove object"),
    }
}
