//! Common test utilities
//!
//! - rustls crypto provider setup
//! - in-process axum mocks for the SSM JSON protocol and the App Configuration REST API
//! - an in-memory backend and counting Secret/status stores

#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use k8s_openapi::api::core::v1::Secret;
use parameter_store_controller::controller::reconciler::{SecretStore, StatusStore};
use parameter_store_controller::crd::{ParameterStore, ParameterStoreSpec, ValueFrom};
use parameter_store_controller::provider::{normalize_key, ParameterBackend, ResolvedValue, TransportError};
use parameter_store_controller::ParameterStoreStatus;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::net::TcpListener;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// SSM mock
// ---------------------------------------------------------------------------

/// Parameters served by the SSM mock, in listing order
#[derive(Debug, Default)]
pub struct SsmMock {
    pub parameters: Vec<(String, String)>,
    /// Fail `GetParametersByPath` once this many pages have been served
    pub fail_after_pages: Option<usize>,
    pub pages_served: AtomicUsize,
    pub requests: Mutex<Vec<String>>,
}

impl SsmMock {
    pub fn with(parameters: &[(&str, &str)]) -> Self {
        Self {
            parameters: parameters
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

fn aws_json(status: StatusCode, body: Value) -> Response {
    (
        status,
        [("content-type", "application/x-amz-json-1.1")],
        body.to_string(),
    )
        .into_response()
}

static REQUEST_IDS: AtomicUsize = AtomicUsize::new(0);

/// Error response carrying a fresh request id, as SSM does
fn aws_error(error_type: &str, message: &str) -> Response {
    let request_id = format!("req-{:08}", REQUEST_IDS.fetch_add(1, Ordering::SeqCst));
    (
        StatusCode::BAD_REQUEST,
        [
            ("content-type", "application/x-amz-json-1.1".to_string()),
            ("x-amzn-requestid", request_id),
        ],
        json!({ "__type": error_type, "message": message }).to_string(),
    )
        .into_response()
}

fn parameter_json(name: &str, value: &str) -> Value {
    json!({
        "Name": name,
        "Type": "SecureString",
        "Value": value,
        "Version": 1,
        "ARN": format!("arn:aws:ssm:us-east-1:000000000000:parameter{name}"),
        "DataType": "text"
    })
}

fn in_path(name: &str, path: &str, recursive: bool) -> bool {
    let prefix = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };
    match name.strip_prefix(&prefix) {
        Some(rest) => recursive || !rest.contains('/'),
        None => false,
    }
}

/// All requests are POST to "/" with x-amz-target header
async fn handle_ssm(State(mock): State<Arc<SsmMock>>, headers: HeaderMap, body: Bytes) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    mock.requests.lock().unwrap().push(target.clone());
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match target.as_str() {
        "AmazonSSM.GetParameter" => {
            let name = request["Name"].as_str().unwrap_or_default();
            match mock.parameters.iter().find(|(k, _)| k == name) {
                Some((k, v)) => aws_json(StatusCode::OK, json!({ "Parameter": parameter_json(k, v) })),
                None => aws_error("ParameterNotFound", &format!("Parameter {name} not found.")),
            }
        }
        "AmazonSSM.GetParametersByPath" => {
            if let Some(limit) = mock.fail_after_pages {
                if mock.pages_served.load(Ordering::SeqCst) >= limit {
                    return aws_error("AccessDeniedException", "User is not authorized");
                }
            }
            let path = request["Path"].as_str().unwrap_or_default();
            let recursive = request["Recursive"].as_bool().unwrap_or(false);
            let page_size = request["MaxResults"].as_u64().unwrap_or(10) as usize;
            let start = request["NextToken"]
                .as_str()
                .and_then(|t| t.parse::<usize>().ok())
                .unwrap_or(0);

            let matching: Vec<_> = mock
                .parameters
                .iter()
                .filter(|(k, _)| in_path(k, path, recursive))
                .collect();
            let page: Vec<Value> = matching
                .iter()
                .skip(start)
                .take(page_size)
                .map(|(k, v)| parameter_json(k, v))
                .collect();
            mock.pages_served.fetch_add(1, Ordering::SeqCst);

            let next = start + page.len();
            let mut body = json!({ "Parameters": page });
            if next < matching.len() {
                body["NextToken"] = json!(next.to_string());
            }
            aws_json(StatusCode::OK, body)
        }
        other => aws_error("InvalidAction", &format!("unsupported target {other}")),
    }
}

/// Start the SSM mock and return its base URL
pub async fn start_ssm_mock(mock: Arc<SsmMock>) -> String {
    let app = Router::new().route("/", post(handle_ssm)).with_state(mock);
    serve(app).await
}

// ---------------------------------------------------------------------------
// App Configuration mock
// ---------------------------------------------------------------------------

/// Key-values served by the App Configuration mock
///
/// `revision_pages` is returned page by page from `/revisions`, filtered by the
/// key prefix, so the same key may repeat across pages.
#[derive(Debug, Default)]
pub struct AppConfigMock {
    pub settings: HashMap<String, String>,
    pub revision_pages: Vec<Vec<(String, String)>>,
    /// Answer 404 for this `/revisions` page and every later one
    pub missing_from_page: Option<usize>,
    pub expected_token: String,
    pub requests: AtomicUsize,
}

impl AppConfigMock {
    pub fn new(settings: &[(&str, &str)], revision_pages: Vec<Vec<(&str, &str)>>) -> Self {
        Self {
            settings: settings
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            revision_pages: revision_pages
                .into_iter()
                .map(|page| {
                    page.into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .collect(),
            missing_from_page: None,
            expected_token: "test-token".to_string(),
            requests: AtomicUsize::new(0),
        }
    }
}

fn authorized(mock: &AppConfigMock, headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", mock.expected_token))
}

async fn handle_kv(
    State(mock): State<Arc<AppConfigMock>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&mock, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match mock.settings.get(&key) {
        Some(value) => Json(json!({
            "etag": "etag",
            "key": key,
            "label": null,
            "content_type": null,
            "value": value,
            "locked": false
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "type": "https://azconfig.io/errors/key-value-not-found", "status": 404 })),
        )
            .into_response(),
    }
}

async fn handle_revisions(
    State(mock): State<Arc<AppConfigMock>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&mock, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let filter = query.get("key").cloned().unwrap_or_default();
    let prefix = filter.trim_end_matches('*').to_string();
    let page_index = query
        .get("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(0);
    if mock.missing_from_page.is_some_and(|from| page_index >= from) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let items: Vec<Value> = mock
        .revision_pages
        .get(page_index)
        .map(|page| {
            page.iter()
                .filter(|(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| json!({ "key": k, "value": v, "label": null }))
                .collect()
        })
        .unwrap_or_default();

    let mut body = json!({ "items": items });
    if page_index + 1 < mock.revision_pages.len() {
        let mut next = reqwest::Url::parse("http://placeholder/revisions").unwrap();
        next.query_pairs_mut()
            .append_pair("key", &filter)
            .append_pair("api-version", "1.0")
            .append_pair("page", &(page_index + 1).to_string());
        body["@nextLink"] = json!(format!("{}?{}", next.path(), next.query().unwrap_or_default()));
    }
    Json(body).into_response()
}

/// Start the App Configuration mock and return its base URL
pub async fn start_app_config_mock(mock: Arc<AppConfigMock>) -> String {
    let app = Router::new()
        .route("/kv/{key}", get(handle_kv))
        .route("/revisions", get(handle_revisions))
        .with_state(mock);
    serve(app).await
}

// ---------------------------------------------------------------------------
// In-memory backend and stores
// ---------------------------------------------------------------------------

/// Backend answering from memory
#[derive(Debug, Default)]
pub struct FakeBackend {
    values: Mutex<HashMap<String, String>>,
    /// Names whose lookup fails with a transport error instead of not-found
    broken: Mutex<HashSet<String>>,
    /// Pages returned for any prefix; keys are normalized, first wins
    pages: Mutex<HashMap<String, Vec<Vec<(String, String)>>>>,
    pub name_calls: AtomicUsize,
    pub prefix_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with(values: &[(&str, &str)]) -> Self {
        let backend = Self::default();
        for (k, v) in values {
            backend.set(k, v);
        }
        backend
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }

    pub fn break_key(&self, key: &str) {
        self.broken.lock().unwrap().insert(key.to_string());
    }

    pub fn set_pages(&self, prefix: &str, pages: Vec<Vec<(&str, &str)>>) {
        self.pages.lock().unwrap().insert(
            prefix.to_string(),
            pages
                .into_iter()
                .map(|p| p.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
                .collect(),
        );
    }

    pub fn calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst) + self.prefix_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn resolve_by_name(&self, name: &str) -> Result<ResolvedValue, TransportError> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.lock().unwrap().contains(name) {
            return Err(TransportError::Request(format!("connection reset fetching {name}")));
        }
        self.values
            .lock()
            .unwrap()
            .get(name)
            .map(|v| ResolvedValue::new(name, v.clone()))
            .ok_or_else(|| TransportError::NotFound(name.to_string()))
    }

    async fn resolve_by_prefix(
        &self,
        prefix: &str,
        _recursive: bool,
    ) -> Result<Vec<ResolvedValue>, TransportError> {
        self.prefix_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.lock().unwrap().contains(prefix) {
            return Err(TransportError::Request(format!("connection reset listing {prefix}")));
        }
        let pages = self.pages.lock().unwrap().get(prefix).cloned();
        let entries: Vec<(String, String)> = match pages {
            Some(pages) => pages.into_iter().flatten().collect(),
            None => {
                let mut entries: Vec<_> = self
                    .values
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(k, _)| k.starts_with(prefix))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                entries.sort();
                entries
            }
        };

        let mut seen = HashSet::new();
        Ok(entries
            .into_iter()
            .filter_map(|(k, v)| {
                let name = normalize_key(&k);
                seen.insert(name.clone()).then(|| ResolvedValue::new(name, v))
            })
            .collect())
    }
}

/// Secret store keeping objects in memory and counting writes
#[derive(Debug, Default)]
pub struct CountingSecretStore {
    secrets: Mutex<HashMap<(String, String), Secret>>,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl CountingSecretStore {
    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn writes(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }

    fn put(&self, secret: &Secret) {
        let key = (
            secret.metadata.namespace.clone().unwrap_or_default(),
            secret.metadata.name.clone().unwrap_or_default(),
        );
        self.secrets.lock().unwrap().insert(key, secret.clone());
    }
}

#[async_trait]
impl SecretStore for CountingSecretStore {
    async fn get(&self, name: &str, namespace: &str) -> Result<Option<Secret>> {
        Ok(self.secret(namespace, name))
    }

    async fn create(&self, secret: &Secret) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.put(secret);
        Ok(())
    }

    async fn update(&self, secret: &Secret) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.put(secret);
        Ok(())
    }
}

/// Status store remembering the last written status and counting writes
#[derive(Debug, Default)]
pub struct CountingStatusStore {
    last: Mutex<Option<ParameterStoreStatus>>,
    pub writes: AtomicUsize,
}

impl CountingStatusStore {
    pub fn last(&self) -> Option<ParameterStoreStatus> {
        self.last.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for CountingStatusStore {
    async fn update_status(
        &self,
        _parameter_store: &ParameterStore,
        status: &ParameterStoreStatus,
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(status.clone());
        Ok(())
    }
}

/// `ParameterStore` in the `default` namespace
pub fn parameter_store(name: &str, value_from: ValueFrom) -> ParameterStore {
    let mut ps = ParameterStore::new(name, ParameterStoreSpec { value_from });
    ps.metadata.namespace = Some("default".to_string());
    ps.metadata.generation = Some(1);
    ps
}
