//! In-memory imitation of the Softaculous panel endpoint.
//!
//! Serves `/frontend/x3/softaculous/index.live.php` over plain HTTP, checks
//! Basic auth against `USERNAME`/`PASSWORD`, dispatches on `act`, and answers
//! in PHP-serialized form (`api=serialize`) or JSON (`api=json`). Requests
//! without `api` get the HTML page a browser would. Every authorised request
//! is recorded so tests can inspect what reached the server.

pub mod php;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Query, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const ENDPOINT_PATH: &str = "/frontend/x3/softaculous/index.live.php";

/// Installable scripts: (soft id, name, current version).
const CATALOG: &[(&str, &str, &str)] = &[
    ("26", "WordPress", "6.4.2"),
    ("413", "Joomla", "5.0.1"),
    ("543", "Drupal", "10.2.0"),
];

/// Version recorded for imported installations, behind the catalog.
const IMPORTED_VERSION: &str = "0.9";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub query: String,
}

#[derive(Debug, Clone)]
struct Installation {
    soft: String,
    version: String,
    domain: String,
    directory: String,
}

#[derive(Debug, Default)]
struct Panel {
    installations: BTreeMap<String, Installation>,
    backups: BTreeMap<String, String>,
    next_id: u64,
    requests: Vec<RecordedRequest>,
}

/// Shared panel state. Clones share the same panel.
#[derive(Clone, Default)]
pub struct MockState {
    panel: Arc<RwLock<Panel>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.panel.read().await.requests.clone()
    }
}

pub fn app() -> Router {
    app_with(MockState::new())
}

pub fn app_with(state: MockState) -> Router {
    Router::new()
        .route(ENDPOINT_PATH, get(handle).post(handle))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(state)).await
}

fn expected_authorization() -> String {
    format!("Basic {}", STANDARD.encode(format!("{USERNAME}:{PASSWORD}")))
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected_authorization());
    if !authorized {
        tracing::warn!(%method, "rejected request with bad credentials");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let query = raw.unwrap_or_default();
    tracing::info!(%method, %query, "panel request");

    let params: HashMap<String, String> = pairs.into_iter().collect();
    let mut panel = state.panel.write().await;
    panel.requests.push(RecordedRequest {
        method: method.to_string(),
        query,
    });

    let Some(format) = params.get("api").cloned() else {
        return html("Softaculous - Home");
    };
    let Some(body) = dispatch(&mut panel, &params) else {
        return html("Unknown action");
    };

    match format.as_str() {
        "json" => ([(header::CONTENT_TYPE, "application/json")], php::json_encode(&body)).into_response(),
        _ => ([(header::CONTENT_TYPE, "text/plain")], php::to_string(&body)).into_response(),
    }
}

fn html(title: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "text/html")],
        format!("<html><head><title>{title}</title></head><body></body></html>"),
    )
        .into_response()
}

fn failure(message: &str) -> Value {
    json!({ "error": [message] })
}

/// Reply document for `act`, or `None` when the action is unknown.
fn dispatch(panel: &mut Panel, params: &HashMap<String, String>) -> Option<Value> {
    let param = |key: &str| params.get(key).map(String::as_str);

    let reply = match param("act") {
        None => list_scripts(),
        Some("software") => match param("soft").and_then(catalog_entry) {
            Some((soft, _, version)) => {
                let insid = panel.install(soft, version, param("softdomain"), param("softdirectory"));
                json!({ "done": true, "insid": insid })
            }
            None => failure("Invalid script"),
        },
        Some("import") => match param("soft").and_then(catalog_entry) {
            Some((soft, _, _)) => {
                let insid = panel.install(soft, IMPORTED_VERSION, param("softdomain"), None);
                json!({ "done": true, "insid": insid })
            }
            None => failure("Invalid script"),
        },
        Some("upgrade") => match param("insid").and_then(|id| panel.installations.get_mut(id)) {
            Some(install) => {
                if let Some((_, _, version)) = catalog_entry(&install.soft) {
                    install.version = version.to_string();
                }
                json!({ "done": true })
            }
            None => failure("Installation not found"),
        },
        Some("remove") => match param("insid").and_then(|id| panel.installations.remove(id)) {
            Some(_) => json!({ "done": true }),
            None => failure("Installation not found"),
        },
        Some("installations") => panel.installations_reply(param("showupdates") == Some("true")),
        Some("backup") => match param("insid") {
            Some(insid) if panel.installations.contains_key(insid) => {
                panel.next_id += 1;
                let name = format!("backup_time_{insid}_{}.tar.gz", panel.next_id);
                panel.backups.insert(name.clone(), insid.to_string());
                json!({ "done": true, "backup": name })
            }
            _ => failure("Installation not found"),
        },
        Some("restore") => match param("restore") {
            Some(name) if panel.backups.contains_key(name) => json!({ "done": true }),
            _ => failure("Backup not found"),
        },
        Some("backups") => {
            if let Some(name) = param("download") {
                match panel.backups.get(name) {
                    Some(insid) => json!({ "download": name, "insid": insid }),
                    None => failure("Backup not found"),
                }
            } else if let Some(name) = param("remove") {
                match panel.backups.remove(name) {
                    Some(_) => json!({ "done": true }),
                    None => failure("Backup not found"),
                }
            } else {
                panel.backups_reply()
            }
        }
        Some(_) => return None,
    };
    Some(reply)
}

fn catalog_entry(soft: &str) -> Option<(&'static str, &'static str, &'static str)> {
    CATALOG.iter().copied().find(|(id, _, _)| *id == soft)
}

fn list_scripts() -> Value {
    let scripts: serde_json::Map<String, Value> = CATALOG
        .iter()
        .map(|(id, name, version)| (id.to_string(), json!({ "name": name, "ver": version })))
        .collect();
    json!({ "time_taken": 0.5, "iscripts": scripts })
}

impl Panel {
    fn install(&mut self, soft: &str, version: &str, domain: Option<&str>, directory: Option<&str>) -> String {
        self.next_id += 1;
        let insid = format!("{soft}_{}", self.next_id);
        self.installations.insert(
            insid.clone(),
            Installation {
                soft: soft.to_string(),
                version: version.to_string(),
                domain: domain.unwrap_or("example.com").to_string(),
                directory: directory.unwrap_or_default().to_string(),
            },
        );
        insid
    }

    fn installations_reply(&self, updates_only: bool) -> Value {
        let mut by_script: BTreeMap<String, serde_json::Map<String, Value>> = BTreeMap::new();
        for (insid, install) in &self.installations {
            let latest = catalog_entry(&install.soft).map(|(_, _, v)| v);
            let has_update = latest.is_some_and(|v| v != install.version);
            if updates_only && !has_update {
                continue;
            }
            by_script.entry(install.soft.clone()).or_default().insert(
                insid.clone(),
                json!({
                    "softdomain": install.domain,
                    "softpath": install.directory,
                    "ver": install.version,
                }),
            );
        }
        json!({ "installations": by_script })
    }

    fn backups_reply(&self) -> Value {
        let mut by_install: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for (name, insid) in &self.backups {
            by_install
                .entry(insid.clone())
                .or_default()
                .push(json!({ "name": name }));
        }
        json!({ "backups": by_install })
    }
}
