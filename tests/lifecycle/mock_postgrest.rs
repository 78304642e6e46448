//! Mock PostgREST table store for lifecycle tests.
//!
//! Serves `/rest/v1/{table}` from in-memory tables on an ephemeral port.
//! Each verb can be switched to answer 503 so fallback paths can be driven.

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Which verbs currently fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub reads: bool,
    pub inserts: bool,
    pub updates: bool,
    pub deletes: bool,
}

/// In-memory tables plus a request log.
#[derive(Default)]
pub struct MockState {
    pub tables: HashMap<String, Vec<Value>>,
    pub failures: Failures,
    /// `"METHOD table"` for every request received
    pub requests: Vec<String>,
}

fn eq_value(raw: &str) -> Option<&str> {
    raw.strip_prefix("eq.")
}

fn field_text(row: &Value, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches_filters(row: &Value, filters: &[(&String, &str)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| field_text(row, field).as_deref() == Some(*expected))
}

fn unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "message": "mock table store unavailable"
    }))
}

async fn table_handler(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
    body: web::Bytes,
    state: web::Data<Arc<Mutex<MockState>>>,
) -> HttpResponse {
    let table = path.into_inner();
    let mut state = state.lock().unwrap();
    state.requests.push(format!("{} {}", req.method(), table));

    let filters: Vec<(&String, &str)> = query
        .iter()
        .filter(|(name, _)| name.as_str() != "select" && name.as_str() != "order")
        .filter_map(|(name, value)| eq_value(value).map(|v| (name, v)))
        .collect();

    match req.method().as_str() {
        "GET" => {
            if state.failures.reads {
                return unavailable();
            }
            let mut rows: Vec<Value> = state
                .tables
                .get(&table)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| matches_filters(row, &filters))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if let Some(field) = query.get("order").and_then(|o| o.strip_suffix(".desc")) {
                rows.sort_by(|a, b| field_text(b, field).cmp(&field_text(a, field)));
            }
            HttpResponse::Ok().json(rows)
        }
        "POST" => {
            if state.failures.inserts {
                return unavailable();
            }
            let incoming: Vec<Map<String, Value>> = match serde_json::from_slice(&body) {
                Ok(rows) => rows,
                Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
            };
            let now = Value::String(Utc::now().to_rfc3339());
            let mut stored = Vec::new();
            for mut row in incoming {
                row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
                row.insert("created_at".into(), now.clone());
                if table == "projects" {
                    row.insert("updated_at".into(), now.clone());
                }
                stored.push(Value::Object(row));
            }
            state
                .tables
                .entry(table)
                .or_default()
                .extend(stored.iter().cloned());
            HttpResponse::Created().json(stored)
        }
        "PATCH" => {
            if state.failures.updates {
                return unavailable();
            }
            let patch: Map<String, Value> = match serde_json::from_slice(&body) {
                Ok(patch) => patch,
                Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
            };
            let mut updated = Vec::new();
            if let Some(rows) = state.tables.get_mut(&table) {
                for row in rows.iter_mut().filter(|row| matches_filters(row, &filters)) {
                    if let Value::Object(fields) = row {
                        fields.extend(patch.clone());
                    }
                    updated.push(row.clone());
                }
            }
            HttpResponse::Ok().json(updated)
        }
        "DELETE" => {
            if state.failures.deletes {
                return unavailable();
            }
            if let Some(rows) = state.tables.get_mut(&table) {
                rows.retain(|row| !matches_filters(row, &filters));
            }
            HttpResponse::NoContent().finish()
        }
        _ => HttpResponse::MethodNotAllowed().finish(),
    }
}

/// Mock table store running on an ephemeral port.
pub struct MockPostgrest {
    pub base_url: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockPostgrest {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .route("/rest/v1/{table}", web::route().to(table_handler))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Lives until the test runtime shuts down
        tokio::spawn(server);

        MockPostgrest { base_url, state }
    }

    pub fn set_failures(&self, failures: Failures) {
        self.state.lock().unwrap().failures = failures;
    }

    pub fn fail_everything(&self) {
        self.set_failures(Failures {
            reads: true,
            inserts: true,
            updates: true,
            deletes: true,
        });
    }

    /// Rows currently stored remotely in `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// How many requests with this method hit `table`.
    pub fn request_count(&self, method: &str, table: &str) -> usize {
        let wanted = format!("{} {}", method, table);
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| **r == wanted)
            .count()
    }
}
