//! Integration tests for the HTTP gateway and the commands built on it.
//!
//! A fake collections API is served by axum on a background runtime; the
//! blocking client under test talks to it over a real socket.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use docsync::commands::{self, get::GetArgs, update::UpdateArgs};
use docsync::{CliError, Connection, HttpStore, Mirror};
use docsync_engine::{DocumentStore, EntryQuery, Error, Format, Outcome};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeApi {
    collections: BTreeMap<String, Vec<Value>>,
    last_revision: i64,
    saves: Vec<Value>,
    fail_saves: bool,
}

type Shared = Arc<Mutex<FakeApi>>;
type ApiResult = Result<Json<Value>, (StatusCode, String)>;

fn authorize(params: &HashMap<String, String>) -> Result<(), (StatusCode, String)> {
    match params.get("token") {
        Some(token) if token == TOKEN => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
    }
}

async fn list_collections(
    State(api): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    authorize(&params)?;
    let api = api.lock().unwrap();
    Ok(Json(json!(api.collections.keys().collect::<Vec<_>>())))
}

async fn get_entries(
    State(api): State<Shared>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> ApiResult {
    authorize(&params)?;
    let api = api.lock().unwrap();
    let entries = api
        .collections
        .get(&collection)
        .ok_or((StatusCode::NOT_FOUND, "Collection not found".to_string()))?;

    let wanted = body.pointer("/filter/_id").cloned();
    let limit = body
        .get("limit")
        .and_then(Value::as_u64)
        .map(|l| l as usize)
        .unwrap_or(usize::MAX);
    let matching: Vec<_> = entries
        .iter()
        .filter(|entry| wanted.as_ref().map_or(true, |id| entry.get("_id") == Some(id)))
        .take(limit)
        .cloned()
        .collect();

    Ok(Json(json!({ "entries": matching })))
}

async fn save_entry(
    State(api): State<Shared>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> ApiResult {
    authorize(&params)?;
    let mut api = api.lock().unwrap();
    if api.fail_saves {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()));
    }

    let mut data = body
        .get("data")
        .cloned()
        .ok_or((StatusCode::BAD_REQUEST, "missing data".to_string()))?;
    api.saves.push(data.clone());

    api.last_revision += 1;
    data["_modified"] = json!(api.last_revision);
    let id = data.get("_id").cloned();
    let entries = api.collections.entry(collection).or_default();
    entries.retain(|entry| entry.get("_id") != id.as_ref());
    entries.push(data.clone());

    Ok(Json(json!({ "data": data })))
}

fn spawn_api(api: Shared) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/api/collections/listCollections", get(list_collections))
        .route("/api/collections/get/{collection}", post(get_entries))
        .route("/api/collections/save/{collection}", post(save_entry))
        .with_state(api);

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", addr)
}

struct Harness {
    api: Shared,
    base_url: String,
    store: HttpStore,
}

fn harness() -> Harness {
    let mut fake = FakeApi {
        last_revision: 3,
        ..Default::default()
    };
    fake.collections.insert(
        "posts".into(),
        vec![
            json!({"_id": "a", "_modified": 3, "title": "Old", "tags": ["x"]}),
            json!({"_id": "b", "_modified": 2, "title": "Other"}),
        ],
    );
    fake.collections.insert("pages".into(), vec![]);

    let api = Arc::new(Mutex::new(fake));
    let base_url = spawn_api(api.clone());
    let store = HttpStore::new(Connection {
        base_url: base_url.clone(),
        token: TOKEN.into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    Harness {
        api,
        base_url,
        store,
    }
}

fn write_edit(dir: &std::path::Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("edit.json");
    std::fs::write(&path, text).unwrap();
    path
}

// ============================================================================
// Gateway
// ============================================================================

#[test]
fn lists_collections() {
    let h = harness();
    assert_eq!(h.store.list_collections().unwrap(), vec!["pages", "posts"]);
}

#[test]
fn fetches_entries_and_documents() {
    let h = harness();
    let entries = h
        .store
        .fetch_entries("posts", &EntryQuery::new())
        .unwrap();
    assert_eq!(entries.len(), 2);

    let doc = h.store.fetch_document("posts", "b").unwrap();
    assert_eq!(doc.id(), "b");
    assert_eq!(doc.revision(), 2);
}

#[test]
fn missing_document_is_not_found() {
    let h = harness();
    assert_eq!(
        h.store.fetch_document("posts", "zzz").unwrap_err(),
        Error::NotFound {
            collection: "posts".into(),
            id: "zzz".into()
        }
    );
}

#[test]
fn error_status_carries_body() {
    let h = harness();
    let store = HttpStore::new(Connection {
        base_url: h.base_url.clone(),
        token: "wrong".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    assert_eq!(
        store.list_collections().unwrap_err(),
        Error::Transport("API error 401: Unauthorized".into())
    );
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = HttpStore::new(Connection {
        base_url: format!("http://{}", addr),
        token: TOKEN.into(),
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    assert!(matches!(store.list_collections(), Err(Error::Transport(_))));
}

// ============================================================================
// Commands over HTTP
// ============================================================================

#[test]
fn get_then_update_round_trip() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(dir.path());

    let mut out = Vec::new();
    let path = commands::get::run(
        &h.store,
        &mirror,
        GetArgs {
            collection: "posts",
            id: "a",
            format: Format::Yaml,
            output: None,
        },
        &mut out,
    )
    .unwrap();

    let pulled = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, pulled.replace("title: Old", "title: New")).unwrap();

    let mut out = Vec::new();
    let outcome = commands::update::run(
        &h.store,
        &mirror,
        UpdateArgs {
            collection: "posts",
            id: Some("a"),
            format: Some(Format::Yaml),
            tempfile: None,
            dry_run: false,
        },
        &mut out,
    )
    .unwrap();

    assert_eq!(
        outcome,
        Outcome::Committed {
            id: "a".into(),
            from: 3,
            to: 4
        }
    );
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("~ title\n  - \"Old\"\n  + \"New\"\n"));
    assert!(printed.ends_with("updated a: rev 3 -> 4\n"));

    let api = h.api.lock().unwrap();
    assert_eq!(api.saves.len(), 1);
    assert_eq!(
        api.saves[0],
        json!({"_id": "a", "_modified": 3, "title": "New", "tags": ["x"]})
    );
}

#[test]
fn stale_edit_is_refused() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    let edit = write_edit(dir.path(), r#"{"_id": "a", "_modified": 1, "title": "New", "tags": ["x"]}"#);

    let mut out = Vec::new();
    let err = commands::update::run(
        &h.store,
        &Mirror::new(dir.path()),
        UpdateArgs {
            collection: "posts",
            id: None,
            format: None,
            tempfile: Some(&edit),
            dry_run: false,
        },
        &mut out,
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "document changed on server (server rev 3 != local rev 1)"
    );
    assert!(String::from_utf8(out).unwrap().contains("~ title"));
    assert!(h.api.lock().unwrap().saves.is_empty());
}

#[test]
fn dry_run_names_the_save_endpoint() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    let edit = write_edit(dir.path(), r#"{"_id": "a", "_modified": 3, "title": "Old", "tags": ["x", "y"]}"#);

    let mut out = Vec::new();
    let outcome = commands::update::run(
        &h.store,
        &Mirror::new(dir.path()),
        UpdateArgs {
            collection: "posts",
            id: None,
            format: None,
            tempfile: Some(&edit),
            dry_run: true,
        },
        &mut out,
    )
    .unwrap();

    assert!(matches!(outcome, Outcome::Planned(_)));
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("+ tags[1] (array of 1)\n  + \"y\"\n"));
    assert!(printed.ends_with(
        "[DRY-RUN] Would update collection 'posts' document 'a' (rev 3) via /api/collections/save/posts\n"
    ));
    assert!(h.api.lock().unwrap().saves.is_empty());
}

#[test]
fn failed_save_is_reported_after_the_diff() {
    let h = harness();
    h.api.lock().unwrap().fail_saves = true;
    let dir = tempfile::tempdir().unwrap();
    let edit = write_edit(dir.path(), r#"{"_id": "a", "_modified": 3, "title": "New", "tags": ["x"]}"#);

    let mut out = Vec::new();
    let err = commands::update::run(
        &h.store,
        &Mirror::new(dir.path()),
        UpdateArgs {
            collection: "posts",
            id: None,
            format: None,
            tempfile: Some(&edit),
            dry_run: false,
        },
        &mut out,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        CliError::Engine(Error::Transport(ref msg)) if msg == "API error 500: boom"
    ));
    assert!(String::from_utf8(out).unwrap().contains("~ title"));
}

#[test]
fn list_command_over_http() {
    let h = harness();
    let mut out = Vec::new();
    commands::list::run(&h.store, Some("posts"), None, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a - Old\nb - Other\n");
}
