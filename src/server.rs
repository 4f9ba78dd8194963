use crate::{
    config::Config,
    errors::{AppError, AppResult},
    files::{DirectoryEntry, EntryKind, FileContent, FileOps},
    pg::{
        types::{QueryResult, Status, Tables},
        Console,
    },
    web,
};
use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{sync::Arc, time::Instant};
use tokio_util::io::{ReaderStream, StreamReader};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub files: Arc<FileOps>,
    pub console: Console,
}

pub async fn serve(cfg: Config, files: FileOps, console: Console) -> anyhow::Result<()> {
    let shared = AppState { cfg: Arc::new(cfg), files: Arc::new(files), console };

    let app = build_router(shared.clone());

    let addr = format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("shutdown complete");
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    let request_limit = shared.cfg.limits.max_request_kb * 1024;
    let upload_limit = shared.cfg.limits.max_upload_mb * 1024 * 1024;
    let origins: Vec<HeaderValue> = shared
        .cfg
        .server
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let mut router = Router::new()
        .route("/healthz", get(health))
        .route("/api/files", get(list_files).post(create_entry).delete(delete_entry))
        .route("/api/files/download", get(download))
        .route("/api/files/content", get(file_content))
        .route(
            "/api/files/upload",
            post(upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/pg/status", get(pg_status))
        .route("/api/pg/tables", get(pg_tables))
        .route("/api/pg/query", post(pg_query))
        .fallback(web::serve_asset)
        .layer(DefaultBodyLimit::max(request_limit))
        .layer(TraceLayer::new_for_http());
    if !origins.is_empty() {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }
    router.with_state(shared)
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct Listing {
    pub path: String,
    pub items: Vec<DirectoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct Done {
    pub ok: bool,
}

const DONE: Json<Done> = Json(Done { ok: true });

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

async fn list_files(
    State(state): State<AppState>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> AppResult<Json<Listing>> {
    let Query(q) = query?;
    let path = if q.path.is_empty() { "/".to_string() } else { q.path };
    let audit = Audit::start("list", &path);
    let items = audit.finish(state.files.list(&path).await)?;
    Ok(Json(Listing { path, items }))
}

async fn create_entry(
    State(state): State<AppState>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> AppResult<Json<Done>> {
    let Json(req) = body?;
    let audit = Audit::start("create", &req.path);
    audit.finish(state.files.create(&req.path, req.kind, req.content.as_deref()).await)?;
    Ok(DONE)
}

async fn delete_entry(
    State(state): State<AppState>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> AppResult<Json<Done>> {
    let Query(q) = query?;
    let audit = Audit::start("delete", &q.path);
    audit.finish(state.files.delete(&q.path).await)?;
    Ok(DONE)
}

async fn file_content(
    State(state): State<AppState>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> AppResult<Json<FileContent>> {
    let Query(q) = query?;
    let audit = Audit::start("read", &q.path);
    let content = audit.finish(state.files.read_content(&q.path).await)?;
    Ok(Json(content))
}

async fn download(
    State(state): State<AppState>,
    query: Result<Query<PathQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(q) = query?;
    let audit = Audit::start("download", &q.path);
    let dl = audit.finish(state.files.open_download(&q.path).await)?;

    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(dl.mime.essence_str()) {
        headers.insert(header::CONTENT_TYPE, v);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(dl.size));
    let disposition = content_disposition(&dl.file_name);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| AppError::Io("invalid file name".into()))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    let stream = ReaderStream::new(dl.file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Done>> {
    let mut multipart = multipart?;
    let mut dir: Option<String> = None;
    let mut stored = false;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("path") => dir = Some(field.text().await?),
            Some("file") => {
                // the target directory has to be known before the body is streamed
                let Some(dir) = dir.as_deref() else {
                    return Err(AppError::BadRequest("the path field must come before the file".into()));
                };
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_owned)
                    .ok_or_else(|| AppError::BadRequest("file part has no filename".into()))?;
                let audit = Audit::start("upload", &format!("{}/{}", dir.trim_end_matches('/'), file_name));
                let body = field.map_err(std::io::Error::other);
                let mut reader = StreamReader::new(Box::pin(body));
                audit.finish(state.files.upload(dir, &file_name, &mut reader).await)?;
                stored = true;
            }
            _ => {}
        }
    }
    if !stored {
        return Err(AppError::BadRequest("no file uploaded".into()));
    }
    Ok(DONE)
}

async fn pg_status(State(state): State<AppState>) -> Json<Status> {
    Json(state.console.status().await)
}

async fn pg_tables(State(state): State<AppState>) -> AppResult<Json<Tables>> {
    let audit = Audit::start("tables", "");
    let tables = audit.finish(state.console.list_tables().await)?;
    Ok(Json(Tables { tables }))
}

async fn pg_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> AppResult<Json<QueryResult>> {
    let Json(req) = body?;
    if req.query.trim().is_empty() {
        return Err(AppError::BadRequest("query is required".into()));
    }
    let audit = Audit::start("query", "");
    let result = audit.finish(state.console.run_query(&req.query).await)?;
    Ok(Json(result))
}

/// `attachment` disposition with an ASCII fallback name plus the RFC 5987
/// encoded UTF-8 name. The fallback swaps `"`, `\` and any non-ASCII or
/// control character for `_`; the `filename*` form keeps the exact name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(file_name.len());
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

/// One structured `audit` line per file or query operation.
struct Audit {
    request_id: String,
    op: &'static str,
    path: String,
    started: Instant,
}

impl Audit {
    fn start(op: &'static str, path: &str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            op,
            path: path.to_string(),
            started: Instant::now(),
        }
    }

    fn finish<T>(self, result: AppResult<T>) -> AppResult<T> {
        let code = match &result {
            Ok(_) => "OK",
            Err(e) => e.code(),
        };
        tracing::info!(
            request_id = %self.request_id,
            op = self.op,
            path = %self.path,
            code = code,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "audit"
        );
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
