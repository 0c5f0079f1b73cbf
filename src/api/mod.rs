use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::models::CourseEntry;
use crate::services::conflict;
use crate::services::export::{self, ExportFormat, ExportJob, ExportRequest};
use crate::services::statistics::UsageStatistics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct MessageResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ConflictRequest {
    #[serde(default)]
    courses: Option<Vec<CourseEntry>>,
}

#[derive(Debug, Serialize)]
struct ConflictResponse {
    conflicts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackExportRequest {
    #[serde(rename = "type")]
    kind: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/courses",
            get(list_courses).post(create_course).delete(clear_courses),
        )
        .route("/api/courses/conflicts", post(check_conflicts))
        .route("/api/export/excel", post(export_excel))
        .route("/api/export/word", post(export_word))
        .route("/api/statistics", get(get_statistics))
        .route("/api/statistics/export", post(track_export))
        .route("/api/statistics/import", post(track_import))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_courses(State(state): State<AppState>) -> Json<Vec<CourseEntry>> {
    Json(state.courses.fetch_courses().await)
}

async fn create_course(
    State(state): State<AppState>,
    payload: Result<Json<CourseEntry>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(entry) = payload?;
    entry.validate()?;

    let total = state.courses.insert_course(entry).await;
    info!("course added, {} stored", total);
    Ok(Json(MessageResponse {
        success: true,
        message: "课程添加成功".to_string(),
    }))
}

async fn clear_courses(State(state): State<AppState>) -> StatusCode {
    let removed = state.courses.clear().await;
    info!("cleared {} courses", removed);
    StatusCode::NO_CONTENT
}

async fn check_conflicts(
    payload: Result<Json<ConflictRequest>, JsonRejection>,
) -> (StatusCode, Json<ConflictResponse>) {
    match payload {
        Ok(Json(req)) => {
            let courses = req.courses.unwrap_or_default();
            let conflicts = conflict::detect(&courses);
            info!(
                "conflict check over {} courses found {}",
                courses.len(),
                conflicts.len()
            );
            (
                StatusCode::OK,
                Json(ConflictResponse {
                    conflicts: conflicts.messages(),
                    error: None,
                }),
            )
        }
        Err(rejection) => {
            warn!("rejected conflict check: {}", rejection.body_text());
            (
                StatusCode::BAD_REQUEST,
                Json(ConflictResponse {
                    conflicts: Vec::new(),
                    error: Some(rejection.body_text()),
                }),
            )
        }
    }
}

async fn export_excel(
    State(state): State<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    export_schedule(state, ExportFormat::Excel, payload).await
}

async fn export_word(
    State(state): State<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    export_schedule(state, ExportFormat::Word, payload).await
}

async fn export_schedule(
    state: AppState,
    format: ExportFormat,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let job = ExportJob::prepare(req)?;
    let file_name = job.file_name(format);

    let bytes = tokio::task::spawn_blocking(move || export::render(format, &job))
        .await
        .map_err(|e| {
            error!("export task panicked: {}", e);
            AppError::Internal
        })??;
    info!("exported {} ({} bytes)", file_name, bytes.len());

    if let Err(e) = state.stats.track_export(format.stats_key()).await {
        warn!("failed to record {} export: {}", format.stats_key(), e);
    }

    Ok(attachment(format, &file_name, bytes))
}

fn attachment(format: ExportFormat, file_name: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_file_name(file_name, format),
        percent_encode(file_name)
    );
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Plain `filename=` value for clients that ignore `filename*`.
fn ascii_file_name(file_name: &str, format: ExportFormat) -> String {
    let plain = file_name
        .chars()
        .all(|c| (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ');
    if plain {
        file_name.to_string()
    } else {
        format!("timetable.{}", format.extension())
    }
}

/// RFC 5987 `value-chars` encoding.
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => encoded.push(char::from(byte)),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

async fn get_statistics(State(state): State<AppState>) -> Json<UsageStatistics> {
    Json(state.stats.snapshot().await)
}

async fn track_export(
    State(state): State<AppState>,
    payload: Result<Json<TrackExportRequest>, JsonRejection>,
) -> Result<Json<UsageStatistics>, AppError> {
    let Json(req) = payload?;
    let stats = state.stats.track_export(&req.kind).await.map_err(|e| {
        error!("failed to record {} export: {}", req.kind, e);
        AppError::Internal
    })?;
    Ok(Json(stats))
}

async fn track_import(State(state): State<AppState>) -> Result<Json<UsageStatistics>, AppError> {
    let stats = state.stats.track_import().await.map_err(|e| {
        error!("failed to record import: {}", e);
        AppError::Internal
    })?;
    Ok(Json(stats))
}
