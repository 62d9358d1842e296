//! Sequencing, STEP download and apontamento endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use shopfloor::requests::{
    validate_operator_code, ConfirmBatchRequest, FinishRequest, PauseRequest, StartRequest,
    SubmitRequest,
};
use shopfloor::{apontamento, sequencing, ShopfloorError};

use crate::error::ApiError;
use crate::state::SharedState;

pub fn laser_routes(state: SharedState) -> Router {
    Router::new()
        .route("/sequencing", get(get_sequencing))
        .route("/sequencing_v2", get(get_sequencing))
        .route("/download_step", get(download_step))
        .route("/submit_apontamento", post(submit_apontamento))
        .route("/apontamento/start", post(start_apontamento))
        .route("/apontamento/pause", post(pause_apontamento))
        .route("/apontamento/finish", post(finish_apontamento))
        .route("/apontamento/list/:job_id", get(list_apontamentos))
        .route("/apontamento/confirm_batch", post(confirm_batch))
        .route("/of/:job_id/details", get(job_details))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SequencingQuery {
    operator_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsQuery {
    empresa: Option<String>,
    codseq: Option<String>,
}

async fn get_sequencing(
    State(state): State<SharedState>,
    query: Result<Query<SequencingQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let operator_code = validate_operator_code(query.operator_code.as_deref())?.to_string();

    let jobs = state
        .run(move |s| sequencing::sequencing(&s.db, &operator_code))
        .await?;
    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

async fn download_step(
    State(state): State<SharedState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let step = state
        .run(move |s| shopfloor::resolve_step_file(&s.downloads, query.file_path.as_deref()))
        .await?;

    let bytes = tokio::fs::read(&step.path).await.map_err(|e| {
        ApiError::Internal(format!("Failed to read {}: {}", step.path.display(), e))
    })?;
    tracing::info!(file = %step.path.display(), size = bytes.len(), "Serving STEP file");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        step.file_name.replace(['"', '\\'], "_")
    );
    Ok((
        [
            (header::CONTENT_TYPE, step.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn submit_apontamento(
    State(state): State<SharedState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let submit = payload.validate()?;

    state.run(move |s| apontamento::submit(&s.db, &submit)).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Apontamento registered successfully",
    })))
}

async fn start_apontamento(
    State(state): State<SharedState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let start = payload.validate()?;

    let id = state
        .run(move |s| apontamento::start(&s.db, &start))
        .await?;
    Ok(Json(json!({ "success": true, "apontamento_id": id })))
}

async fn pause_apontamento(
    State(state): State<SharedState>,
    payload: Result<Json<PauseRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let id = payload.validate()?;

    state.run(move |s| apontamento::pause(&s.db, id)).await?;
    Ok(Json(json!({ "success": true })))
}

async fn finish_apontamento(
    State(state): State<SharedState>,
    payload: Result<Json<FinishRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let (id, quantity) = payload.validate()?;

    state
        .run(move |s| apontamento::finish(&s.db, id, quantity))
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn list_apontamentos(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let rows = state
        .run(move |s| apontamento::list(&s.db, &job_id))
        .await?;
    Ok(Json(json!({
        "success": true,
        "total": rows.len(),
        "apontamentos": rows,
    })))
}

async fn confirm_batch(
    State(state): State<SharedState>,
    payload: Result<Json<ConfirmBatchRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload?;
    let header = payload.validate()?;
    let items = payload.items;

    let processed = state
        .run(move |s| Ok(apontamento::confirm_batch(&s.db, &header, &items)))
        .await?;
    Ok(Json(json!({
        "success": true,
        "processed": processed,
        "message": format!("{} apontamentos registered successfully", processed),
    })))
}

async fn job_details(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
    query: Result<Query<DetailsQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let (company, sequence) = match (query.empresa, query.codseq) {
        (Some(e), Some(c)) if !e.trim().is_empty() && !c.trim().is_empty() => (e, c),
        _ => {
            return Err(ShopfloorError::validation("empresa and codseq are required").into());
        }
    };

    let details = state
        .run(move |s| sequencing::full_details(&s.db, &job_id, &company, &sequence))
        .await?;
    Ok(Json(json!({ "success": true, "data": details })))
}
