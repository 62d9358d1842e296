use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::SharedState;

pub fn operator_routes(state: SharedState) -> Router {
    Router::new()
        .route("/operadores/:code", get(get_operator))
        .with_state(state)
}

async fn get_operator(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let operator = state
        .run(move |s| shopfloor::operator::lookup(&s.db, &code))
        .await?;
    Ok(Json(json!({
        "success": true,
        "codigo": operator.code,
        "nome": operator.name,
    })))
}
