use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{FormSession, OpenFormSessionRequest, SearchQueryUpdate},
    queries::product_queries,
    services::autofill_service,
};

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Form session {} not found", id))
}

pub async fn open_form_session(
    State(state): State<AppState>,
    Json(payload): Json<OpenFormSessionRequest>,
) -> Result<(StatusCode, Json<FormSession>)> {
    if let Some(record_id) = payload.record_id {
        if product_queries::find_by_id(&state.db, record_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Product with id {} not found",
                record_id
            )));
        }
    }

    let session = state.form_sessions.open(payload.record_id).await;

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_form_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormSession>> {
    let session = state
        .form_sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))?;

    let snapshot = session.lock().await.clone();

    Ok(Json(snapshot))
}

pub async fn update_search_query(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SearchQueryUpdate>,
) -> Result<Json<FormSession>> {
    let session = state
        .form_sessions
        .get(id)
        .await
        .ok_or_else(|| session_not_found(id))?;

    let mut session = session.lock().await;
    autofill_service::apply_search_query(&mut session, payload.value.unwrap_or_default(), &state.chat)
        .await?;

    Ok(Json(session.clone()))
}

pub async fn close_form_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !state.form_sessions.close(id).await {
        return Err(session_not_found(id));
    }

    Ok(StatusCode::NO_CONTENT)
}
