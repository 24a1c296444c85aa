use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use edubot_core::{
    model::SessionUpdate,
    service::{ChatRequest, ExplanationRequest},
    ChatService,
};

use crate::error::AppError;

type AppState = State<Arc<ChatService>>;

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    message: String,
}

fn payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

pub async fn chat_handler(
    State(service): AppState,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = payload(body)?;
    if request.message.trim().is_empty() {
        return Err(AppError::MalformedPayload("No message provided".into()));
    }

    let reply = service.chat(&request).await?;
    Ok(Json(reply))
}

pub async fn search_handler(
    State(service): AppState,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = payload(body)?;
    if request.message.trim().is_empty() {
        return Err(AppError::MalformedPayload("No message provided".into()));
    }

    let answer = service.search(&request.message).await?;
    Ok(Json(json!({ "results": [answer] })))
}

pub async fn explain_handler(
    State(service): AppState,
    body: Result<Json<ExplanationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = payload(body)?;
    let explanation = service.explain(&request).await?;
    Ok(Json(explanation))
}

pub async fn record_progress_handler(
    State(service): AppState,
    body: Result<Json<SessionUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let update = payload(body)?;
    service.record_progress(&update)?;
    Ok(Json(json!({
        "status": "success",
        "message": "Progress updated successfully"
    })))
}

pub async fn get_progress_handler(
    State(service): AppState,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = service.progress(&student_id)?;
    Ok(Json(record))
}
