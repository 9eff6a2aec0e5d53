// src/handlers/settings.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::deadline::{CustomDeadlinesPayload, DeadlineRules, DeadlineSet},
};

// GET /api/settings/deadline-rules
#[utoipa::path(
    get,
    path = "/api/settings/deadline-rules",
    tag = "Settings",
    responses(
        (status = 200, description = "Regras de prazo (padrões quando não configuradas)", body = DeadlineRules)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_deadline_rules(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let rules = app_state.deadline_service.rules().await?;
    Ok((StatusCode::OK, Json(rules)))
}

// PUT /api/settings/deadline-rules
#[utoipa::path(
    put,
    path = "/api/settings/deadline-rules",
    tag = "Settings",
    request_body = DeadlineRules,
    responses(
        (status = 200, description = "Regras atualizadas", body = DeadlineRules)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_deadline_rules(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<DeadlineRules>,
) -> Result<impl IntoResponse, AppError> {
    let rules = app_state.deadline_service.update_rules(&user, payload).await?;
    Ok((StatusCode::OK, Json(rules)))
}

// GET /api/evaluations/{id}/deadlines
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/deadlines",
    tag = "Settings",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Prazos calculados para a avaliação", body = DeadlineSet)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_evaluation_deadlines(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deadlines = app_state.deadline_service.for_evaluation(id).await?;
    Ok((StatusCode::OK, Json(deadlines)))
}

// POST /api/evaluations/{id}/deadlines/validate
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/deadlines/validate",
    tag = "Settings",
    request_body = CustomDeadlinesPayload,
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Prazos personalizados com resultado da validação", body = DeadlineSet)
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_custom_deadlines(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<CustomDeadlinesPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let deadlines = app_state.deadline_service.validate_custom(id, &payload).await?;
    Ok((StatusCode::OK, Json(deadlines)))
}
