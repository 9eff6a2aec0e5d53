// src/handlers/performance_rule.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        evaluation::EvaluationDetail,
        performance_rule::{PerformanceRule, PerformanceRulePayload},
    },
};

// GET /api/performance-rule
#[utoipa::path(
    get,
    path = "/api/performance-rule",
    tag = "Performance Rule",
    responses(
        (status = 200, description = "Regra vigente (padrão desabilitada na primeira leitura)", body = PerformanceRule)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_rule(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let rule = app_state.rule_service.get_rule().await?;
    Ok((StatusCode::OK, Json(rule)))
}

// PUT /api/performance-rule
#[utoipa::path(
    put,
    path = "/api/performance-rule",
    tag = "Performance Rule",
    request_body = PerformanceRulePayload,
    responses(
        (status = 200, description = "Regra atualizada", body = PerformanceRule),
        (status = 400, description = "Pesos inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_rule(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PerformanceRulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let rule = app_state.rule_service.update_rule(&user, payload.into()).await?;
    Ok((StatusCode::OK, Json(rule)))
}

// POST /api/evaluations/{id}/apply-rule
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/apply-rule",
    tag = "Performance Rule",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Notas de RH recalculadas", body = EvaluationDetail)
    ),
    security(("api_jwt" = []))
)]
pub async fn apply_rule(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if app_state.rule_service.apply_on_request(&user, id).await?.is_none() {
        tracing::info!(evaluation_id = id, "Regra desabilitada, nada a recalcular");
    }

    let detail = app_state.evaluation_service.get(id).await?;
    Ok((StatusCode::OK, Json(detail)))
}
