// src/handlers/shares.rs

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
    models::{
        evaluation::ScorePayload,
        share::{CreateSharePayload, EvaluationShare, ShareItemSummary, ShareScore},
    },
};

// POST /api/evaluations/{id}/shares
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/shares",
    tag = "Shares",
    request_body = CreateSharePayload,
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 201, description = "Avaliação compartilhada", body = [EvaluationShare])
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shares(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(evaluation_id): Path<i64>,
    Json(payload): Json<CreateSharePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let shares = app_state.share_service.create(&user, evaluation_id, payload).await?;
    Ok((StatusCode::CREATED, Json(shares)))
}

// GET /api/evaluations/{id}/shares
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/shares",
    tag = "Shares",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Compartilhamentos da avaliação", body = [EvaluationShare])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_for_evaluation(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(evaluation_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let shares = app_state.share_service.list_for_evaluation(evaluation_id).await?;
    Ok((StatusCode::OK, Json(shares)))
}

// GET /api/evaluations/{id}/shares/summary
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/shares/summary",
    tag = "Shares",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Média e notas por item", body = [ShareItemSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn summary(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(evaluation_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.share_service.summary(evaluation_id).await?;
    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/shares/mine
#[utoipa::path(
    get,
    path = "/api/shares/mine",
    tag = "Shares",
    responses(
        (status = 200, description = "Compartilhamentos recebidos", body = [EvaluationShare])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let shares = app_state.share_service.list_mine(&user).await?;
    Ok((StatusCode::OK, Json(shares)))
}

// GET /api/shares/{id}
#[utoipa::path(
    get,
    path = "/api/shares/{id}",
    tag = "Shares",
    params(("id" = i64, Path, description = "ID do compartilhamento")),
    responses(
        (status = 200, description = "Detalhe (somente destinatário)", body = EvaluationShare)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_share(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let share = app_state.share_service.detail(&user, id).await?;
    Ok((StatusCode::OK, Json(share)))
}

// DELETE /api/shares/{id}
#[utoipa::path(
    delete,
    path = "/api/shares/{id}",
    tag = "Shares",
    params(("id" = i64, Path, description = "ID do compartilhamento")),
    responses(
        (status = 204, description = "Compartilhamento removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_share(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.share_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/shares/{id}/scores
#[utoipa::path(
    get,
    path = "/api/shares/{id}/scores",
    tag = "Shares",
    params(("id" = i64, Path, description = "ID do compartilhamento")),
    responses(
        (status = 200, description = "Notas do destinatário", body = [ShareScore])
    ),
    security(("api_jwt" = []))
)]
pub async fn get_scores(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let scores = app_state.share_service.scores(&user, id).await?;
    Ok((StatusCode::OK, Json(scores)))
}

// PUT /api/shares/{id}/scores/{item_id}
#[utoipa::path(
    put,
    path = "/api/shares/{id}/scores/{item_id}",
    tag = "Shares",
    request_body = ScorePayload,
    params(
        ("id" = i64, Path, description = "ID do compartilhamento"),
        ("item_id" = i64, Path, description = "ID do item de KPI")
    ),
    responses(
        (status = 200, description = "Nota gravada", body = ShareScore)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_score(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, item_id)): Path<(i64, i64)>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let score = app_state.share_service.update_score(&user, id, item_id, payload).await?;
    Ok((StatusCode::OK, Json(score)))
}

// PUT /api/shares/{id}/submit
#[utoipa::path(
    put,
    path = "/api/shares/{id}/submit",
    tag = "Shares",
    params(("id" = i64, Path, description = "ID do compartilhamento")),
    responses(
        (status = 200, description = "Notas enviadas", body = EvaluationShare)
    ),
    security(("api_jwt" = []))
)]
pub async fn submit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let share = app_state.share_service.submit(&user, id).await?;
    Ok((StatusCode::OK, Json(share)))
}
