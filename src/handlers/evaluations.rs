// src/handlers/evaluations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::evaluation::{
        CreateEvaluationPayload, Evaluation, EvaluationDetail, EvaluationFilter, EvaluationPage,
        ObjectionPayload, PendingCount, ResolveObjectionPayload, ScoreItem, ScorePayload,
        UpdateStatusPayload,
    },
};

// =============================================================================
//  1. AGENDAMENTO E CONSULTA
// =============================================================================

// POST /api/evaluations
#[utoipa::path(
    post,
    path = "/api/evaluations",
    tag = "Evaluations",
    request_body = CreateEvaluationPayload,
    responses(
        (status = 201, description = "Avaliação agendada", body = Evaluation),
        (status = 403, description = "Apenas RH")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_evaluation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateEvaluationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let evaluation = app_state.evaluation_service.create(&user, payload).await?;

    Ok((StatusCode::CREATED, Json(evaluation)))
}

// GET /api/evaluations
#[utoipa::path(
    get,
    path = "/api/evaluations",
    tag = "Evaluations",
    params(EvaluationFilter),
    responses(
        (status = 200, description = "Página de avaliações", body = EvaluationPage)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_evaluations(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<EvaluationFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.evaluation_service.list(&filter).await?;
    Ok((StatusCode::OK, Json(page)))
}

// GET /api/evaluations/{id}
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}",
    tag = "Evaluations",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Avaliação com notas por item", body = EvaluationDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_evaluation(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.evaluation_service.get(id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// GET /api/evaluations/employee/{employee_id}
#[utoipa::path(
    get,
    path = "/api/evaluations/employee/{employee_id}",
    tag = "Evaluations",
    params(("employee_id" = i64, Path, description = "ID do colaborador")),
    responses(
        (status = 200, description = "Avaliações do colaborador", body = [Evaluation]),
        (status = 404, description = "Colaborador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employee_evaluations(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(employee_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = app_state.evaluation_service.list_for_employee(employee_id).await?;
    Ok((StatusCode::OK, Json(evaluations)))
}

// GET /api/evaluations/pending/{employee_id}
#[utoipa::path(
    get,
    path = "/api/evaluations/pending/{employee_id}",
    tag = "Evaluations",
    params(("employee_id" = i64, Path, description = "ID do colaborador")),
    responses(
        (status = 200, description = "Avaliações em pending ou self_evaluated", body = [Evaluation])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending_evaluations(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(employee_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = app_state.evaluation_service.pending_for_employee(employee_id).await?;
    Ok((StatusCode::OK, Json(evaluations)))
}

// GET /api/evaluations/pending-count
#[utoipa::path(
    get,
    path = "/api/evaluations/pending-count",
    tag = "Evaluations",
    responses(
        (status = 200, description = "Pendências do usuário conforme o papel", body = PendingCount)
    ),
    security(("api_jwt" = []))
)]
pub async fn pending_evaluation_count(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let count = app_state.evaluation_service.pending_count(&user).await?;
    Ok((StatusCode::OK, Json(count)))
}

// DELETE /api/evaluations/{id}
#[utoipa::path(
    delete,
    path = "/api/evaluations/{id}",
    tag = "Evaluations",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 204, description = "Avaliação e dependências removidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_evaluation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.evaluation_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. FLUXO DE STATUS
// =============================================================================

// PUT /api/evaluations/{id}/status
#[utoipa::path(
    put,
    path = "/api/evaluations/{id}/status",
    tag = "Evaluations",
    request_body = UpdateStatusPayload,
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Status atualizado", body = Evaluation),
        (status = 400, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let evaluation = app_state
        .evaluation_service
        .update_status(&user, id, payload.status, payload.total_score)
        .await?;

    Ok((StatusCode::OK, Json(evaluation)))
}

// POST /api/evaluations/{id}/objection
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/objection",
    tag = "Evaluations",
    request_body = ObjectionPayload,
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Objeção registrada", body = Evaluation)
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_objection(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ObjectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let evaluation = app_state
        .evaluation_service
        .submit_objection(&user, id, &payload.reason)
        .await?;

    Ok((StatusCode::OK, Json(evaluation)))
}

// PUT /api/evaluations/{id}/objection
#[utoipa::path(
    put,
    path = "/api/evaluations/{id}/objection",
    tag = "Evaluations",
    request_body = ResolveObjectionPayload,
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Objeção resolvida pelo RH", body = Evaluation)
    ),
    security(("api_jwt" = []))
)]
pub async fn handle_objection(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ResolveObjectionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let evaluation = app_state
        .evaluation_service
        .handle_objection(&user, id, payload.total_score, &payload.final_comment)
        .await?;

    Ok((StatusCode::OK, Json(evaluation)))
}

// =============================================================================
//  3. NOTAS POR ITEM
// =============================================================================

// PUT /api/scores/{score_id}/self
#[utoipa::path(
    put,
    path = "/api/scores/{score_id}/self",
    tag = "Scores",
    request_body = ScorePayload,
    params(("score_id" = i64, Path, description = "ID da nota do item")),
    responses(
        (status = 200, description = "Autoavaliação gravada", body = ScoreItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_self_score(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(score_id): Path<i64>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let score = app_state.evaluation_service.update_self_score(&user, score_id, payload).await?;
    Ok((StatusCode::OK, Json(score)))
}

// PUT /api/scores/{score_id}/manager
#[utoipa::path(
    put,
    path = "/api/scores/{score_id}/manager",
    tag = "Scores",
    request_body = ScorePayload,
    params(("score_id" = i64, Path, description = "ID da nota do item")),
    responses(
        (status = 200, description = "Nota do gestor gravada", body = ScoreItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_manager_score(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(score_id): Path<i64>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let score = app_state.evaluation_service.update_manager_score(&user, score_id, payload).await?;
    Ok((StatusCode::OK, Json(score)))
}

// PUT /api/scores/{score_id}/hr
#[utoipa::path(
    put,
    path = "/api/scores/{score_id}/hr",
    tag = "Scores",
    request_body = ScorePayload,
    params(("score_id" = i64, Path, description = "ID da nota do item")),
    responses(
        (status = 200, description = "Nota de RH gravada", body = ScoreItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_hr_score(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(score_id): Path<i64>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let score = app_state.evaluation_service.update_hr_score(&user, score_id, payload).await?;
    Ok((StatusCode::OK, Json(score)))
}

// PUT /api/scores/{score_id}/final
#[utoipa::path(
    put,
    path = "/api/scores/{score_id}/final",
    tag = "Scores",
    request_body = ScorePayload,
    params(("score_id" = i64, Path, description = "ID da nota do item")),
    responses(
        (status = 200, description = "Nota final ajustada", body = ScoreItem),
        (status = 403, description = "Apenas RH")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_final_score(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(score_id): Path<i64>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let score = app_state.evaluation_service.update_final_score(&user, score_id, payload).await?;
    Ok((StatusCode::OK, Json(score)))
}
