// src/handlers/invitations.rs

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
    models::{
        evaluation::{PendingCount, ScorePayload},
        invitation::{
            CreateInvitationPayload, Invitation, InvitationStatusFilter, InvitationWithScores, InvitedScore,
        },
    },
};

// POST /api/evaluations/{id}/invitations
#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/invitations",
    tag = "Invitations",
    request_body = CreateInvitationPayload,
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 201, description = "Convites criados (já convidados são ignorados)", body = [Invitation])
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invitations(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(evaluation_id): Path<i64>,
    Json(payload): Json<CreateInvitationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state.invitation_service.create(&user, evaluation_id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/evaluations/{id}/invitations
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/invitations",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID da avaliação")),
    responses(
        (status = 200, description = "Convites da avaliação", body = [Invitation])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_for_evaluation(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(evaluation_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invitations = app_state.invitation_service.list_for_evaluation(evaluation_id).await?;
    Ok((StatusCode::OK, Json(invitations)))
}

// GET /api/invitations/mine
#[utoipa::path(
    get,
    path = "/api/invitations/mine",
    tag = "Invitations",
    params(InvitationStatusFilter),
    responses(
        (status = 200, description = "Convites recebidos", body = [Invitation])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<InvitationStatusFilter>,
) -> Result<impl IntoResponse, AppError> {
    let invitations = app_state.invitation_service.list_mine(&user, filter.status).await?;
    Ok((StatusCode::OK, Json(invitations)))
}

// GET /api/invitations/sent
#[utoipa::path(
    get,
    path = "/api/invitations/sent",
    tag = "Invitations",
    params(InvitationStatusFilter),
    responses(
        (status = 200, description = "Convites enviados (avaliados ativos)", body = [Invitation])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sent(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<InvitationStatusFilter>,
) -> Result<impl IntoResponse, AppError> {
    let invitations = app_state.invitation_service.list_sent(&user, filter.status).await?;
    Ok((StatusCode::OK, Json(invitations)))
}

// GET /api/invitations/pending-count
#[utoipa::path(
    get,
    path = "/api/invitations/pending-count",
    tag = "Invitations",
    responses(
        (status = 200, description = "Convites recebidos aguardando resposta", body = PendingCount)
    ),
    security(("api_jwt" = []))
)]
pub async fn pending_count(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let count = app_state.invitation_service.pending_count(&user).await?;
    Ok((StatusCode::OK, Json(count)))
}

// GET /api/invitations/{id}
#[utoipa::path(
    get,
    path = "/api/invitations/{id}",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Convite com as notas", body = InvitationWithScores),
        (status = 403, description = "Apenas o convidado ou o RH")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_invitation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.invitation_service.details(&user, id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/invitations/{id}/accept
#[utoipa::path(
    put,
    path = "/api/invitations/{id}/accept",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Convite aceito", body = Invitation)
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_invitation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = app_state.invitation_service.accept(&user, id).await?;
    Ok((StatusCode::OK, Json(invitation)))
}

// PUT /api/invitations/{id}/decline
#[utoipa::path(
    put,
    path = "/api/invitations/{id}/decline",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Convite recusado", body = Invitation)
    ),
    security(("api_jwt" = []))
)]
pub async fn decline_invitation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = app_state.invitation_service.decline(&user, id).await?;
    Ok((StatusCode::OK, Json(invitation)))
}

// PUT /api/invitations/{id}/complete
#[utoipa::path(
    put,
    path = "/api/invitations/{id}/complete",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Convite concluído", body = Invitation)
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_invitation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = app_state.invitation_service.complete(&user, id).await?;
    Ok((StatusCode::OK, Json(invitation)))
}

// PUT /api/invitations/{id}/cancel
#[utoipa::path(
    put,
    path = "/api/invitations/{id}/cancel",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Convite cancelado", body = Invitation)
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_invitation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = app_state.invitation_service.cancel(&user, id).await?;
    Ok((StatusCode::OK, Json(invitation)))
}

// PUT /api/invitations/{id}/reinvite
#[utoipa::path(
    put,
    path = "/api/invitations/{id}/reinvite",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Convite reenviado", body = Invitation)
    ),
    security(("api_jwt" = []))
)]
pub async fn reinvite(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = app_state.invitation_service.reinvite(&user, id).await?;
    Ok((StatusCode::OK, Json(invitation)))
}

// DELETE /api/invitations/{id}
#[utoipa::path(
    delete,
    path = "/api/invitations/{id}",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 204, description = "Convite e notas removidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_invitation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.invitation_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/invitations/{id}/scores
#[utoipa::path(
    get,
    path = "/api/invitations/{id}/scores",
    tag = "Invitations",
    params(("id" = i64, Path, description = "ID do convite")),
    responses(
        (status = 200, description = "Notas do convidado", body = [InvitedScore])
    ),
    security(("api_jwt" = []))
)]
pub async fn get_scores(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let scores = app_state.invitation_service.scores(&user, id).await?;
    Ok((StatusCode::OK, Json(scores)))
}

// PUT /api/invited-scores/{score_id}
#[utoipa::path(
    put,
    path = "/api/invited-scores/{score_id}",
    tag = "Invitations",
    request_body = ScorePayload,
    params(("score_id" = i64, Path, description = "ID da nota do convidado")),
    responses(
        (status = 200, description = "Nota do convidado gravada", body = InvitedScore)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_score(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(score_id): Path<i64>,
    Json(payload): Json<ScorePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let score = app_state.invitation_service.update_score(&user, score_id, payload).await?;
    Ok((StatusCode::OK, Json(score)))
}
