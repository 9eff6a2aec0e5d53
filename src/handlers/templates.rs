// src/handlers/templates.rs

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
    models::template::{ItemPayload, KpiItem, KpiTemplate, TemplateDetail, TemplatePayload},
};

// =============================================================================
//  1. MODELOS
// =============================================================================

// POST /api/templates
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    request_body = TemplatePayload,
    responses(
        (status = 201, description = "Modelo criado", body = KpiTemplate),
        (status = 403, description = "Apenas RH")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let template = app_state.template_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

// GET /api/templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    responses(
        (status = 200, description = "Modelos cadastrados", body = [KpiTemplate])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let templates = app_state.template_service.list().await?;
    Ok((StatusCode::OK, Json(templates)))
}

// GET /api/templates/{id}
#[utoipa::path(
    get,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Modelo com seus itens", body = TemplateDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.template_service.get(id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/templates/{id}
#[utoipa::path(
    put,
    path = "/api/templates/{id}",
    tag = "Templates",
    request_body = TemplatePayload,
    params(("id" = i64, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Modelo atualizado", body = KpiTemplate)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let template = app_state.template_service.update(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(template)))
}

// DELETE /api/templates/{id}
#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "ID do modelo")),
    responses(
        (status = 204, description = "Modelo e itens removidos"),
        (status = 400, description = "Modelo em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.template_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. ITENS DE KPI
// =============================================================================

// POST /api/templates/{id}/items
#[utoipa::path(
    post,
    path = "/api/templates/{id}/items",
    tag = "Templates",
    request_body = ItemPayload,
    params(("id" = i64, Path, description = "ID do modelo")),
    responses(
        (status = 201, description = "Item criado", body = KpiItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(template_id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let item = app_state.template_service.create_item(&user, template_id, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

// GET /api/items/{id}
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item de KPI", body = KpiItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.template_service.find_item(id).await?;
    Ok((StatusCode::OK, Json(item)))
}

// PUT /api/items/{id}
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    tag = "Templates",
    request_body = ItemPayload,
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item atualizado", body = KpiItem)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let item = app_state.template_service.update_item(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/items/{id}
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    tag = "Templates",
    params(("id" = i64, Path, description = "ID do item")),
    responses(
        (status = 204, description = "Item removido"),
        (status = 400, description = "Item com notas lançadas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.template_service.delete_item(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
