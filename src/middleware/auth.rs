use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{common::error::AppError, config::AppState, models::employee::Employee};

// Guard das rotas protegidas: valida o Bearer e anexa o colaborador à requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)?;

    let employee = app_state.auth_service.validate_token(token).await?;
    tracing::debug!(employee_id = employee.id, "Requisição autenticada");

    request.extensions_mut().insert(employee);
    Ok(next.run(request).await)
}

// Extrator para obter o colaborador autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub Employee);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Employee>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}
