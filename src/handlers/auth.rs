use axum::Json;

use crate::{middleware::auth::AuthenticatedUser, models::employee::Employee};

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Users",
    responses(
        (status = 200, description = "Colaborador autenticado", body = Employee),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<Employee> {
    Json(user)
}
