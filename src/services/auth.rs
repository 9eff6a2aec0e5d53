// src/services/auth.rs

use std::sync::Arc;

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::{auth::Claims, employee::Employee},
};

/// Valida o JWT emitido pela plataforma e resolve o colaborador do `sub`.
/// Emitir tokens não é papel deste serviço.
#[derive(Clone)]
pub struct AuthService {
    employee_repo: Arc<dyn EmployeeRepository>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(employee_repo: Arc<dyn EmployeeRepository>, jwt_secret: String) -> Self {
        Self { employee_repo, jwt_secret }
    }

    pub async fn validate_token(&self, token: &str) -> Result<Employee, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let employee = self
            .employee_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !employee.is_active {
            tracing::warn!(employee_id = employee.id, "Token de colaborador inativo recusado");
            return Err(AppError::InvalidToken);
        }
        Ok(employee)
    }
}
