// src/models/employee.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Employee,
    Manager,
    Hr,
}

// Colaborador lido do cadastro (o núcleo nunca altera este registro)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[schema(example = "maria@empresa.com")]
    pub email: Option<String>,
    pub role: EmployeeRole,
    pub department_id: Option<i64>,
    // Sem gestor direto a autoavaliação fica bloqueada
    pub manager_id: Option<i64>,
    pub is_active: bool,
}

impl Employee {
    pub fn is_hr(&self) -> bool {
        self.role == EmployeeRole::Hr
    }

    pub fn manages(&self, other: &Employee) -> bool {
        other.manager_id == Some(self.id)
    }
}
