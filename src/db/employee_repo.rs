// src/db/employee_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::repositories::EmployeeRepository,
    models::employee::Employee,
};

const EMPLOYEE_COLUMNS: &str = "id, name, email, role, department_id, manager_id, is_active";

#[derive(Clone)]
pub struct PgEmployeeRepository {
    pool: PgPool,
}

impl PgEmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Employee>, AppError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ANY($1) ORDER BY id");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }
}
