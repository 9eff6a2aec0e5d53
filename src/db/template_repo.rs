// src/db/template_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::repositories::TemplateRepository,
    models::template::{ItemPayload, KpiItem, KpiTemplate, TemplatePayload},
};

const TEMPLATE_COLUMNS: &str = "id, name, description, created_at";
const ITEM_COLUMNS: &str = "id, template_id, name, description, max_score, sort_order";

#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn create_template(&self, input: &TemplatePayload) -> Result<KpiTemplate, AppError> {
        let sql = format!(
            "INSERT INTO kpi_templates (name, description) VALUES ($1, $2) RETURNING {TEMPLATE_COLUMNS}"
        );
        let template = sqlx::query_as::<_, KpiTemplate>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(template)
    }

    async fn list_templates(&self) -> Result<Vec<KpiTemplate>, AppError> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM kpi_templates ORDER BY name, id");
        let templates = sqlx::query_as::<_, KpiTemplate>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(templates)
    }

    async fn find_template(&self, id: i64) -> Result<Option<KpiTemplate>, AppError> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM kpi_templates WHERE id = $1");
        let template = sqlx::query_as::<_, KpiTemplate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(template)
    }

    async fn update_template(&self, id: i64, input: &TemplatePayload) -> Result<Option<KpiTemplate>, AppError> {
        let sql = format!(
            "UPDATE kpi_templates SET name = $2, description = $3 WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"
        );
        let template = sqlx::query_as::<_, KpiTemplate>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(&self.pool)
            .await?;
        Ok(template)
    }

    async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM kpi_items WHERE template_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM kpi_templates WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn template_in_use(&self, id: i64) -> Result<bool, AppError> {
        let in_use: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM kpi_evaluations WHERE template_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(in_use)
    }

    async fn list_items(&self, template_id: i64) -> Result<Vec<KpiItem>, AppError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM kpi_items WHERE template_id = $1 ORDER BY sort_order, id");
        let items = sqlx::query_as::<_, KpiItem>(&sql)
            .bind(template_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn create_item(&self, template_id: i64, input: &ItemPayload) -> Result<KpiItem, AppError> {
        let sql = format!(
            "INSERT INTO kpi_items (template_id, name, description, max_score, sort_order) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, KpiItem>(&sql)
            .bind(template_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.max_score_or_default())
            .bind(input.sort_order.unwrap_or(0))
            .fetch_one(&self.pool)
            .await?;
        Ok(item)
    }

    async fn find_item(&self, id: i64) -> Result<Option<KpiItem>, AppError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM kpi_items WHERE id = $1");
        let item = sqlx::query_as::<_, KpiItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn update_item(&self, id: i64, input: &ItemPayload) -> Result<Option<KpiItem>, AppError> {
        // sort_order omitido mantém a posição atual
        let sql = format!(
            "UPDATE kpi_items SET name = $2, description = $3, max_score = $4, \
             sort_order = COALESCE($5, sort_order) \
             WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, KpiItem>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.max_score_or_default())
            .bind(input.sort_order)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn delete_item(&self, id: i64) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM kpi_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn item_in_use(&self, id: i64) -> Result<bool, AppError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM kpi_scores WHERE item_id = $1) \
             OR EXISTS (SELECT 1 FROM invited_scores WHERE item_id = $1) \
             OR EXISTS (SELECT 1 FROM share_scores WHERE item_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(in_use)
    }
}
