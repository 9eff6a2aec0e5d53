// src/models/template.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiTemplate {
    pub id: i64,
    #[schema(example = "Avaliação anual - Engenharia")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiItem {
    pub id: i64,
    pub template_id: i64,
    #[schema(example = "Entregas no prazo")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 100)]
    pub max_score: Decimal,
    pub sort_order: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: KpiTemplate,
    pub items: Vec<KpiItem>,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    #[validate(length(min = 1, max = 255, message = "Nome deve ter entre 1 e 255 caracteres."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    #[validate(length(min = 1, max = 255, message = "Nome deve ter entre 1 e 255 caracteres."))]
    pub name: String,
    pub description: Option<String>,
    /// Padrão 100 quando omitido.
    #[schema(example = "100")]
    pub max_score: Option<Decimal>,
    pub sort_order: Option<i32>,
}

impl ItemPayload {
    pub fn max_score_or_default(&self) -> Decimal {
        self.max_score.unwrap_or(Decimal::ONE_HUNDRED)
    }
}
