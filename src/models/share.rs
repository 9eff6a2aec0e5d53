// src/models/share.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "share_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Pending,
    Completed,
}

/// Revisão delegada de uma avaliação a um terceiro.
/// Não alimenta o cálculo automático da nota de RH.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationShare {
    pub id: i64,
    pub evaluation_id: i64,
    pub shared_to_id: i64,
    pub shared_by_id: i64,
    pub status: ShareStatus,
    pub message: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareScore {
    pub id: i64,
    pub share_id: i64,
    pub item_id: i64,
    pub score: Option<Decimal>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareWithScores {
    #[serde(flatten)]
    pub share: EvaluationShare,
    pub scores: Vec<ShareScore>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareScoreEntry {
    pub shared_to_id: i64,
    pub score: Option<Decimal>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareItemSummary {
    pub item_id: i64,
    pub average_score: Decimal,
    pub score_count: u32,
    pub scores: Vec<ShareScoreEntry>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSharePayload {
    #[validate(length(min = 1, message = "Informe ao menos um destinatário."))]
    pub shared_to_ids: Vec<i64>,
    #[validate(length(max = 1000, message = "Mensagem muito longa."))]
    pub message: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}
