// src/models/evaluation.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "evaluation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    SelfEvaluated,
    ManagerEvaluated,
    PendingConfirm,
    Completed,
}

impl EvaluationStatus {
    /// Única etapa de origem aceita para cada destino.
    /// `Pending` é só estado inicial, nunca destino.
    pub fn required_predecessor(self) -> Option<EvaluationStatus> {
        match self {
            EvaluationStatus::Pending => None,
            EvaluationStatus::SelfEvaluated => Some(EvaluationStatus::Pending),
            EvaluationStatus::ManagerEvaluated => Some(EvaluationStatus::SelfEvaluated),
            EvaluationStatus::PendingConfirm => Some(EvaluationStatus::ManagerEvaluated),
            EvaluationStatus::Completed => Some(EvaluationStatus::PendingConfirm),
        }
    }

    pub fn can_transition_to(self, next: EvaluationStatus) -> bool {
        next.required_predecessor() == Some(self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::SelfEvaluated => "self_evaluated",
            EvaluationStatus::ManagerEvaluated => "manager_evaluated",
            EvaluationStatus::PendingConfirm => "pending_confirm",
            EvaluationStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "review_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewPeriod {
    Monthly,
    Quarterly,
    Yearly,
}

// Qual das três notas de um item está sendo gravada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    SelfReview,
    Manager,
    Hr,
    // Ajuste manual do RH sobre a nota final do item
    Final,
}

impl ScoreSource {
    pub fn columns(self) -> (&'static str, &'static str) {
        match self {
            ScoreSource::SelfReview => ("self_score", "self_comment"),
            ScoreSource::Manager => ("manager_score", "manager_comment"),
            ScoreSource::Hr => ("hr_score", "hr_comment"),
            ScoreSource::Final => ("final_score", "final_comment"),
        }
    }
}

// --- Structs de Banco ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: i64,
    pub employee_id: i64,
    pub template_id: i64,
    pub period: ReviewPeriod,
    #[schema(example = 2025)]
    pub year: i32,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
    pub status: EvaluationStatus,
    #[schema(example = "85.50")]
    pub total_score: Decimal,
    pub has_objection: bool,
    pub objection_reason: Option<String>,
    pub final_comment: Option<String>,
    // Travado pela resolução de objeção: a conclusão não recalcula o total
    pub total_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreItem {
    pub id: i64,
    pub evaluation_id: i64,
    pub item_id: i64,
    pub self_score: Option<Decimal>,
    pub self_comment: Option<String>,
    pub manager_score: Option<Decimal>,
    pub manager_comment: Option<String>,
    pub hr_score: Option<Decimal>,
    pub hr_comment: Option<String>,
    pub final_score: Option<Decimal>,
    pub final_comment: Option<String>,
}

impl ScoreItem {
    /// Prioridade RH > gestor > autoavaliação; zero quando nada foi lançado.
    pub fn resolved_final_score(&self) -> Decimal {
        self.hr_score
            .or(self.manager_score)
            .or(self.self_score)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetail {
    #[serde(flatten)]
    pub header: Evaluation,
    pub scores: Vec<ScoreItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPage {
    pub data: Vec<Evaluation>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingCount {
    #[schema(example = 3)]
    pub count: i64,
}

// --- Valores de escrita usados pelos repositórios ---

#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub employee_id: i64,
    pub template_id: i64,
    pub period: ReviewPeriod,
    pub year: i32,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalScore {
    pub score_id: i64,
    pub final_score: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EvaluationFilter {
    pub status: Option<EvaluationStatus>,
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
    // Subordinados diretos deste gestor
    pub manager_id: Option<i64>,
    pub period: Option<ReviewPeriod>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl EvaluationFilter {
    // Mesmos limites da listagem original: página >= 1, tamanho entre 1 e 100 (padrão 10)
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.filter(|s| (1..=100).contains(s)).unwrap_or(10)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationPayload {
    pub employee_id: i64,
    pub template_id: i64,
    pub period: ReviewPeriod,
    #[validate(range(min = 2000, max = 2100, message = "Ano fora do intervalo permitido."))]
    #[schema(example = 2025)]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "Mês deve estar entre 1 e 12."))]
    pub month: Option<i32>,
    #[validate(range(min = 1, max = 4, message = "Trimestre deve estar entre 1 e 4."))]
    pub quarter: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: EvaluationStatus,
    // Só usado ao concluir: total já ajustado pelo RH
    pub total_score: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScorePayload {
    pub score: Option<Decimal>,
    #[validate(length(max = 2000, message = "Comentário muito longo."))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectionPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "A nota do item 2 não considera o projeto entregue em março.")]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveObjectionPayload {
    #[schema(example = "88.5")]
    pub total_score: Decimal,
    #[validate(length(min = 1, message = "required"))]
    pub final_comment: String,
}
