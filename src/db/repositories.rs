// src/db/repositories.rs
//
// Contratos de persistência usados pelos serviços. Toda operação que toca
// mais de um registro é atômica na implementação.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        employee::Employee,
        evaluation::{
            Evaluation, EvaluationFilter, EvaluationStatus, FinalScore, NewEvaluation, ScoreItem,
            ScoreSource,
        },
        invitation::{Invitation, InvitationStatus, InvitationWithScores, InvitedScore},
        performance_rule::PerformanceRule,
        share::{EvaluationShare, ShareScore, ShareStatus, ShareWithScores},
        template::{ItemPayload, KpiItem, KpiTemplate, TemplatePayload},
    },
    scoring::RuleOutcome,
};

/// Par (origem, destino) de uma troca de status condicionada.
pub type StatusChange = (EvaluationStatus, EvaluationStatus);

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, AppError>;

    // Devolve só os que existem; quem chama compara os tamanhos
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Employee>, AppError>;
}

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn list_template_items(&self, template_id: i64) -> Result<Vec<KpiItem>, AppError>;

    /// Cria a avaliação em `pending` e um `ScoreItem` vazio por item.
    async fn create_with_scores(
        &self,
        new: &NewEvaluation,
        item_ids: &[i64],
    ) -> Result<Evaluation, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Evaluation>, AppError>;

    async fn list(&self, filter: &EvaluationFilter) -> Result<(Vec<Evaluation>, i64), AppError>;

    // Ignora a paginação do filtro
    async fn count(&self, filter: &EvaluationFilter) -> Result<i64, AppError>;

    /// Avaliações do colaborador; `statuses` vazio traz todas.
    async fn list_by_employee(
        &self,
        employee_id: i64,
        statuses: &[EvaluationStatus],
    ) -> Result<Vec<Evaluation>, AppError>;

    /// Remove notas, convites, compartilhamentos e a própria avaliação.
    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError>;

    async fn list_scores(&self, evaluation_id: i64) -> Result<Vec<ScoreItem>, AppError>;

    async fn find_score(&self, score_id: i64) -> Result<Option<ScoreItem>, AppError>;

    async fn update_score(
        &self,
        score_id: i64,
        source: ScoreSource,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<ScoreItem, AppError>;

    /// Compare-and-set: `None` quando o status atual já não é `from`.
    async fn transition_status(
        &self,
        id: i64,
        from: EvaluationStatus,
        to: EvaluationStatus,
    ) -> Result<Option<Evaluation>, AppError>;

    /// Grava notas de RH e total numa transação, avançando o status junto
    /// quando pedido. Com `total_locked` o total atual é mantido.
    /// Retorna se o avanço aconteceu.
    async fn apply_hr_scores(
        &self,
        id: i64,
        outcome: &RuleOutcome,
        advance: Option<StatusChange>,
    ) -> Result<bool, AppError>;

    /// `pending_confirm -> completed` com notas finais; `total` ausente mantém o atual.
    async fn complete(
        &self,
        id: i64,
        finals: &[FinalScore],
        total: Option<Decimal>,
    ) -> Result<Option<Evaluation>, AppError>;

    async fn record_objection(&self, id: i64, reason: &str) -> Result<Option<Evaluation>, AppError>;

    async fn resolve_objection(
        &self,
        id: i64,
        total: Decimal,
        final_comment: &str,
    ) -> Result<Option<Evaluation>, AppError>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Convites novos (convidados já existentes são ignorados), cada um com
    /// uma nota vazia por item.
    async fn create_batch(
        &self,
        evaluation_id: i64,
        inviter_id: i64,
        invitee_ids: &[i64],
        message: Option<&str>,
        item_ids: &[i64],
    ) -> Result<Vec<Invitation>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, AppError>;

    async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<Invitation>, AppError>;

    async fn list_for_invitee(
        &self,
        invitee_id: i64,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError>;

    /// Convites enviados, só de avaliados ainda ativos.
    async fn list_for_inviter(
        &self,
        inviter_id: i64,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError>;

    async fn list_with_scores(&self, evaluation_id: i64) -> Result<Vec<InvitationWithScores>, AppError>;

    async fn list_scores(&self, invitation_id: i64) -> Result<Vec<InvitedScore>, AppError>;

    async fn find_score(&self, score_id: i64) -> Result<Option<InvitedScore>, AppError>;

    async fn update_score(
        &self,
        score_id: i64,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<InvitedScore, AppError>;

    async fn transition(
        &self,
        id: i64,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, AppError>;

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create_template(&self, input: &TemplatePayload) -> Result<KpiTemplate, AppError>;

    async fn list_templates(&self) -> Result<Vec<KpiTemplate>, AppError>;

    async fn find_template(&self, id: i64) -> Result<Option<KpiTemplate>, AppError>;

    async fn update_template(&self, id: i64, input: &TemplatePayload) -> Result<Option<KpiTemplate>, AppError>;

    /// Remove o modelo e seus itens.
    async fn delete_template(&self, id: i64) -> Result<bool, AppError>;

    // Há avaliação agendada com este modelo
    async fn template_in_use(&self, id: i64) -> Result<bool, AppError>;

    async fn list_items(&self, template_id: i64) -> Result<Vec<KpiItem>, AppError>;

    async fn create_item(&self, template_id: i64, input: &ItemPayload) -> Result<KpiItem, AppError>;

    async fn find_item(&self, id: i64) -> Result<Option<KpiItem>, AppError>;

    async fn update_item(&self, id: i64, input: &ItemPayload) -> Result<Option<KpiItem>, AppError>;

    async fn delete_item(&self, id: i64) -> Result<bool, AppError>;

    // Há nota de avaliação apontando para o item
    async fn item_in_use(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PerformanceRuleRepository: Send + Sync {
    async fn find(&self) -> Result<Option<PerformanceRule>, AppError>;

    async fn save(&self, rule: &PerformanceRule) -> Result<PerformanceRule, AppError>;
}

#[async_trait]
pub trait ShareRepository: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn create_batch(
        &self,
        evaluation_id: i64,
        shared_by_id: i64,
        shared_to_ids: &[i64],
        message: Option<&str>,
        deadline: Option<chrono::DateTime<chrono::Utc>>,
        item_ids: &[i64],
    ) -> Result<Vec<EvaluationShare>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<EvaluationShare>, AppError>;

    async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<EvaluationShare>, AppError>;

    async fn list_for_recipient(&self, shared_to_id: i64) -> Result<Vec<EvaluationShare>, AppError>;

    async fn list_scores(&self, share_id: i64) -> Result<Vec<ShareScore>, AppError>;

    async fn list_with_scores(&self, evaluation_id: i64) -> Result<Vec<ShareWithScores>, AppError>;

    async fn update_score(
        &self,
        share_id: i64,
        item_id: i64,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<Option<ShareScore>, AppError>;

    async fn transition(
        &self,
        id: i64,
        from: ShareStatus,
        to: ShareStatus,
    ) -> Result<Option<EvaluationShare>, AppError>;

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Grava todas as chaves ou nenhuma.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError>;
}
