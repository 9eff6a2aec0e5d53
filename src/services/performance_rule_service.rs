// src/services/performance_rule_service.rs

use std::sync::Arc;

use serde_json::json;

use crate::{
    common::error::AppError,
    db::{repositories::StatusChange, EvaluationRepository, InvitationRepository, PerformanceRuleRepository},
    models::{employee::Employee, performance_rule::PerformanceRule},
    scoring::{evaluate_rule, RuleOutcome},
    services::notification::{NotificationEvent, Notifier},
};

/// Resultado de uma aplicação da regra já persistida.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRule {
    pub outcome: RuleOutcome,
    pub advanced: bool,
}

#[derive(Clone)]
pub struct PerformanceRuleService {
    rule_repo: Arc<dyn PerformanceRuleRepository>,
    evaluation_repo: Arc<dyn EvaluationRepository>,
    invitation_repo: Arc<dyn InvitationRepository>,
    notifier: Arc<dyn Notifier>,
}

impl PerformanceRuleService {
    pub fn new(
        rule_repo: Arc<dyn PerformanceRuleRepository>,
        evaluation_repo: Arc<dyn EvaluationRepository>,
        invitation_repo: Arc<dyn InvitationRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { rule_repo, evaluation_repo, invitation_repo, notifier }
    }

    /// Lê a regra; na primeira leitura grava a regra padrão (desabilitada).
    pub async fn get_rule(&self) -> Result<PerformanceRule, AppError> {
        match self.rule_repo.find().await? {
            Some(rule) => Ok(rule),
            None => {
                tracing::info!("Regra de desempenho ausente, gravando padrão");
                self.rule_repo.save(&PerformanceRule::default()).await
            }
        }
    }

    pub async fn update_rule(&self, actor: &Employee, rule: PerformanceRule) -> Result<PerformanceRule, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH pode alterar a regra de desempenho"));
        }
        rule.validate_weights()?;

        let saved = self.rule_repo.save(&rule).await?;
        tracing::info!(enabled = saved.enabled, "✅ Regra de desempenho atualizada");
        Ok(saved)
    }

    /// Regra vigente, só quando existe e está habilitada.
    pub async fn active_rule(&self) -> Result<Option<PerformanceRule>, AppError> {
        Ok(self.rule_repo.find().await?.filter(|rule| rule.enabled))
    }

    /// Recalcula e grava as notas de RH numa única transação, com avanço de
    /// status opcional junto. `actor_id` é quem disparou o recálculo.
    pub async fn apply(
        &self,
        actor_id: i64,
        rule: &PerformanceRule,
        evaluation_id: i64,
        advance: Option<StatusChange>,
    ) -> Result<AppliedRule, AppError> {
        let scores = self.evaluation_repo.list_scores(evaluation_id).await?;
        let invitations = self.invitation_repo.list_with_scores(evaluation_id).await?;

        let outcome = evaluate_rule(rule, &scores, &invitations);
        let advanced = self
            .evaluation_repo
            .apply_hr_scores(evaluation_id, &outcome, advance)
            .await?;

        tracing::info!(
            evaluation_id,
            scenario = ?outcome.scenario,
            updated = outcome.updates.len(),
            advanced,
            "Regra de desempenho aplicada"
        );

        if !outcome.updates.is_empty() {
            self.notifier
                .notify(
                    actor_id,
                    NotificationEvent::PerformanceRuleApplied,
                    json!({
                        "evaluationId": evaluation_id,
                        "scenario": outcome.scenario,
                        "totalScore": outcome.total_score,
                    }),
                )
                .await;
        }

        Ok(AppliedRule { outcome, advanced })
    }

    /// No-op com sucesso quando não há regra ou ela está desabilitada.
    pub async fn apply_rule(&self, actor_id: i64, evaluation_id: i64) -> Result<Option<AppliedRule>, AppError> {
        let Some(rule) = self.active_rule().await? else {
            return Ok(None);
        };
        self.apply(actor_id, &rule, evaluation_id, None).await.map(Some)
    }

    /// Recálculo pedido manualmente pelo RH, sem mexer no status.
    pub async fn apply_on_request(&self, actor: &Employee, evaluation_id: i64) -> Result<Option<AppliedRule>, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH pode reaplicar a regra de desempenho"));
        }
        self.evaluation_repo
            .find_by_id(evaluation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Avaliação"))?;
        self.apply_rule(actor.id, evaluation_id).await
    }
}
