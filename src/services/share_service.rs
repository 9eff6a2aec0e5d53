// src/services/share_service.rs

use std::{collections::BTreeMap, sync::Arc};

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, EvaluationRepository, ShareRepository},
    models::{
        employee::Employee,
        evaluation::{EvaluationStatus, ScorePayload},
        share::{
            CreateSharePayload, EvaluationShare, ShareItemSummary, ShareScore, ShareScoreEntry,
            ShareStatus,
        },
    },
    scoring::engine::round2,
    services::notification::{payload, NotificationEvent, Notifier},
};

#[derive(Clone)]
pub struct ShareService {
    share_repo: Arc<dyn ShareRepository>,
    evaluation_repo: Arc<dyn EvaluationRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ShareService {
    pub fn new(
        share_repo: Arc<dyn ShareRepository>,
        evaluation_repo: Arc<dyn EvaluationRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { share_repo, evaluation_repo, employee_repo, notifier }
    }

    async fn find(&self, id: i64) -> Result<EvaluationShare, AppError> {
        self.share_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Compartilhamento"))
    }

    // Detalhe, notas e edição são exclusivos do destinatário
    async fn find_as_recipient(&self, actor: &Employee, id: i64) -> Result<EvaluationShare, AppError> {
        let share = self.find(id).await?;
        if share.shared_to_id != actor.id {
            return Err(AppError::forbidden("Compartilhamento destinado a outro colaborador"));
        }
        Ok(share)
    }

    pub async fn create(
        &self,
        actor: &Employee,
        evaluation_id: i64,
        input: CreateSharePayload,
    ) -> Result<Vec<EvaluationShare>, AppError> {
        let evaluation = self
            .evaluation_repo
            .find_by_id(evaluation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Avaliação"))?;
        if evaluation.status != EvaluationStatus::ManagerEvaluated {
            return Err(AppError::invalid_state(
                "Só é possível compartilhar avaliações já avaliadas pelo gestor",
            ));
        }

        let mut recipients = input.shared_to_ids.clone();
        recipients.sort_unstable();
        recipients.dedup();
        if self.employee_repo.find_many(&recipients).await?.len() != recipients.len() {
            return Err(AppError::not_found("Destinatário"));
        }

        let item_ids: Vec<i64> = self
            .evaluation_repo
            .list_scores(evaluation_id)
            .await?
            .iter()
            .map(|s| s.item_id)
            .collect();

        let created = self
            .share_repo
            .create_batch(
                evaluation_id,
                actor.id,
                &recipients,
                input.message.as_deref(),
                input.deadline,
                &item_ids,
            )
            .await?;

        tracing::info!(evaluation_id, created = created.len(), "✅ Avaliação compartilhada");
        for share in &created {
            self.notifier
                .notify(actor.id, NotificationEvent::ShareCreated, payload(share))
                .await;
        }
        Ok(created)
    }

    pub async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<EvaluationShare>, AppError> {
        self.share_repo.list_for_evaluation(evaluation_id).await
    }

    pub async fn list_mine(&self, actor: &Employee) -> Result<Vec<EvaluationShare>, AppError> {
        self.share_repo.list_for_recipient(actor.id).await
    }

    pub async fn detail(&self, actor: &Employee, id: i64) -> Result<EvaluationShare, AppError> {
        self.find_as_recipient(actor, id).await
    }

    pub async fn scores(&self, actor: &Employee, id: i64) -> Result<Vec<ShareScore>, AppError> {
        self.find_as_recipient(actor, id).await?;
        self.share_repo.list_scores(id).await
    }

    pub async fn update_score(
        &self,
        actor: &Employee,
        share_id: i64,
        item_id: i64,
        input: ScorePayload,
    ) -> Result<ShareScore, AppError> {
        let share = self.find_as_recipient(actor, share_id).await?;
        if share.status == ShareStatus::Completed {
            return Err(AppError::invalid_state("Compartilhamento já enviado, notas bloqueadas"));
        }
        if input.score.is_some_and(|s| s < Decimal::ZERO) {
            return Err(AppError::invalid_input("A nota não pode ser negativa"));
        }

        self.share_repo
            .update_score(share_id, item_id, input.score, input.comment)
            .await?
            .ok_or_else(|| AppError::not_found("Item do compartilhamento"))
    }

    pub async fn submit(&self, actor: &Employee, id: i64) -> Result<EvaluationShare, AppError> {
        self.find_as_recipient(actor, id).await?;
        let submitted = self
            .share_repo
            .transition(id, ShareStatus::Pending, ShareStatus::Completed)
            .await?
            .ok_or_else(|| AppError::invalid_state("Compartilhamento já enviado"))?;

        tracing::info!(share_id = id, "Compartilhamento enviado");
        self.notifier
            .notify(actor.id, NotificationEvent::ShareSubmitted, payload(&submitted))
            .await;
        Ok(submitted)
    }

    /// Consolida as notas de todos os compartilhamentos da avaliação, por item.
    /// Média e contagem consideram só notas preenchidas.
    pub async fn summary(&self, evaluation_id: i64) -> Result<Vec<ShareItemSummary>, AppError> {
        let shares = self.share_repo.list_with_scores(evaluation_id).await?;

        let mut by_item: BTreeMap<i64, Vec<ShareScoreEntry>> = BTreeMap::new();
        for share in shares {
            for score in share.scores {
                by_item.entry(score.item_id).or_default().push(ShareScoreEntry {
                    shared_to_id: share.share.shared_to_id,
                    score: score.score,
                    comment: score.comment,
                });
            }
        }

        Ok(by_item
            .into_iter()
            .map(|(item_id, scores)| {
                let filled: Vec<Decimal> = scores.iter().filter_map(|e| e.score).collect();
                let score_count = filled.len() as u32;
                let average_score = if filled.is_empty() {
                    Decimal::ZERO
                } else {
                    round2(filled.iter().sum::<Decimal>() / Decimal::from(score_count))
                };
                ShareItemSummary { item_id, average_score, score_count, scores }
            })
            .collect())
    }

    pub async fn delete(&self, actor: &Employee, id: i64) -> Result<(), AppError> {
        let share = self.find(id).await?;
        if share.shared_by_id != actor.id {
            return Err(AppError::forbidden("Apenas quem compartilhou pode excluir"));
        }
        if !self.share_repo.delete_cascade(id).await? {
            return Err(AppError::not_found("Compartilhamento"));
        }

        tracing::info!(share_id = id, "🗑️ Compartilhamento excluído");
        self.notifier
            .notify(actor.id, NotificationEvent::ShareDeleted, payload(&share))
            .await;
        Ok(())
    }
}
