// src/services/invitation_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, EvaluationRepository, InvitationRepository},
    models::{
        employee::Employee,
        evaluation::{EvaluationStatus, PendingCount, ScorePayload},
        invitation::{
            CreateInvitationPayload, Invitation, InvitationStatus, InvitationWithScores, InvitedScore,
        },
    },
    services::{
        evaluation_service::EvaluationService,
        notification::{payload, NotificationEvent, Notifier},
    },
};

#[derive(Clone)]
pub struct InvitationService {
    invitation_repo: Arc<dyn InvitationRepository>,
    evaluation_repo: Arc<dyn EvaluationRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    evaluation_service: EvaluationService,
    notifier: Arc<dyn Notifier>,
}

impl InvitationService {
    pub fn new(
        invitation_repo: Arc<dyn InvitationRepository>,
        evaluation_repo: Arc<dyn EvaluationRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        evaluation_service: EvaluationService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { invitation_repo, evaluation_repo, employee_repo, evaluation_service, notifier }
    }

    async fn find(&self, id: i64) -> Result<Invitation, AppError> {
        self.invitation_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Convite"))
    }

    fn require_hr(actor: &Employee) -> Result<(), AppError> {
        if actor.is_hr() {
            Ok(())
        } else {
            Err(AppError::forbidden("Apenas o RH gerencia convites"))
        }
    }

    fn require_invitee(actor: &Employee, invitation: &Invitation) -> Result<(), AppError> {
        if actor.id == invitation.invitee_id {
            Ok(())
        } else {
            Err(AppError::forbidden("Sem permissão para operar este convite"))
        }
    }

    // Troca de status condicionada, com notificação
    async fn move_to(
        &self,
        actor: &Employee,
        invitation: &Invitation,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Invitation, AppError> {
        if invitation.status != from {
            return Err(AppError::invalid_state("Status do convite não permite esta operação"));
        }
        let updated = self
            .invitation_repo
            .transition(invitation.id, from, to)
            .await?
            .ok_or_else(|| AppError::invalid_state("Status do convite não permite esta operação"))?;

        tracing::info!(invitation_id = updated.id, from = ?from, to = ?to, "Convite atualizado");
        self.notifier
            .notify(actor.id, NotificationEvent::InvitationStatusChange, payload(&updated))
            .await;
        Ok(updated)
    }

    /// Convida colegas para avaliar. Convidados já presentes são ignorados.
    pub async fn create(
        &self,
        actor: &Employee,
        evaluation_id: i64,
        input: CreateInvitationPayload,
    ) -> Result<Vec<Invitation>, AppError> {
        Self::require_hr(actor)?;

        let evaluation = self.evaluation_service.find(evaluation_id).await?;
        if !matches!(
            evaluation.status,
            EvaluationStatus::SelfEvaluated | EvaluationStatus::ManagerEvaluated
        ) {
            return Err(AppError::invalid_state(
                "Convites só podem ser feitos após a autoavaliação ou a avaliação do gestor",
            ));
        }
        if input.invitee_ids.contains(&evaluation.employee_id) {
            return Err(AppError::invalid_input("O colaborador avaliado não pode ser convidado"));
        }

        let mut invitee_ids = input.invitee_ids.clone();
        invitee_ids.sort_unstable();
        invitee_ids.dedup();
        let found = self.employee_repo.find_many(&invitee_ids).await?;
        if found.len() != invitee_ids.len() {
            return Err(AppError::not_found("Convidado"));
        }

        let item_ids: Vec<i64> = self
            .evaluation_repo
            .list_scores(evaluation_id)
            .await?
            .iter()
            .map(|s| s.item_id)
            .collect();

        let created = self
            .invitation_repo
            .create_batch(evaluation_id, actor.id, &invitee_ids, input.message.as_deref(), &item_ids)
            .await?;

        tracing::info!(evaluation_id, created = created.len(), "✅ Convites criados");
        for invitation in &created {
            self.notifier
                .notify(actor.id, NotificationEvent::InvitationCreated, payload(invitation))
                .await;
        }
        Ok(created)
    }

    pub async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<Invitation>, AppError> {
        self.evaluation_service.find(evaluation_id).await?;
        self.invitation_repo.list_for_evaluation(evaluation_id).await
    }

    pub async fn list_mine(
        &self,
        actor: &Employee,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        self.invitation_repo.list_for_invitee(actor.id, status).await
    }

    /// Convites enviados por quem pergunta; avaliados desligados ficam de fora.
    pub async fn list_sent(
        &self,
        actor: &Employee,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        self.invitation_repo.list_for_inviter(actor.id, status).await
    }

    pub async fn pending_count(&self, actor: &Employee) -> Result<PendingCount, AppError> {
        let pending = self
            .invitation_repo
            .list_for_invitee(actor.id, Some(InvitationStatus::Pending))
            .await?;
        Ok(PendingCount { count: pending.len() as i64 })
    }

    // Só o convidado ou o RH
    pub async fn details(&self, actor: &Employee, id: i64) -> Result<InvitationWithScores, AppError> {
        let invitation = self.find(id).await?;
        if invitation.invitee_id != actor.id && !actor.is_hr() {
            return Err(AppError::forbidden("Sem permissão para ver este convite"));
        }
        let scores = self.invitation_repo.list_scores(id).await?;
        Ok(InvitationWithScores { invitation, scores })
    }

    pub async fn accept(&self, actor: &Employee, id: i64) -> Result<Invitation, AppError> {
        let invitation = self.find(id).await?;
        Self::require_invitee(actor, &invitation)?;
        self.move_to(actor, &invitation, InvitationStatus::Pending, InvitationStatus::Accepted)
            .await
    }

    pub async fn decline(&self, actor: &Employee, id: i64) -> Result<Invitation, AppError> {
        let invitation = self.find(id).await?;
        Self::require_invitee(actor, &invitation)?;
        let updated = self
            .move_to(actor, &invitation, InvitationStatus::Pending, InvitationStatus::Declined)
            .await?;
        self.evaluation_service
            .reconcile_after_invitation_change(actor.id, updated.evaluation_id, false)
            .await;
        Ok(updated)
    }

    /// Notas do convite: convidado, RH ou o próprio avaliado.
    pub async fn scores(&self, actor: &Employee, id: i64) -> Result<Vec<InvitedScore>, AppError> {
        let invitation = self.find(id).await?;
        let evaluation = self.evaluation_service.find(invitation.evaluation_id).await?;

        let can_view = invitation.invitee_id == actor.id || actor.is_hr() || evaluation.employee_id == actor.id;
        if !can_view {
            return Err(AppError::forbidden("Sem permissão para ver as notas deste convite"));
        }
        self.invitation_repo.list_scores(id).await
    }

    pub async fn update_score(
        &self,
        actor: &Employee,
        score_id: i64,
        input: ScorePayload,
    ) -> Result<InvitedScore, AppError> {
        let score = self
            .invitation_repo
            .find_score(score_id)
            .await?
            .ok_or_else(|| AppError::not_found("Nota do convite"))?;
        let invitation = self.find(score.invitation_id).await?;

        Self::require_invitee(actor, &invitation)?;
        if invitation.status != InvitationStatus::Accepted {
            return Err(AppError::invalid_state("Só convites aceitos podem receber notas"));
        }
        if input.score.is_some_and(|s| s < Decimal::ZERO) {
            return Err(AppError::invalid_input("A nota não pode ser negativa"));
        }

        let updated = self
            .invitation_repo
            .update_score(score_id, input.score, input.comment)
            .await?;
        self.notifier
            .notify(actor.id, NotificationEvent::InvitedScoreUpdated, payload(&updated))
            .await;
        Ok(updated)
    }

    pub async fn complete(&self, actor: &Employee, id: i64) -> Result<Invitation, AppError> {
        let invitation = self.find(id).await?;
        Self::require_invitee(actor, &invitation)?;
        if invitation.status != InvitationStatus::Accepted {
            return Err(AppError::invalid_state("Status do convite não permite esta operação"));
        }

        let scores = self.invitation_repo.list_scores(id).await?;
        if scores.iter().any(|s| s.score.is_none()) {
            return Err(AppError::invalid_state("Preencha a nota de todos os itens antes de concluir"));
        }

        let updated = self
            .move_to(actor, &invitation, InvitationStatus::Accepted, InvitationStatus::Completed)
            .await?;
        self.evaluation_service
            .reconcile_after_invitation_change(actor.id, updated.evaluation_id, false)
            .await;
        Ok(updated)
    }

    pub async fn cancel(&self, actor: &Employee, id: i64) -> Result<Invitation, AppError> {
        Self::require_hr(actor)?;
        let invitation = self.find(id).await?;
        let updated = self
            .move_to(actor, &invitation, InvitationStatus::Pending, InvitationStatus::Cancelled)
            .await?;
        self.evaluation_service
            .reconcile_after_invitation_change(actor.id, updated.evaluation_id, false)
            .await;
        Ok(updated)
    }

    pub async fn reinvite(&self, actor: &Employee, id: i64) -> Result<Invitation, AppError> {
        Self::require_hr(actor)?;
        let invitation = self.find(id).await?;
        self.move_to(actor, &invitation, InvitationStatus::Declined, InvitationStatus::Pending)
            .await
    }

    pub async fn delete(&self, actor: &Employee, id: i64) -> Result<(), AppError> {
        Self::require_hr(actor)?;
        let invitation = self.find(id).await?;
        let was_completed = invitation.status == InvitationStatus::Completed;

        if !self.invitation_repo.delete_cascade(id).await? {
            return Err(AppError::not_found("Convite"));
        }

        tracing::info!(invitation_id = id, was_completed, "🗑️ Convite excluído");
        self.notifier
            .notify(actor.id, NotificationEvent::InvitationDeleted, payload(&invitation))
            .await;
        self.evaluation_service
            .reconcile_after_invitation_change(actor.id, invitation.evaluation_id, was_completed)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::services::evaluation_service::tests::{enable_rule, fixture, score, scored_evaluation, yearly, Fixture};
    use rust_decimal_macros::dec;

    fn service(f: &Fixture) -> InvitationService {
        let shared = Arc::new(f.store.clone());
        InvitationService::new(
            shared.clone(),
            shared.clone(),
            shared,
            f.service.clone(),
            Arc::new(f.notifier.clone()),
        )
    }

    fn invitation_of(created: &[Invitation], invitee: &Employee) -> i64 {
        created
            .iter()
            .find(|i| i.invitee_id == invitee.id)
            .map(|i| i.id)
            .unwrap()
    }

    async fn fill_and_complete(service: &InvitationService, store: &MemoryStore, invitee: &Employee, id: i64, value: Decimal) {
        service.accept(invitee, id).await.unwrap();
        for s in InvitationRepository::list_scores(store, id).await.unwrap() {
            service.update_score(invitee, s.id, score(value)).await.unwrap();
        }
        service.complete(invitee, id).await.unwrap();
    }

    #[tokio::test]
    async fn create_validates_state_and_invitees() {
        let f = fixture().await;
        let invitations = service(&f);
        let pending = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();

        let payload = |ids: Vec<i64>| CreateInvitationPayload { invitee_ids: ids, message: None };

        assert!(matches!(
            invitations.create(&f.hr, pending.id, payload(vec![f.peer.id])).await,
            Err(AppError::InvalidState(_))
        ));

        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        assert!(matches!(
            invitations.create(&f.manager, evaluation.id, payload(vec![f.peer.id])).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            invitations.create(&f.hr, evaluation.id, payload(vec![f.employee.id])).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            invitations.create(&f.hr, evaluation.id, payload(vec![9999])).await,
            Err(AppError::ResourceNotFound(_))
        ));

        let created = invitations
            .create(&f.hr, evaluation.id, payload(vec![f.peer.id, f.manager.id]))
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(InvitationRepository::list_scores(&f.store, created[0].id).await.unwrap().len(), 2);

        // Já convidados são ignorados
        let again = invitations.create(&f.hr, evaluation.id, payload(vec![f.peer.id])).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn lifecycle_checks_actor_and_status() {
        let f = fixture().await;
        let invitations = service(&f);
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let created = invitations
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id], message: None })
            .await
            .unwrap();
        let id = created[0].id;
        let score_id = InvitationRepository::list_scores(&f.store, id).await.unwrap()[0].id;

        assert!(matches!(invitations.accept(&f.manager, id).await, Err(AppError::Forbidden(_))));
        // Nota só depois de aceitar
        assert!(matches!(
            invitations.update_score(&f.peer, score_id, score(dec!(70))).await,
            Err(AppError::InvalidState(_))
        ));

        invitations.accept(&f.peer, id).await.unwrap();
        assert!(matches!(invitations.accept(&f.peer, id).await, Err(AppError::InvalidState(_))));

        invitations.update_score(&f.peer, score_id, score(dec!(70))).await.unwrap();
        match invitations.complete(&f.peer, id).await {
            Err(AppError::InvalidState(msg)) => assert!(msg.contains("todos os itens")),
            other => panic!("esperava InvalidState, veio {:?}", other),
        }

        // Leitura das notas
        assert!(invitations.scores(&f.employee, id).await.is_ok());
        assert!(invitations.scores(&f.hr, id).await.is_ok());
        assert!(matches!(invitations.scores(&f.manager, id).await, Err(AppError::Forbidden(_))));

        assert!(matches!(invitations.cancel(&f.hr, id).await, Err(AppError::InvalidState(_))));
        assert_eq!(invitations.list_mine(&f.peer, Some(InvitationStatus::Accepted)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn decline_and_reinvite() {
        let f = fixture().await;
        let invitations = service(&f);
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let id = invitations
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id], message: None })
            .await
            .unwrap()[0]
            .id;

        assert!(matches!(invitations.reinvite(&f.hr, id).await, Err(AppError::InvalidState(_))));
        invitations.decline(&f.peer, id).await.unwrap();
        assert!(matches!(invitations.reinvite(&f.peer, id).await, Err(AppError::Forbidden(_))));

        let resent = invitations.reinvite(&f.hr, id).await.unwrap();
        assert_eq!(resent.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn last_invitation_completion_advances_evaluation() {
        let f = fixture().await;
        let invitations = service(&f);
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let created = invitations
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id, f.manager.id], message: None })
            .await
            .unwrap();

        // Gestor avalia antes da regra existir: fica em manager_evaluated
        f.service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;

        fill_and_complete(&invitations, &f.store, &f.peer, invitation_of(&created, &f.peer), dec!(70)).await;
        // Ainda há convite em aberto
        assert_eq!(
            f.service.find(evaluation.id).await.unwrap().status,
            EvaluationStatus::ManagerEvaluated
        );

        invitations.decline(&f.manager, invitation_of(&created, &f.manager)).await.unwrap();

        let advanced = f.service.find(evaluation.id).await.unwrap();
        assert_eq!(advanced.status, EvaluationStatus::PendingConfirm);
        assert_eq!(advanced.total_score, dec!(162.00));
    }

    #[tokio::test]
    async fn cancel_of_last_outstanding_invitation_advances() {
        let f = fixture().await;
        let invitations = service(&f);
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let id = invitations
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id], message: None })
            .await
            .unwrap()[0]
            .id;
        f.service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;

        assert!(matches!(invitations.cancel(&f.manager, id).await, Err(AppError::Forbidden(_))));
        invitations.cancel(&f.hr, id).await.unwrap();

        let advanced = f.service.find(evaluation.id).await.unwrap();
        assert_eq!(advanced.status, EvaluationStatus::PendingConfirm);
        // Sem convite concluído: cenário sem convite, 50/50
        assert_eq!(advanced.total_score, dec!(170.00));
    }

    #[tokio::test]
    async fn deleting_completed_invitation_recalculates_pending_confirm() {
        let f = fixture().await;
        let invitations = service(&f);
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let id = invitations
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id], message: None })
            .await
            .unwrap()[0]
            .id;
        fill_and_complete(&invitations, &f.store, &f.peer, id, dec!(70)).await;

        let confirmed = f
            .service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();
        assert_eq!(confirmed.status, EvaluationStatus::PendingConfirm);
        assert_eq!(confirmed.total_score, dec!(162.00));

        assert!(matches!(invitations.delete(&f.peer, id).await, Err(AppError::Forbidden(_))));
        invitations.delete(&f.hr, id).await.unwrap();

        let recalculated = f.service.find(evaluation.id).await.unwrap();
        assert_eq!(recalculated.status, EvaluationStatus::PendingConfirm);
        assert_eq!(recalculated.total_score, dec!(170.00));
        assert!(InvitationRepository::list_scores(&f.store, id).await.unwrap().is_empty());
        assert!(f.notifier.events().await.contains(&NotificationEvent::InvitationDeleted));
    }

    #[tokio::test]
    async fn resolved_objection_total_survives_invitation_delete() {
        let f = fixture().await;
        let invitations = service(&f);
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let id = invitations
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id], message: None })
            .await
            .unwrap()[0]
            .id;
        fill_and_complete(&invitations, &f.store, &f.peer, id, dec!(70)).await;
        f.service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        f.service.submit_objection(&f.employee, evaluation.id, "discordo").await.unwrap();
        f.service
            .handle_objection(&f.hr, evaluation.id, dec!(88.5), "Ajustado após revisão")
            .await
            .unwrap();

        invitations.delete(&f.hr, id).await.unwrap();

        // Notas de RH recalculadas, total decidido pelo RH intacto
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        assert!(scores.iter().all(|s| s.hr_score == Some(dec!(85.00))));
        assert_eq!(f.service.find(evaluation.id).await.unwrap().total_score, dec!(88.5));

        let completed = f
            .service
            .update_status(&f.employee, evaluation.id, EvaluationStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(completed.total_score, dec!(88.5));
    }

    #[tokio::test]
    async fn sent_list_details_and_pending_count() {
        let f = fixture().await;
        let service = service(&f);
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let created = service
            .create(&f.hr, evaluation.id, CreateInvitationPayload { invitee_ids: vec![f.peer.id, f.orphan.id], message: None })
            .await
            .unwrap();
        let peer_invitation = invitation_of(&created, &f.peer);
        service.accept(&f.peer, peer_invitation).await.unwrap();

        assert_eq!(service.list_sent(&f.hr, None).await.unwrap().len(), 2);
        let accepted = service.list_sent(&f.hr, Some(InvitationStatus::Accepted)).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].invitee_id, f.peer.id);
        assert!(service.list_sent(&f.manager, None).await.unwrap().is_empty());

        assert_eq!(service.pending_count(&f.peer).await.unwrap().count, 0);
        assert_eq!(service.pending_count(&f.orphan).await.unwrap().count, 1);

        let detail = service.details(&f.peer, peer_invitation).await.unwrap();
        assert_eq!(detail.invitation.id, peer_invitation);
        assert_eq!(detail.scores.len(), f.item_ids.len());
        assert!(service.details(&f.hr, peer_invitation).await.is_ok());
        match service.details(&f.employee, peer_invitation).await {
            Err(AppError::Forbidden(_)) => {}
            other => panic!("esperava Forbidden, veio {:?}", other),
        }
        match service.details(&f.peer, 999).await {
            Err(AppError::ResourceNotFound(_)) => {}
            other => panic!("esperava ResourceNotFound, veio {:?}", other),
        }

        // Avaliado desligado some da lista de enviados
        f.store.deactivate(f.employee.id).await;
        assert!(service.list_sent(&f.hr, None).await.unwrap().is_empty());
    }
}
