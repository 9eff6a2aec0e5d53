// src/services/evaluation_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, EvaluationRepository, InvitationRepository},
    models::{
        employee::{Employee, EmployeeRole},
        evaluation::{
            CreateEvaluationPayload, Evaluation, EvaluationDetail, EvaluationFilter, EvaluationPage,
            EvaluationStatus, FinalScore, NewEvaluation, PendingCount, ReviewPeriod, ScoreItem,
            ScorePayload, ScoreSource,
        },
    },
    scoring::engine::round2,
    services::{
        notification::{payload, NotificationEvent, Notifier},
        performance_rule_service::PerformanceRuleService,
    },
};

#[derive(Clone)]
pub struct EvaluationService {
    evaluation_repo: Arc<dyn EvaluationRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
    invitation_repo: Arc<dyn InvitationRepository>,
    rule_service: PerformanceRuleService,
    notifier: Arc<dyn Notifier>,
}

impl EvaluationService {
    pub fn new(
        evaluation_repo: Arc<dyn EvaluationRepository>,
        employee_repo: Arc<dyn EmployeeRepository>,
        invitation_repo: Arc<dyn InvitationRepository>,
        rule_service: PerformanceRuleService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { evaluation_repo, employee_repo, invitation_repo, rule_service, notifier }
    }

    // ---
    // Leitura
    // ---

    pub async fn find(&self, id: i64) -> Result<Evaluation, AppError> {
        self.evaluation_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Avaliação"))
    }

    pub async fn employee_of(&self, evaluation: &Evaluation) -> Result<Employee, AppError> {
        self.employee_repo
            .find_by_id(evaluation.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Colaborador"))
    }

    pub async fn get(&self, id: i64) -> Result<EvaluationDetail, AppError> {
        let header = self.find(id).await?;
        let scores = self.evaluation_repo.list_scores(id).await?;
        Ok(EvaluationDetail { header, scores })
    }

    pub async fn list(&self, filter: &EvaluationFilter) -> Result<EvaluationPage, AppError> {
        let (data, total) = self.evaluation_repo.list(filter).await?;
        let page_size = filter.page_size();
        Ok(EvaluationPage {
            data,
            total,
            page: filter.page(),
            page_size,
            total_pages: (total + page_size - 1) / page_size,
        })
    }

    pub async fn list_for_employee(&self, employee_id: i64) -> Result<Vec<Evaluation>, AppError> {
        self.employee_repo
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Colaborador"))?;
        self.evaluation_repo.list_by_employee(employee_id, &[]).await
    }

    /// Avaliações do colaborador que ainda dependem dele ou do gestor.
    pub async fn pending_for_employee(&self, employee_id: i64) -> Result<Vec<Evaluation>, AppError> {
        self.employee_repo
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Colaborador"))?;
        self.evaluation_repo
            .list_by_employee(employee_id, &[EvaluationStatus::Pending, EvaluationStatus::SelfEvaluated])
            .await
    }

    /// Contador do menu, conforme o papel de quem pergunta.
    ///
    /// Todos: as próprias em `pending` e `pending_confirm`. Gestor e RH somam
    /// as `self_evaluated` do próprio departamento; o RH soma ainda todas as
    /// `manager_evaluated`.
    pub async fn pending_count(&self, actor: &Employee) -> Result<PendingCount, AppError> {
        let own = |status| EvaluationFilter {
            status: Some(status),
            employee_id: Some(actor.id),
            ..Default::default()
        };
        let mut count = self.evaluation_repo.count(&own(EvaluationStatus::Pending)).await?
            + self.evaluation_repo.count(&own(EvaluationStatus::PendingConfirm)).await?;

        let reviews_department = matches!(actor.role, EmployeeRole::Manager | EmployeeRole::Hr);
        if let Some(department_id) = actor.department_id.filter(|_| reviews_department) {
            let filter = EvaluationFilter {
                status: Some(EvaluationStatus::SelfEvaluated),
                department_id: Some(department_id),
                ..Default::default()
            };
            count += self.evaluation_repo.count(&filter).await?;
        }
        if actor.is_hr() {
            let filter = EvaluationFilter {
                status: Some(EvaluationStatus::ManagerEvaluated),
                ..Default::default()
            };
            count += self.evaluation_repo.count(&filter).await?;
        }

        Ok(PendingCount { count })
    }

    // ---
    // Ciclo de vida
    // ---

    pub async fn create(&self, actor: &Employee, input: CreateEvaluationPayload) -> Result<Evaluation, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH pode agendar avaliações"));
        }
        match input.period {
            ReviewPeriod::Monthly if input.month.is_none() => {
                return Err(AppError::invalid_input("Avaliação mensal exige o mês"));
            }
            ReviewPeriod::Quarterly if input.quarter.is_none() => {
                return Err(AppError::invalid_input("Avaliação trimestral exige o trimestre"));
            }
            _ => {}
        }

        self.employee_repo
            .find_by_id(input.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Colaborador"))?;

        let items = self.evaluation_repo.list_template_items(input.template_id).await?;
        if items.is_empty() {
            return Err(AppError::invalid_input("O modelo não possui itens de KPI"));
        }
        let item_ids: Vec<i64> = items.iter().map(|i| i.id).collect();

        let new = NewEvaluation {
            employee_id: input.employee_id,
            template_id: input.template_id,
            period: input.period,
            year: input.year,
            month: if input.period == ReviewPeriod::Monthly { input.month } else { None },
            quarter: if input.period == ReviewPeriod::Quarterly { input.quarter } else { None },
        };
        let evaluation = self.evaluation_repo.create_with_scores(&new, &item_ids).await?;

        tracing::info!(evaluation_id = evaluation.id, employee_id = evaluation.employee_id, "✅ Avaliação criada");
        self.notifier
            .notify(actor.id, NotificationEvent::EvaluationCreated, payload(&evaluation))
            .await;
        Ok(evaluation)
    }

    pub async fn delete(&self, actor: &Employee, id: i64) -> Result<(), AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH pode excluir avaliações"));
        }
        let evaluation = self.find(id).await?;
        if !self.evaluation_repo.delete_cascade(id).await? {
            return Err(AppError::not_found("Avaliação"));
        }

        tracing::info!(evaluation_id = id, "🗑️ Avaliação excluída");
        self.notifier
            .notify(actor.id, NotificationEvent::EvaluationDeleted, payload(&evaluation))
            .await;
        Ok(())
    }

    // ---
    // Notas por item
    // ---

    async fn load_score(&self, score_id: i64) -> Result<(ScoreItem, Evaluation, Employee), AppError> {
        let score = self
            .evaluation_repo
            .find_score(score_id)
            .await?
            .ok_or_else(|| AppError::not_found("Registro de nota"))?;
        let evaluation = self.find(score.evaluation_id).await?;
        let employee = self.employee_of(&evaluation).await?;

        if evaluation.status == EvaluationStatus::Completed {
            return Err(AppError::invalid_state("Avaliação concluída não aceita novas notas"));
        }
        Ok((score, evaluation, employee))
    }

    async fn save_score(
        &self,
        actor: &Employee,
        score_id: i64,
        source: ScoreSource,
        input: ScorePayload,
        event: NotificationEvent,
    ) -> Result<ScoreItem, AppError> {
        if input.score.is_some_and(|s| s < Decimal::ZERO) {
            return Err(AppError::invalid_input("A nota não pode ser negativa"));
        }
        let updated = self
            .evaluation_repo
            .update_score(score_id, source, input.score, input.comment)
            .await?;
        self.notifier.notify(actor.id, event, payload(&updated)).await;
        Ok(updated)
    }

    pub async fn update_self_score(
        &self,
        actor: &Employee,
        score_id: i64,
        input: ScorePayload,
    ) -> Result<ScoreItem, AppError> {
        let (score, _, employee) = self.load_score(score_id).await?;
        if actor.id != employee.id {
            return Err(AppError::forbidden("Só o próprio colaborador faz a autoavaliação"));
        }
        // Primeira autoavaliação exige gestor direto
        if score.self_score.is_none() && input.score.is_some() && employee.manager_id.is_none() {
            return Err(AppError::invalid_state("Colaborador sem gestor direto, contate o RH"));
        }
        self.save_score(actor, score_id, ScoreSource::SelfReview, input, NotificationEvent::SelfScoreUpdated)
            .await
    }

    pub async fn update_manager_score(
        &self,
        actor: &Employee,
        score_id: i64,
        input: ScorePayload,
    ) -> Result<ScoreItem, AppError> {
        let (_, _, employee) = self.load_score(score_id).await?;
        if !actor.manages(&employee) && !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o gestor direto ou o RH lançam esta nota"));
        }
        self.save_score(actor, score_id, ScoreSource::Manager, input, NotificationEvent::ManagerScoreUpdated)
            .await
    }

    pub async fn update_hr_score(
        &self,
        actor: &Employee,
        score_id: i64,
        input: ScorePayload,
    ) -> Result<ScoreItem, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH lança a nota de RH"));
        }
        self.load_score(score_id).await?;
        self.save_score(actor, score_id, ScoreSource::Hr, input, NotificationEvent::HrScoreUpdated)
            .await
    }

    /// Ajuste manual da nota final de um item, antes da conclusão.
    pub async fn update_final_score(
        &self,
        actor: &Employee,
        score_id: i64,
        input: ScorePayload,
    ) -> Result<ScoreItem, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH ajusta a nota final"));
        }
        self.load_score(score_id).await?;
        self.save_score(actor, score_id, ScoreSource::Final, input, NotificationEvent::FinalScoreUpdated)
            .await
    }

    // ---
    // Máquina de estados
    // ---

    fn check_transition_actor(actor: &Employee, employee: &Employee, target: EvaluationStatus) -> Result<(), AppError> {
        let allowed = match target {
            EvaluationStatus::Pending => false,
            EvaluationStatus::SelfEvaluated => actor.id == employee.id,
            EvaluationStatus::ManagerEvaluated => actor.manages(employee) || actor.is_hr(),
            EvaluationStatus::PendingConfirm => actor.is_hr(),
            EvaluationStatus::Completed => actor.id == employee.id || actor.is_hr(),
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Sem permissão para mover a avaliação para {}",
                target.as_str()
            )))
        }
    }

    fn stale_status(evaluation: &Evaluation) -> AppError {
        AppError::invalid_state(format!(
            "A avaliação {} mudou de status durante a operação",
            evaluation.id
        ))
    }

    pub async fn update_status(
        &self,
        actor: &Employee,
        id: i64,
        target: EvaluationStatus,
        total_score: Option<Decimal>,
    ) -> Result<Evaluation, AppError> {
        let evaluation = self.find(id).await?;
        if !evaluation.status.can_transition_to(target) {
            return Err(AppError::invalid_state(format!(
                "Transição de {} para {} não permitida",
                evaluation.status.as_str(),
                target.as_str()
            )));
        }

        let employee = self.employee_of(&evaluation).await?;
        Self::check_transition_actor(actor, &employee, target)?;

        let updated = match target {
            EvaluationStatus::SelfEvaluated => {
                if employee.manager_id.is_none() {
                    return Err(AppError::invalid_state("Colaborador sem gestor direto, contate o RH"));
                }
                self.advance(&evaluation, target).await?
            }
            EvaluationStatus::ManagerEvaluated => self.enter_manager_evaluated(actor, &evaluation).await?,
            EvaluationStatus::Completed => self.complete(&evaluation, total_score).await?,
            _ => self.advance(&evaluation, target).await?,
        };

        tracing::info!(
            evaluation_id = id,
            from = evaluation.status.as_str(),
            to = updated.status.as_str(),
            "Status da avaliação atualizado"
        );
        self.notifier
            .notify(actor.id, NotificationEvent::EvaluationStatusChange, payload(&updated))
            .await;
        Ok(updated)
    }

    async fn advance(&self, evaluation: &Evaluation, target: EvaluationStatus) -> Result<Evaluation, AppError> {
        self.evaluation_repo
            .transition_status(evaluation.id, evaluation.status, target)
            .await?
            .ok_or_else(|| Self::stale_status(evaluation))
    }

    // Com regra ativa, calcula o RH e avança para pending_confirm na mesma transação
    async fn enter_manager_evaluated(&self, actor: &Employee, evaluation: &Evaluation) -> Result<Evaluation, AppError> {
        let entered = self.advance(evaluation, EvaluationStatus::ManagerEvaluated).await?;

        let Some(rule) = self.rule_service.active_rule().await? else {
            return Ok(entered);
        };
        let advance = Some((EvaluationStatus::ManagerEvaluated, EvaluationStatus::PendingConfirm));
        match self.rule_service.apply(actor.id, &rule, evaluation.id, advance).await {
            Ok(applied) if applied.advanced => self.find(evaluation.id).await,
            Ok(_) => Ok(entered),
            Err(e) => {
                tracing::warn!(
                    evaluation_id = evaluation.id,
                    "Falha ao aplicar a regra, aguardando revisão manual do RH: {:?}",
                    e
                );
                Ok(entered)
            }
        }
    }

    async fn complete(&self, evaluation: &Evaluation, explicit_total: Option<Decimal>) -> Result<Evaluation, AppError> {
        if evaluation.has_objection {
            return Err(AppError::invalid_state("Há uma objeção pendente de análise pelo RH"));
        }
        if explicit_total.is_some_and(|t| t < Decimal::ZERO) {
            return Err(AppError::invalid_input("A nota não pode ser negativa"));
        }

        let scores = self.evaluation_repo.list_scores(evaluation.id).await?;
        let finals: Vec<FinalScore> = scores
            .iter()
            .map(|s| FinalScore { score_id: s.id, final_score: s.resolved_final_score() })
            .collect();

        let total = match explicit_total.filter(|t| !t.is_zero()) {
            Some(total) => Some(round2(total)),
            None if evaluation.total_locked => None,
            None => Some(round2(finals.iter().map(|f| f.final_score).sum())),
        };

        self.evaluation_repo
            .complete(evaluation.id, &finals, total)
            .await?
            .ok_or_else(|| Self::stale_status(evaluation))
    }

    // ---
    // Objeção
    // ---

    pub async fn submit_objection(&self, actor: &Employee, id: i64, reason: &str) -> Result<Evaluation, AppError> {
        let evaluation = self.find(id).await?;
        if actor.id != evaluation.employee_id {
            return Err(AppError::forbidden("Apenas o colaborador avaliado pode contestar"));
        }
        let already_raised =
            evaluation.has_objection || evaluation.objection_reason.as_deref().is_some_and(|r| !r.is_empty());
        if already_raised {
            return Err(AppError::invalid_state("A objeção só pode ser registrada uma vez"));
        }
        if evaluation.status != EvaluationStatus::PendingConfirm {
            return Err(AppError::invalid_state("Objeção só é aceita aguardando confirmação"));
        }

        let updated = self
            .evaluation_repo
            .record_objection(id, reason)
            .await?
            .ok_or_else(|| AppError::invalid_state("A objeção só pode ser registrada uma vez"))?;

        tracing::info!(evaluation_id = id, "Objeção registrada");
        self.notifier
            .notify(actor.id, NotificationEvent::ObjectionSubmitted, payload(&updated))
            .await;
        Ok(updated)
    }

    pub async fn handle_objection(
        &self,
        actor: &Employee,
        id: i64,
        total_score: Decimal,
        final_comment: &str,
    ) -> Result<Evaluation, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH pode tratar objeções"));
        }
        if final_comment.trim().is_empty() {
            return Err(AppError::invalid_input("Informe o comentário final"));
        }
        if total_score < Decimal::ZERO {
            return Err(AppError::invalid_input("A nota não pode ser negativa"));
        }

        let evaluation = self.find(id).await?;
        if !evaluation.has_objection {
            return Err(AppError::invalid_state("Não há objeção para tratar nesta avaliação"));
        }

        let updated = self
            .evaluation_repo
            .resolve_objection(id, round2(total_score), final_comment)
            .await?
            .ok_or_else(|| AppError::invalid_state("Não há objeção para tratar nesta avaliação"))?;

        tracing::info!(evaluation_id = id, total = %updated.total_score, "Objeção tratada");
        self.notifier
            .notify(updated.employee_id, NotificationEvent::ObjectionHandled, payload(&updated))
            .await;
        Ok(updated)
    }

    // ---
    // Pós-condição comum a todo evento de convite
    // ---

    /// Chamada depois de recusar, concluir, cancelar ou excluir um convite.
    ///
    /// Em `manager_evaluated`, com regra ativa e nenhum convite em aberto,
    /// recalcula e avança. Em `pending_confirm`, a remoção de um convite
    /// concluído recalcula sem mudar o status. Erros só são registrados.
    pub async fn reconcile_after_invitation_change(&self, actor_id: i64, evaluation_id: i64, removed_completed: bool) {
        if let Err(e) = self.try_reconcile(actor_id, evaluation_id, removed_completed).await {
            tracing::warn!(evaluation_id, "Falha ao reaplicar a regra após mudança de convite: {:?}", e);
        }
    }

    async fn try_reconcile(&self, actor_id: i64, evaluation_id: i64, removed_completed: bool) -> Result<(), AppError> {
        let Some(evaluation) = self.evaluation_repo.find_by_id(evaluation_id).await? else {
            return Ok(());
        };

        match evaluation.status {
            EvaluationStatus::ManagerEvaluated => {
                let Some(rule) = self.rule_service.active_rule().await? else {
                    return Ok(());
                };
                let invitations = self.invitation_repo.list_for_evaluation(evaluation_id).await?;
                if invitations.iter().any(|i| i.status.is_outstanding()) {
                    return Ok(());
                }
                let advance = Some((EvaluationStatus::ManagerEvaluated, EvaluationStatus::PendingConfirm));
                let applied = self.rule_service.apply(actor_id, &rule, evaluation_id, advance).await?;
                if applied.advanced {
                    tracing::info!(evaluation_id, "Convites encerrados, avaliação aguardando confirmação");
                }
            }
            EvaluationStatus::PendingConfirm if removed_completed => {
                let Some(rule) = self.rule_service.active_rule().await? else {
                    return Ok(());
                };
                self.rule_service.apply(actor_id, &rule, evaluation_id, None).await?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{memory::MemoryStore, InvitationRepository, PerformanceRuleRepository};
    use crate::models::{
        employee::EmployeeRole,
        invitation::InvitationStatus,
        performance_rule::{
            EmployeeInvitationWeights, NoInvitationWeights, PerformanceRule, WithInvitationWeights,
        },
    };
    use crate::services::notification::recording::RecordingNotifier;
    use rust_decimal_macros::dec;

    pub(crate) struct Fixture {
        pub store: MemoryStore,
        pub service: EvaluationService,
        pub notifier: RecordingNotifier,
        pub hr: Employee,
        pub manager: Employee,
        pub employee: Employee,
        pub orphan: Employee,
        pub peer: Employee,
        pub item_ids: Vec<i64>,
    }

    pub(crate) async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::default();
        let shared = Arc::new(store.clone());
        let notifier_arc: Arc<dyn Notifier> = Arc::new(notifier.clone());

        let rule_service =
            PerformanceRuleService::new(shared.clone(), shared.clone(), shared.clone(), notifier_arc.clone());
        let service = EvaluationService::new(shared.clone(), shared.clone(), shared, rule_service, notifier_arc);

        let hr = store.insert_employee("Helena (RH)", EmployeeRole::Hr, None).await;
        let manager = store.insert_employee("Marcos", EmployeeRole::Manager, None).await;
        let employee = store.insert_employee("Ana", EmployeeRole::Employee, Some(manager.id)).await;
        let orphan = store.insert_employee("Sem Gestor", EmployeeRole::Employee, None).await;
        let peer = store.insert_employee("Pedro", EmployeeRole::Employee, Some(manager.id)).await;
        let item_ids = store
            .insert_items(1, &["Entregas", "Qualidade"])
            .await
            .into_iter()
            .map(|i| i.id)
            .collect();

        Fixture { store, service, notifier, hr, manager, employee, orphan, peer, item_ids }
    }

    pub(crate) fn yearly(employee_id: i64) -> CreateEvaluationPayload {
        CreateEvaluationPayload {
            employee_id,
            template_id: 1,
            period: ReviewPeriod::Yearly,
            year: 2025,
            month: None,
            quarter: None,
        }
    }

    pub(crate) fn score(value: Decimal) -> ScorePayload {
        ScorePayload { score: Some(value), comment: None }
    }

    pub(crate) async fn enable_rule(store: &MemoryStore, no_inv: (Decimal, Decimal), with_inv: (Decimal, Decimal, Decimal)) {
        let rule = PerformanceRule {
            no_invitation: NoInvitationWeights { self_weight: no_inv.0, superior_weight: no_inv.1 },
            with_invitation: WithInvitationWeights {
                employee: EmployeeInvitationWeights {
                    self_weight: with_inv.0,
                    invite_superior_weight: with_inv.1,
                    superior_weight: with_inv.2,
                },
            },
            enabled: true,
        };
        PerformanceRuleRepository::save(store, &rule).await.unwrap();
    }

    /// Avaliação em `self_evaluated` com autoavaliação e nota do gestor lançadas.
    pub(crate) async fn scored_evaluation(f: &Fixture, self_score: Decimal, manager_score: Decimal) -> Evaluation {
        let evaluation = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        for s in &scores {
            f.service.update_self_score(&f.employee, s.id, score(self_score)).await.unwrap();
            f.service.update_manager_score(&f.manager, s.id, score(manager_score)).await.unwrap();
        }
        f.service
            .update_status(&f.employee, evaluation.id, EvaluationStatus::SelfEvaluated, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_requires_hr_and_period_fields() {
        let f = fixture().await;

        match f.service.create(&f.manager, yearly(f.employee.id)).await {
            Err(AppError::Forbidden(_)) => {}
            other => panic!("esperava Forbidden, veio {:?}", other),
        }

        let mut monthly = yearly(f.employee.id);
        monthly.period = ReviewPeriod::Monthly;
        match f.service.create(&f.hr, monthly).await {
            Err(AppError::InvalidInput(_)) => {}
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }

        let evaluation = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        assert_eq!(evaluation.status, EvaluationStatus::Pending);
        let detail = f.service.get(evaluation.id).await.unwrap();
        assert_eq!(detail.scores.len(), 2);
        assert_eq!(f.notifier.events().await, vec![NotificationEvent::EvaluationCreated]);
    }

    #[tokio::test]
    async fn self_evaluation_without_manager_is_rejected() {
        let f = fixture().await;
        let evaluation = f.service.create(&f.hr, yearly(f.orphan.id)).await.unwrap();
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();

        match f.service.update_self_score(&f.orphan, scores[0].id, score(dec!(80))).await {
            Err(AppError::InvalidState(msg)) => assert!(msg.contains("gestor")),
            other => panic!("esperava InvalidState, veio {:?}", other),
        }
        match f
            .service
            .update_status(&f.orphan, evaluation.id, EvaluationStatus::SelfEvaluated, None)
            .await
        {
            Err(AppError::InvalidState(msg)) => assert!(msg.contains("gestor")),
            other => panic!("esperava InvalidState, veio {:?}", other),
        }

        assert_eq!(f.service.find(evaluation.id).await.unwrap().status, EvaluationStatus::Pending);
    }

    #[tokio::test]
    async fn score_actors_are_enforced() {
        let f = fixture().await;
        let evaluation = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        let score_id = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap()[0].id;

        assert!(matches!(
            f.service.update_self_score(&f.manager, score_id, score(dec!(80))).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.update_manager_score(&f.peer, score_id, score(dec!(80))).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.update_hr_score(&f.manager, score_id, score(dec!(80))).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.update_self_score(&f.employee, score_id, score(dec!(-1))).await,
            Err(AppError::InvalidInput(_))
        ));

        f.service.update_manager_score(&f.hr, score_id, score(dec!(75))).await.unwrap();
        f.service.update_hr_score(&f.hr, score_id, score(dec!(77))).await.unwrap();
    }

    #[tokio::test]
    async fn transitions_cannot_skip_steps() {
        let f = fixture().await;
        let evaluation = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();

        match f
            .service
            .update_status(&f.hr, evaluation.id, EvaluationStatus::Completed, None)
            .await
        {
            Err(AppError::InvalidState(_)) => {}
            other => panic!("esperava InvalidState, veio {:?}", other),
        }
        assert!(matches!(
            f.service
                .update_status(&f.manager, evaluation.id, EvaluationStatus::SelfEvaluated, None)
                .await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn manager_evaluated_stays_without_active_rule() {
        let f = fixture().await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;

        let updated = f
            .service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        assert_eq!(updated.status, EvaluationStatus::ManagerEvaluated);
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        assert!(scores.iter().all(|s| s.hr_score.is_none()));
    }

    #[tokio::test]
    async fn active_rule_scores_and_advances_to_pending_confirm() {
        let f = fixture().await;
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;

        let updated = f
            .service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        assert_eq!(updated.status, EvaluationStatus::PendingConfirm);
        assert_eq!(updated.total_score, dec!(170.00));
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        assert!(scores.iter().all(|s| s.hr_score == Some(dec!(85.00))));
        // Quem moveu o status aparece como autor do recálculo
        assert!(f
            .notifier
            .entries()
            .await
            .contains(&(f.manager.id, NotificationEvent::PerformanceRuleApplied)));
    }

    #[tokio::test]
    async fn completed_invitation_uses_invitation_weights() {
        let f = fixture().await;
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;

        let invitations = InvitationRepository::create_batch(
            &f.store,
            evaluation.id,
            f.hr.id,
            &[f.peer.id],
            None,
            &f.item_ids,
        )
        .await
        .unwrap();
        for s in InvitationRepository::list_scores(&f.store, invitations[0].id).await.unwrap() {
            InvitationRepository::update_score(&f.store, s.id, Some(dec!(70)), None).await.unwrap();
        }
        InvitationRepository::transition(&f.store, invitations[0].id, InvitationStatus::Pending, InvitationStatus::Completed)
            .await
            .unwrap();

        let updated = f
            .service
            .update_status(&f.hr, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        assert_eq!(updated.status, EvaluationStatus::PendingConfirm);
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        assert!(scores.iter().all(|s| s.hr_score == Some(dec!(81.00))));
        assert_eq!(updated.total_score, dec!(162.00));
    }

    #[tokio::test]
    async fn rule_failure_keeps_manager_evaluated() {
        let f = fixture().await;
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        f.store.fail_hr_writes(true);

        let updated = f
            .service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        assert_eq!(updated.status, EvaluationStatus::ManagerEvaluated);
        assert_eq!(updated.total_score, Decimal::ZERO);
    }

    #[tokio::test]
    async fn completion_resolves_final_scores() {
        let f = fixture().await;
        let evaluation = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        f.service.update_self_score(&f.employee, scores[0].id, score(dec!(60))).await.unwrap();
        f.service.update_manager_score(&f.manager, scores[0].id, score(dec!(70))).await.unwrap();
        f.service.update_self_score(&f.employee, scores[1].id, score(dec!(50))).await.unwrap();
        f.service.update_hr_score(&f.hr, scores[1].id, score(dec!(95))).await.unwrap();
        f.store.set_status(evaluation.id, EvaluationStatus::PendingConfirm).await;

        let completed = f
            .service
            .update_status(&f.employee, evaluation.id, EvaluationStatus::Completed, None)
            .await
            .unwrap();

        assert_eq!(completed.status, EvaluationStatus::Completed);
        assert_eq!(completed.total_score, dec!(165));
        let scores = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap();
        assert_eq!(scores[0].final_score, Some(dec!(70)));
        assert_eq!(scores[1].final_score, Some(dec!(95)));

        // Concluída: notas travadas
        assert!(matches!(
            f.service.update_hr_score(&f.hr, scores[0].id, score(dec!(10))).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn explicit_total_wins_on_completion() {
        let f = fixture().await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        f.store.set_status(evaluation.id, EvaluationStatus::PendingConfirm).await;

        let completed = f
            .service
            .update_status(&f.hr, evaluation.id, EvaluationStatus::Completed, Some(dec!(150.456)))
            .await
            .unwrap();

        assert_eq!(completed.total_score, dec!(150.46));
    }

    #[tokio::test]
    async fn negative_explicit_total_is_rejected() {
        let f = fixture().await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        f.store.set_status(evaluation.id, EvaluationStatus::PendingConfirm).await;

        match f
            .service
            .update_status(&f.hr, evaluation.id, EvaluationStatus::Completed, Some(dec!(-10)))
            .await
        {
            Err(AppError::InvalidInput(_)) => {}
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }
        assert_eq!(
            f.service.find(evaluation.id).await.unwrap().status,
            EvaluationStatus::PendingConfirm
        );
    }

    #[tokio::test]
    async fn objection_flow() {
        let f = fixture().await;
        enable_rule(&f.store, (dec!(50), dec!(50)), (dec!(30), dec!(30), dec!(40))).await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;

        // Fora de pending_confirm
        assert!(matches!(
            f.service.submit_objection(&f.employee, evaluation.id, "discordo").await,
            Err(AppError::InvalidState(_))
        ));

        f.service
            .update_status(&f.manager, evaluation.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        assert!(matches!(
            f.service.submit_objection(&f.manager, evaluation.id, "discordo").await,
            Err(AppError::Forbidden(_))
        ));

        let objected = f.service.submit_objection(&f.employee, evaluation.id, "discordo").await.unwrap();
        assert!(objected.has_objection);

        match f.service.submit_objection(&f.employee, evaluation.id, "de novo").await {
            Err(AppError::InvalidState(_)) => {}
            other => panic!("esperava InvalidState, veio {:?}", other),
        }

        // Concluir com objeção aberta é bloqueado
        assert!(matches!(
            f.service
                .update_status(&f.employee, evaluation.id, EvaluationStatus::Completed, None)
                .await,
            Err(AppError::InvalidState(_))
        ));

        assert!(matches!(
            f.service.handle_objection(&f.manager, evaluation.id, dec!(88.5), "ajustado").await,
            Err(AppError::Forbidden(_))
        ));
        let resolved = f
            .service
            .handle_objection(&f.hr, evaluation.id, dec!(88.5), "Ajustado após revisão")
            .await
            .unwrap();
        assert!(!resolved.has_objection);
        assert!(resolved.total_locked);
        assert_eq!(resolved.total_score, dec!(88.5));
        assert_eq!(resolved.status, EvaluationStatus::PendingConfirm);

        // Uma vez só, mesmo depois de resolvida
        assert!(matches!(
            f.service.submit_objection(&f.employee, evaluation.id, "outra").await,
            Err(AppError::InvalidState(_))
        ));

        // Total travado sobrevive à conclusão sem total explícito
        let completed = f
            .service
            .update_status(&f.employee, evaluation.id, EvaluationStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(completed.total_score, dec!(88.5));
        let events = f.notifier.events().await;
        assert!(events.contains(&NotificationEvent::ObjectionSubmitted));
        assert!(events.contains(&NotificationEvent::ObjectionHandled));
    }

    #[tokio::test]
    async fn delete_cascades_everything() {
        let f = fixture().await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        InvitationRepository::create_batch(&f.store, evaluation.id, f.hr.id, &[f.peer.id], None, &f.item_ids)
            .await
            .unwrap();

        assert!(matches!(
            f.service.delete(&f.manager, evaluation.id).await,
            Err(AppError::Forbidden(_))
        ));
        f.service.delete(&f.hr, evaluation.id).await.unwrap();

        assert!(matches!(f.service.find(evaluation.id).await, Err(AppError::ResourceNotFound(_))));
        assert!(EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap().is_empty());
        assert!(InvitationRepository::list_for_evaluation(&f.store, evaluation.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_paginated() {
        let f = fixture().await;
        for _ in 0..3 {
            f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        }
        f.service.create(&f.hr, yearly(f.peer.id)).await.unwrap();

        let page = f
            .service
            .list(&EvaluationFilter {
                employee_id: Some(f.employee.id),
                page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn list_filters_by_department_manager_and_month() {
        let f = fixture().await;
        f.store.set_department(f.employee.id, Some(7)).await;
        f.store.set_department(f.orphan.id, Some(8)).await;

        let monthly = |employee_id, month| CreateEvaluationPayload {
            period: ReviewPeriod::Monthly,
            month: Some(month),
            ..yearly(employee_id)
        };
        f.service.create(&f.hr, monthly(f.employee.id, 3)).await.unwrap();
        f.service.create(&f.hr, monthly(f.employee.id, 4)).await.unwrap();
        f.service.create(&f.hr, monthly(f.orphan.id, 3)).await.unwrap();
        f.service.create(&f.hr, monthly(f.peer.id, 3)).await.unwrap();

        let by_department = f
            .service
            .list(&EvaluationFilter { department_id: Some(7), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_department.total, 2);
        assert!(by_department.data.iter().all(|e| e.employee_id == f.employee.id));

        // Ana e Pedro respondem ao mesmo gestor
        let by_manager = f
            .service
            .list(&EvaluationFilter { manager_id: Some(f.manager.id), month: Some(3), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_manager.total, 2);
        assert!(by_manager.data.iter().all(|e| e.month == Some(3) && e.employee_id != f.orphan.id));

        let by_quarter = f
            .service
            .list(&EvaluationFilter { quarter: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(by_quarter.total, 0);
    }

    #[tokio::test]
    async fn employee_lists_and_pending_subset() {
        let f = fixture().await;
        let self_evaluated = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let pending = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        let done = f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        f.store.set_status(done.id, EvaluationStatus::Completed).await;
        f.service.create(&f.hr, yearly(f.peer.id)).await.unwrap();

        let all = f.service.list_for_employee(f.employee.id).await.unwrap();
        assert_eq!(all.len(), 3);

        let mut open: Vec<i64> = f
            .service
            .pending_for_employee(f.employee.id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        open.sort();
        assert_eq!(open, vec![self_evaluated.id, pending.id]);

        match f.service.pending_for_employee(999).await {
            Err(AppError::ResourceNotFound(_)) => {}
            other => panic!("esperava ResourceNotFound, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn pending_count_depends_on_role() {
        let f = fixture().await;
        f.store.set_department(f.employee.id, Some(7)).await;

        scored_evaluation(&f, dec!(80), dec!(90)).await;
        f.service.create(&f.hr, yearly(f.employee.id)).await.unwrap();
        let reviewed = scored_evaluation(&f, dec!(70), dec!(75)).await;
        f.service
            .update_status(&f.manager, reviewed.id, EvaluationStatus::ManagerEvaluated, None)
            .await
            .unwrap();

        let manager = Employee { department_id: Some(7), ..f.manager.clone() };
        let hr = Employee { department_id: Some(7), ..f.hr.clone() };

        assert_eq!(f.service.pending_count(&f.employee).await.unwrap().count, 1);
        assert_eq!(f.service.pending_count(&manager).await.unwrap().count, 1);
        assert_eq!(f.service.pending_count(&hr).await.unwrap().count, 2);
        // Sem departamento o gestor só vê as próprias
        assert_eq!(f.service.pending_count(&f.manager).await.unwrap().count, 0);
        assert_eq!(f.service.pending_count(&f.peer).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn final_score_is_hr_only_and_recomputed_on_completion() {
        let f = fixture().await;
        let evaluation = scored_evaluation(&f, dec!(80), dec!(90)).await;
        let score_id = EvaluationRepository::list_scores(&f.store, evaluation.id).await.unwrap()[0].id;

        match f.service.update_final_score(&f.manager, score_id, score(dec!(95))).await {
            Err(AppError::Forbidden(_)) => {}
            other => panic!("esperava Forbidden, veio {:?}", other),
        }
        match f.service.update_final_score(&f.hr, score_id, score(dec!(-1))).await {
            Err(AppError::InvalidInput(_)) => {}
            other => panic!("esperava InvalidInput, veio {:?}", other),
        }

        let input = ScorePayload { score: Some(dec!(95)), comment: Some("Ajuste do comitê".into()) };
        let updated = f.service.update_final_score(&f.hr, score_id, input).await.unwrap();
        assert_eq!(updated.final_score, Some(dec!(95)));
        assert_eq!(updated.final_comment.as_deref(), Some("Ajuste do comitê"));
        assert!(f.notifier.events().await.contains(&NotificationEvent::FinalScoreUpdated));

        f.store.set_status(evaluation.id, EvaluationStatus::PendingConfirm).await;
        f.service
            .update_status(&f.employee, evaluation.id, EvaluationStatus::Completed, None)
            .await
            .unwrap();
        let completed = EvaluationRepository::find_score(&f.store, score_id).await.unwrap().unwrap();
        assert_eq!(completed.final_score, Some(dec!(90)));
        assert_eq!(completed.final_comment.as_deref(), Some("Ajuste do comitê"));

        match f.service.update_final_score(&f.hr, score_id, score(dec!(95))).await {
            Err(AppError::InvalidState(_)) => {}
            other => panic!("esperava InvalidState, veio {:?}", other),
        }
    }
}
