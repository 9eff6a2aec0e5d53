//! Repositórios em memória usados pelos testes de serviço.
//!
//! Um único `MemoryStore` implementa todos os contratos de `repositories`.
//! Cada operação segura o lock de escrita do início ao fim, o que dá a mesma
//! atomicidade das transações do Postgres.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::repositories::{
        EmployeeRepository, EvaluationRepository, InvitationRepository, PerformanceRuleRepository,
        SettingsRepository, ShareRepository, StatusChange, TemplateRepository,
    },
    models::{
        employee::{Employee, EmployeeRole},
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

#[derive(Default)]
struct Tables {
    next_id: i64,
    employees: BTreeMap<i64, Employee>,
    templates: BTreeMap<i64, KpiTemplate>,
    items: BTreeMap<i64, KpiItem>,
    evaluations: BTreeMap<i64, Evaluation>,
    scores: BTreeMap<i64, ScoreItem>,
    invitations: BTreeMap<i64, Invitation>,
    invited_scores: BTreeMap<i64, InvitedScore>,
    shares: BTreeMap<i64, EvaluationShare>,
    share_scores: BTreeMap<i64, ShareScore>,
    rule: Option<PerformanceRule>,
    settings: BTreeMap<String, String>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn drop_invitation(&mut self, id: i64) -> bool {
        self.invited_scores.retain(|_, s| s.invitation_id != id);
        self.invitations.remove(&id).is_some()
    }

    fn drop_share(&mut self, id: i64) -> bool {
        self.share_scores.retain(|_, s| s.share_id != id);
        self.shares.remove(&id).is_some()
    }

    fn template_items(&self, template_id: i64) -> Vec<KpiItem> {
        let mut items: Vec<KpiItem> = self
            .items
            .values()
            .filter(|i| i.template_id == template_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.sort_order, i.id));
        items
    }

    // Mesma semântica do WHERE do repositório Postgres
    fn matches(&self, evaluation: &Evaluation, filter: &EvaluationFilter) -> bool {
        let employee = self.employees.get(&evaluation.employee_id);
        filter.status.is_none_or(|s| evaluation.status == s)
            && filter.employee_id.is_none_or(|id| evaluation.employee_id == id)
            && filter
                .department_id
                .is_none_or(|d| employee.is_some_and(|e| e.department_id == Some(d)))
            && filter
                .manager_id
                .is_none_or(|m| employee.is_some_and(|e| e.manager_id == Some(m)))
            && filter.period.is_none_or(|p| evaluation.period == p)
            && filter.year.is_none_or(|y| evaluation.year == y)
            && filter.month.is_none_or(|m| evaluation.month == Some(m))
            && filter.quarter.is_none_or(|q| evaluation.quarter == Some(q))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    // Simulam falha de banco na gravação das notas de RH e das configurações
    fail_hr_writes: Arc<AtomicBool>,
    fail_settings_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_hr_writes(&self, fail: bool) {
        self.fail_hr_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_settings_writes(&self, fail: bool) {
        self.fail_settings_writes.store(fail, Ordering::SeqCst);
    }

    // Grava como se fosse direto no banco, sem passar pela API
    pub async fn put_setting(&self, key: &str, value: &str) {
        self.tables.write().await.settings.insert(key.to_string(), value.to_string());
    }

    pub async fn insert_employee(&self, name: &str, role: EmployeeRole, manager_id: Option<i64>) -> Employee {
        let mut tables = self.tables.write().await;
        let employee = Employee {
            id: tables.next_id(),
            name: name.to_string(),
            email: None,
            role,
            department_id: None,
            manager_id,
            is_active: true,
        };
        tables.employees.insert(employee.id, employee.clone());
        employee
    }

    pub async fn set_department(&self, employee_id: i64, department_id: Option<i64>) {
        if let Some(employee) = self.tables.write().await.employees.get_mut(&employee_id) {
            employee.department_id = department_id;
        }
    }

    pub async fn deactivate(&self, employee_id: i64) {
        if let Some(employee) = self.tables.write().await.employees.get_mut(&employee_id) {
            employee.is_active = false;
        }
    }

    pub async fn insert_items(&self, template_id: i64, names: &[&str]) -> Vec<KpiItem> {
        let mut tables = self.tables.write().await;
        names
            .iter()
            .map(|name| {
                let item = KpiItem {
                    id: tables.next_id(),
                    template_id,
                    name: name.to_string(),
                    description: None,
                    max_score: Decimal::ONE_HUNDRED,
                    sort_order: 0,
                };
                tables.items.insert(item.id, item.clone());
                item
            })
            .collect()
    }

    pub async fn set_status(&self, evaluation_id: i64, status: EvaluationStatus) {
        if let Some(evaluation) = self.tables.write().await.evaluations.get_mut(&evaluation_id) {
            evaluation.status = status;
        }
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, AppError> {
        Ok(self.tables.read().await.employees.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Employee>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .employees
            .values()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EvaluationRepository for MemoryStore {
    async fn list_template_items(&self, template_id: i64) -> Result<Vec<KpiItem>, AppError> {
        Ok(self.tables.read().await.template_items(template_id))
    }

    async fn create_with_scores(
        &self,
        new: &NewEvaluation,
        item_ids: &[i64],
    ) -> Result<Evaluation, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let evaluation = Evaluation {
            id: tables.next_id(),
            employee_id: new.employee_id,
            template_id: new.template_id,
            period: new.period,
            year: new.year,
            month: new.month,
            quarter: new.quarter,
            status: EvaluationStatus::Pending,
            total_score: Decimal::ZERO,
            has_objection: false,
            objection_reason: None,
            final_comment: None,
            total_locked: false,
            created_at: now,
            updated_at: now,
        };
        tables.evaluations.insert(evaluation.id, evaluation.clone());

        for item_id in item_ids {
            let score = ScoreItem {
                id: tables.next_id(),
                evaluation_id: evaluation.id,
                item_id: *item_id,
                self_score: None,
                self_comment: None,
                manager_score: None,
                manager_comment: None,
                hr_score: None,
                hr_comment: None,
                final_score: None,
                final_comment: None,
            };
            tables.scores.insert(score.id, score);
        }
        Ok(evaluation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Evaluation>, AppError> {
        Ok(self.tables.read().await.evaluations.get(&id).cloned())
    }

    async fn list(&self, filter: &EvaluationFilter) -> Result<(Vec<Evaluation>, i64), AppError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Evaluation> = tables
            .evaluations
            .values()
            .filter(|e| tables.matches(e, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.page_size() as usize)
            .collect();
        Ok((data, total))
    }

    async fn count(&self, filter: &EvaluationFilter) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.evaluations.values().filter(|e| tables.matches(e, filter)).count() as i64)
    }

    async fn list_by_employee(
        &self,
        employee_id: i64,
        statuses: &[EvaluationStatus],
    ) -> Result<Vec<Evaluation>, AppError> {
        let tables = self.tables.read().await;
        let mut evaluations: Vec<Evaluation> = tables
            .evaluations
            .values()
            .filter(|e| e.employee_id == employee_id)
            .filter(|e| statuses.is_empty() || statuses.contains(&e.status))
            .cloned()
            .collect();
        evaluations.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(evaluations)
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        let invitation_ids: Vec<i64> = tables
            .invitations
            .values()
            .filter(|i| i.evaluation_id == id)
            .map(|i| i.id)
            .collect();
        for invitation_id in invitation_ids {
            tables.drop_invitation(invitation_id);
        }

        let share_ids: Vec<i64> = tables
            .shares
            .values()
            .filter(|s| s.evaluation_id == id)
            .map(|s| s.id)
            .collect();
        for share_id in share_ids {
            tables.drop_share(share_id);
        }

        tables.scores.retain(|_, s| s.evaluation_id != id);
        Ok(tables.evaluations.remove(&id).is_some())
    }

    async fn list_scores(&self, evaluation_id: i64) -> Result<Vec<ScoreItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .scores
            .values()
            .filter(|s| s.evaluation_id == evaluation_id)
            .cloned()
            .collect())
    }

    async fn find_score(&self, score_id: i64) -> Result<Option<ScoreItem>, AppError> {
        Ok(self.tables.read().await.scores.get(&score_id).cloned())
    }

    async fn update_score(
        &self,
        score_id: i64,
        source: ScoreSource,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<ScoreItem, AppError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .scores
            .get_mut(&score_id)
            .ok_or_else(|| AppError::not_found("Registro de nota"))?;

        match source {
            ScoreSource::SelfReview => {
                record.self_score = score;
                record.self_comment = comment;
            }
            ScoreSource::Manager => {
                record.manager_score = score;
                record.manager_comment = comment;
            }
            ScoreSource::Hr => {
                record.hr_score = score;
                record.hr_comment = comment;
            }
            ScoreSource::Final => {
                record.final_score = score;
                record.final_comment = comment;
            }
        }
        Ok(record.clone())
    }

    async fn transition_status(
        &self,
        id: i64,
        from: EvaluationStatus,
        to: EvaluationStatus,
    ) -> Result<Option<Evaluation>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .evaluations
            .get_mut(&id)
            .filter(|e| e.status == from)
            .map(|e| {
                e.status = to;
                e.updated_at = Utc::now();
                e.clone()
            }))
    }

    async fn apply_hr_scores(
        &self,
        id: i64,
        outcome: &RuleOutcome,
        advance: Option<StatusChange>,
    ) -> Result<bool, AppError> {
        if self.fail_hr_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.write().await;
        for update in &outcome.updates {
            if let Some(score) = tables.scores.get_mut(&update.score_id).filter(|s| s.evaluation_id == id) {
                score.hr_score = Some(update.hr_score);
                score.hr_comment = Some(update.hr_comment.clone());
            }
        }

        let Some(evaluation) = tables.evaluations.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(total) = outcome.total_score.filter(|_| !evaluation.total_locked) {
            evaluation.total_score = total;
        }
        let advanced = match advance {
            Some((from, to)) if evaluation.status == from => {
                evaluation.status = to;
                true
            }
            _ => false,
        };
        evaluation.updated_at = Utc::now();
        Ok(advanced)
    }

    async fn complete(
        &self,
        id: i64,
        finals: &[FinalScore],
        total: Option<Decimal>,
    ) -> Result<Option<Evaluation>, AppError> {
        let mut tables = self.tables.write().await;

        let Some(evaluation) = tables
            .evaluations
            .get_mut(&id)
            .filter(|e| e.status == EvaluationStatus::PendingConfirm && !e.has_objection)
        else {
            return Ok(None);
        };
        evaluation.status = EvaluationStatus::Completed;
        if let Some(total) = total {
            evaluation.total_score = total;
        }
        evaluation.updated_at = Utc::now();
        let completed = evaluation.clone();

        for final_score in finals {
            if let Some(score) = tables.scores.get_mut(&final_score.score_id) {
                score.final_score = Some(final_score.final_score);
            }
        }
        Ok(Some(completed))
    }

    async fn record_objection(&self, id: i64, reason: &str) -> Result<Option<Evaluation>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .evaluations
            .get_mut(&id)
            .filter(|e| {
                e.status == EvaluationStatus::PendingConfirm
                    && !e.has_objection
                    && e.objection_reason.as_deref().unwrap_or_default().is_empty()
            })
            .map(|e| {
                e.has_objection = true;
                e.objection_reason = Some(reason.to_string());
                e.updated_at = Utc::now();
                e.clone()
            }))
    }

    async fn resolve_objection(
        &self,
        id: i64,
        total: Decimal,
        final_comment: &str,
    ) -> Result<Option<Evaluation>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .evaluations
            .get_mut(&id)
            .filter(|e| e.has_objection)
            .map(|e| {
                e.has_objection = false;
                e.total_score = total;
                e.final_comment = Some(final_comment.to_string());
                e.total_locked = true;
                e.updated_at = Utc::now();
                e.clone()
            }))
    }
}

#[async_trait]
impl InvitationRepository for MemoryStore {
    async fn create_batch(
        &self,
        evaluation_id: i64,
        inviter_id: i64,
        invitee_ids: &[i64],
        message: Option<&str>,
        item_ids: &[i64],
    ) -> Result<Vec<Invitation>, AppError> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::new();

        for invitee_id in invitee_ids {
            let exists = tables
                .invitations
                .values()
                .any(|i| i.evaluation_id == evaluation_id && i.invitee_id == *invitee_id);
            if exists {
                continue;
            }

            let now = Utc::now();
            let invitation = Invitation {
                id: tables.next_id(),
                evaluation_id,
                inviter_id,
                invitee_id: *invitee_id,
                status: InvitationStatus::Pending,
                message: message.map(str::to_string),
                created_at: now,
                updated_at: now,
            };
            tables.invitations.insert(invitation.id, invitation.clone());

            for item_id in item_ids {
                let score = InvitedScore {
                    id: tables.next_id(),
                    invitation_id: invitation.id,
                    item_id: *item_id,
                    score: None,
                    comment: None,
                };
                tables.invited_scores.insert(score.id, score);
            }
            created.push(invitation);
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, AppError> {
        Ok(self.tables.read().await.invitations.get(&id).cloned())
    }

    async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<Invitation>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .invitations
            .values()
            .filter(|i| i.evaluation_id == evaluation_id)
            .cloned()
            .collect())
    }

    async fn list_for_invitee(
        &self,
        invitee_id: i64,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .invitations
            .values()
            .filter(|i| i.invitee_id == invitee_id && status.is_none_or(|s| i.status == s))
            .cloned()
            .collect())
    }

    async fn list_for_inviter(
        &self,
        inviter_id: i64,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        let tables = self.tables.read().await;
        let evaluated_is_active = |invitation: &Invitation| {
            tables
                .evaluations
                .get(&invitation.evaluation_id)
                .and_then(|e| tables.employees.get(&e.employee_id))
                .is_some_and(|e| e.is_active)
        };
        Ok(tables
            .invitations
            .values()
            .filter(|i| i.inviter_id == inviter_id && status.is_none_or(|s| i.status == s))
            .filter(|i| evaluated_is_active(i))
            .cloned()
            .collect())
    }

    async fn list_with_scores(&self, evaluation_id: i64) -> Result<Vec<InvitationWithScores>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .invitations
            .values()
            .filter(|i| i.evaluation_id == evaluation_id)
            .map(|invitation| InvitationWithScores {
                invitation: invitation.clone(),
                scores: tables
                    .invited_scores
                    .values()
                    .filter(|s| s.invitation_id == invitation.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn list_scores(&self, invitation_id: i64) -> Result<Vec<InvitedScore>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .invited_scores
            .values()
            .filter(|s| s.invitation_id == invitation_id)
            .cloned()
            .collect())
    }

    async fn find_score(&self, score_id: i64) -> Result<Option<InvitedScore>, AppError> {
        Ok(self.tables.read().await.invited_scores.get(&score_id).cloned())
    }

    async fn update_score(
        &self,
        score_id: i64,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<InvitedScore, AppError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .invited_scores
            .get_mut(&score_id)
            .ok_or_else(|| AppError::not_found("Nota do convite"))?;
        record.score = score;
        record.comment = comment;
        Ok(record.clone())
    }

    async fn transition(
        &self,
        id: i64,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .invitations
            .get_mut(&id)
            .filter(|i| i.status == from)
            .map(|i| {
                i.status = to;
                i.updated_at = Utc::now();
                i.clone()
            }))
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.drop_invitation(id))
    }
}

#[async_trait]
impl TemplateRepository for MemoryStore {
    async fn create_template(&self, input: &TemplatePayload) -> Result<KpiTemplate, AppError> {
        let mut tables = self.tables.write().await;
        let template = KpiTemplate {
            id: tables.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: Utc::now(),
        };
        tables.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn list_templates(&self) -> Result<Vec<KpiTemplate>, AppError> {
        let tables = self.tables.read().await;
        let mut templates: Vec<KpiTemplate> = tables.templates.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(templates)
    }

    async fn find_template(&self, id: i64) -> Result<Option<KpiTemplate>, AppError> {
        Ok(self.tables.read().await.templates.get(&id).cloned())
    }

    async fn update_template(&self, id: i64, input: &TemplatePayload) -> Result<Option<KpiTemplate>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.templates.get_mut(&id).map(|t| {
            t.name = input.name.clone();
            t.description = input.description.clone();
            t.clone()
        }))
    }

    async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        tables.items.retain(|_, i| i.template_id != id);
        Ok(tables.templates.remove(&id).is_some())
    }

    async fn template_in_use(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.read().await.evaluations.values().any(|e| e.template_id == id))
    }

    async fn list_items(&self, template_id: i64) -> Result<Vec<KpiItem>, AppError> {
        Ok(self.tables.read().await.template_items(template_id))
    }

    async fn create_item(&self, template_id: i64, input: &ItemPayload) -> Result<KpiItem, AppError> {
        let mut tables = self.tables.write().await;
        let item = KpiItem {
            id: tables.next_id(),
            template_id,
            name: input.name.clone(),
            description: input.description.clone(),
            max_score: input.max_score_or_default(),
            sort_order: input.sort_order.unwrap_or(0),
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_item(&self, id: i64) -> Result<Option<KpiItem>, AppError> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn update_item(&self, id: i64, input: &ItemPayload) -> Result<Option<KpiItem>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.items.get_mut(&id).map(|i| {
            i.name = input.name.clone();
            i.description = input.description.clone();
            i.max_score = input.max_score_or_default();
            if let Some(order) = input.sort_order {
                i.sort_order = order;
            }
            i.clone()
        }))
    }

    async fn delete_item(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.items.remove(&id).is_some())
    }

    async fn item_in_use(&self, id: i64) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.scores.values().any(|s| s.item_id == id)
            || tables.invited_scores.values().any(|s| s.item_id == id)
            || tables.share_scores.values().any(|s| s.item_id == id))
    }
}

#[async_trait]
impl PerformanceRuleRepository for MemoryStore {
    async fn find(&self) -> Result<Option<PerformanceRule>, AppError> {
        Ok(self.tables.read().await.rule)
    }

    async fn save(&self, rule: &PerformanceRule) -> Result<PerformanceRule, AppError> {
        self.tables.write().await.rule = Some(*rule);
        Ok(*rule)
    }
}

#[async_trait]
impl ShareRepository for MemoryStore {
    async fn create_batch(
        &self,
        evaluation_id: i64,
        shared_by_id: i64,
        shared_to_ids: &[i64],
        message: Option<&str>,
        deadline: Option<DateTime<Utc>>,
        item_ids: &[i64],
    ) -> Result<Vec<EvaluationShare>, AppError> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::new();

        for shared_to_id in shared_to_ids {
            let now = Utc::now();
            let share = EvaluationShare {
                id: tables.next_id(),
                evaluation_id,
                shared_to_id: *shared_to_id,
                shared_by_id,
                status: ShareStatus::Pending,
                message: message.map(str::to_string),
                deadline,
                created_at: now,
                updated_at: now,
            };
            tables.shares.insert(share.id, share.clone());

            for item_id in item_ids {
                let score = ShareScore {
                    id: tables.next_id(),
                    share_id: share.id,
                    item_id: *item_id,
                    score: None,
                    comment: None,
                };
                tables.share_scores.insert(score.id, score);
            }
            created.push(share);
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<EvaluationShare>, AppError> {
        Ok(self.tables.read().await.shares.get(&id).cloned())
    }

    async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<EvaluationShare>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shares
            .values()
            .filter(|s| s.evaluation_id == evaluation_id)
            .cloned()
            .collect())
    }

    async fn list_for_recipient(&self, shared_to_id: i64) -> Result<Vec<EvaluationShare>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shares
            .values()
            .filter(|s| s.shared_to_id == shared_to_id)
            .cloned()
            .collect())
    }

    async fn list_scores(&self, share_id: i64) -> Result<Vec<ShareScore>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .share_scores
            .values()
            .filter(|s| s.share_id == share_id)
            .cloned()
            .collect())
    }

    async fn list_with_scores(&self, evaluation_id: i64) -> Result<Vec<ShareWithScores>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .shares
            .values()
            .filter(|s| s.evaluation_id == evaluation_id)
            .map(|share| ShareWithScores {
                share: share.clone(),
                scores: tables
                    .share_scores
                    .values()
                    .filter(|s| s.share_id == share.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn update_score(
        &self,
        share_id: i64,
        item_id: i64,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<Option<ShareScore>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .share_scores
            .values_mut()
            .find(|s| s.share_id == share_id && s.item_id == item_id)
            .map(|s| {
                s.score = score;
                s.comment = comment;
                s.clone()
            }))
    }

    async fn transition(
        &self,
        id: i64,
        from: ShareStatus,
        to: ShareStatus,
    ) -> Result<Option<EvaluationShare>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .shares
            .get_mut(&id)
            .filter(|s| s.status == from)
            .map(|s| {
                s.status = to;
                s.updated_at = Utc::now();
                s.clone()
            }))
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.drop_share(id))
    }
}

#[async_trait]
impl SettingsRepository for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        if self.fail_settings_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.write().await;
        for (key, value) in entries {
            tables.settings.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}
