// src/services/deadline_service.rs

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    common::error::AppError,
    db::{EvaluationRepository, SettingsRepository},
    models::{
        deadline::{CustomDeadlinesPayload, DeadlineDays, DeadlineRules, DeadlineSet, TimeMode},
        employee::Employee,
        evaluation::{Evaluation, ReviewPeriod},
    },
};

const KEY_STANDARD_DAYS: &str = "deadline_standard_days";
const KEY_COMPRESSED_DAYS: &str = "deadline_compressed_days";
const KEY_MINIMUM_DAYS: &str = "deadline_minimum_days";
const KEY_TIME_THRESHOLD: &str = "deadline_time_threshold";
const KEY_AUTO_PROCESS: &str = "auto_process_overdue";

/// Calcula prazos de etapa a partir do período avaliado.
///
/// `today` só é usado quando o mês ou trimestre não foi informado.
pub struct DeadlineCalculator<'a> {
    pub period: ReviewPeriod,
    pub year: i32,
    pub month: Option<i32>,
    pub quarter: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub today: DateTime<Utc>,
    pub rules: &'a DeadlineRules,
}

fn last_day_of_month(year: i32, month: i32) -> Option<NaiveDate> {
    let month = u32::try_from(month).ok().filter(|m| (1..=12).contains(m))?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_hours() / 24
}

fn stage_span(days: i64) -> Result<TimeDelta, AppError> {
    TimeDelta::try_days(days).ok_or_else(|| AppError::invalid_input("Quantidade de dias fora do intervalo"))
}

fn add_days(from: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, AppError> {
    from.checked_add_signed(stage_span(days)?)
        .ok_or_else(|| AppError::invalid_input("Prazo calculado fora do calendário"))
}

impl<'a> DeadlineCalculator<'a> {
    pub fn for_evaluation(evaluation: &Evaluation, rules: &'a DeadlineRules) -> Self {
        Self {
            period: evaluation.period,
            year: evaluation.year,
            month: evaluation.month,
            quarter: evaluation.quarter,
            created_at: evaluation.created_at,
            today: Utc::now(),
            rules,
        }
    }

    /// Último dia do período, à meia-noite UTC.
    pub fn period_end(&self) -> Result<DateTime<Utc>, AppError> {
        let date = match self.period {
            ReviewPeriod::Monthly => match self.month {
                Some(month) => last_day_of_month(self.year, month),
                None => last_day_of_month(self.today.year(), self.today.month() as i32),
            },
            ReviewPeriod::Quarterly => match self.quarter {
                Some(quarter) => last_day_of_month(self.year, quarter * 3),
                None => {
                    let current = (self.today.month() as i32 - 1) / 3 + 1;
                    last_day_of_month(self.today.year(), current * 3)
                }
            },
            ReviewPeriod::Yearly => NaiveDate::from_ymd_opt(self.year, 12, 31),
        };

        date.and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc())
            .ok_or_else(|| AppError::invalid_input("Período da avaliação inválido"))
    }

    pub fn available_days(&self) -> Result<i64, AppError> {
        Ok(days_between(self.created_at, self.period_end()?))
    }

    pub fn calculate(&self) -> Result<DeadlineSet, AppError> {
        let period_end = self.period_end()?;
        let available_days = days_between(self.created_at, period_end);
        let rules = self.rules;

        let (time_mode, days) = if available_days < rules.minimum_days.total() {
            return Ok(DeadlineSet {
                period_end,
                self_eval_deadline: None,
                manager_eval_deadline: None,
                hr_review_deadline: None,
                final_confirm_deadline: None,
                available_days,
                time_mode: TimeMode::Insufficient,
                is_valid: false,
                message: Some("Tempo insuficiente, sugerimos adiar para o próximo ciclo".into()),
            });
        } else if available_days < rules.time_threshold.emergency {
            (TimeMode::Emergency, rules.minimum_days)
        } else if available_days < rules.time_threshold.compressed {
            (TimeMode::Compressed, rules.compressed_days)
        } else {
            (TimeMode::Standard, rules.standard_days)
        };

        // Cada etapa começa onde a anterior termina
        let self_eval = add_days(self.created_at, days.self_eval)?;
        let manager_eval = add_days(self_eval, days.manager_eval)?;
        let hr_review = add_days(manager_eval, days.hr_review)?;
        let final_confirm = add_days(hr_review, days.final_confirm)?;

        Ok(DeadlineSet {
            period_end,
            self_eval_deadline: Some(self_eval),
            manager_eval_deadline: Some(manager_eval),
            hr_review_deadline: Some(hr_review),
            final_confirm_deadline: Some(final_confirm),
            available_days,
            time_mode,
            is_valid: true,
            message: None,
        })
    }

    /// Prazos informados manualmente. Uma violação vira `is_valid = false`
    /// com a mensagem do primeiro problema encontrado.
    pub fn custom(&self, input: &CustomDeadlinesPayload) -> Result<DeadlineSet, AppError> {
        let period_end = self.period_end()?;
        let message = self.check_custom(input, period_end)?.err();

        Ok(DeadlineSet {
            period_end,
            self_eval_deadline: Some(input.self_eval_deadline),
            manager_eval_deadline: Some(input.manager_eval_deadline),
            hr_review_deadline: Some(input.hr_review_deadline),
            final_confirm_deadline: Some(input.final_confirm_deadline),
            available_days: days_between(self.created_at, period_end),
            time_mode: TimeMode::Custom,
            is_valid: message.is_none(),
            message,
        })
    }

    // Erro externo: configuração inutilizável. Erro interno: prazo recusado.
    fn check_custom(
        &self,
        input: &CustomDeadlinesPayload,
        period_end: DateTime<Utc>,
    ) -> Result<Result<(), String>, AppError> {
        if input.self_eval_deadline > input.manager_eval_deadline {
            return Ok(Err("O prazo da autoavaliação não pode ser posterior ao do gestor".into()));
        }
        if input.manager_eval_deadline > input.hr_review_deadline {
            return Ok(Err("O prazo do gestor não pode ser posterior ao da revisão do RH".into()));
        }
        if input.hr_review_deadline > input.final_confirm_deadline {
            return Ok(Err("O prazo da revisão do RH não pode ser posterior ao da confirmação final".into()));
        }
        if input.self_eval_deadline < self.created_at {
            return Ok(Err("O prazo da autoavaliação não pode ser anterior à criação".into()));
        }
        if input.final_confirm_deadline > period_end {
            return Ok(Err("A confirmação final não pode passar do fim do período".into()));
        }

        let minimum = &self.rules.minimum_days;
        let stages = [
            (self.created_at, input.self_eval_deadline, minimum.self_eval, "autoavaliação"),
            (input.self_eval_deadline, input.manager_eval_deadline, minimum.manager_eval, "avaliação do gestor"),
            (input.manager_eval_deadline, input.hr_review_deadline, minimum.hr_review, "revisão do RH"),
            (input.hr_review_deadline, input.final_confirm_deadline, minimum.final_confirm, "confirmação final"),
        ];
        for (start, end, min_days, stage) in stages {
            if end - start < stage_span(min_days)? {
                return Ok(Err(format!("A etapa de {} precisa de ao menos {} dia(s)", stage, min_days)));
            }
        }
        Ok(Ok(()))
    }
}

#[derive(Clone)]
pub struct DeadlineService {
    settings_repo: Arc<dyn SettingsRepository>,
    evaluation_repo: Arc<dyn EvaluationRepository>,
}

impl DeadlineService {
    pub fn new(settings_repo: Arc<dyn SettingsRepository>, evaluation_repo: Arc<dyn EvaluationRepository>) -> Self {
        Self { settings_repo, evaluation_repo }
    }

    // Valor ausente ou ilegível cai no padrão
    async fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, AppError> {
        let Some(raw) = self.settings_repo.get(key).await? else {
            return Ok(default);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key, "Configuração de prazo ilegível, usando padrão: {}", e);
                Ok(default)
            }
        }
    }

    fn encode<T: Serialize>(key: &'static str, value: &T) -> Result<(&'static str, String), AppError> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Falha ao serializar a configuração {}", key))?;
        Ok((key, raw))
    }

    pub async fn rules(&self) -> Result<DeadlineRules, AppError> {
        let defaults = DeadlineRules::default();
        let rules = DeadlineRules {
            standard_days: self.read_or::<DeadlineDays>(KEY_STANDARD_DAYS, defaults.standard_days).await?,
            compressed_days: self.read_or(KEY_COMPRESSED_DAYS, defaults.compressed_days).await?,
            minimum_days: self.read_or(KEY_MINIMUM_DAYS, defaults.minimum_days).await?,
            time_threshold: self.read_or(KEY_TIME_THRESHOLD, defaults.time_threshold).await?,
            auto_process_overdue: self.read_or(KEY_AUTO_PROCESS, defaults.auto_process_overdue).await?,
        };

        // Valores gravados fora da API também passam pelos limites
        if let Err(reason) = rules.validate_days() {
            tracing::warn!("Regras de prazo gravadas são inválidas, usando padrão: {}", reason);
            return Ok(defaults);
        }
        Ok(rules)
    }

    pub async fn update_rules(&self, actor: &Employee, rules: DeadlineRules) -> Result<DeadlineRules, AppError> {
        if !actor.is_hr() {
            return Err(AppError::forbidden("Apenas o RH pode alterar as regras de prazo"));
        }
        rules.validate_days().map_err(AppError::InvalidInput)?;

        let entries = [
            Self::encode(KEY_STANDARD_DAYS, &rules.standard_days)?,
            Self::encode(KEY_COMPRESSED_DAYS, &rules.compressed_days)?,
            Self::encode(KEY_MINIMUM_DAYS, &rules.minimum_days)?,
            Self::encode(KEY_TIME_THRESHOLD, &rules.time_threshold)?,
            Self::encode(KEY_AUTO_PROCESS, &rules.auto_process_overdue)?,
        ];
        self.settings_repo.set_many(&entries).await?;

        tracing::info!("✅ Regras de prazo atualizadas");
        Ok(rules)
    }

    async fn find_evaluation(&self, id: i64) -> Result<Evaluation, AppError> {
        self.evaluation_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Avaliação"))
    }

    pub async fn for_evaluation(&self, evaluation_id: i64) -> Result<DeadlineSet, AppError> {
        let evaluation = self.find_evaluation(evaluation_id).await?;
        let rules = self.rules().await?;
        DeadlineCalculator::for_evaluation(&evaluation, &rules).calculate()
    }

    pub async fn validate_custom(
        &self,
        evaluation_id: i64,
        input: &CustomDeadlinesPayload,
    ) -> Result<DeadlineSet, AppError> {
        let evaluation = self.find_evaluation(evaluation_id).await?;
        let rules = self.rules().await?;
        DeadlineCalculator::for_evaluation(&evaluation, &rules).custom(input)
    }
}
