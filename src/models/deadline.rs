// src/models/deadline.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Tetos aceitos na configuração
pub const MAX_STAGE_DAYS: i64 = 366;
pub const MAX_THRESHOLD_DAYS: i64 = 3660;

/// Dias reservados a cada etapa da avaliação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeadlineDays {
    pub self_eval: i64,
    pub manager_eval: i64,
    pub hr_review: i64,
    pub final_confirm: i64,
}

impl DeadlineDays {
    pub const fn new(self_eval: i64, manager_eval: i64, hr_review: i64, final_confirm: i64) -> Self {
        Self { self_eval, manager_eval, hr_review, final_confirm }
    }

    pub fn total(&self) -> i64 {
        self.stages().iter().fold(0i64, |acc, d| acc.saturating_add(*d))
    }

    fn stages(&self) -> [i64; 4] {
        [self.self_eval, self.manager_eval, self.hr_review, self.final_confirm]
    }

    fn is_within_bounds(&self) -> bool {
        self.stages().iter().all(|d| (0..=MAX_STAGE_DAYS).contains(d))
    }
}

// Limiares em dias disponíveis para trocar de modo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeThreshold {
    pub standard: i64,
    pub compressed: i64,
    pub emergency: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeadlineRules {
    pub standard_days: DeadlineDays,
    pub compressed_days: DeadlineDays,
    pub minimum_days: DeadlineDays,
    pub time_threshold: TimeThreshold,
    pub auto_process_overdue: bool,
}

impl Default for DeadlineRules {
    fn default() -> Self {
        Self {
            standard_days: DeadlineDays::new(7, 5, 3, 2),
            compressed_days: DeadlineDays::new(5, 3, 2, 1),
            minimum_days: DeadlineDays::new(3, 2, 1, 1),
            time_threshold: TimeThreshold { standard: 30, compressed: 20, emergency: 10 },
            auto_process_overdue: false,
        }
    }
}

impl DeadlineRules {
    pub fn validate_days(&self) -> Result<(), String> {
        let all_sets = [&self.standard_days, &self.compressed_days, &self.minimum_days];
        if !all_sets.iter().all(|d| d.is_within_bounds()) {
            return Err(format!("Os dias de cada etapa devem estar entre 0 e {}", MAX_STAGE_DAYS));
        }
        let t = &self.time_threshold;
        if t.standard > MAX_THRESHOLD_DAYS {
            return Err(format!("Limiares não podem passar de {} dias", MAX_THRESHOLD_DAYS));
        }
        if t.emergency < 0 || t.emergency > t.compressed || t.compressed > t.standard {
            return Err("Limiares devem respeitar emergência <= comprimido <= padrão".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    Standard,
    Compressed,
    Emergency,
    Insufficient,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeadlineSet {
    pub period_end: DateTime<Utc>,
    pub self_eval_deadline: Option<DateTime<Utc>>,
    pub manager_eval_deadline: Option<DateTime<Utc>>,
    pub hr_review_deadline: Option<DateTime<Utc>>,
    pub final_confirm_deadline: Option<DateTime<Utc>>,
    pub available_days: i64,
    pub time_mode: TimeMode,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomDeadlinesPayload {
    pub self_eval_deadline: DateTime<Utc>,
    pub manager_eval_deadline: DateTime<Utc>,
    pub hr_review_deadline: DateTime<Utc>,
    pub final_confirm_deadline: DateTime<Utc>,
}
