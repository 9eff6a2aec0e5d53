// src/db/performance_rule_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::{
    common::error::AppError,
    db::repositories::PerformanceRuleRepository,
    models::performance_rule::{
        EmployeeInvitationWeights, NoInvitationWeights, PerformanceRule, WithInvitationWeights,
    },
};

// Forma plana da linha única de `performance_rules`
#[derive(Debug, FromRow)]
struct PerformanceRuleRow {
    no_invitation_self_weight: Decimal,
    no_invitation_superior_weight: Decimal,
    employee_self_weight: Decimal,
    employee_invite_superior_weight: Decimal,
    employee_superior_weight: Decimal,
    enabled: bool,
}

impl From<PerformanceRuleRow> for PerformanceRule {
    fn from(row: PerformanceRuleRow) -> Self {
        Self {
            no_invitation: NoInvitationWeights {
                self_weight: row.no_invitation_self_weight,
                superior_weight: row.no_invitation_superior_weight,
            },
            with_invitation: WithInvitationWeights {
                employee: EmployeeInvitationWeights {
                    self_weight: row.employee_self_weight,
                    invite_superior_weight: row.employee_invite_superior_weight,
                    superior_weight: row.employee_superior_weight,
                },
            },
            enabled: row.enabled,
        }
    }
}

const RULE_COLUMNS: &str = "no_invitation_self_weight, no_invitation_superior_weight, \
     employee_self_weight, employee_invite_superior_weight, employee_superior_weight, enabled";

#[derive(Clone)]
pub struct PgPerformanceRuleRepository {
    pool: PgPool,
}

impl PgPerformanceRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PerformanceRuleRepository for PgPerformanceRuleRepository {
    async fn find(&self) -> Result<Option<PerformanceRule>, AppError> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM performance_rules WHERE id = 1");
        let row = sqlx::query_as::<_, PerformanceRuleRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PerformanceRule::from))
    }

    async fn save(&self, rule: &PerformanceRule) -> Result<PerformanceRule, AppError> {
        let employee = &rule.with_invitation.employee;
        let sql = format!(
            "INSERT INTO performance_rules (id, {RULE_COLUMNS}) VALUES (1, $1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                no_invitation_self_weight = EXCLUDED.no_invitation_self_weight, \
                no_invitation_superior_weight = EXCLUDED.no_invitation_superior_weight, \
                employee_self_weight = EXCLUDED.employee_self_weight, \
                employee_invite_superior_weight = EXCLUDED.employee_invite_superior_weight, \
                employee_superior_weight = EXCLUDED.employee_superior_weight, \
                enabled = EXCLUDED.enabled, \
                updated_at = NOW() \
             RETURNING {RULE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PerformanceRuleRow>(&sql)
            .bind(rule.no_invitation.self_weight)
            .bind(rule.no_invitation.superior_weight)
            .bind(employee.self_weight)
            .bind(employee.invite_superior_weight)
            .bind(employee.superior_weight)
            .bind(rule.enabled)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }
}
