// src/models/performance_rule.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;

// Folga aceita na soma dos pesos
const WEIGHT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);
const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoInvitationWeights {
    #[schema(example = 20)]
    pub self_weight: Decimal,
    #[schema(example = 80)]
    pub superior_weight: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInvitationWeights {
    #[schema(example = 20)]
    pub self_weight: Decimal,
    #[schema(example = 30)]
    pub invite_superior_weight: Decimal,
    #[schema(example = 50)]
    pub superior_weight: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithInvitationWeights {
    pub employee: EmployeeInvitationWeights,
}

/// Configuração única da regra de desempenho.
///
/// É lida uma vez por operação e passada explicitamente ao motor de cálculo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRule {
    pub no_invitation: NoInvitationWeights,
    pub with_invitation: WithInvitationWeights,
    pub enabled: bool,
}

impl Default for PerformanceRule {
    fn default() -> Self {
        Self {
            no_invitation: NoInvitationWeights {
                self_weight: Decimal::from(20),
                superior_weight: Decimal::from(80),
            },
            with_invitation: WithInvitationWeights {
                employee: EmployeeInvitationWeights {
                    self_weight: Decimal::from(20),
                    invite_superior_weight: Decimal::from(30),
                    superior_weight: Decimal::from(50),
                },
            },
            enabled: false,
        }
    }
}

impl PerformanceRule {
    /// Cada peso entre 0 e 100 e cada conjunto somando 100.
    pub fn validate_weights(&self) -> Result<(), AppError> {
        let employee = &self.with_invitation.employee;
        let checks: [(&str, &[(&str, Decimal)]); 2] = [
            (
                "Sem convite",
                &[
                    ("autoavaliação", self.no_invitation.self_weight),
                    ("gestor", self.no_invitation.superior_weight),
                ],
            ),
            (
                "Com convite (colaborador)",
                &[
                    ("autoavaliação", employee.self_weight),
                    ("convidados", employee.invite_superior_weight),
                    ("gestor", employee.superior_weight),
                ],
            ),
        ];

        for (label, values) in checks {
            let mut sum = Decimal::ZERO;
            for (name, value) in values {
                if *value < Decimal::ZERO || *value > HUNDRED {
                    return Err(AppError::invalid_input(format!(
                        "{} - {} deve estar entre 0 e 100",
                        label, name
                    )));
                }
                sum += *value;
            }

            if (sum - HUNDRED).abs() > WEIGHT_TOLERANCE {
                return Err(AppError::invalid_input(format!(
                    "{}: a soma dos pesos deve ser 100, atual {:.2}",
                    label, sum
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRulePayload {
    pub no_invitation: NoInvitationWeights,
    pub with_invitation: WithInvitationWeights,
    #[serde(default)]
    pub enabled: bool,
}

impl From<PerformanceRulePayload> for PerformanceRule {
    fn from(payload: PerformanceRulePayload) -> Self {
        Self {
            no_invitation: payload.no_invitation,
            with_invitation: payload.with_invitation,
            enabled: payload.enabled,
        }
    }
}
