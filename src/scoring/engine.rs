// src/scoring/engine.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use super::aggregator::{summarize_invitations, ItemAverage, Scenario};
use crate::models::{
    evaluation::ScoreItem,
    invitation::InvitationWithScores,
    performance_rule::PerformanceRule,
};

pub const AUTO_HR_COMMENT: &str = "Nota calculada automaticamente pela regra de desempenho";

/// Uma fonte de nota com seu peso configurado. `value` ausente = fonte sem nota.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponent {
    pub weight: Decimal,
    pub value: Option<Decimal>,
}

impl ScoreComponent {
    pub fn new(weight: Decimal, value: Option<Decimal>) -> Self {
        Self { weight, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HrScoreUpdate {
    pub score_id: i64,
    pub item_id: i64,
    pub hr_score: Decimal,
    pub hr_comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub scenario: Scenario,
    pub updates: Vec<HrScoreUpdate>,
    // Só existe quando ao menos um item foi recalculado
    pub total_score: Option<Decimal>,
}

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Média ponderada renormalizada sobre os componentes presentes com peso > 0.
///
/// Retorna `None` quando nenhum componente contribui.
pub fn weighted_average(components: &[ScoreComponent]) -> Option<Decimal> {
    let mut weight_sum = Decimal::ZERO;
    let mut weighted = Decimal::ZERO;

    for component in components {
        let Some(value) = component.value else { continue };
        if component.weight <= Decimal::ZERO {
            continue;
        }
        weight_sum += component.weight;
        weighted += component.weight * value;
    }

    if weight_sum.is_zero() {
        return None;
    }
    Some(weighted / weight_sum)
}

pub fn components_for(
    rule: &PerformanceRule,
    scenario: Scenario,
    score: &ScoreItem,
    invited: Option<&ItemAverage>,
) -> Vec<ScoreComponent> {
    match scenario {
        Scenario::NoInvitation => {
            let weights = &rule.no_invitation;
            vec![
                ScoreComponent::new(weights.self_weight, score.self_score),
                ScoreComponent::new(weights.superior_weight, score.manager_score),
            ]
        }
        Scenario::EmployeeInvitation => {
            let weights = &rule.with_invitation.employee;
            vec![
                ScoreComponent::new(weights.self_weight, score.self_score),
                ScoreComponent::new(weights.invite_superior_weight, invited.map(|a| a.average)),
                ScoreComponent::new(weights.superior_weight, score.manager_score),
            ]
        }
    }
}

pub fn calculate_hr_score(
    rule: &PerformanceRule,
    scenario: Scenario,
    score: &ScoreItem,
    invited: Option<&ItemAverage>,
) -> Option<Decimal> {
    weighted_average(&components_for(rule, scenario, score, invited)).map(round2)
}

/// Recalcula as notas de RH de uma avaliação a partir do estado persistido.
///
/// Não olha `rule.enabled`: quem chama decide se a regra vale.
pub fn evaluate_rule(
    rule: &PerformanceRule,
    scores: &[ScoreItem],
    invitations: &[InvitationWithScores],
) -> RuleOutcome {
    let summary = summarize_invitations(invitations);

    let updates: Vec<HrScoreUpdate> = scores
        .iter()
        .filter_map(|score| {
            let invited = summary.average_for(score.item_id);
            let hr_score = calculate_hr_score(rule, summary.scenario, score, invited)?;

            let hr_comment = match score.hr_comment.as_deref() {
                Some(existing) if !existing.trim().is_empty() => existing.to_string(),
                _ => AUTO_HR_COMMENT.to_string(),
            };

            Some(HrScoreUpdate {
                score_id: score.id,
                item_id: score.item_id,
                hr_score,
                hr_comment,
            })
        })
        .collect();

    let total_score = if updates.is_empty() {
        None
    } else {
        Some(round2(updates.iter().map(|u| u.hr_score).sum()))
    };

    RuleOutcome {
        scenario: summary.scenario,
        updates,
        total_score,
    }
}
