// src/scoring/aggregator.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::invitation::{InvitationStatus, InvitationWithScores};

/// Cenário de pesos usado para a avaliação inteira (nunca por item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    NoInvitation,
    EmployeeInvitation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemAverage {
    pub average: Decimal,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvitationSummary {
    pub scenario: Scenario,
    // item_id -> média dos convidados; itens sem nota ficam de fora
    pub averages: HashMap<i64, ItemAverage>,
}

impl InvitationSummary {
    pub fn average_for(&self, item_id: i64) -> Option<&ItemAverage> {
        self.averages.get(&item_id)
    }
}

/// Agrega as notas dos convites de uma avaliação.
///
/// Só contam convites `completed` com ao menos uma nota preenchida; um convite
/// concluído sem nenhuma nota não muda o cenário.
pub fn summarize_invitations(invitations: &[InvitationWithScores]) -> InvitationSummary {
    let mut sums: HashMap<i64, (Decimal, u32)> = HashMap::new();
    let mut qualifying = 0usize;

    for invitation in invitations {
        if invitation.invitation.status != InvitationStatus::Completed || !invitation.has_any_score() {
            continue;
        }
        qualifying += 1;

        for score in &invitation.scores {
            if let Some(value) = score.score {
                let entry = sums.entry(score.item_id).or_insert((Decimal::ZERO, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }
    }

    let averages = sums
        .into_iter()
        .map(|(item_id, (sum, count))| {
            let average = sum / Decimal::from(count);
            (item_id, ItemAverage { average, count })
        })
        .collect();

    let scenario = if qualifying == 0 {
        Scenario::NoInvitation
    } else {
        Scenario::EmployeeInvitation
    };

    InvitationSummary { scenario, averages }
}
