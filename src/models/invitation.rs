// src/models/invitation.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invitation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
    Completed,
}

impl InvitationStatus {
    /// Ainda pode produzir notas: segura o avanço automático da avaliação.
    pub fn is_outstanding(self) -> bool {
        matches!(self, InvitationStatus::Pending | InvitationStatus::Accepted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: i64,
    pub evaluation_id: i64,
    pub inviter_id: i64,
    pub invitee_id: i64,
    pub status: InvitationStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitedScore {
    pub id: i64,
    pub invitation_id: i64,
    pub item_id: i64,
    pub score: Option<Decimal>,
    pub comment: Option<String>,
}

// Convite com suas notas, entrada do agregador
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationWithScores {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub scores: Vec<InvitedScore>,
}

impl InvitationWithScores {
    pub fn all_scored(&self) -> bool {
        self.scores.iter().all(|s| s.score.is_some())
    }

    pub fn has_any_score(&self) -> bool {
        self.scores.iter().any(|s| s.score.is_some())
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationPayload {
    #[validate(length(min = 1, message = "Informe ao menos um convidado."))]
    #[schema(example = json!([7, 9]))]
    pub invitee_ids: Vec<i64>,

    #[validate(length(max = 1000, message = "Mensagem muito longa."))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvitationStatusFilter {
    pub status: Option<InvitationStatus>,
}
