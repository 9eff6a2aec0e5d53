// src/db/invitation_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::repositories::InvitationRepository,
    models::invitation::{Invitation, InvitationStatus, InvitationWithScores, InvitedScore},
};

const INVITATION_COLUMNS: &str =
    "id, evaluation_id, inviter_id, invitee_id, status, message, created_at, updated_at";

// Mesmas colunas, para consultas com JOIN
const PREFIXED_COLUMNS: &str = "i.id, i.evaluation_id, i.inviter_id, i.invitee_id, i.status, i.message, \
     i.created_at, i.updated_at";

#[derive(Clone)]
pub struct PgInvitationRepository {
    pool: PgPool,
}

impl PgInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationRepository for PgInvitationRepository {
    async fn create_batch(
        &self,
        evaluation_id: i64,
        inviter_id: i64,
        invitee_ids: &[i64],
        message: Option<&str>,
        item_ids: &[i64],
    ) -> Result<Vec<Invitation>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(invitee_ids.len());

        let sql = format!(
            "INSERT INTO evaluation_invitations (evaluation_id, inviter_id, invitee_id, message) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (evaluation_id, invitee_id) DO NOTHING \
             RETURNING {INVITATION_COLUMNS}"
        );

        for invitee_id in invitee_ids {
            // Conflito = já convidado, segue para o próximo
            let Some(invitation) = sqlx::query_as::<_, Invitation>(&sql)
                .bind(evaluation_id)
                .bind(inviter_id)
                .bind(invitee_id)
                .bind(message)
                .fetch_optional(&mut *tx)
                .await?
            else {
                continue;
            };

            sqlx::query(
                "INSERT INTO invited_scores (invitation_id, item_id) SELECT $1, UNNEST($2::BIGINT[])",
            )
            .bind(invitation.id)
            .bind(item_ids)
            .execute(&mut *tx)
            .await?;

            created.push(invitation);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, AppError> {
        let sql = format!("SELECT {INVITATION_COLUMNS} FROM evaluation_invitations WHERE id = $1");
        let invitation = sqlx::query_as::<_, Invitation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invitation)
    }

    async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<Invitation>, AppError> {
        let sql = format!(
            "SELECT {INVITATION_COLUMNS} FROM evaluation_invitations \
             WHERE evaluation_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let invitations = sqlx::query_as::<_, Invitation>(&sql)
            .bind(evaluation_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(invitations)
    }

    async fn list_for_invitee(
        &self,
        invitee_id: i64,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        let sql = format!(
            "SELECT {INVITATION_COLUMNS} FROM evaluation_invitations \
             WHERE invitee_id = $1 AND ($2::invitation_status IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC"
        );
        let invitations = sqlx::query_as::<_, Invitation>(&sql)
            .bind(invitee_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(invitations)
    }

    async fn list_for_inviter(
        &self,
        inviter_id: i64,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, AppError> {
        let sql = format!(
            "SELECT {PREFIXED_COLUMNS} FROM evaluation_invitations i \
             JOIN kpi_evaluations e ON e.id = i.evaluation_id \
             JOIN employees emp ON emp.id = e.employee_id \
             WHERE i.inviter_id = $1 AND emp.is_active \
             AND ($2::invitation_status IS NULL OR i.status = $2) \
             ORDER BY i.created_at DESC, i.id DESC"
        );
        let invitations = sqlx::query_as::<_, Invitation>(&sql)
            .bind(inviter_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(invitations)
    }

    async fn list_with_scores(&self, evaluation_id: i64) -> Result<Vec<InvitationWithScores>, AppError> {
        let invitations = self.list_for_evaluation(evaluation_id).await?;

        let scores = sqlx::query_as::<_, InvitedScore>(
            "SELECT s.id, s.invitation_id, s.item_id, s.score, s.comment \
             FROM invited_scores s \
             JOIN evaluation_invitations i ON i.id = s.invitation_id \
             WHERE i.evaluation_id = $1 ORDER BY s.id",
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_invitation: HashMap<i64, Vec<InvitedScore>> = HashMap::new();
        for score in scores {
            by_invitation.entry(score.invitation_id).or_default().push(score);
        }

        Ok(invitations
            .into_iter()
            .map(|invitation| {
                let scores = by_invitation.remove(&invitation.id).unwrap_or_default();
                InvitationWithScores { invitation, scores }
            })
            .collect())
    }

    async fn list_scores(&self, invitation_id: i64) -> Result<Vec<InvitedScore>, AppError> {
        let scores = sqlx::query_as::<_, InvitedScore>(
            "SELECT id, invitation_id, item_id, score, comment FROM invited_scores \
             WHERE invitation_id = $1 ORDER BY id",
        )
        .bind(invitation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(scores)
    }

    async fn find_score(&self, score_id: i64) -> Result<Option<InvitedScore>, AppError> {
        let score = sqlx::query_as::<_, InvitedScore>(
            "SELECT id, invitation_id, item_id, score, comment FROM invited_scores WHERE id = $1",
        )
        .bind(score_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score)
    }

    async fn update_score(
        &self,
        score_id: i64,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<InvitedScore, AppError> {
        sqlx::query_as::<_, InvitedScore>(
            "UPDATE invited_scores SET score = $2, comment = $3 WHERE id = $1 \
             RETURNING id, invitation_id, item_id, score, comment",
        )
        .bind(score_id)
        .bind(score)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Nota do convite"))
    }

    async fn transition(
        &self,
        id: i64,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, AppError> {
        let sql = format!(
            "UPDATE evaluation_invitations SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {INVITATION_COLUMNS}"
        );
        let invitation = sqlx::query_as::<_, Invitation>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invitation)
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invited_scores WHERE invitation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM evaluation_invitations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}
