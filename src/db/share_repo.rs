// src/db/share_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::repositories::ShareRepository,
    models::share::{EvaluationShare, ShareScore, ShareStatus, ShareWithScores},
};

const SHARE_COLUMNS: &str =
    "id, evaluation_id, shared_to_id, shared_by_id, status, message, deadline, created_at, updated_at";

#[derive(Clone)]
pub struct PgShareRepository {
    pool: PgPool,
}

impl PgShareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn create_batch(
        &self,
        evaluation_id: i64,
        shared_by_id: i64,
        shared_to_ids: &[i64],
        message: Option<&str>,
        deadline: Option<DateTime<Utc>>,
        item_ids: &[i64],
    ) -> Result<Vec<EvaluationShare>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(shared_to_ids.len());

        let sql = format!(
            "INSERT INTO evaluation_shares (evaluation_id, shared_to_id, shared_by_id, message, deadline) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SHARE_COLUMNS}"
        );

        for shared_to_id in shared_to_ids {
            let share = sqlx::query_as::<_, EvaluationShare>(&sql)
                .bind(evaluation_id)
                .bind(shared_to_id)
                .bind(shared_by_id)
                .bind(message)
                .bind(deadline)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query("INSERT INTO share_scores (share_id, item_id) SELECT $1, UNNEST($2::BIGINT[])")
                .bind(share.id)
                .bind(item_ids)
                .execute(&mut *tx)
                .await?;

            created.push(share);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<EvaluationShare>, AppError> {
        let sql = format!("SELECT {SHARE_COLUMNS} FROM evaluation_shares WHERE id = $1");
        let share = sqlx::query_as::<_, EvaluationShare>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(share)
    }

    async fn list_for_evaluation(&self, evaluation_id: i64) -> Result<Vec<EvaluationShare>, AppError> {
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM evaluation_shares WHERE evaluation_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let shares = sqlx::query_as::<_, EvaluationShare>(&sql)
            .bind(evaluation_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(shares)
    }

    async fn list_for_recipient(&self, shared_to_id: i64) -> Result<Vec<EvaluationShare>, AppError> {
        let sql = format!(
            "SELECT {SHARE_COLUMNS} FROM evaluation_shares WHERE shared_to_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let shares = sqlx::query_as::<_, EvaluationShare>(&sql)
            .bind(shared_to_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(shares)
    }

    async fn list_scores(&self, share_id: i64) -> Result<Vec<ShareScore>, AppError> {
        let scores = sqlx::query_as::<_, ShareScore>(
            "SELECT id, share_id, item_id, score, comment FROM share_scores WHERE share_id = $1 ORDER BY id",
        )
        .bind(share_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(scores)
    }

    async fn list_with_scores(&self, evaluation_id: i64) -> Result<Vec<ShareWithScores>, AppError> {
        let shares = self.list_for_evaluation(evaluation_id).await?;

        let scores = sqlx::query_as::<_, ShareScore>(
            "SELECT s.id, s.share_id, s.item_id, s.score, s.comment \
             FROM share_scores s JOIN evaluation_shares e ON e.id = s.share_id \
             WHERE e.evaluation_id = $1 ORDER BY s.id",
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_share: HashMap<i64, Vec<ShareScore>> = HashMap::new();
        for score in scores {
            by_share.entry(score.share_id).or_default().push(score);
        }

        Ok(shares
            .into_iter()
            .map(|share| {
                let scores = by_share.remove(&share.id).unwrap_or_default();
                ShareWithScores { share, scores }
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
        let updated = sqlx::query_as::<_, ShareScore>(
            "UPDATE share_scores SET score = $3, comment = $4 \
             WHERE share_id = $1 AND item_id = $2 \
             RETURNING id, share_id, item_id, score, comment",
        )
        .bind(share_id)
        .bind(item_id)
        .bind(score)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn transition(
        &self,
        id: i64,
        from: ShareStatus,
        to: ShareStatus,
    ) -> Result<Option<EvaluationShare>, AppError> {
        let sql = format!(
            "UPDATE evaluation_shares SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {SHARE_COLUMNS}"
        );
        let share = sqlx::query_as::<_, EvaluationShare>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;
        Ok(share)
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM share_scores WHERE share_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM evaluation_shares WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}
