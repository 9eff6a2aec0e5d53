// src/db/evaluation_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgArguments, query::QueryAs, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    db::repositories::{EvaluationRepository, StatusChange},
    models::{
        evaluation::{
            Evaluation, EvaluationFilter, EvaluationStatus, FinalScore, NewEvaluation, ScoreItem,
            ScoreSource,
        },
        template::KpiItem,
    },
    scoring::RuleOutcome,
};

const EVALUATION_COLUMNS: &str = "id, employee_id, template_id, period, year, month, quarter, status, \
     total_score, has_objection, objection_reason, final_comment, total_locked, created_at, updated_at";

const SCORE_COLUMNS: &str = "id, evaluation_id, item_id, self_score, self_comment, manager_score, \
     manager_comment, hr_score, hr_comment, final_score, final_comment";

// $1..$8 na ordem de `bind_filter`
const FILTER_CLAUSE: &str = "WHERE ($1::evaluation_status IS NULL OR status = $1) \
     AND ($2::BIGINT IS NULL OR employee_id = $2) \
     AND ($3::BIGINT IS NULL OR employee_id IN (SELECT id FROM employees WHERE department_id = $3)) \
     AND ($4::BIGINT IS NULL OR employee_id IN (SELECT id FROM employees WHERE manager_id = $4)) \
     AND ($5::review_period IS NULL OR period = $5) \
     AND ($6::INT IS NULL OR year = $6) \
     AND ($7::INT IS NULL OR month = $7) \
     AND ($8::INT IS NULL OR quarter = $8)";

fn bind_filter<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &EvaluationFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(filter.status)
        .bind(filter.employee_id)
        .bind(filter.department_id)
        .bind(filter.manager_id)
        .bind(filter.period)
        .bind(filter.year)
        .bind(filter.month)
        .bind(filter.quarter)
}

#[derive(Clone)]
pub struct PgEvaluationRepository {
    pool: PgPool,
}

impl PgEvaluationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Usado tanto fora quanto dentro de transações
    async fn set_status<'e, E>(
        executor: E,
        id: i64,
        from: EvaluationStatus,
        to: EvaluationStatus,
    ) -> Result<Option<Evaluation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE kpi_evaluations SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {EVALUATION_COLUMNS}"
        );
        let evaluation = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(executor)
            .await?;
        Ok(evaluation)
    }
}

#[async_trait]
impl EvaluationRepository for PgEvaluationRepository {
    async fn list_template_items(&self, template_id: i64) -> Result<Vec<KpiItem>, AppError> {
        let items = sqlx::query_as::<_, KpiItem>(
            "SELECT id, template_id, name, description, max_score, sort_order FROM kpi_items \
             WHERE template_id = $1 ORDER BY sort_order, id",
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn create_with_scores(
        &self,
        new: &NewEvaluation,
        item_ids: &[i64],
    ) -> Result<Evaluation, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO kpi_evaluations (employee_id, template_id, period, year, month, quarter) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {EVALUATION_COLUMNS}"
        );
        let evaluation = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(new.employee_id)
            .bind(new.template_id)
            .bind(new.period)
            .bind(new.year)
            .bind(new.month)
            .bind(new.quarter)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO kpi_scores (evaluation_id, item_id) SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(evaluation.id)
        .bind(item_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(evaluation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Evaluation>, AppError> {
        let sql = format!("SELECT {EVALUATION_COLUMNS} FROM kpi_evaluations WHERE id = $1");
        let evaluation = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(evaluation)
    }

    async fn list(&self, filter: &EvaluationFilter) -> Result<(Vec<Evaluation>, i64), AppError> {
        let total = self.count(filter).await?;

        let sql = format!(
            "SELECT {EVALUATION_COLUMNS} FROM kpi_evaluations {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $9 OFFSET $10"
        );
        let data = bind_filter(sqlx::query_as::<_, Evaluation>(&sql), filter)
            .bind(filter.page_size())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((data, total))
    }

    async fn count(&self, filter: &EvaluationFilter) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM kpi_evaluations {FILTER_CLAUSE}");
        let (total,): (i64,) = bind_filter(sqlx::query_as(&sql), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn list_by_employee(
        &self,
        employee_id: i64,
        statuses: &[EvaluationStatus],
    ) -> Result<Vec<Evaluation>, AppError> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let sql = format!(
            "SELECT {EVALUATION_COLUMNS} FROM kpi_evaluations \
             WHERE employee_id = $1 \
             AND (cardinality($2::TEXT[]) = 0 OR status::TEXT = ANY($2::TEXT[])) \
             ORDER BY year DESC, created_at DESC, id DESC"
        );
        let evaluations = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(employee_id)
            .bind(&statuses[..])
            .fetch_all(&self.pool)
            .await?;
        Ok(evaluations)
    }

    async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let dependents = [
            "DELETE FROM invited_scores WHERE invitation_id IN \
             (SELECT id FROM evaluation_invitations WHERE evaluation_id = $1)",
            "DELETE FROM evaluation_invitations WHERE evaluation_id = $1",
            "DELETE FROM share_scores WHERE share_id IN \
             (SELECT id FROM evaluation_shares WHERE evaluation_id = $1)",
            "DELETE FROM evaluation_shares WHERE evaluation_id = $1",
            "DELETE FROM kpi_scores WHERE evaluation_id = $1",
        ];
        for sql in dependents {
            sqlx::query(sql).bind(id).execute(&mut *tx).await?;
        }

        let deleted = sqlx::query("DELETE FROM kpi_evaluations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_scores(&self, evaluation_id: i64) -> Result<Vec<ScoreItem>, AppError> {
        let sql = format!("SELECT {SCORE_COLUMNS} FROM kpi_scores WHERE evaluation_id = $1 ORDER BY id");
        let scores = sqlx::query_as::<_, ScoreItem>(&sql)
            .bind(evaluation_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(scores)
    }

    async fn find_score(&self, score_id: i64) -> Result<Option<ScoreItem>, AppError> {
        let sql = format!("SELECT {SCORE_COLUMNS} FROM kpi_scores WHERE id = $1");
        let score = sqlx::query_as::<_, ScoreItem>(&sql)
            .bind(score_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(score)
    }

    async fn update_score(
        &self,
        score_id: i64,
        source: ScoreSource,
        score: Option<Decimal>,
        comment: Option<String>,
    ) -> Result<ScoreItem, AppError> {
        let (score_column, comment_column) = source.columns();
        let sql = format!(
            "UPDATE kpi_scores SET {score_column} = $2, {comment_column} = $3 \
             WHERE id = $1 RETURNING {SCORE_COLUMNS}"
        );
        sqlx::query_as::<_, ScoreItem>(&sql)
            .bind(score_id)
            .bind(score)
            .bind(comment)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Registro de nota"))
    }

    async fn transition_status(
        &self,
        id: i64,
        from: EvaluationStatus,
        to: EvaluationStatus,
    ) -> Result<Option<Evaluation>, AppError> {
        Self::set_status(&self.pool, id, from, to).await
    }

    async fn apply_hr_scores(
        &self,
        id: i64,
        outcome: &RuleOutcome,
        advance: Option<StatusChange>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        for update in &outcome.updates {
            sqlx::query(
                "UPDATE kpi_scores SET hr_score = $1, hr_comment = $2 \
                 WHERE id = $3 AND evaluation_id = $4",
            )
            .bind(update.hr_score)
            .bind(&update.hr_comment)
            .bind(update.score_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(total) = outcome.total_score {
            // Total resolvido numa objeção não é sobrescrito
            sqlx::query(
                "UPDATE kpi_evaluations SET total_score = $2, updated_at = NOW() \
                 WHERE id = $1 AND total_locked = FALSE",
            )
            .bind(id)
            .bind(total)
            .execute(&mut *tx)
            .await?;
        }

        let advanced = match advance {
            Some((from, to)) => Self::set_status(&mut *tx, id, from, to).await?.is_some(),
            None => false,
        };

        tx.commit().await?;
        Ok(advanced)
    }

    async fn complete(
        &self,
        id: i64,
        finals: &[FinalScore],
        total: Option<Decimal>,
    ) -> Result<Option<Evaluation>, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE kpi_evaluations \
             SET status = 'completed', total_score = COALESCE($2, total_score), updated_at = NOW() \
             WHERE id = $1 AND status = 'pending_confirm' AND has_objection = FALSE \
             RETURNING {EVALUATION_COLUMNS}"
        );
        let Some(evaluation) = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(id)
            .bind(total)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // tx descartada: rollback
            return Ok(None);
        };

        for final_score in finals {
            sqlx::query("UPDATE kpi_scores SET final_score = $1 WHERE id = $2 AND evaluation_id = $3")
                .bind(final_score.final_score)
                .bind(final_score.score_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(evaluation))
    }

    async fn record_objection(&self, id: i64, reason: &str) -> Result<Option<Evaluation>, AppError> {
        let sql = format!(
            "UPDATE kpi_evaluations SET has_objection = TRUE, objection_reason = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending_confirm' AND has_objection = FALSE \
             AND COALESCE(objection_reason, '') = '' \
             RETURNING {EVALUATION_COLUMNS}"
        );
        let evaluation = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(id)
            .bind(reason)
            .fetch_optional(&self.pool)
            .await?;
        Ok(evaluation)
    }

    async fn resolve_objection(
        &self,
        id: i64,
        total: Decimal,
        final_comment: &str,
    ) -> Result<Option<Evaluation>, AppError> {
        let sql = format!(
            "UPDATE kpi_evaluations SET has_objection = FALSE, total_score = $2, final_comment = $3, \
             total_locked = TRUE, updated_at = NOW() \
             WHERE id = $1 AND has_objection = TRUE \
             RETURNING {EVALUATION_COLUMNS}"
        );
        let evaluation = sqlx::query_as::<_, Evaluation>(&sql)
            .bind(id)
            .bind(total)
            .bind(final_comment)
            .fetch_optional(&self.pool)
            .await?;
        Ok(evaluation)
    }
}
