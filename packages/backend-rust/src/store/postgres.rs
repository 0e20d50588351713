//! Postgres-backed `DrillStore`.
//!
//! Runtime `sqlx::query` calls with quoted camelCase columns; the schema is
//! bootstrapped in-process at connect time. Position claiming and session
//! completion use conditional UPDATEs so the row version check and the
//! write are one atomic statement.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use super::{
    DrillProgress, DrillStore, MasteryRecord, PlannedQuestion, SessionKind, SessionRecord,
    SessionStatus, SessionSummary, StoreError, TrailEntry,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "masteryRecords" (
    "userId" TEXT NOT NULL,
    "skillId" BIGINT NOT NULL,
    "currentDifficulty" INT NOT NULL,
    "window" JSONB NOT NULL,
    "totalAttempts" BIGINT NOT NULL,
    "correctAttempts" BIGINT NOT NULL,
    "updatedAt" TIMESTAMPTZ NOT NULL,
    PRIMARY KEY ("userId", "skillId")
);

CREATE TABLE IF NOT EXISTS "drillProgress" (
    "userId" TEXT NOT NULL,
    "moduleId" BIGINT NOT NULL,
    "drillNumber" BIGINT NOT NULL,
    "accuracy" DOUBLE PRECISION NOT NULL,
    "completedAt" TIMESTAMPTZ NOT NULL,
    "sessionId" TEXT NOT NULL,
    PRIMARY KEY ("userId", "moduleId", "drillNumber")
);

CREATE TABLE IF NOT EXISTS "practiceSessions" (
    "id" TEXT PRIMARY KEY,
    "userId" TEXT NOT NULL,
    "kind" TEXT NOT NULL,
    "moduleId" BIGINT,
    "drillNumber" BIGINT,
    "planned" JSONB NOT NULL,
    "currentPosition" BIGINT NOT NULL DEFAULT 0,
    "totalQuestions" BIGINT NOT NULL,
    "status" TEXT NOT NULL,
    "startedAt" TIMESTAMPTZ NOT NULL,
    "endedAt" TIMESTAMPTZ,
    "summary" JSONB
);

CREATE INDEX IF NOT EXISTS "idxPracticeSessionsUserStatus"
    ON "practiceSessions" ("userId", "status");

CREATE TABLE IF NOT EXISTS "answerTrail" (
    "sessionId" TEXT NOT NULL,
    "position" BIGINT NOT NULL,
    "questionId" TEXT NOT NULL,
    "skillId" BIGINT NOT NULL,
    "difficulty" INT NOT NULL,
    "userAnswer" TEXT NOT NULL,
    "isCorrect" BOOLEAN NOT NULL,
    "timeSpentSeconds" DOUBLE PRECISION NOT NULL,
    "confidence" INT NOT NULL,
    "hintsUsed" BIGINT NOT NULL DEFAULT 0,
    "points" BIGINT NOT NULL,
    "answeredAt" TIMESTAMPTZ NOT NULL,
    PRIMARY KEY ("sessionId", "position")
);
"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn mastery_from_row(row: &sqlx::postgres::PgRow) -> Result<MasteryRecord, StoreError> {
    let window: serde_json::Value = row.try_get("window")?;
    Ok(MasteryRecord {
        user_id: row.try_get("userId")?,
        skill_id: row.try_get("skillId")?,
        current_difficulty: row.try_get::<i32, _>("currentDifficulty")? as u8,
        window: serde_json::from_value(window)?,
        total_attempts: row.try_get("totalAttempts")?,
        correct_attempts: row.try_get("correctAttempts")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

fn session_from_row(row: &sqlx::postgres::PgRow) -> Result<SessionRecord, StoreError> {
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    let planned: serde_json::Value = row.try_get("planned")?;
    let summary: Option<serde_json::Value> = row.try_get("summary")?;

    Ok(SessionRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        kind: if kind == "drill" {
            SessionKind::Drill
        } else {
            SessionKind::Practice
        },
        module_id: row.try_get("moduleId")?,
        drill_number: row.try_get("drillNumber")?,
        planned: serde_json::from_value::<Vec<PlannedQuestion>>(planned)?,
        current_position: row.try_get("currentPosition")?,
        total_questions: row.try_get("totalQuestions")?,
        status: if status == "completed" {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        },
        started_at: row.try_get("startedAt")?,
        ended_at: row.try_get("endedAt")?,
        summary: summary.map(serde_json::from_value).transpose()?,
    })
}

fn trail_from_row(row: &sqlx::postgres::PgRow) -> Result<TrailEntry, StoreError> {
    Ok(TrailEntry {
        position: row.try_get("position")?,
        question_id: row.try_get("questionId")?,
        skill_id: row.try_get("skillId")?,
        difficulty: row.try_get::<i32, _>("difficulty")? as u8,
        user_answer: row.try_get("userAnswer")?,
        is_correct: row.try_get("isCorrect")?,
        time_spent_seconds: row.try_get("timeSpentSeconds")?,
        confidence: row.try_get::<i32, _>("confidence")? as u8,
        hints_used: row.try_get("hintsUsed")?,
        points: row.try_get("points")?,
        answered_at: row.try_get("answeredAt")?,
    })
}

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Completed => "completed",
    }
}

#[async_trait]
impl DrillStore for PgStore {
    async fn get_mastery(
        &self,
        user_id: &str,
        skill_id: i64,
    ) -> Result<Option<MasteryRecord>, StoreError> {
        let row = sqlx::query(
            r#"SELECT * FROM "masteryRecords" WHERE "userId" = $1 AND "skillId" = $2"#,
        )
        .bind(user_id)
        .bind(skill_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(mastery_from_row).transpose()
    }

    async fn upsert_mastery(&self, record: &MasteryRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "masteryRecords"
                ("userId", "skillId", "currentDifficulty", "window", "totalAttempts", "correctAttempts", "updatedAt")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ("userId", "skillId") DO UPDATE SET
                "currentDifficulty" = EXCLUDED."currentDifficulty",
                "window" = EXCLUDED."window",
                "totalAttempts" = EXCLUDED."totalAttempts",
                "correctAttempts" = EXCLUDED."correctAttempts",
                "updatedAt" = EXCLUDED."updatedAt"
            "#,
        )
        .bind(&record.user_id)
        .bind(record.skill_id)
        .bind(record.current_difficulty as i32)
        .bind(serde_json::to_value(&record.window)?)
        .bind(record.total_attempts)
        .bind(record.correct_attempts)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn drill_progress(
        &self,
        user_id: &str,
        module_id: i64,
    ) -> Result<Vec<DrillProgress>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM "drillProgress"
            WHERE "userId" = $1 AND "moduleId" = $2
            ORDER BY "drillNumber"
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DrillProgress {
                    user_id: row.try_get("userId")?,
                    module_id: row.try_get("moduleId")?,
                    drill_number: row.try_get("drillNumber")?,
                    accuracy: row.try_get("accuracy")?,
                    completed_at: row.try_get("completedAt")?,
                    session_id: row.try_get("sessionId")?,
                })
            })
            .collect()
    }

    async fn upsert_drill_progress(&self, progress: &DrillProgress) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "drillProgress"
                ("userId", "moduleId", "drillNumber", "accuracy", "completedAt", "sessionId")
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ("userId", "moduleId", "drillNumber") DO UPDATE SET
                "accuracy" = EXCLUDED."accuracy",
                "completedAt" = EXCLUDED."completedAt",
                "sessionId" = EXCLUDED."sessionId"
            "#,
        )
        .bind(&progress.user_id)
        .bind(progress.module_id)
        .bind(progress.drill_number)
        .bind(progress.accuracy)
        .bind(progress.completed_at)
        .bind(&progress.session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_drill_progress(
        &self,
        user_id: &str,
        module_id: i64,
    ) -> Result<u64, StoreError> {
        let result =
            sqlx::query(r#"DELETE FROM "drillProgress" WHERE "userId" = $1 AND "moduleId" = $2"#)
                .bind(user_id)
                .bind(module_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn insert_session(&self, session: &SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "practiceSessions"
                ("id", "userId", "kind", "moduleId", "drillNumber", "planned",
                 "currentPosition", "totalQuestions", "status", "startedAt")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.kind.as_str())
        .bind(session.module_id)
        .bind(session.drill_number)
        .bind(serde_json::to_value(&session.planned)?)
        .bind(session.current_position)
        .bind(session.total_questions)
        .bind(status_str(session.status))
        .bind(session.started_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(r#"SELECT * FROM "practiceSessions" WHERE "id" = $1"#)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_active_session(
        &self,
        user_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM "practiceSessions"
            WHERE "userId" = $1 AND "status" = 'active'
            ORDER BY "startedAt" DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn claim_position(&self, session_id: &str, expected: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE "practiceSessions"
            SET "currentPosition" = "currentPosition" + 1
            WHERE "id" = $1 AND "currentPosition" = $2 AND "status" = 'active'
            "#,
        )
        .bind(session_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn append_trail(&self, session_id: &str, entry: &TrailEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "answerTrail"
                ("sessionId", "position", "questionId", "skillId", "difficulty", "userAnswer",
                 "isCorrect", "timeSpentSeconds", "confidence", "hintsUsed", "points", "answeredAt")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(session_id)
        .bind(entry.position)
        .bind(&entry.question_id)
        .bind(entry.skill_id)
        .bind(entry.difficulty as i32)
        .bind(&entry.user_answer)
        .bind(entry.is_correct)
        .bind(entry.time_spent_seconds)
        .bind(entry.confidence as i32)
        .bind(entry.hints_used)
        .bind(entry.points)
        .bind(entry.answered_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn trail(&self, session_id: &str) -> Result<Vec<TrailEntry>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT * FROM "answerTrail" WHERE "sessionId" = $1 ORDER BY "position""#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(trail_from_row).collect()
    }

    async fn seen_question_ids(&self, user_id: &str) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT "planned" FROM "practiceSessions" WHERE "userId" = $1 AND "status" = 'completed'"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut seen = HashSet::new();
        for row in &rows {
            let planned: serde_json::Value = row.try_get("planned")?;
            let planned: Vec<PlannedQuestion> = serde_json::from_value(planned)?;
            seen.extend(planned.into_iter().map(|p| p.question_id));
        }
        Ok(seen)
    }

    async fn complete_session(
        &self,
        session_id: &str,
        summary: &SessionSummary,
        ended_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE "practiceSessions"
            SET "status" = 'completed', "summary" = $2, "endedAt" = $3
            WHERE "id" = $1 AND "status" = 'active'
            "#,
        )
        .bind(session_id)
        .bind(serde_json::to_value(summary)?)
        .bind(ended_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
