//! Quest missions and per-user progress

use chrono::{DateTime, Utc};
use nmon_common::models::{Mission, QuestAnswer};
use nmon_common::time::format_timestamp;
use nmon_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::{begin_write, next_id};

/// Separator of the `options` column
pub const OPTION_SEPARATOR: &str = "|";

const SELECT_MISSIONS: &str = "SELECT mission_id, tier, title, question, options, answer_key, grading_type, hint, explanation FROM missions";

/// All missions ordered by tier, then id
pub async fn list_missions(pool: &SqlitePool) -> Result<Vec<Mission>> {
    let rows = sqlx::query(&format!("{} ORDER BY tier, mission_id", SELECT_MISSIONS))
        .fetch_all(pool)
        .await?;
    rows.iter().map(row_to_mission).collect()
}

pub async fn get_mission(pool: &SqlitePool, mission_id: &str) -> Result<Option<Mission>> {
    let row = sqlx::query(&format!("{} WHERE mission_id = ?", SELECT_MISSIONS))
        .bind(mission_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(row_to_mission).transpose()
}

/// Store a new mission under the next `M##` id and return it
pub async fn create_mission(pool: &SqlitePool, mut mission: Mission) -> Result<Mission> {
    let mut tx = begin_write(pool).await?;
    mission.mission_id = next_id(&mut tx, "missions", "mission_id", "M", 2).await?;
    insert_mission(&mut tx, &mission).await?;
    tx.commit().await?;
    Ok(mission)
}

pub async fn insert_mission(conn: &mut SqliteConnection, mission: &Mission) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO missions
            (mission_id, tier, title, question, options, answer_key, grading_type, hint, explanation)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&mission.mission_id)
    .bind(mission.tier)
    .bind(&mission.title)
    .bind(&mission.question)
    .bind(mission.options.join(OPTION_SEPARATOR))
    .bind(&mission.answer_key)
    .bind(mission.grading_type.as_str())
    .bind(&mission.hint)
    .bind(&mission.explanation)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Record a user's answer; a later answer replaces the earlier one
pub async fn record_answer(
    pool: &SqlitePool,
    user_id: &str,
    answer: &QuestAnswer,
    answered_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO quest_progress (user_id, mission_id, tier, correct, user_answer, answered_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, mission_id) DO UPDATE SET
            tier = excluded.tier,
            correct = excluded.correct,
            user_answer = excluded.user_answer,
            answered_at = excluded.answered_at
        "#,
    )
    .bind(user_id)
    .bind(&answer.mission_id)
    .bind(answer.tier)
    .bind(answer.correct)
    .bind(&answer.user_answer)
    .bind(format_timestamp(answered_at))
    .execute(pool)
    .await?;
    Ok(())
}

/// Answers recorded for a user, ordered by mission id
pub async fn progress_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<QuestAnswer>> {
    let rows = sqlx::query(
        r#"
        SELECT mission_id, tier, correct, user_answer
        FROM quest_progress
        WHERE user_id = ?
        ORDER BY mission_id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<QuestAnswer> {
            Ok(QuestAnswer {
                mission_id: row.try_get("mission_id")?,
                tier: row.try_get("tier")?,
                correct: row.try_get("correct")?,
                user_answer: row.try_get("user_answer")?,
            })
        })
        .collect()
}

/// Forget every answer of a user; returns how many were removed
pub async fn reset_progress(pool: &SqlitePool, user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM quest_progress WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// (correct answers, all answers) over every user
pub async fn answer_counts(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts: (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(correct), 0), COUNT(*) FROM quest_progress",
    )
    .fetch_one(pool)
    .await?;
    Ok(counts)
}

fn row_to_mission(row: &SqliteRow) -> Result<Mission> {
    let options: String = row.try_get("options")?;
    let grading_type: String = row.try_get("grading_type")?;
    Ok(Mission {
        mission_id: row.try_get("mission_id")?,
        tier: row.try_get("tier")?,
        title: row.try_get("title")?,
        question: row.try_get("question")?,
        options: split_options(&options),
        answer_key: row.try_get("answer_key")?,
        grading_type: grading_type.parse()?,
        hint: row.try_get("hint")?,
        explanation: row.try_get("explanation")?,
    })
}

/// Split a `|` separated option list, dropping blanks
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(OPTION_SEPARATOR)
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
