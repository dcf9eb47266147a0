use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{FromRow, SqliteConnection, SqliteExecutor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub category: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub difficulty: i64,
}

pub async fn get_all_questions<'e, E>(executor: E) -> sqlx::Result<Vec<Question>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn count_questions<'e, E>(executor: E) -> sqlx::Result<i64>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(executor)
        .await
}

pub async fn get_question_by_id<'e, E>(executor: E, id: i64) -> sqlx::Result<Option<Question>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_questions_for_category<'e, E>(
    executor: E,
    category: i64,
) -> sqlx::Result<Vec<Question>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE questions.category = ?1
ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(executor)
    .await
}

// SQLite's LIKE folds case for ASCII letters only: "peanut" finds "PEANUT"
// but "é" does not find "É".
pub async fn search_questions<'e, E>(executor: E, term: &str) -> sqlx::Result<Vec<Question>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE questions.question LIKE ?1 ESCAPE '\'
ORDER BY id
        "#,
    )
    .bind(like_pattern(term))
    .fetch_all(executor)
    .await
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Questions eligible for the next quiz round: everything not yet shown,
/// restricted to `category` when one is given. Previously shown ids are
/// filtered here rather than bound into the query, so the list length is not
/// limited by the number of SQLite variables.
pub async fn get_quiz_candidates<'e, E>(
    executor: E,
    category: Option<i64>,
    previous_questions: &[i64],
) -> sqlx::Result<Vec<Question>>
where
    E: SqliteExecutor<'e>,
{
    let shown: HashSet<i64> = previous_questions.iter().copied().collect();
    let questions = sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE ?1 IS NULL OR questions.category = ?1
ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(executor)
    .await?;

    Ok(questions
        .into_iter()
        .filter(|q| !shown.contains(&q.id))
        .collect())
}

pub async fn create_question<'e, E>(executor: E, question: &NewQuestion) -> sqlx::Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query(
        r#"
INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(executor)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Returns the number of deleted rows.
pub async fn delete_question<'e, E>(executor: E, id: i64) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn import_questions(
    conn: &mut SqliteConnection,
    questions: Vec<Question>,
) -> sqlx::Result<()> {
    for question in questions {
        sqlx::query(
            r#"
INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (id) DO UPDATE SET
    question = excluded.question,
    answer = excluded.answer,
    category = excluded.category,
    difficulty = excluded.difficulty
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
