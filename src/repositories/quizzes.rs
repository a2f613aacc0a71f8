use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Quiz, QuizQuestion};

const COLUMNS: &str = "\
    id, course_id, video_id, title, description, questions, passing_score, \
    time_limit_minutes, max_attempts, is_active, created_at, updated_at";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) course_id: Uuid,
    pub(crate) video_id: Option<Uuid>,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) questions: Json<Vec<QuizQuestion>>,
    pub(crate) passing_score: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateQuiz<'_>) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            course_id, video_id, title, description, questions, passing_score,
            time_limit_minutes, max_attempts, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.course_id)
    .bind(params.video_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.questions)
    .bind(params.passing_score)
    .bind(params.time_limit_minutes)
    .bind(params.max_attempts)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: Uuid,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes
         WHERE course_id = $1 AND is_active = TRUE
         ORDER BY created_at",
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
