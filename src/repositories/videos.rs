use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Video;

const COLUMNS: &str = "\
    id, course_id, title, description, position, url, storage_key, \
    thumbnail_url, duration_seconds, is_active, created_at, updated_at";

pub(crate) struct CreateVideo<'a> {
    pub(crate) course_id: Uuid,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) position: i32,
    pub(crate) url: Option<String>,
    pub(crate) storage_key: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateVideo<'_>) -> Result<Video, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!(
        "INSERT INTO videos (
            course_id, title, description, position, url, storage_key,
            thumbnail_url, duration_seconds, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {COLUMNS}",
    ))
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.position)
    .bind(params.url)
    .bind(params.storage_key)
    .bind(params.thumbnail_url)
    .bind(params.duration_seconds)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!("SELECT {COLUMNS} FROM videos WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: Uuid,
) -> Result<Vec<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!(
        "SELECT {COLUMNS} FROM videos
         WHERE course_id = $1 AND is_active = TRUE
         ORDER BY position",
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Next free position in the course ordering. Concurrent inserts can race to
/// the same value; the unique index on (course_id, position) decides the
/// loser, which surfaces as a conflict.
pub(crate) async fn next_position(pool: &PgPool, course_id: Uuid) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) + 1 FROM videos WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM videos WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
