use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Course;
use crate::db::types::CourseStatus;

const COLUMNS: &str = "\
    id, teacher_id, title, subject, grade, division, description, cover_url, \
    cover_key, status, is_approved, is_active, rejection_reason, approval_date, \
    created_at, updated_at";

/// Catalog row: the course plus its teacher's name and content counts.
#[derive(Debug, FromRow)]
pub(crate) struct CourseWithCounts {
    #[sqlx(flatten)]
    pub(crate) course: Course,
    pub(crate) teacher_name: String,
    pub(crate) video_count: i64,
    pub(crate) quiz_count: i64,
    pub(crate) enrollment_count: i64,
}

pub(crate) struct CreateCourse<'a> {
    pub(crate) teacher_id: Uuid,
    pub(crate) title: &'a str,
    pub(crate) subject: &'a str,
    pub(crate) grade: i32,
    pub(crate) division: Option<String>,
    pub(crate) description: &'a str,
    pub(crate) cover_url: Option<String>,
    pub(crate) cover_key: Option<String>,
    pub(crate) status: CourseStatus,
    pub(crate) is_approved: bool,
    pub(crate) approval_date: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create<'e, E>(executor: E, params: CreateCourse<'_>) -> Result<Course, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            teacher_id, title, subject, grade, division, description,
            cover_url, cover_key, status, is_approved, approval_date,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
         RETURNING {COLUMNS}",
    ))
    .bind(params.teacher_id)
    .bind(params.title)
    .bind(params.subject)
    .bind(params.grade)
    .bind(params.division)
    .bind(params.description)
    .bind(params.cover_url)
    .bind(params.cover_key)
    .bind(params.status)
    .bind(params.is_approved)
    .bind(params.approval_date)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    course_id: Uuid,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn title_taken(
    pool: &PgPool,
    teacher_id: Uuid,
    title: &str,
) -> Result<bool, sqlx::Error> {
    let existing: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM courses WHERE teacher_id = $1 AND lower(title) = lower($2)",
    )
    .bind(teacher_id)
    .bind(title)
    .fetch_optional(pool)
    .await?;
    Ok(existing.is_some())
}

/// Public catalog: approved, active courses with teacher name and counts.
pub(crate) async fn list_public(pool: &PgPool) -> Result<Vec<CourseWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, CourseWithCounts>(
        "SELECT c.*,
                u.name AS teacher_name,
                (SELECT COUNT(*) FROM videos v
                  WHERE v.course_id = c.id AND v.is_active = TRUE) AS video_count,
                (SELECT COUNT(*) FROM quizzes q
                  WHERE q.course_id = c.id AND q.is_active = TRUE) AS quiz_count,
                (SELECT COUNT(*) FROM enrollments e
                  WHERE e.course_id = c.id) AS enrollment_count
         FROM courses c
         JOIN users u ON u.id = c.teacher_id
         WHERE c.is_approved = TRUE AND c.is_active = TRUE
         ORDER BY c.created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_teacher(
    pool: &PgPool,
    teacher_id: Uuid,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE teacher_id = $1 ORDER BY created_at DESC",
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

/// Courses that still count toward admin aggregates.
pub(crate) async fn list_approved(pool: &PgPool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses
         WHERE is_approved = TRUE AND is_active = TRUE
         ORDER BY created_at DESC",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct UpdateCourse {
    pub(crate) title: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) grade: Option<i32>,
    pub(crate) division: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) cover_url: Option<String>,
    pub(crate) cover_key: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    course_id: Uuid,
    params: UpdateCourse,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            title = COALESCE($1, title),
            subject = COALESCE($2, subject),
            grade = COALESCE($3, grade),
            division = COALESCE($4, division),
            description = COALESCE($5, description),
            cover_url = COALESCE($6, cover_url),
            cover_key = COALESCE($7, cover_key),
            is_active = COALESCE($8, is_active),
            updated_at = $9
         WHERE id = $10
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.subject)
    .bind(params.grade)
    .bind(params.division)
    .bind(params.description)
    .bind(params.cover_url)
    .bind(params.cover_key)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

/// Hard delete; videos, quizzes and enrollments go with the course via
/// foreign-key cascade.
pub(crate) async fn delete_cascade(pool: &PgPool, course_id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM courses WHERE id = $1").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count_approved(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM courses WHERE is_approved = TRUE AND is_active = TRUE",
    )
    .fetch_one(pool)
    .await
}

pub(crate) async fn count_active_videos(pool: &PgPool, course_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE course_id = $1 AND is_active = TRUE")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_active_quizzes(
    pool: &PgPool,
    course_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE course_id = $1 AND is_active = TRUE")
        .bind(course_id)
        .fetch_one(pool)
        .await
}
