use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Enrollment, QuizAttempt};
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str = "\
    id, student_id, course_id, completed_videos, completed_quizzes, \
    total_videos, total_quizzes, quiz_scores, overall_progress, status, \
    completion_date, enrolled_at, updated_at";

const ATTEMPT_COLUMNS: &str =
    "id, enrollment_id, quiz_id, score, passed, answers, time_taken_seconds, completed_at";

/// Enrollment joined with its course for student-facing listings.
#[derive(Debug, FromRow)]
pub(crate) struct EnrollmentWithCourse {
    #[sqlx(flatten)]
    pub(crate) enrollment: Enrollment,
    pub(crate) course_title: String,
    pub(crate) course_subject: String,
    pub(crate) teacher_name: String,
}

/// Enrollment joined with its student for teacher/admin listings.
#[derive(Debug, FromRow)]
pub(crate) struct EnrollmentWithStudent {
    #[sqlx(flatten)]
    pub(crate) enrollment: Enrollment,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) student_number: Option<String>,
}

pub(crate) struct CreateEnrollment {
    pub(crate) student_id: Uuid,
    pub(crate) course_id: Uuid,
    pub(crate) total_videos: i32,
    pub(crate) total_quizzes: i32,
    pub(crate) enrolled_at: PrimitiveDateTime,
}

/// Inserts the enrollment. The unique constraint on (student_id, course_id)
/// rejects the loser of a concurrent duplicate race; callers map that
/// violation to a conflict.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateEnrollment,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (
            student_id, course_id, total_videos, total_quizzes,
            enrolled_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.student_id)
    .bind(params.course_id)
    .bind(params.total_videos)
    .bind(params.total_quizzes)
    .bind(params.enrolled_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_student_course(
    pool: &PgPool,
    student_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 AND course_id = $2",
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: Uuid,
) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentWithCourse>(
        "SELECT e.*, c.title AS course_title, c.subject AS course_subject,
                u.name AS teacher_name
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         JOIN users u ON u.id = c.teacher_id
         WHERE e.student_id = $1
         ORDER BY e.enrolled_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: Uuid,
) -> Result<Vec<EnrollmentWithStudent>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentWithStudent>(
        "SELECT e.*, u.name AS student_name, u.email AS student_email,
                u.student_id AS student_number
         FROM enrollments e
         JOIN users u ON u.id = e.student_id
         WHERE e.course_id = $1
         ORDER BY e.enrolled_at",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<EnrollmentWithStudent>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentWithStudent>(
        "SELECT e.*, u.name AS student_name, u.email AS student_email,
                u.student_id AS student_number
         FROM enrollments e
         JOIN users u ON u.id = e.student_id
         ORDER BY e.enrolled_at DESC",
    )
    .fetch_all(pool)
    .await
}

/// Row lock serializing concurrent quiz submissions and progress updates
/// for one enrollment.
pub(crate) async fn lock_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE",
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub(crate) struct ProgressUpdate {
    pub(crate) completed_videos: Json<Vec<Uuid>>,
    pub(crate) completed_quizzes: Json<Vec<Uuid>>,
    pub(crate) quiz_scores: Json<HashMap<Uuid, i32>>,
    pub(crate) overall_progress: i32,
    pub(crate) status: EnrollmentStatus,
    pub(crate) completion_date: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update_progress(
    conn: &mut PgConnection,
    id: Uuid,
    params: ProgressUpdate,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE enrollments SET
            completed_videos = $1,
            completed_quizzes = $2,
            quiz_scores = $3,
            overall_progress = $4,
            status = $5,
            completion_date = $6,
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}",
    ))
    .bind(params.completed_videos)
    .bind(params.completed_quizzes)
    .bind(params.quiz_scores)
    .bind(params.overall_progress)
    .bind(params.status)
    .bind(params.completion_date)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(conn)
    .await
}

pub(crate) async fn count_attempts(
    conn: &mut PgConnection,
    enrollment_id: Uuid,
    quiz_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM quiz_attempts WHERE enrollment_id = $1 AND quiz_id = $2",
    )
    .bind(enrollment_id)
    .bind(quiz_id)
    .fetch_one(conn)
    .await
}

pub(crate) struct CreateAttempt {
    pub(crate) enrollment_id: Uuid,
    pub(crate) quiz_id: Uuid,
    pub(crate) score: i32,
    pub(crate) passed: bool,
    pub(crate) answers: Json<Vec<usize>>,
    pub(crate) time_taken_seconds: Option<i32>,
    pub(crate) completed_at: PrimitiveDateTime,
}

pub(crate) async fn insert_attempt(
    conn: &mut PgConnection,
    params: CreateAttempt,
) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (
            enrollment_id, quiz_id, score, passed, answers,
            time_taken_seconds, completed_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {ATTEMPT_COLUMNS}",
    ))
    .bind(params.enrollment_id)
    .bind(params.quiz_id)
    .bind(params.score)
    .bind(params.passed)
    .bind(params.answers)
    .bind(params.time_taken_seconds)
    .bind(params.completed_at)
    .fetch_one(conn)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments").fetch_one(pool).await
}

/// Distinct students holding at least one enrollment; the numerator of the
/// platform activity rate.
pub(crate) async fn count_enrolled_students(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(DISTINCT student_id) FROM enrollments")
        .fetch_one(pool)
        .await
}

pub(crate) async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM enrollments WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
