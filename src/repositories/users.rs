use sqlx::{PgPool, QueryBuilder};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, name, email, hashed_password, role, student_id, grade, division, \
    child_student_id, subject, experience_years, qualifications, phone, \
    avatar_url, is_approved, is_active, last_login, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_student_id(
    pool: &PgPool,
    student_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE student_id = $1"))
        .bind(student_id)
        .fetch_optional(pool)
        .await
}

/// Allocates the next sequential student identifier. Sequence values are
/// never reused, including for registrations that later fail.
pub(crate) async fn next_student_id(pool: &PgPool) -> Result<String, sqlx::Error> {
    let value: i64 =
        sqlx::query_scalar("SELECT nextval('student_id_seq')").fetch_one(pool).await?;
    Ok(format!("STU{value:06}"))
}

pub(crate) struct CreateUser<'a> {
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) student_id: Option<String>,
    pub(crate) grade: Option<i32>,
    pub(crate) division: Option<String>,
    pub(crate) child_student_id: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) experience_years: Option<i32>,
    pub(crate) qualifications: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) is_approved: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            name, email, hashed_password, role, student_id, grade, division,
            child_student_id, subject, experience_years, qualifications, phone,
            is_approved, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
        RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.student_id)
    .bind(params.grade)
    .bind(params.division)
    .bind(params.child_student_id)
    .bind(params.subject)
    .bind(params.experience_years)
    .bind(params.qualifications)
    .bind(params.phone)
    .bind(params.is_approved)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateProfile {
    pub(crate) name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) avatar_url: Option<String>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    params: UpdateProfile,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET
            name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            avatar_url = COALESCE($3, avatar_url),
            hashed_password = COALESCE($4, hashed_password),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.phone)
    .bind(params.avatar_url)
    .bind(params.hashed_password)
    .bind(params.updated_at)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_last_login(
    pool: &PgPool,
    id: Uuid,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Flips the approval gate for a teacher account. Returns false when no
/// pending teacher matched.
pub(crate) async fn approve_teacher(
    pool: &PgPool,
    id: Uuid,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_approved = TRUE, updated_at = $1
         WHERE id = $2 AND role = 'teacher' AND is_approved = FALSE",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn reject_teacher(
    pool: &PgPool,
    id: Uuid,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_active = FALSE, updated_at = $1
         WHERE id = $2 AND role = 'teacher' AND is_approved = FALSE",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_pending_teachers(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users
         WHERE role = 'teacher' AND is_approved = FALSE AND is_active = TRUE
         ORDER BY created_at",
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct UserFilter {
    pub(crate) role: Option<UserRole>,
    pub(crate) search: Option<String>,
}

pub(crate) async fn list(pool: &PgPool, filter: &UserFilter) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users WHERE TRUE"));

    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<User>().fetch_all(pool).await
}

pub(crate) async fn count_by_role(pool: &PgPool, role: UserRole) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1 AND is_active = TRUE")
        .bind(role)
        .fetch_one(pool)
        .await
}

/// Admin accounts are not deletable.
pub(crate) async fn delete_non_admin(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role <> 'admin'")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
