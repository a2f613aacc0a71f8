pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod quizzes;
pub(crate) mod requests;
pub(crate) mod users;
pub(crate) mod videos;

/// Postgres unique_violation. Race-sensitive inserts rely on the constraint
/// rather than a prior existence check.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
