use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::ApprovalRequest;
use crate::db::types::{RequestStatus, RequestType};

const COLUMNS: &str = "\
    id, request_type, requester_id, payload, status, admin_notes, \
    processed_by, processed_at, created_at";

pub(crate) struct CreateRequest {
    pub(crate) request_type: RequestType,
    pub(crate) requester_id: Uuid,
    pub(crate) payload: Json<serde_json::Value>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateRequest,
) -> Result<ApprovalRequest, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRequest>(&format!(
        "INSERT INTO requests (request_type, requester_id, payload, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}",
    ))
    .bind(params.request_type)
    .bind(params.requester_id)
    .bind(params.payload)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ApprovalRequest>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRequest>(&format!("SELECT {COLUMNS} FROM requests WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    status: Option<RequestStatus>,
) -> Result<Vec<ApprovalRequest>, sqlx::Error> {
    match status {
        Some(status) => {
            sqlx::query_as::<_, ApprovalRequest>(&format!(
                "SELECT {COLUMNS} FROM requests WHERE status = $1 ORDER BY created_at",
            ))
            .bind(status)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ApprovalRequest>(&format!(
                "SELECT {COLUMNS} FROM requests ORDER BY created_at DESC",
            ))
            .fetch_all(pool)
            .await
        }
    }
}

pub(crate) async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE status = 'pending'")
        .fetch_one(pool)
        .await
}

/// Atomic terminal transition. The `status = 'pending'` predicate makes the
/// decision idempotence-safe: a request already approved or rejected matches
/// no row and the caller reports a conflict.
pub(crate) async fn process(
    conn: &mut PgConnection,
    id: Uuid,
    status: RequestStatus,
    admin_notes: Option<String>,
    processed_by: Uuid,
    processed_at: PrimitiveDateTime,
) -> Result<Option<ApprovalRequest>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRequest>(&format!(
        "UPDATE requests SET
            status = $1,
            admin_notes = $2,
            processed_by = $3,
            processed_at = $4
         WHERE id = $5 AND status = 'pending'
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(admin_notes)
    .bind(processed_by)
    .bind(processed_at)
    .bind(id)
    .fetch_optional(conn)
    .await
}
