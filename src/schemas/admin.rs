use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::time::format_primitive;
use crate::db::models::ApprovalRequest;
use crate::db::types::{RequestStatus, RequestType};
use crate::services::performance::PerformanceTier;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewPayload {
    pub(crate) action: ReviewAction,
    #[serde(default)]
    pub(crate) admin_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestResponse {
    pub(crate) id: Uuid,
    pub(crate) request_type: RequestType,
    pub(crate) requester_id: Uuid,
    pub(crate) payload: serde_json::Value,
    pub(crate) status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) processed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) processed_at: Option<String>,
    pub(crate) created_at: String,
}

impl RequestResponse {
    pub(crate) fn from_db(request: ApprovalRequest) -> Self {
        Self {
            id: request.id,
            request_type: request.request_type,
            requester_id: request.requester_id,
            payload: request.payload.0,
            status: request.status,
            admin_notes: request.admin_notes,
            processed_by: request.processed_by,
            processed_at: request.processed_at.map(format_primitive),
            created_at: format_primitive(request.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardStatsResponse {
    pub(crate) total_students: i64,
    pub(crate) total_teachers: i64,
    pub(crate) total_parents: i64,
    pub(crate) total_courses: i64,
    pub(crate) total_enrollments: i64,
    pub(crate) pending_requests: i64,
    pub(crate) pending_teachers: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopPerformer {
    pub(crate) student_id: Uuid,
    pub(crate) student_name: String,
    pub(crate) course_title: String,
    pub(crate) completion_rate: f64,
    pub(crate) average_score: f64,
    pub(crate) rating: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct PerformanceStatsResponse {
    pub(crate) completion_rate: f64,
    pub(crate) quiz_success_rate: f64,
    pub(crate) average_quiz_score: f64,
    pub(crate) student_activity_rate: f64,
    pub(crate) overall_rating: i32,
    pub(crate) performance: PerformanceTier,
    pub(crate) top_performers: Vec<TopPerformer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CoursePerformanceRow {
    pub(crate) course_id: Uuid,
    pub(crate) course_title: String,
    pub(crate) teacher_name: String,
    pub(crate) enrollment_count: i64,
    pub(crate) average_completion: f64,
    pub(crate) average_quiz_score: f64,
    pub(crate) rating: i32,
}
