use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::types::{CourseStatus, EnrollmentStatus, RequestStatus, RequestType, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
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
    pub(crate) avatar_url: Option<String>,
    pub(crate) is_approved: bool,
    pub(crate) is_active: bool,
    pub(crate) last_login: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: Uuid,
    pub(crate) teacher_id: Uuid,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) grade: i32,
    pub(crate) division: Option<String>,
    pub(crate) description: String,
    pub(crate) cover_url: Option<String>,
    pub(crate) cover_key: Option<String>,
    pub(crate) status: CourseStatus,
    pub(crate) is_approved: bool,
    pub(crate) is_active: bool,
    pub(crate) rejection_reason: Option<String>,
    pub(crate) approval_date: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Video {
    pub(crate) id: Uuid,
    pub(crate) course_id: Uuid,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: i32,
    pub(crate) url: Option<String>,
    pub(crate) storage_key: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One quiz question as stored in the `questions` JSONB column. The stored
/// form keeps the correct index; student-facing reads strip it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct QuizQuestion {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: Uuid,
    pub(crate) course_id: Uuid,
    pub(crate) video_id: Option<Uuid>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) questions: Json<Vec<QuizQuestion>>,
    pub(crate) passing_score: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: Uuid,
    pub(crate) student_id: Uuid,
    pub(crate) course_id: Uuid,
    pub(crate) completed_videos: Json<Vec<Uuid>>,
    pub(crate) completed_quizzes: Json<Vec<Uuid>>,
    pub(crate) total_videos: i32,
    pub(crate) total_quizzes: i32,
    pub(crate) quiz_scores: Json<HashMap<Uuid, i32>>,
    pub(crate) overall_progress: i32,
    pub(crate) status: EnrollmentStatus,
    pub(crate) completion_date: Option<PrimitiveDateTime>,
    pub(crate) enrolled_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: Uuid,
    pub(crate) enrollment_id: Uuid,
    pub(crate) quiz_id: Uuid,
    pub(crate) score: i32,
    pub(crate) passed: bool,
    pub(crate) answers: Json<Vec<usize>>,
    pub(crate) time_taken_seconds: Option<i32>,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ApprovalRequest {
    pub(crate) id: Uuid,
    pub(crate) request_type: RequestType,
    pub(crate) requester_id: Uuid,
    pub(crate) payload: Json<serde_json::Value>,
    pub(crate) status: RequestStatus,
    pub(crate) admin_notes: Option<String>,
    pub(crate) processed_by: Option<Uuid>,
    pub(crate) processed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
}
