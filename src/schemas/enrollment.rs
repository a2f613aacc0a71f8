use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::time::format_primitive;
use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;
use crate::repositories::enrollments::{EnrollmentWithCourse, EnrollmentWithStudent};
use crate::services::performance::PerformanceTier;

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollPayload {
    pub(crate) course_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressUpdatePayload {
    pub(crate) video_id: Uuid,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: Uuid,
    pub(crate) student_id: Uuid,
    pub(crate) course_id: Uuid,
    pub(crate) completed_videos: Vec<Uuid>,
    pub(crate) completed_quizzes: Vec<Uuid>,
    pub(crate) total_videos: i32,
    pub(crate) total_quizzes: i32,
    pub(crate) quiz_scores: HashMap<Uuid, i32>,
    pub(crate) overall_progress: i32,
    pub(crate) status: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) completion_date: Option<String>,
    pub(crate) enrolled_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_number: Option<String>,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            completed_videos: enrollment.completed_videos.0,
            completed_quizzes: enrollment.completed_quizzes.0,
            total_videos: enrollment.total_videos,
            total_quizzes: enrollment.total_quizzes,
            quiz_scores: enrollment.quiz_scores.0,
            overall_progress: enrollment.overall_progress,
            status: enrollment.status,
            completion_date: enrollment.completion_date.map(format_primitive),
            enrolled_at: format_primitive(enrollment.enrolled_at),
            course_title: None,
            course_subject: None,
            teacher_name: None,
            student_name: None,
            student_email: None,
            student_number: None,
        }
    }

    pub(crate) fn from_with_course(row: EnrollmentWithCourse) -> Self {
        let mut response = Self::from_db(row.enrollment);
        response.course_title = Some(row.course_title);
        response.course_subject = Some(row.course_subject);
        response.teacher_name = Some(row.teacher_name);
        response
    }

    pub(crate) fn from_with_student(row: EnrollmentWithStudent) -> Self {
        let mut response = Self::from_db(row.enrollment);
        response.student_name = Some(row.student_name);
        response.student_email = Some(row.student_email);
        response.student_number = row.student_number;
        response
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollCheckResponse {
    pub(crate) enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enrollment: Option<EnrollmentResponse>,
}

/// Read-side projection over one student's enrollments, recomputed per
/// request.
#[derive(Debug, Serialize)]
pub(crate) struct StudentStatsResponse {
    pub(crate) total_courses: i64,
    pub(crate) completed_courses: i64,
    pub(crate) completion_rate: f64,
    pub(crate) average_quiz_score: f64,
    pub(crate) overall_rating: i32,
    pub(crate) performance: PerformanceTier,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChildProgressResponse {
    pub(crate) student_name: String,
    pub(crate) student_number: String,
    pub(crate) stats: StudentStatsResponse,
    pub(crate) enrollments: Vec<EnrollmentResponse>,
}
