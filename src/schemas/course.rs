use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Course;
use crate::db::types::CourseStatus;
use crate::repositories::courses::CourseWithCounts;
use crate::schemas::video::VideoResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 3, max = 200))]
    pub(crate) title: String,
    #[validate(length(min = 2, max = 128))]
    pub(crate) subject: String,
    #[validate(range(min = 1, max = 12))]
    pub(crate) grade: i32,
    #[serde(default)]
    pub(crate) division: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) cover_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    #[validate(length(min = 3, max = 200))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 12))]
    pub(crate) grade: Option<i32>,
    #[serde(default)]
    pub(crate) division: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) cover_url: Option<String>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: Uuid,
    pub(crate) teacher_id: Uuid,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) grade: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) division: Option<String>,
    pub(crate) description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cover_url: Option<String>,
    pub(crate) status: CourseStatus,
    pub(crate) is_approved: bool,
    pub(crate) is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) approval_date: Option<String>,
    pub(crate) created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) teacher_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) video_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) quiz_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enrollment_count: Option<i64>,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            teacher_id: course.teacher_id,
            title: course.title,
            subject: course.subject,
            grade: course.grade,
            division: course.division,
            description: course.description,
            cover_url: course.cover_url,
            status: course.status,
            is_approved: course.is_approved,
            is_active: course.is_active,
            rejection_reason: course.rejection_reason,
            approval_date: course.approval_date.map(format_primitive),
            created_at: format_primitive(course.created_at),
            teacher_name: None,
            video_count: None,
            quiz_count: None,
            enrollment_count: None,
        }
    }

    pub(crate) fn from_counts(row: CourseWithCounts) -> Self {
        let mut response = Self::from_db(row.course);
        response.teacher_name = Some(row.teacher_name);
        response.video_count = Some(row.video_count);
        response.quiz_count = Some(row.quiz_count);
        response.enrollment_count = Some(row.enrollment_count);
        response
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseDetailResponse {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) videos: Vec<VideoResponse>,
}

/// Acknowledgment for a course-creation request awaiting admin review.
#[derive(Debug, Serialize)]
pub(crate) struct CourseRequestedResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) request_id: Uuid,
}
