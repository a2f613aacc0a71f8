use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_owner, CurrentApprovedTeacher, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Course;
use crate::db::types::{RequestType, UserRole};
use crate::repositories;
use crate::schemas::course::{
    CourseCreate, CourseDetailResponse, CourseRequestedResponse, CourseResponse, CourseUpdate,
};
use crate::schemas::video::VideoResponse;
use crate::schemas::MessageResponse;

#[cfg(test)]
mod tests;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/teacher/my-courses", get(my_courses))
        .route("/:id", get(course_detail).put(update_course).delete(delete_course))
}

/// Public catalog: approved and active courses only.
async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_public(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_counts).collect()))
}

async fn course_detail(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseDetailResponse>, ApiError> {
    let course = fetch_course(&state, course_id).await?;

    if !(course.is_approved && course.is_active) {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let videos = repositories::videos::list_by_course(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list course videos"))?;

    Ok(Json(CourseDetailResponse {
        course: CourseResponse::from_db(course),
        videos: videos.into_iter().map(VideoResponse::from_db).collect(),
    }))
}

/// Teachers do not create courses directly; the action records an approval
/// request that an admin later materializes into a course.
async fn create_course(
    State(state): State<AppState>,
    CurrentApprovedTeacher(teacher): CurrentApprovedTeacher,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseRequestedResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Friendly pre-check; the unique index still decides the race at
    // materialization time.
    let taken = repositories::courses::title_taken(state.db(), teacher.id, &payload.title)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check course title"))?;
    if taken {
        return Err(ApiError::Conflict(
            "You already have a course with this title".to_string(),
        ));
    }

    let request_payload = serde_json::json!({
        "title": payload.title,
        "subject": payload.subject,
        "grade": payload.grade,
        "division": payload.division,
        "description": payload.description.unwrap_or_default(),
        "cover_url": payload.cover_url,
    });

    let request = repositories::requests::create(
        state.db(),
        repositories::requests::CreateRequest {
            request_type: RequestType::CourseCreation,
            requester_id: teacher.id,
            payload: sqlx::types::Json(request_payload),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record course request"))?;

    tracing::info!(request_id = %request.id, teacher_id = %teacher.id, "Course creation requested");

    Ok((
        StatusCode::CREATED,
        Json(CourseRequestedResponse {
            success: true,
            message: "Course submitted for admin approval".to_string(),
            request_id: request.id,
        }),
    ))
}

async fn my_courses(
    State(state): State<AppState>,
    CurrentApprovedTeacher(teacher): CurrentApprovedTeacher,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_by_teacher(state.db(), teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list teacher courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn update_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = fetch_course(&state, course_id).await?;
    require_course_owner(&user, course.teacher_id)?;

    let updated = repositories::courses::update(
        state.db(),
        course.id,
        repositories::courses::UpdateCourse {
            title: payload.title,
            subject: payload.subject,
            grade: payload.grade,
            division: payload.division,
            description: payload.description,
            cover_url: payload.cover_url,
            cover_key: None,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("You already have a course with this title".to_string())
        } else {
            ApiError::internal(e, "Failed to update course")
        }
    })?;

    Ok(Json(CourseResponse::from_db(updated)))
}

/// Hard delete. Videos, quizzes and enrollments are removed with the course.
async fn delete_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let course = fetch_course(&state, course_id).await?;
    require_course_owner(&user, course.teacher_id)?;

    if user.role == UserRole::Teacher && !user.is_approved {
        return Err(ApiError::PendingApproval("Teacher account awaiting approval"));
    }

    repositories::courses::delete_cascade(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;

    tracing::info!(course_id = %course.id, deleted_by = %user.id, "Course deleted");

    Ok(Json(MessageResponse::ok("Course and all related content deleted")))
}

pub(crate) async fn fetch_course(state: &AppState, course_id: Uuid) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}
