use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentParent, CurrentStudent, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Enrollment, User};
use crate::db::types::{EnrollmentStatus, UserRole};
use crate::repositories;
use crate::schemas::enrollment::{
    ChildProgressResponse, EnrollCheckResponse, EnrollPayload, EnrollmentResponse,
    ProgressUpdatePayload, StudentStatsResponse,
};
use crate::services::{performance, progress};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll))
        .route("/check/:course_id", get(check_enrollment))
        .route("/my-enrollments", get(my_enrollments))
        .route("/:id/progress", put(mark_video_complete).get(enrollment_progress))
        .route("/student-stats", get(student_stats))
        .route("/parent/child-progress", get(child_progress))
        .route("/course/:course_id/students", get(course_students))
}

/// Enrollment snapshots the course's current content counts; later content
/// changes do not move the goalposts for already-enrolled students.
async fn enroll(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Json(payload): Json<EnrollPayload>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    let course = fetch_course(&state, payload.course_id).await?;
    if !course.is_active {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }
    if !course.is_approved {
        return Err(ApiError::BadRequest("Course is not open for enrollment".to_string()));
    }

    let total_videos = repositories::courses::count_active_videos(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count course videos"))?;
    let total_quizzes = repositories::courses::count_active_quizzes(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count course quizzes"))?;

    let enrollment = repositories::enrollments::create(
        state.db(),
        repositories::enrollments::CreateEnrollment {
            student_id: student.id,
            course_id: course.id,
            total_videos: total_videos as i32,
            total_quizzes: total_quizzes as i32,
            enrolled_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("Already enrolled in this course".to_string())
        } else {
            ApiError::internal(e, "Failed to enroll")
        }
    })?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn check_enrollment(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(course_id): Path<Uuid>,
) -> Result<Json<EnrollCheckResponse>, ApiError> {
    let enrollment =
        repositories::enrollments::find_by_student_course(state.db(), student.id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;

    Ok(Json(EnrollCheckResponse {
        enrolled: enrollment.is_some(),
        enrollment: enrollment.map(EnrollmentResponse::from_db),
    }))
}

async fn my_enrollments(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let rows = repositories::enrollments::list_by_student(state.db(), student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;
    Ok(Json(rows.into_iter().map(EnrollmentResponse::from_with_course).collect()))
}

/// Marks a video as watched. Re-marking an already completed video is a
/// no-op, not an error.
async fn mark_video_complete(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(enrollment_id): Path<Uuid>,
    Json(payload): Json<ProgressUpdatePayload>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let video = repositories::videos::find_by_id(state.db(), payload.video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let enrollment = repositories::enrollments::lock_by_id(&mut tx, enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;
    if enrollment.student_id != student.id {
        return Err(ApiError::Forbidden("Not your enrollment"));
    }
    if video.course_id != enrollment.course_id {
        return Err(ApiError::BadRequest("Video belongs to a different course".to_string()));
    }

    let mut completed_videos = enrollment.completed_videos.0.clone();
    if !completed_videos.contains(&video.id) {
        completed_videos.push(video.id);
    }

    let completed_video_count = completed_videos.len() as i32;
    let completed_quiz_count = enrollment.completed_quizzes.0.len() as i32;
    let overall = progress::overall_progress(
        completed_video_count,
        completed_quiz_count,
        enrollment.total_videos,
        enrollment.total_quizzes,
    );
    let complete = progress::is_complete(
        completed_video_count,
        completed_quiz_count,
        enrollment.total_videos,
        enrollment.total_quizzes,
    );
    let now = primitive_now_utc();
    let status =
        if complete { EnrollmentStatus::Completed } else { EnrollmentStatus::Active };
    let completion_date = if complete {
        enrollment.completion_date.or(Some(now))
    } else {
        enrollment.completion_date
    };

    let updated = repositories::enrollments::update_progress(
        &mut tx,
        enrollment.id,
        repositories::enrollments::ProgressUpdate {
            completed_videos: Jsonb(completed_videos),
            completed_quizzes: enrollment.completed_quizzes,
            quiz_scores: enrollment.quiz_scores,
            overall_progress: overall,
            status,
            completion_date,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update progress"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit progress"))?;

    Ok(Json(EnrollmentResponse::from_db(updated)))
}

async fn enrollment_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = repositories::enrollments::find_by_id(state.db(), enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    ensure_progress_access(&state, &user, &enrollment).await?;

    Ok(Json(EnrollmentResponse::from_db(enrollment)))
}

async fn student_stats(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<StudentStatsResponse>, ApiError> {
    let stats = compute_student_stats(&state, student.id).await?;
    Ok(Json(stats))
}

async fn child_progress(
    State(state): State<AppState>,
    CurrentParent(parent): CurrentParent,
) -> Result<Json<ChildProgressResponse>, ApiError> {
    let child_student_id = parent
        .child_student_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("No child linked to this account".to_string()))?;

    let child = repositories::users::find_by_student_id(state.db(), child_student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load linked student"))?
        .ok_or_else(|| ApiError::NotFound("Linked student not found".to_string()))?;

    let stats = compute_student_stats(&state, child.id).await?;
    let rows = repositories::enrollments::list_by_student(state.db(), child.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(ChildProgressResponse {
        student_name: child.name,
        student_number: child.student_id.unwrap_or_default(),
        stats,
        enrollments: rows.into_iter().map(EnrollmentResponse::from_with_course).collect(),
    }))
}

async fn course_students(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let course = fetch_course(&state, course_id).await?;
    if user.role != UserRole::Admin && user.id != course.teacher_id {
        return Err(ApiError::Forbidden("Not enough permissions for this course"));
    }

    let rows = repositories::enrollments::list_by_course(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list course students"))?;
    Ok(Json(rows.into_iter().map(EnrollmentResponse::from_with_student).collect()))
}

/// Averages over the student's enrollments, recomputed per request.
pub(crate) async fn compute_student_stats(
    state: &AppState,
    student_id: Uuid,
) -> Result<StudentStatsResponse, ApiError> {
    let rows = repositories::enrollments::list_by_student(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    let total_courses = rows.len() as i64;
    let completed_courses = rows
        .iter()
        .filter(|row| row.enrollment.status == EnrollmentStatus::Completed)
        .count() as i64;

    let completion_rate = if rows.is_empty() {
        0.0
    } else {
        let sum: i64 =
            rows.iter().map(|row| i64::from(row.enrollment.overall_progress)).sum();
        sum as f64 / rows.len() as f64
    };

    let scores: Vec<i32> = rows
        .iter()
        .flat_map(|row| row.enrollment.quiz_scores.0.values().copied())
        .collect();
    let average_quiz_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|score| i64::from(*score)).sum::<i64>() as f64 / scores.len() as f64
    };

    Ok(StudentStatsResponse {
        total_courses,
        completed_courses,
        completion_rate,
        average_quiz_score,
        overall_rating: performance::enrollment_rating(completion_rate, average_quiz_score),
        performance: performance::tier(completion_rate, average_quiz_score),
    })
}

/// The student themselves, the linked parent, the owning teacher, or an
/// admin.
async fn ensure_progress_access(
    state: &AppState,
    user: &User,
    enrollment: &Enrollment,
) -> Result<(), ApiError> {
    match user.role {
        UserRole::Admin => Ok(()),
        UserRole::Student if user.id == enrollment.student_id => Ok(()),
        UserRole::Teacher => {
            let course = fetch_course(state, enrollment.course_id).await?;
            if course.teacher_id == user.id {
                Ok(())
            } else {
                Err(ApiError::Forbidden("Not enough permissions for this enrollment"))
            }
        }
        UserRole::Parent => {
            let linked = match user.child_student_id.as_deref() {
                Some(student_number) => {
                    repositories::users::find_by_student_id(state.db(), student_number)
                        .await
                        .map_err(|e| ApiError::internal(e, "Failed to load linked student"))?
                        .is_some_and(|child| child.id == enrollment.student_id)
                }
                None => false,
            };
            if linked {
                Ok(())
            } else {
                Err(ApiError::Forbidden("Not enough permissions for this enrollment"))
            }
        }
        _ => Err(ApiError::Forbidden("Not enough permissions for this enrollment")),
    }
}
