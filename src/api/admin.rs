use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{CourseStatus, RequestStatus, RequestType, UserRole};
use crate::repositories;
use crate::schemas::admin::{
    CoursePerformanceRow, DashboardStatsResponse, PerformanceStatsResponse, RequestResponse,
    ReviewAction, ReviewPayload, TopPerformer,
};
use crate::schemas::auth::{LoginPayload, TokenResponse};
use crate::schemas::enrollment::EnrollmentResponse;
use crate::schemas::user::UserResponse;
use crate::schemas::MessageResponse;
use crate::services::performance;

#[cfg(test)]
mod tests;

/// Max login attempts per window.
const LOGIN_RATE_LIMIT: u64 = 5;
const LOGIN_RATE_WINDOW_SECONDS: u64 = 60;

/// Top performers returned by the platform performance report.
const TOP_PERFORMER_LIMIT: usize = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin_login))
        .route("/pending-teachers", get(pending_teachers))
        .route("/approve-teacher/:id", put(review_teacher))
        .route("/course-requests", get(course_requests))
        .route("/approve-course/:request_id", put(review_course_request))
        .route("/dashboard-stats", get(dashboard_stats))
        .route("/performance-stats", get(performance_stats))
        .route("/course-performance", get(course_performance))
        .route("/users", get(list_users))
        .route("/users/:id", delete(delete_user))
        .route("/enrollments", get(list_enrollments))
        .route("/enrollments/:id", delete(delete_enrollment))
        .route("/courses/:id", delete(delete_course))
}

/// Separate login issuing a shorter-lived token. Tighter rate limit than the
/// public endpoint.
async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let rate_key = format!("rl:admin:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Invalid email or password"))?;

    let valid = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Password verification failed"))?;
    if !valid || user.role != UserRole::Admin || !user.is_active {
        return Err(ApiError::Unauthorized("Invalid email or password"));
    }

    let token = security::create_access_token(
        &user.id.to_string(),
        user.role,
        state.settings(),
        Some(security::admin_token_duration(state.settings())),
    )
    .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    repositories::users::set_last_login(state.db(), user.id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record login"))?;

    Ok(Json(TokenResponse { token, user: UserResponse::from_db(user) }))
}

async fn pending_teachers(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let teachers = repositories::users::list_pending_teachers(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list pending teachers"))?;
    Ok(Json(teachers.into_iter().map(UserResponse::from_db).collect()))
}

async fn review_teacher(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(teacher_id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let now = primitive_now_utc();
    let (changed, message) = match payload.action {
        ReviewAction::Approve => {
            let changed = repositories::users::approve_teacher(state.db(), teacher_id, now)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to approve teacher"))?;
            (changed, "Teacher approved")
        }
        ReviewAction::Reject => {
            let changed = repositories::users::reject_teacher(state.db(), teacher_id, now)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to reject teacher"))?;
            (changed, "Teacher rejected")
        }
    };

    if !changed {
        return Err(ApiError::NotFound("Pending teacher not found".to_string()));
    }

    tracing::info!(%teacher_id, admin_id = %admin.id, message, "Teacher reviewed");
    Ok(Json(MessageResponse::ok(message)))
}

async fn course_requests(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let requests = repositories::requests::list(state.db(), Some(RequestStatus::Pending))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list course requests"))?;
    Ok(Json(requests.into_iter().map(RequestResponse::from_db).collect()))
}

/// Payload a course-creation request carries; written at request time by the
/// course endpoint.
#[derive(Debug, Deserialize)]
struct CourseRequestPayload {
    title: String,
    subject: String,
    grade: i32,
    #[serde(default)]
    division: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    cover_url: Option<String>,
}

/// Approving materializes the course from the request payload inside one
/// transaction; the pending-only update keeps a re-review from approving
/// twice.
async fn review_course_request(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<RequestResponse>, ApiError> {
    let now = primitive_now_utc();
    let status = match payload.action {
        ReviewAction::Approve => RequestStatus::Approved,
        ReviewAction::Reject => RequestStatus::Rejected,
    };

    repositories::requests::find_by_id(state.db(), request_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load request"))?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let request = repositories::requests::process(
        &mut tx,
        request_id,
        status,
        payload.admin_notes,
        admin.id,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to process request"))?
    .ok_or_else(|| ApiError::Conflict("Request already processed".to_string()))?;

    if request.request_type != RequestType::CourseCreation {
        return Err(ApiError::BadRequest("Not a course creation request".to_string()));
    }

    if matches!(payload.action, ReviewAction::Approve) {
        let course: CourseRequestPayload = serde_json::from_value(request.payload.0.clone())
            .map_err(|e| ApiError::internal(e, "Malformed course request payload"))?;

        repositories::courses::create(
            &mut *tx,
            repositories::courses::CreateCourse {
                teacher_id: request.requester_id,
                title: &course.title,
                subject: &course.subject,
                grade: course.grade,
                division: course.division,
                description: &course.description,
                cover_url: course.cover_url,
                cover_key: None,
                status: CourseStatus::Approved,
                is_approved: true,
                approval_date: Some(now),
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| {
            if repositories::is_unique_violation(&e) {
                ApiError::Conflict("The teacher already has a course with this title".to_string())
            } else {
                ApiError::internal(e, "Failed to create course")
            }
        })?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit review"))?;

    tracing::info!(%request_id, admin_id = %admin.id, status = ?status, "Course request reviewed");
    Ok(Json(RequestResponse::from_db(request)))
}

async fn dashboard_stats(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<DashboardStatsResponse>, ApiError> {
    let db = state.db();
    let total_students = repositories::users::count_by_role(db, UserRole::Student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let total_teachers = repositories::users::count_by_role(db, UserRole::Teacher)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count teachers"))?;
    let total_parents = repositories::users::count_by_role(db, UserRole::Parent)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count parents"))?;
    let total_courses = repositories::courses::count_approved(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count courses"))?;
    let total_enrollments = repositories::enrollments::count_all(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;
    let pending_requests = repositories::requests::count_pending(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count requests"))?;
    let pending_teachers = repositories::users::list_pending_teachers(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list pending teachers"))?
        .len() as i64;

    Ok(Json(DashboardStatsResponse {
        total_students,
        total_teachers,
        total_parents,
        total_courses,
        total_enrollments,
        pending_requests,
        pending_teachers,
    }))
}

/// Platform overview recomputed from all enrollments on each request.
async fn performance_stats(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<PerformanceStatsResponse>, ApiError> {
    let rows = repositories::enrollments::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    let total = rows.len();
    let completion_rate = if total == 0 {
        0.0
    } else {
        rows.iter().map(|row| i64::from(row.enrollment.overall_progress)).sum::<i64>() as f64
            / total as f64
    };

    let mut scores: Vec<i32> = Vec::new();
    let mut passing = 0usize;
    for row in &rows {
        for score in row.enrollment.quiz_scores.0.values() {
            scores.push(*score);
            if *score >= 60 {
                passing += 1;
            }
        }
    }
    let average_quiz_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|score| i64::from(*score)).sum::<i64>() as f64 / scores.len() as f64
    };
    let quiz_success_rate =
        if scores.is_empty() { 0.0 } else { 100.0 * passing as f64 / scores.len() as f64 };

    let total_students = repositories::users::count_by_role(state.db(), UserRole::Student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let enrolled_students = repositories::enrollments::count_enrolled_students(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrolled students"))?;
    let student_activity_rate = if total_students == 0 {
        0.0
    } else {
        100.0 * enrolled_students as f64 / total_students as f64
    };

    let overall_rating = performance::platform_rating(
        completion_rate,
        quiz_success_rate,
        average_quiz_score,
        student_activity_rate,
    );

    let top_performers = top_performers(&state, &rows).await?;

    Ok(Json(PerformanceStatsResponse {
        completion_rate,
        quiz_success_rate,
        average_quiz_score,
        student_activity_rate,
        overall_rating,
        performance: performance::tier(completion_rate, average_quiz_score),
        top_performers,
    }))
}

async fn top_performers(
    state: &AppState,
    rows: &[repositories::enrollments::EnrollmentWithStudent],
) -> Result<Vec<TopPerformer>, ApiError> {
    let mut ranked: Vec<(Uuid, TopPerformer)> = rows
        .iter()
        .map(|row| {
            let scores = &row.enrollment.quiz_scores.0;
            let average_score = if scores.is_empty() {
                0.0
            } else {
                scores.values().map(|score| i64::from(*score)).sum::<i64>() as f64
                    / scores.len() as f64
            };
            let completion_rate = f64::from(row.enrollment.overall_progress);
            let performer = TopPerformer {
                student_id: row.enrollment.student_id,
                student_name: row.student_name.clone(),
                course_title: String::new(),
                completion_rate,
                average_score,
                rating: performance::enrollment_rating(completion_rate, average_score),
            };
            (row.enrollment.course_id, performer)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.rating.cmp(&a.1.rating));
    ranked.truncate(TOP_PERFORMER_LIMIT);

    let mut performers = Vec::with_capacity(ranked.len());
    for (course_id, mut performer) in ranked {
        let course = repositories::courses::find_by_id(state.db(), course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load course"))?;
        performer.course_title = course.map(|c| c.title).unwrap_or_default();
        performers.push(performer);
    }
    Ok(performers)
}

async fn course_performance(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<CoursePerformanceRow>>, ApiError> {
    let courses = repositories::courses::list_approved(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    let mut report = Vec::with_capacity(courses.len());
    for course in courses {
        let rows = repositories::enrollments::list_by_course(state.db(), course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list course enrollments"))?;

        let enrollment_count = rows.len() as i64;
        let average_completion = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|row| i64::from(row.enrollment.overall_progress)).sum::<i64>() as f64
                / rows.len() as f64
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

        let teacher = repositories::users::find_by_id(state.db(), course.teacher_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load teacher"))?;

        report.push(CoursePerformanceRow {
            course_id: course.id,
            course_title: course.title,
            teacher_name: teacher.map(|t| t.name).unwrap_or_default(),
            enrollment_count,
            average_completion,
            average_quiz_score,
            rating: performance::enrollment_rating(average_completion, average_quiz_score),
        });
    }

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct UserListQuery {
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    search: Option<String>,
}

async fn list_users(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(
        state.db(),
        &repositories::users::UserFilter { role: query.role, search: query.search },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list users"))?;
    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

/// Admin accounts are not deletable through the API.
async fn delete_user(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::users::delete_non_admin(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(%user_id, admin_id = %admin.id, "User deleted");
    Ok(Json(MessageResponse::ok("User deleted")))
}

async fn list_enrollments(
    State(state): State<AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let rows = repositories::enrollments::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;
    Ok(Json(rows.into_iter().map(EnrollmentResponse::from_with_student).collect()))
}

async fn delete_enrollment(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(enrollment_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::enrollments::delete(state.db(), enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete enrollment"))?;
    if !deleted {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    }

    tracing::info!(%enrollment_id, admin_id = %admin.id, "Enrollment deleted");
    Ok(Json(MessageResponse::ok("Enrollment deleted")))
}

async fn delete_course(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(course_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::courses::delete_cascade(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    tracing::info!(%course_id, admin_id = %admin.id, "Course deleted");
    Ok(Json(MessageResponse::ok("Course and all related content deleted")))
}
