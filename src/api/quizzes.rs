use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::{require_course_owner, CurrentApprovedTeacher, CurrentStudent, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Quiz, User};
use crate::db::types::{EnrollmentStatus, UserRole};
use crate::repositories;
use crate::schemas::quiz::{
    QuizCreate, QuizResponse, QuizSubmit, QuizSubmitResponse, SanitizedQuizResponse,
};
use crate::schemas::MessageResponse;
use crate::services::{grading, progress};

#[cfg(test)]
mod tests;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quiz))
        .route("/course/:course_id", get(list_course_quizzes))
        .route("/:id", get(quiz_detail).delete(delete_quiz))
        .route("/:id/submit", post(submit_quiz))
}

const DEFAULT_PASSING_SCORE: i32 = 60;
const DEFAULT_TIME_LIMIT_MINUTES: i32 = 15;
const DEFAULT_MAX_ATTEMPTS: i32 = 3;

async fn create_quiz(
    State(state): State<AppState>,
    CurrentApprovedTeacher(teacher): CurrentApprovedTeacher,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = fetch_course(&state, payload.course_id).await?;
    require_course_owner(&teacher, course.teacher_id)?;

    let questions: Vec<_> =
        payload.questions.into_iter().map(|question| question.into_question()).collect();
    grading::validate_questions(&questions)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if let Some(video_id) = payload.video_id {
        let video = repositories::videos::find_by_id(state.db(), video_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load video"))?
            .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;
        if video.course_id != course.id {
            return Err(ApiError::BadRequest(
                "Video belongs to a different course".to_string(),
            ));
        }
    }

    let now = primitive_now_utc();
    let quiz = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            course_id: course.id,
            video_id: payload.video_id,
            title: payload.title.trim(),
            description: payload.description.as_deref().unwrap_or_default(),
            questions: Jsonb(questions),
            passing_score: payload.passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
            time_limit_minutes: payload.time_limit_minutes.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
            max_attempts: payload.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("A quiz with this title already exists in the course".to_string())
        } else {
            ApiError::internal(e, "Failed to create quiz")
        }
    })?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz))))
}

/// Students get a shuffled copy with correct answers stripped; the owning
/// teacher and admins see the quiz as stored.
async fn quiz_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quiz_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let quiz = fetch_quiz(&state, quiz_id).await?;
    let course = fetch_course(&state, quiz.course_id).await?;
    ensure_quiz_access(&state, &user, course.teacher_id, course.id).await?;

    Ok(render_quiz(&user, quiz))
}

async fn list_course_quizzes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let course = fetch_course(&state, course_id).await?;
    ensure_quiz_access(&state, &user, course.teacher_id, course.id).await?;

    let quizzes = repositories::quizzes::list_by_course(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list course quizzes"))?;

    if user.role == UserRole::Student {
        let mut rng = rand::thread_rng();
        let sanitized: Vec<_> = quizzes
            .into_iter()
            .map(|quiz| {
                let questions = grading::sanitize_for_student(&quiz.questions.0, &mut rng);
                SanitizedQuizResponse::from_db(quiz, questions)
            })
            .collect();
        Ok(Json(sanitized).into_response())
    } else {
        let full: Vec<_> = quizzes.into_iter().map(QuizResponse::from_db).collect();
        Ok(Json(full).into_response())
    }
}

/// Grades inside a transaction holding the enrollment row lock, so two
/// concurrent submissions cannot both slip under the attempt cap.
async fn submit_quiz(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<QuizSubmit>,
) -> Result<Json<QuizSubmitResponse>, ApiError> {
    let quiz = fetch_quiz(&state, quiz_id).await?;

    let enrollment =
        repositories::enrollments::find_by_student_course(state.db(), student.id, quiz.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load enrollment"))?
            .ok_or_else(|| {
                ApiError::Forbidden("Enroll in the course before taking its quizzes")
            })?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to open transaction"))?;

    let enrollment = repositories::enrollments::lock_by_id(&mut tx, enrollment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    let attempts_used =
        repositories::enrollments::count_attempts(&mut tx, enrollment.id, quiz.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    if attempts_used >= i64::from(quiz.max_attempts) {
        return Err(ApiError::BadRequest("Maximum attempts reached".to_string()));
    }

    let outcome = grading::grade(&quiz.questions.0, &payload.answers)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let passed = outcome.score >= quiz.passing_score;
    let now = primitive_now_utc();

    repositories::enrollments::insert_attempt(
        &mut tx,
        repositories::enrollments::CreateAttempt {
            enrollment_id: enrollment.id,
            quiz_id: quiz.id,
            score: outcome.score,
            passed,
            answers: Jsonb(payload.answers),
            time_taken_seconds: payload.time_taken_seconds,
            completed_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record attempt"))?;

    let mut quiz_scores = enrollment.quiz_scores.0.clone();
    let best_score = quiz_scores
        .get(&quiz.id)
        .copied()
        .map_or(outcome.score, |previous| previous.max(outcome.score));
    quiz_scores.insert(quiz.id, best_score);

    let mut completed_quizzes = enrollment.completed_quizzes.0.clone();
    if passed && !completed_quizzes.contains(&quiz.id) {
        completed_quizzes.push(quiz.id);
    }

    let completed_video_count = enrollment.completed_videos.0.len() as i32;
    let completed_quiz_count = completed_quizzes.len() as i32;
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
    let status =
        if complete { EnrollmentStatus::Completed } else { EnrollmentStatus::Active };
    let completion_date = if complete {
        enrollment.completion_date.or(Some(now))
    } else {
        enrollment.completion_date
    };

    repositories::enrollments::update_progress(
        &mut tx,
        enrollment.id,
        repositories::enrollments::ProgressUpdate {
            completed_videos: enrollment.completed_videos,
            completed_quizzes: Jsonb(completed_quizzes),
            quiz_scores: Jsonb(quiz_scores),
            overall_progress: overall,
            status,
            completion_date,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update progress"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit submission"))?;

    let attempts_used = attempts_used + 1;
    Ok(Json(QuizSubmitResponse {
        score: outcome.score,
        passed,
        correct_answers: outcome.correct_answers,
        best_score,
        attempts_used,
        attempts_left: i64::from(quiz.max_attempts) - attempts_used,
    }))
}

async fn delete_quiz(
    State(state): State<AppState>,
    CurrentApprovedTeacher(teacher): CurrentApprovedTeacher,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let quiz = fetch_quiz(&state, quiz_id).await?;
    let course = fetch_course(&state, quiz.course_id).await?;
    require_course_owner(&teacher, course.teacher_id)?;

    repositories::quizzes::delete(state.db(), quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    Ok(Json(MessageResponse::ok("Quiz deleted")))
}

pub(crate) async fn fetch_quiz(state: &AppState, id: Uuid) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}

fn render_quiz(user: &User, quiz: Quiz) -> Response {
    if user.role == UserRole::Student {
        let mut rng = rand::thread_rng();
        let questions = grading::sanitize_for_student(&quiz.questions.0, &mut rng);
        Json(SanitizedQuizResponse::from_db(quiz, questions)).into_response()
    } else {
        Json(QuizResponse::from_db(quiz)).into_response()
    }
}

async fn ensure_quiz_access(
    state: &AppState,
    user: &User,
    course_teacher_id: Uuid,
    course_id: Uuid,
) -> Result<(), ApiError> {
    match user.role {
        UserRole::Admin => Ok(()),
        UserRole::Teacher if user.id == course_teacher_id => Ok(()),
        UserRole::Student => {
            let enrollment =
                repositories::enrollments::find_by_student_course(state.db(), user.id, course_id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
            if enrollment.is_some() {
                Ok(())
            } else {
                Err(ApiError::Forbidden("Enroll in the course to take its quizzes"))
            }
        }
        _ => Err(ApiError::Forbidden("Not enough permissions for this course")),
    }
}
