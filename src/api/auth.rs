use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::{LoginPayload, RegisterResponse, TokenResponse, VerifyStudentResponse};
use crate::schemas::user::{ProfileUpdate, RegisterPayload, UserResponse};

#[cfg(test)]
mod tests;

/// Max attempts per window for auth endpoints.
const AUTH_RATE_LIMIT: u64 = 10;
/// Rate limit window in seconds.
const AUTH_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/verify-student/:student_id", get(verify_student))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = registration_email(&payload).to_lowercase();

    let rate_key = format!("rl:register:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many registration attempts, try again later"));
    }

    let user = match payload {
        RegisterPayload::Student(student) => register_student(&state, student).await?,
        RegisterPayload::Parent(parent) => register_parent(&state, parent).await?,
        RegisterPayload::Teacher(teacher) => register_teacher(&state, teacher).await?,
    };

    let response = if user.role == UserRole::Teacher && !user.is_approved {
        RegisterResponse {
            token: None,
            user: UserResponse::from_db(user),
            message: Some(
                "Registration received. Your account is pending admin approval.".to_string(),
            ),
        }
    } else {
        let token = security::create_access_token(
            &user.id.to_string(),
            user.role,
            state.settings(),
            None,
        )
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
        RegisterResponse { token: Some(token), user: UserResponse::from_db(user), message: None }
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn register_student(
    state: &AppState,
    payload: crate::schemas::user::StudentRegistration,
) -> Result<User, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Secondary grades are split into divisions; earlier grades are not.
    if payload.grade >= 9 && payload.division.as_deref().map_or(true, |d| d.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Division is required for grades 9 and above".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.password)?;
    let student_number = repositories::users::next_student_id(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to allocate student id"))?;

    let now = primitive_now_utc();
    create_user(
        state,
        repositories::users::CreateUser {
            name: &payload.name,
            email: &payload.email.to_lowercase(),
            hashed_password,
            role: UserRole::Student,
            student_id: Some(student_number),
            grade: Some(payload.grade),
            division: payload.division,
            child_student_id: None,
            subject: None,
            experience_years: None,
            qualifications: None,
            phone: payload.phone,
            is_approved: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
}

async fn register_parent(
    state: &AppState,
    payload: crate::schemas::user::ParentRegistration,
) -> Result<User, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let child = repositories::users::find_by_student_id(state.db(), &payload.child_student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up student id"))?;

    match child {
        Some(child) if child.role == UserRole::Student => {}
        _ => return Err(ApiError::BadRequest("Student ID not found".to_string())),
    }

    let hashed_password = hash_password(&payload.password)?;
    let now = primitive_now_utc();
    create_user(
        state,
        repositories::users::CreateUser {
            name: &payload.name,
            email: &payload.email.to_lowercase(),
            hashed_password,
            role: UserRole::Parent,
            student_id: None,
            grade: None,
            division: None,
            child_student_id: Some(payload.child_student_id),
            subject: None,
            experience_years: None,
            qualifications: None,
            phone: payload.phone,
            is_approved: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
}

async fn register_teacher(
    state: &AppState,
    payload: crate::schemas::user::TeacherRegistration,
) -> Result<User, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let hashed_password = hash_password(&payload.password)?;
    let now = primitive_now_utc();
    create_user(
        state,
        repositories::users::CreateUser {
            name: &payload.name,
            email: &payload.email.to_lowercase(),
            hashed_password,
            role: UserRole::Teacher,
            student_id: None,
            grade: None,
            division: None,
            child_student_id: None,
            subject: Some(payload.subject),
            experience_years: payload.experience_years,
            qualifications: payload.qualifications,
            phone: payload.phone,
            // Teachers stay locked out until an admin approves them.
            is_approved: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await
}

async fn create_user(
    state: &AppState,
    params: repositories::users::CreateUser<'_>,
) -> Result<User, ApiError> {
    repositories::users::create(state.db(), params).await.map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("An account with this email already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.to_lowercase();

    let rate_key = format!("rl:login:{email}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, AUTH_RATE_LIMIT, AUTH_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let user = repositories::users::find_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;

    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    if !user.is_active {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    if user.role == UserRole::Teacher && !user.is_approved {
        return Err(ApiError::PendingApproval("Your account is pending admin approval"));
    }

    let now = primitive_now_utc();
    repositories::users::set_last_login(state.db(), user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record login"))?;

    let token =
        security::create_access_token(&user.id.to_string(), user.role, state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse { token, user: UserResponse::from_db(user) }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let hashed_password = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let updated = repositories::users::update_profile(
        state.db(),
        user.id,
        repositories::users::UpdateProfile {
            name: payload.name,
            phone: payload.phone,
            avatar_url: payload.avatar_url,
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?;

    Ok(Json(UserResponse::from_db(updated)))
}

/// Public lookup used by the parent registration form.
async fn verify_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<VerifyStudentResponse>, ApiError> {
    let student = repositories::users::find_by_student_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up student id"))?;

    match student {
        Some(student) if student.role == UserRole::Student => Ok(Json(VerifyStudentResponse {
            exists: true,
            name: Some(student.name),
            grade: student.grade,
        })),
        _ => Ok(Json(VerifyStudentResponse { exists: false, name: None, grade: None })),
    }
}

fn registration_email(payload: &RegisterPayload) -> &str {
    match payload {
        RegisterPayload::Student(student) => &student.email,
        RegisterPayload::Parent(parent) => &parent.email,
        RegisterPayload::Teacher(teacher) => &teacher.email,
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    security::hash_password(password).map_err(|e| ApiError::internal(e, "Failed to hash password"))
}
