use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::courses::fetch_course;
use crate::api::errors::ApiError;
use crate::api::guards::{CurrentApprovedTeacher, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{User, Video};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::video::VideoResponse;
use crate::schemas::MessageResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_video))
        .route("/course/:course_id", get(list_course_videos))
        .route("/:id", get(video_detail).delete(delete_video))
}

struct UploadFields {
    course_id: Option<Uuid>,
    title: Option<String>,
    description: String,
    external_url: Option<String>,
    duration_seconds: Option<i32>,
    file: Option<(String, String, Vec<u8>)>,
}

/// Multipart upload: metadata fields plus either a `video` file part stored
/// in the object store or an external `url`.
async fn upload_video(
    State(state): State<AppState>,
    CurrentApprovedTeacher(teacher): CurrentApprovedTeacher,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>), ApiError> {
    let mut fields = UploadFields {
        course_id: None,
        title: None,
        description: String::new(),
        external_url: None,
        duration_seconds: None,
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "course_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid course_id: {e}")))?;
                fields.course_id = Some(
                    Uuid::parse_str(value.trim())
                        .map_err(|_| ApiError::BadRequest("Invalid course_id".to_string()))?,
                );
            }
            "title" => {
                fields.title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Invalid title: {e}")))?,
                );
            }
            "description" => {
                fields.description = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid description: {e}")))?;
            }
            "url" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid url: {e}")))?;
                if !value.trim().is_empty() {
                    fields.external_url = Some(value);
                }
            }
            "duration_seconds" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid duration: {e}")))?;
                fields.duration_seconds = value.trim().parse::<i32>().ok();
            }
            "video" => {
                let file_name = field.file_name().unwrap_or("video.mp4").to_string();
                let content_type =
                    field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
                fields.file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let course_id =
        fields.course_id.ok_or_else(|| ApiError::BadRequest("course_id is required".to_string()))?;
    let title = fields
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;

    let course = fetch_course(&state, course_id).await?;
    if course.teacher_id != teacher.id {
        return Err(ApiError::Forbidden("Not enough permissions for this course"));
    }

    if fields.file.is_none() && fields.external_url.is_none() {
        return Err(ApiError::BadRequest(
            "Provide either a video file or an external url".to_string(),
        ));
    }

    let mut storage_key = None;
    if let Some((file_name, content_type, bytes)) = fields.file {
        let Some(storage) = state.storage() else {
            return Err(ApiError::ServiceUnavailable("Media storage not configured".to_string()));
        };

        let extension = file_extension(&file_name);
        let allowed = &state.settings().storage().allowed_video_extensions;
        if !allowed.iter().any(|ext| ext == &extension) {
            return Err(ApiError::BadRequest(format!(
                "Unsupported video format .{extension}"
            )));
        }

        let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(ApiError::BadRequest("Video exceeds the upload size limit".to_string()));
        }

        let key = format!("videos/{}/{}.{}", course.id, Uuid::new_v4(), extension);
        let (size, sha256) = storage
            .upload_bytes(&key, &content_type, bytes)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store video"))?;
        tracing::info!(%key, size, %sha256, "Video uploaded to storage");
        storage_key = Some(key);
    }

    let position = repositories::videos::next_position(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign video position"))?;

    let now = primitive_now_utc();
    let video = repositories::videos::create(
        state.db(),
        repositories::videos::CreateVideo {
            course_id: course.id,
            title: &title,
            description: &fields.description,
            position,
            url: fields.external_url,
            storage_key,
            thumbnail_url: None,
            duration_seconds: fields.duration_seconds,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| {
        if repositories::is_unique_violation(&e) {
            ApiError::Conflict("Video position already taken, retry the upload".to_string())
        } else {
            ApiError::internal(e, "Failed to create video")
        }
    })?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from_db(video))))
}

async fn list_course_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    let course = fetch_course(&state, course_id).await?;
    ensure_video_access(&state, &user, course.teacher_id, course.id).await?;

    let videos = repositories::videos::list_by_course(state.db(), course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list course videos"))?;

    let mut responses = Vec::with_capacity(videos.len());
    for video in videos {
        responses.push(presign_video(&state, video).await);
    }

    Ok(Json(responses))
}

async fn video_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
) -> Result<Json<VideoResponse>, ApiError> {
    let video = repositories::videos::find_by_id(state.db(), video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    let course = fetch_course(&state, video.course_id).await?;
    ensure_video_access(&state, &user, course.teacher_id, course.id).await?;

    Ok(Json(presign_video(&state, video).await))
}

async fn delete_video(
    State(state): State<AppState>,
    CurrentApprovedTeacher(teacher): CurrentApprovedTeacher,
    Path(video_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let video = repositories::videos::find_by_id(state.db(), video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    let course = fetch_course(&state, video.course_id).await?;
    if course.teacher_id != teacher.id {
        return Err(ApiError::Forbidden("Not enough permissions for this course"));
    }

    repositories::videos::delete(state.db(), video.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete video"))?;

    Ok(Json(MessageResponse::ok("Video deleted")))
}

/// Owning teacher, admin, or an enrolled student.
async fn ensure_video_access(
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
                Err(ApiError::Forbidden("Enroll in the course to watch its videos"))
            }
        }
        _ => Err(ApiError::Forbidden("Not enough permissions for this course")),
    }
}

async fn presign_video(state: &AppState, video: Video) -> VideoResponse {
    let playback = match (&video.storage_key, state.storage()) {
        (Some(key), Some(storage)) => {
            let expires = Duration::from_secs(
                state.settings().storage().presigned_url_expire_minutes * 60,
            );
            match storage.presign_get(key, expires).await {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(error = %err, video_id = %video.id, "Failed to presign video");
                    None
                }
            }
        }
        _ => None,
    };
    VideoResponse::with_playback_url(video, playback)
}

fn file_extension(file_name: &str) -> String {
    file_name.rsplit('.').next().unwrap_or("mp4").to_ascii_lowercase()
}
