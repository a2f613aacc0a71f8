use serde::Serialize;
use uuid::Uuid;

use crate::core::time::format_primitive;
use crate::db::models::Video;

#[derive(Debug, Serialize)]
pub(crate) struct VideoResponse {
    pub(crate) id: Uuid,
    pub(crate) course_id: Uuid,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) position: i32,
    /// Playback location: a presigned URL when the file lives in object
    /// storage, otherwise the externally hosted URL as stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) created_at: String,
}

impl VideoResponse {
    pub(crate) fn from_db(video: Video) -> Self {
        Self {
            id: video.id,
            course_id: video.course_id,
            title: video.title,
            description: video.description,
            position: video.position,
            url: video.url,
            thumbnail_url: video.thumbnail_url,
            duration_seconds: video.duration_seconds,
            created_at: format_primitive(video.created_at),
        }
    }

    pub(crate) fn with_playback_url(video: Video, playback_url: Option<String>) -> Self {
        let mut response = Self::from_db(video);
        if playback_url.is_some() {
            response.url = playback_url;
        }
        response
    }
}
