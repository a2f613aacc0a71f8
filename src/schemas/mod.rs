use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod course;
pub(crate) mod enrollment;
pub(crate) mod quiz;
pub(crate) mod user;
pub(crate) mod video;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

/// Uniform acknowledgment body for mutations that return no resource.
#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
}

impl MessageResponse {
    pub(crate) fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}
