// API-specific data models for the web server

use serde::{Deserialize, Serialize};

/// Body of `POST /scan`.
#[derive(Deserialize, Debug, Clone)]
pub struct ScanRequest {
    /// Base64 image, optionally prefixed with a data-URL header such as
    /// `data:image/png;base64,`. Optional here so a missing field can be
    /// answered with our own message instead of a deserializer error.
    pub image: Option<String>,
    #[serde(default)]
    pub redirect: bool,
}

/// Body of `GET /health`.
#[derive(Serialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
