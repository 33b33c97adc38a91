// Error types produced while turning request bytes into a scan result.

use thiserror::Error;

/// Failures caused by the submitted image or by what was found inside it.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid image data: {0}")]
    InvalidImage(#[from] image::ImageError),

    #[error("Decoded {family} payload is not valid UTF-8 text")]
    NonUtf8Payload {
        family: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Failures while writing debug copies of the variants. Never reach the client.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create debug image directory {path}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write debug image {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
}
