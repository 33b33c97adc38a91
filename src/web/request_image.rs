// Turns the `image` field of a scan request into a decoded raster.

use crate::scan::ScanError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::DynamicImage;
use std::borrow::Cow;
use tracing::debug;

/// Drops everything up to and including the first comma, if any.
pub fn strip_data_url_prefix(field: &str) -> &str {
    field.split_once(',').map_or(field, |(_, payload)| payload)
}

/// Decodes a base64 (or data-URL) image field into a raster.
///
/// The container format is always sniffed from the bytes; a data-URL media
/// type is not trusted.
pub fn decode_image_field(field: &str) -> Result<DynamicImage, ScanError> {
    let payload = strip_data_url_prefix(field);

    // Line-wrapped base64 is common from some clients.
    let payload: Cow<'_, str> = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(
            payload
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect(),
        )
    } else {
        Cow::Borrowed(payload)
    };

    let bytes = STANDARD.decode(payload.as_bytes())?;
    let image = image::load_from_memory(&bytes)?;

    debug!(
        "Input image decoded: {}x{}, {:?}, {} byte(s)",
        image.width(),
        image.height(),
        image.color(),
        bytes.len()
    );

    Ok(image)
}
