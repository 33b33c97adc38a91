// Redirect URL templating for successful scans.

use super::error::ApiError;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use headers::HeaderMapExt;

/// URL template with `{code}`, `{protocol}` and `{host}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTemplate(String);

impl RedirectTemplate {
    pub const DEFAULT: &'static str = "http://localhost/search/{code}";

    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitutes the placeholders literally, without URL-encoding.
    ///
    /// Single pass: text inserted for one placeholder is never re-scanned, so a
    /// decoded value containing `{host}` stays as it is.
    pub fn render(&self, code: &str, protocol: &str, host: &str) -> String {
        let placeholders = [("{code}", code), ("{protocol}", protocol), ("{host}", host)];

        let mut out = String::with_capacity(self.0.len() + code.len() + host.len());
        let mut rest = self.0.as_str();
        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            match placeholders
                .iter()
                .find_map(|&(name, value)| tail.strip_prefix(name).map(|after| (value, after)))
            {
                Some((value, after)) => {
                    out.push_str(value);
                    rest = after;
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for RedirectTemplate {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// Scheme and host the client used to reach us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    /// Scheme from `X-Forwarded-Proto`, then the URI, then `http`.
    /// Host from the `Host` header (port kept), then the URI authority, then `localhost`.
    pub fn from_parts(headers: &HeaderMap, uri: &Uri) -> Self {
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| uri.scheme_str())
            .unwrap_or("http")
            .to_string();

        let host = headers
            .typed_get::<headers::Host>()
            .map(|h| match h.port() {
                Some(port) => format!("{}:{}", h.hostname(), port),
                None => h.hostname().to_string(),
            })
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Self { scheme, host }
    }
}

/// `302 Found` with the given `Location` and an empty body.
pub fn found(location: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(location).map_err(|e| {
        ApiError::InternalServerError(format!("Invalid redirect URL '{}': {}", location, e))
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, value)]).into_response())
}
