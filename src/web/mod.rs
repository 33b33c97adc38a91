// Web server module
// Handles the HTTP endpoints: the scan API, health probe and client page.

mod app;
mod error;
mod handlers;
mod listeners;
mod models;
mod redirect;
mod request_image;

pub use app::{AppOptions, create_app};
pub use listeners::create_listener;
pub use redirect::RedirectTemplate;

use crate::scan::{DebugPersister, SymbolDetector};
use std::sync::Arc;

// Maximum allowed size for scan request bodies (base64 inflates images by a third)
pub const MAX_REQUEST_SIZE_BYTES: usize = 32 * 1024 * 1024; // 32MB

/// Read-only state shared by every request.
pub struct AppState {
    pub detector: Arc<dyn SymbolDetector>,
    pub redirect_template: RedirectTemplate,
    pub debug_persister: Option<DebugPersister>,
}

pub type SharedState = Arc<AppState>;
