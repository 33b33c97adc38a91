// Process configuration, read once at startup from flags and environment.

use crate::web::RedirectTemplate;
use clap::{Parser, ValueEnum};
use std::{path::PathBuf, time::Duration};
use tracing::Level;

const PRODUCTION_WORKERS: usize = 2;
const PRODUCTION_TIMEOUT: Duration = Duration::from_secs(120);
const PRODUCTION_BACKLOG: i32 = 2048;
const DEVELOPMENT_BACKLOG: i32 = 1024;

/// Command line arguments for barcode-scan-server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Hostname/IP to bind the server to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 5555)]
    pub port: u16,

    /// Redirect URL template. `{code}`, `{protocol}` and `{host}` are replaced
    /// with the decoded value, request scheme and request host.
    #[arg(long, env = "REDIRECT_URL", default_value = RedirectTemplate::DEFAULT)]
    pub redirect_url: String,

    /// Directory receiving a copy of every generated image variant.
    /// Debug persistence is off when unset.
    #[arg(long, env = "IMAGES_LOCATION_COPY")]
    pub images_location_copy: Option<PathBuf>,

    /// Directory containing the `index.html` client page.
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Serving mode.
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = ServeMode::Development)]
    pub mode: ServeMode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    Development,
    Production,
}

impl std::fmt::Display for ServeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServeMode::Development => f.write_str("development"),
            ServeMode::Production => f.write_str("production"),
        }
    }
}

impl ServeMode {
    pub fn log_level(self) -> Level {
        match self {
            ServeMode::Development => Level::DEBUG,
            ServeMode::Production => Level::INFO,
        }
    }

    /// Async worker threads; `None` keeps the tokio default (one per core).
    pub fn worker_threads(self) -> Option<usize> {
        match self {
            ServeMode::Development => None,
            ServeMode::Production => Some(PRODUCTION_WORKERS),
        }
    }

    /// Upper bound on concurrently running scans.
    pub fn max_blocking_threads(self) -> Option<usize> {
        self.worker_threads()
    }

    pub fn request_timeout(self) -> Option<Duration> {
        match self {
            ServeMode::Development => None,
            ServeMode::Production => Some(PRODUCTION_TIMEOUT),
        }
    }

    /// How long in-flight requests may drain after a shutdown signal.
    pub fn shutdown_grace(self) -> Option<Duration> {
        self.request_timeout()
    }

    pub fn backlog(self) -> i32 {
        match self {
            ServeMode::Development => DEVELOPMENT_BACKLOG,
            ServeMode::Production => PRODUCTION_BACKLOG,
        }
    }

    pub fn build_runtime(self) -> std::io::Result<tokio::runtime::Runtime> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("scan-worker");
        if let Some(workers) = self.worker_threads() {
            builder.worker_threads(workers);
        }
        if let Some(blocking) = self.max_blocking_threads() {
            builder.max_blocking_threads(blocking);
        }
        builder.build()
    }
}
