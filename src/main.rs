// Main entry point for the barcode-scan-server application.
// Reads configuration, builds the Tokio runtime for the serving mode,
// configures the Axum router, and starts the HTTP server.

mod config;
mod scan;
mod shutdown_signal;
mod web;

use clap::Parser;
use config::AppConfig;
use scan::{DebugPersister, DetectorChain};
use shutdown_signal::shutdown_signal;
use std::{future::IntoFuture, sync::Arc, time::Duration};
use web::{AppOptions, AppState, RedirectTemplate};

// How long blocking scan threads get to finish once the server has stopped
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    // Parse command line args and environment variables
    let config = AppConfig::parse();

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_max_level(config.mode.log_level())
        .with_target(true) // Include module path in logs
        .with_file(true) // Include source file name
        .with_line_number(true) // Include line numbers
        .init();

    tracing::info!("Starting barcode-scan-server in {} mode...", config.mode);

    let runtime = config.mode.build_runtime().unwrap_or_else(|err| {
        tracing::error!("FATAL: Failed to build Tokio runtime: {}", err);
        eprintln!("FATAL: Could not start runtime. Error: {}. Exiting.", err);
        std::process::exit(1);
    });

    runtime.block_on(run(config));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    tracing::info!("barcode-scan-server has shut down.");
}

async fn run(config: AppConfig) {
    let redirect_template = RedirectTemplate::new(config.redirect_url.clone());
    tracing::info!("Redirect URL template: {}", redirect_template.as_str());

    let debug_persister = config.images_location_copy.as_ref().map(DebugPersister::new);
    match &debug_persister {
        Some(persister) => tracing::info!(
            "Debug image copies will be written to {}",
            persister.dir().display()
        ),
        None => tracing::debug!("Debug image persistence disabled"),
    }

    let state = Arc::new(AppState {
        detector: Arc::new(DetectorChain::standard()),
        redirect_template,
        debug_persister,
    });

    // --- Build Axum Application Router ---
    let app = web::create_app(
        state,
        AppOptions {
            static_dir: config.static_dir.clone(),
            request_timeout: config.mode.request_timeout(),
        },
    );

    tracing::info!("Axum router configured.");

    // --- Start HTTP Server ---
    let listener = match web::create_listener(&config.host, config.port, config.mode.backlog()) {
        Ok((addr, l)) => {
            tracing::info!("Server successfully bound. Listening on http://{}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    // Fires once the shutdown signal has been seen, starting the drain deadline
    let (draining_tx, draining_rx) = tokio::sync::oneshot::channel::<()>();

    let server = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutting down, waiting for in-flight requests...");
            let _ = draining_tx.send(());
        })
        .into_future();
    let mut server = tokio::spawn(server);

    let grace = config.mode.shutdown_grace();
    let drain_deadline = async move {
        if draining_rx.await.is_err() {
            // Server stopped without a signal; the other branch reports it
            std::future::pending::<()>().await;
        }
        match grace {
            Some(grace) => tokio::time::sleep(grace).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = &mut server => match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Server run error: {}", e);
                eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
            }
            Err(e) => tracing::error!("Server task failed: {}", e),
        },
        _ = drain_deadline => {
            tracing::warn!(
                "In-flight requests did not finish within {:?}; closing remaining connections",
                grace.unwrap_or_default()
            );
            server.abort();
        }
    }
}
