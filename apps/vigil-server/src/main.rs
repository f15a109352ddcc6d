use tracing::{debug, error, info, warn};

mod api;
mod app_state;
mod bootstrap;
mod config;
mod game_api;
mod http_client;
mod keepalive;
mod notifier;
mod responses;
mod router;
mod tasks;
#[cfg(test)]
mod test_support;

pub(crate) use app_state::AppState;

use config::ServerConfig;
use vigil_core::WatchConfig;

#[tokio::main]
async fn main() {
    vigil_otel::init();

    let server_cfg = match ServerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };
    let watch_cfg = match WatchConfig::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let bootstrap::BootstrapOutput {
        app,
        engine,
        cancel,
        background_tasks,
    } = match bootstrap::build(&server_cfg, &watch_cfg) {
        Ok(out) => out,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    let listener = match tokio::net::TcpListener::bind(server_cfg.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %server_cfg.addr, "bind server socket: {err}");
            std::process::exit(1);
        }
    };
    info!(addr = %server_cfg.addr, "vigil listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(err) = server.await {
        error!("http server exited with error: {err}");
    }

    cancel.cancel();
    if !background_tasks.is_empty() {
        info!(tasks = background_tasks.len(), "shutting down background tasks");
        let report = background_tasks
            .shutdown_with_grace(server_cfg.shutdown_grace)
            .await;
        debug!(completed = ?report.completed, "background tasks stopped");
        if !report.aborted.is_empty() {
            warn!(aborted = ?report.aborted, "background tasks aborted after grace");
        }
    }
    engine.shutdown(server_cfg.shutdown_grace).await;
    info!("shutdown complete");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!("SIGTERM handler unavailable: {err}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
