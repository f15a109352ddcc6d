use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rotation {
    Minutely,
    Hourly,
    Daily,
}

fn parse_rotation(raw: &str) -> Rotation {
    match raw.trim().to_lowercase().as_str() {
        "hourly" => Rotation::Hourly,
        "minutely" => Rotation::Minutely,
        _ => Rotation::Daily,
    }
}

/// Install the global subscriber: console output filtered by `RUST_LOG`
/// (default `info`), plus a rolling file of `vigil::*` events when
/// `VIGIL_LOG_ROLL=1`. Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(fmt::layer().with_filter(filter));

    if std::env::var("VIGIL_LOG_ROLL").ok().as_deref() != Some("1") {
        let _ = registry.try_init();
        return;
    }

    let dir = std::env::var("VIGIL_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let prefix = std::env::var("VIGIL_LOG_PREFIX").unwrap_or_else(|_| "vigil".into());
    let rotation = parse_rotation(
        &std::env::var("VIGIL_LOG_ROTATION").unwrap_or_else(|_| "daily".into()),
    );
    if std::fs::create_dir_all(&dir).is_err() {
        tracing::warn!(directory = %dir, "failed to create log directory");
    }
    let writer = match rotation {
        Rotation::Hourly => tracing_appender::rolling::hourly(&dir, &prefix),
        Rotation::Minutely => tracing_appender::rolling::minutely(&dir, &prefix),
        Rotation::Daily => tracing_appender::rolling::daily(&dir, &prefix),
    };
    let (nb, guard) = tracing_appender::non_blocking(writer);
    let _ = FILE_GUARD.set(guard);
    let targets = Targets::new().with_target("vigil", tracing::Level::INFO);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(nb)
        .with_filter(targets);
    let _ = registry.with(file_layer).try_init();
}
