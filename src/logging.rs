use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "exam_timetable=info";

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`.
/// Calling it twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
