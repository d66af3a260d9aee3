#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    use exam_timetable::{ExamCalendar, TimetableConfig, http_api, logging};

    logging::init_tracing();

    let addr: SocketAddr = std::env::var("TIMETABLE_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let config_path = std::env::var("TIMETABLE_CONFIG").ok().map(PathBuf::from);
    let config = TimetableConfig::load(config_path.as_deref())?;
    let calendar = ExamCalendar::from_config(&config.calendar)?;

    tracing::info!(%addr, "exam-timetable HTTP API listening");
    http_api::serve(addr, calendar).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
