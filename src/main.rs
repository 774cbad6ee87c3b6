mod browser;
mod config;
mod error;
mod export;
mod logging;
mod pagination;
mod sites;
mod utils;

use crate::browser::Session;
use crate::config::{Config, Site};
use crate::error::Result;
use crate::logging::{init_logging, parse_log_level, LoggerConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_file("config.toml")?;

    // Initialize logging with custom configuration
    let logger_config = LoggerConfig {
        directory: config.logging.directory.clone(),
        file_name: config.logging.filename.clone(),
        rotation: tracing_appender::rolling::Rotation::DAILY,
        level: parse_log_level(&config.logging.level)?,
    };

    init_logging(logger_config)?;

    log_info!("[main] Starting {} scrape...", config.site);

    log_info!("[main] Launching browser session...");
    let session = Session::builder()
        .headless(config.browser.headless)
        .window_size(config.browser.window_width, config.browser.window_height)
        .wait_timeout(Duration::from_secs(config.browser.wait_timeout))
        .arg("--disable-popup-blocking")
        .launch()
        .await?;

    let outcome = match config.site {
        Site::Ualberta => sites::ualberta::run(&session, &config.ualberta).await,
        Site::Srm => sites::srm::run(&session, &config.srm).await,
        Site::Umanitoba => sites::umanitoba::run(&session, &config.umanitoba).await,
        Site::Vit => sites::vit::run(&session, &config.vit).await,
    };

    // Close the browser even when the scrape failed.
    if let Err(e) = session.close().await {
        log_warn!("[main] Error closing browser session: {}", e);
    } else {
        log_info!("[main] Browser session closed successfully");
    }

    match outcome {
        Ok(total) => {
            log_info!("[main] Scrape finished with {} records", total);
            Ok(())
        }
        Err(e) => {
            log_error!(&e => "[main] Scrape failed");
            Err(e)
        }
    }
}
