//! Run the touch-filter check against the locally served chart
//!
//! Usage: touch-filter-check
//!
//! Takes no arguments. The page must already be served (default
//! http://localhost:8000); set TOUCH_CHECK_URL or TOUCH_CHECK_CONFIG to point
//! elsewhere. Chrome runs without its sandbox unless `[browser] sandbox = true`
//! is set in the config file. Exits non-zero when an invariant breaks or the
//! browser fails.

use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use touch_filter_check::{run_check, Config};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("touch_filter_check=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Checking {}", config.target.url);

    let run = run_check(&config).await;
    print!("{}", run.report.to_console()?);

    if let Some(ref path) = config.report.json_path {
        run.report.write_json(path)?;
        info!("JSON report written to {}", path.display());
    }

    match run.result {
        Ok(()) => {
            println!("All tests passed!");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
