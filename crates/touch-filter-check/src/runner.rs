//! Scoped browser lifecycle around the scenario
//!
//! The browser is launched once, the scenario runs on a fresh page, and the
//! browser is closed afterwards whether the scenario passed, failed an
//! assertion or hit a driver error.
//!
//! ```no_run
//! use touch_filter_check::{config::Config, runner::run_check};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let run = run_check(&config).await;
//! print!("{}", run.report.to_console()?);
//! run.result?;
//! # Ok(())
//! # }
//! ```

use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{CheckError, CheckResult};
use crate::report::{ScenarioReport, Step};
use crate::scenario::TouchFilterScenario;

/// Result of one complete check
pub struct CheckRun {
    /// Always populated, also on failure
    pub report: ScenarioReport,
    pub result: CheckResult<()>,
}

impl CheckRun {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Owns the browser for the duration of a check
pub struct TouchFilterRunner {
    session: BrowserSession,
    scenario: TouchFilterScenario,
}

impl TouchFilterRunner {
    /// Validate `config` and launch the headless browser
    pub async fn launch(config: &Config) -> CheckResult<Self> {
        config
            .validate()
            .map_err(|e| CheckError::Config(e.to_string()))?;
        let session = BrowserSession::launch(&config.browser, &config.viewport).await?;
        Ok(Self {
            session,
            scenario: TouchFilterScenario::new(config.clone()),
        })
    }

    /// Run the scenario on a fresh page
    #[instrument(skip_all)]
    pub async fn run(&self, report: &mut ScenarioReport) -> CheckResult<()> {
        let page = self.session.open_page(self.scenario.config()).await?;
        self.scenario.run(&page, report).await
    }

    /// Close the browser
    pub async fn close(self) -> CheckResult<()> {
        self.session.close().await?;
        Ok(())
    }
}

/// Launch, run and close, returning the sealed report and the scenario result
pub async fn run_check(config: &Config) -> CheckRun {
    let mut report = ScenarioReport::new(&config.target.url);

    let started = Instant::now();
    let runner = match TouchFilterRunner::launch(config).await {
        Ok(runner) => runner,
        Err(e) => {
            error!("Launch failed: {}", e);
            let result = Err(e);
            report.finish(&result);
            return CheckRun { report, result };
        }
    };
    report.record(Step::Launch, started, "headless, touch enabled");

    let result = runner.run(&mut report).await;
    if let Err(ref e) = result {
        error!("{}", e);
    }

    let started = Instant::now();
    match runner.close().await {
        Ok(()) => report.record(Step::Close, started, "closed"),
        Err(e) => warn!("Browser did not close cleanly: {}", e),
    }

    report.finish(&result);
    if result.is_ok() {
        info!("Check passed in {}ms", report.total_duration_ms);
    }
    CheckRun { report, result }
}
