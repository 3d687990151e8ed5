//! Browser test helpers

use std::time::Duration;
use touch_filter_check::{CheckError, CheckRun, Config};

/// Check if browser tests should be skipped (when Chrome isn't available)
pub fn should_skip() -> bool {
    std::env::var("SKIP_BROWSER_TESTS").is_ok()
}

/// Macro to skip test if Chrome isn't available
#[macro_export]
macro_rules! skip_if_no_chrome {
    () => {
        if browser::should_skip() {
            eprintln!("Skipping test: SKIP_BROWSER_TESTS is set");
            return;
        }
    };
}

/// Configuration for checking `url` from a test process
pub fn test_config(url: &str) -> Config {
    let mut config = Config::default();
    config.target.url = url.to_string();
    config.timing.initial_settle = Duration::from_millis(300);
    config
}

/// True when the run could not start because no Chrome binary was found
pub fn chrome_missing(run: &CheckRun) -> bool {
    match &run.result {
        Err(CheckError::Driver(e)) => {
            let message = format!("{:#}", e);
            if message.contains("Could not auto detect") {
                eprintln!("Skipping: Chrome not installed ({})", message);
                return true;
            }
            false
        }
        _ => false,
    }
}
