//! Headless touch check for parallel-coordinates charts
//!
//! Verifies, against a running page, that data paths dimmed by a brush
//! filter cannot be selected by touch: their hit regions must carry
//! `pointer-events: none`, a touch aimed at them must not open the tooltip,
//! and touches on the paths that survived the filter must still work.
//!
//! # Features
//!
//! - **Real browser**: headless Chromium over the DevTools Protocol with
//!   touch emulation and a fixed 1024x768 viewport
//! - **Synthetic input**: in-page `touchstart` dispatch and a mouse brush drag
//! - **Named invariants**: every failure says which UI guarantee broke
//! - **Reports**: console and JSON output of each step
//!
//! # Example
//!
//! ```no_run
//! use touch_filter_check::{Config, run_check};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_str(r#"
//!     [target]
//!     url = "http://localhost:8000"
//! "#)?;
//!
//! let run = run_check(&config).await;
//! print!("{}", run.report.to_console()?);
//! assert!(run.passed());
//! # Ok(())
//! # }
//! ```
//!
//! The scenario itself is generic over [`page::ChartPage`], so it can be
//! driven by anything that implements the trait.

pub mod browser;
pub mod config;
pub mod emulation;
pub mod error;
pub mod page;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod scripts;

// Re-export main types for convenience
pub use config::Config;
pub use error::{CheckError, CheckResult, Invariant};
pub use page::{
    BoundingBox, ChartPage, DimmedGating, HitTarget, Point, TouchOutcome, UngatedHitRegion,
};
pub use report::{ScenarioReport, Step};
pub use runner::{run_check, CheckRun, TouchFilterRunner};
pub use scenario::TouchFilterScenario;
