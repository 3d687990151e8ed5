//! The touch-filter scenario
//!
//! Drives a [`ChartPage`] through one deterministic sequence and asserts
//! that brushed-out ("dimmed") paths cannot open the tooltip on touch:
//!
//! ```text
//! open ─► no tooltip ─► touch first path ─► tooltip shown
//!   ─► brush first axis ─► some dimmed, some not
//!   ─► every dimmed hit region has pointer-events: none
//!   ─► dismiss, touch dimmed path ─► blocked, tooltip hidden
//!   ─► touch non-dimmed path ─► tooltip shown
//! ```
//!
//! The first broken invariant aborts the run; there are no retries.

use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, SettleMode};
use crate::error::{CheckError, CheckResult, Invariant};
use crate::page::{ChartPage, HitTarget, TouchOutcome};
use crate::report::{PathCounts, ScenarioReport, Step};

/// Runs the touch-filter protocol against a page
pub struct TouchFilterScenario {
    config: Config,
}

impl TouchFilterScenario {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute every step in order, recording completed steps into `report`
    ///
    /// # Errors
    ///
    /// [`CheckError::Invariant`] for the first failed assertion,
    /// [`CheckError::Driver`] when the page cannot be driven.
    #[instrument(skip_all, fields(url = %self.config.target.url))]
    pub async fn run<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        self.navigate(page, report).await?;
        self.check_initial_state(page, report).await?;
        self.touch_first(page, report).await?;
        self.apply_brush(page, report).await?;
        self.check_pointer_events(page, report).await?;
        self.dismiss(page, report).await?;
        self.touch_dimmed(page, report).await?;
        self.touch_active(page, report).await?;
        info!("Touch filter scenario passed");
        Ok(())
    }

    async fn navigate<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        let started = Instant::now();
        let url = &self.config.target.url;
        info!("Opening {}", url);
        page.open(url).await?;
        tokio::time::sleep(self.config.timing.initial_settle).await;
        report.record(Step::Navigate, started, format!("loaded {}", url));
        Ok(())
    }

    async fn check_initial_state<P: ChartPage>(
        &self,
        page: &P,
        report: &mut ScenarioReport,
    ) -> CheckResult<()> {
        let started = Instant::now();
        if self.tooltip_visible(page).await? {
            return Err(CheckError::invariant(
                Invariant::InitialState,
                "Tooltip should not be visible initially",
            ));
        }
        report.record(Step::InitialState, started, "tooltip hidden");
        Ok(())
    }

    async fn touch_first<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        let started = Instant::now();
        let outcome = page.touch(HitTarget::First).await?;
        debug!("First touch: {}", outcome);
        if !self
            .settle_for_tooltip(page, self.config.timing.touch_settle)
            .await?
        {
            return Err(CheckError::invariant(
                Invariant::PostTouch,
                format!("Tooltip should show after touching a path (touch {})", outcome),
            ));
        }
        report.record(Step::TouchFirst, started, "tooltip shown");
        Ok(())
    }

    async fn apply_brush<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        let started = Instant::now();
        let selectors = &self.config.selectors;
        let gesture = &self.config.gesture;

        let detail = match page.bounding_box(&selectors.brush).await? {
            Some(brush) => {
                let (from, to) =
                    brush.vertical_drag(gesture.brush_start_offset, gesture.brush_end_offset);
                page.drag(from, to).await?;
                tokio::time::sleep(self.config.timing.brush_settle).await;
                report.brush_applied = true;
                format!(
                    "dragged ({:.0}, {:.0}) -> ({:.0}, {:.0})",
                    from.x, from.y, to.x, to.y
                )
            }
            None => {
                warn!("No bounding box for {}, skipping brush gesture", selectors.brush);
                "no brush found, gesture skipped".to_string()
            }
        };

        let counts = PathCounts {
            dimmed: page.count(&selectors.dimmed_foreground()).await?,
            active: page.count(&selectors.active_foreground()).await?,
        };
        report.path_counts = Some(counts);
        info!("Dimmed: {}, Non-dimmed: {}", counts.dimmed, counts.active);

        if counts.dimmed == 0 {
            return Err(CheckError::invariant(
                Invariant::FilterEffect,
                "Brush should filter some paths",
            ));
        }
        if counts.active == 0 {
            return Err(CheckError::invariant(
                Invariant::FilterEffect,
                "Brush should leave some paths visible",
            ));
        }

        report.record(
            Step::BrushFilter,
            started,
            format!("{}; {} dimmed, {} non-dimmed", detail, counts.dimmed, counts.active),
        );
        Ok(())
    }

    async fn check_pointer_events<P: ChartPage>(
        &self,
        page: &P,
        report: &mut ScenarioReport,
    ) -> CheckResult<()> {
        let started = Instant::now();
        let gating = page.dimmed_hit_region_gating().await?;
        if gating.dimmed == 0 {
            return Err(CheckError::invariant(
                Invariant::PointerEventsGating,
                "Dimmed hitarea should have pointer-events:none, got unknown (no dimmed paths)",
            ));
        }
        if let Some(first) = gating.first_ungated() {
            return Err(CheckError::invariant(
                Invariant::PointerEventsGating,
                format!(
                    "Dimmed hitarea should have pointer-events:none, got {} (path {}; {} of {} dimmed paths ungated)",
                    first.pointer_events,
                    first.index,
                    gating.ungated.len(),
                    gating.dimmed
                ),
            ));
        }
        report.record(
            Step::PointerEventsGating,
            started,
            format!("pointer-events: none on all {} dimmed paths", gating.dimmed),
        );
        Ok(())
    }

    async fn dismiss<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        let started = Instant::now();
        page.dismiss_tooltip().await?;
        tokio::time::sleep(self.config.timing.dismiss_settle).await;
        report.record(Step::DismissTooltip, started, "visible class removed");
        Ok(())
    }

    async fn touch_dimmed<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        let started = Instant::now();
        let outcome = page.touch(HitTarget::FirstDimmed).await?;
        // Absence cannot be polled for, so this wait stays fixed in every settle mode
        tokio::time::sleep(self.config.timing.touch_settle).await;

        if outcome != TouchOutcome::Blocked {
            return Err(CheckError::invariant(
                Invariant::BlockedTouch,
                format!("Dimmed path touch should be blocked, got {}", outcome),
            ));
        }
        if self.tooltip_visible(page).await? {
            return Err(CheckError::invariant(
                Invariant::BlockedTouch,
                "Tooltip should NOT show for dimmed path",
            ));
        }
        report.record(Step::TouchDimmed, started, format!("{}, tooltip hidden", outcome));
        Ok(())
    }

    async fn touch_active<P: ChartPage>(&self, page: &P, report: &mut ScenarioReport) -> CheckResult<()> {
        let started = Instant::now();
        let outcome = page.touch(HitTarget::FirstActive).await?;
        if !self
            .settle_for_tooltip(page, self.config.timing.touch_settle)
            .await?
        {
            return Err(CheckError::invariant(
                Invariant::ActiveTouch,
                format!("Tooltip should show for non-dimmed path (touch {})", outcome),
            ));
        }
        report.record(Step::TouchActive, started, format!("{}, tooltip shown", outcome));
        Ok(())
    }

    async fn tooltip_visible<P: ChartPage>(&self, page: &P) -> CheckResult<bool> {
        let visible = page
            .count(&self.config.selectors.visible_tooltip())
            .await?;
        Ok(visible > 0)
    }

    /// Wait for the tooltip to appear, then report whether it is visible
    async fn settle_for_tooltip<P: ChartPage>(&self, page: &P, delay: Duration) -> CheckResult<bool> {
        match self.config.settle.mode {
            SettleMode::Fixed => {
                tokio::time::sleep(delay).await;
                self.tooltip_visible(page).await
            }
            SettleMode::Poll => {
                let deadline = Instant::now() + self.config.settle.poll_timeout;
                loop {
                    if self.tooltip_visible(page).await? {
                        return Ok(true);
                    }
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    tokio::time::sleep(self.config.settle.poll_interval).await;
                }
            }
        }
    }
}
