//! Device emulation via the Chrome DevTools Protocol Emulation domain
//!
//! Gives a page the touch-capable fixed viewport the check runs in, and
//! optionally slows the CPU down to reproduce sluggish rendering.

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetCpuThrottlingRateParams, SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::Page;
use tracing::{debug, instrument};

use crate::config::ViewportConfig;

/// Touch points reported to the page while touch emulation is on
pub const MAX_TOUCH_POINTS: i64 = 5;

/// Emulation controller
pub struct Emulation;

impl Emulation {
    /// Apply the viewport size and, when requested, touch support
    ///
    /// Must run before navigation so the page sees touch capability at load.
    #[instrument(skip(page), fields(width = viewport.width, height = viewport.height))]
    pub async fn apply_viewport(page: &Page, viewport: &ViewportConfig) -> Result<()> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build device metrics params: {}", e))?;
        page.execute(metrics).await?;

        let touch = SetTouchEmulationEnabledParams::builder()
            .enabled(viewport.has_touch)
            .max_touch_points(MAX_TOUCH_POINTS)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build touch emulation params: {}", e))?;
        page.execute(touch).await?;

        debug!("Viewport applied (touch: {})", viewport.has_touch);
        Ok(())
    }

    /// Slow the CPU down by `rate` (1.0 = full speed)
    #[instrument(skip(page), fields(rate = %rate))]
    pub async fn throttle_cpu(page: &Page, rate: f64) -> Result<()> {
        if rate < 1.0 {
            anyhow::bail!("CPU throttling rate must be >= 1.0 (got {})", rate);
        }

        let params = SetCpuThrottlingRateParams::builder()
            .rate(rate)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build CPU params: {}", e))?;
        page.execute(params).await?;

        debug!("CPU throttled to {}x slowdown", rate);
        Ok(())
    }
}
