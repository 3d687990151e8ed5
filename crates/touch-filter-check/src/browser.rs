//! Headless browser session and the CDP-backed [`ChartPage`]

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

use crate::config::{BrowserOptions, Config, Selectors, ViewportConfig};
use crate::emulation::Emulation;
use crate::page::{BoundingBox, ChartPage, DimmedGating, HitTarget, Point, TouchOutcome};
use crate::scripts;

/// Chrome for Testing binaries inside a Puppeteer cache version directory
const CHROME_FOR_TESTING_BINARIES: &[&str] = &[
    "chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
    "chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing",
    "chrome-linux64/chrome",
];

/// Find Chrome for Testing installed by Puppeteer, newest version first
pub fn find_chrome_for_testing() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let cache = Path::new(&home).join(".cache/puppeteer/chrome");

    let mut versions: Vec<PathBuf> = std::fs::read_dir(&cache)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    versions.sort_by(|a, b| b.cmp(a));

    versions.iter().find_map(|version| {
        CHROME_FOR_TESTING_BINARIES
            .iter()
            .map(|binary| version.join(binary))
            .find(|candidate| candidate.exists())
    })
}

/// A fresh user data directory per launch so concurrent runs never share a profile
fn unique_user_data_dir() -> PathBuf {
    static LAUNCH_ID: AtomicU64 = AtomicU64::new(0);

    let launch_id = LAUNCH_ID.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "touch-filter-check-{}-{}-{}",
        std::process::id(),
        launch_id,
        timestamp
    ))
}

fn remove_profile_dir(user_data_dir: &Path) {
    if !user_data_dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(user_data_dir) {
        debug!("Could not remove {}: {}", user_data_dir.display(), e);
    }
}

/// A launched headless browser plus the task draining its CDP event stream
pub struct BrowserSession {
    browser: Browser,
    handle: tokio::task::JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    /// Launch a headless browser sized for `viewport`
    #[instrument(skip_all)]
    pub async fn launch(options: &BrowserOptions, viewport: &ViewportConfig) -> Result<Self> {
        Self::launch_with_profile(options, viewport, unique_user_data_dir()).await
    }

    /// Launch with `user_data_dir` as the profile, removing it again if the launch fails
    async fn launch_with_profile(
        options: &BrowserOptions,
        viewport: &ViewportConfig,
        user_data_dir: PathBuf,
    ) -> Result<Self> {
        match Self::start(options, viewport, &user_data_dir).await {
            Ok((browser, handle)) => Ok(Self {
                browser,
                handle,
                user_data_dir,
            }),
            Err(e) => {
                remove_profile_dir(&user_data_dir);
                Err(e)
            }
        }
    }

    async fn start(
        options: &BrowserOptions,
        viewport: &ViewportConfig,
        user_data_dir: &Path,
    ) -> Result<(Browser, tokio::task::JoinHandle<()>)> {
        let mut builder = BrowserConfig::builder().window_size(viewport.width, viewport.height);

        match options
            .chrome_executable
            .clone()
            .or_else(find_chrome_for_testing)
        {
            Some(chrome_path) => {
                info!("Using Chrome at {}", chrome_path.display());
                builder = builder.chrome_executable(chrome_path);
            }
            None => debug!("No explicit Chrome binary, relying on auto-detection"),
        }

        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        builder = builder.user_data_dir(user_data_dir);

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok((browser, handle))
    }

    /// Open a blank page with the configured emulation applied
    #[instrument(skip_all)]
    pub async fn open_page(&self, config: &Config) -> Result<CdpChartPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")?;

        Emulation::apply_viewport(&page, &config.viewport).await?;
        if config.browser.cpu_slowdown > 1.0 {
            Emulation::throttle_cpu(&page, config.browser.cpu_slowdown).await?;
        }

        Ok(CdpChartPage {
            page,
            selectors: config.selectors.clone(),
            touch_point: Point::new(config.gesture.touch_x, config.gesture.touch_y),
        })
    }

    /// Close the browser, stop the handler task and remove the profile directory
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser");
        let closed = self.browser.close().await.context("Failed to close browser");
        if closed.is_ok() {
            if let Err(e) = self.browser.wait().await {
                debug!("Browser process did not exit cleanly: {}", e);
            }
        }
        self.handle.abort();
        let _ = self.handle.await;

        remove_profile_dir(&self.user_data_dir);
        closed.map(|_| ())
    }
}

/// [`ChartPage`] over a chromiumoxide page
pub struct CdpChartPage {
    page: Page,
    selectors: Selectors,
    touch_point: Point,
}

#[derive(Debug, Deserialize)]
struct RectProbe {
    found: bool,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
}

impl CdpChartPage {
    async fn mouse(&self, kind: DispatchMouseEventType, at: Point, pressed: bool) -> Result<()> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind.clone())
            .x(at.x)
            .y(at.y);
        if pressed {
            builder = builder.button(MouseButton::Left).buttons(1);
        }
        if matches!(
            kind,
            DispatchMouseEventType::MousePressed | DispatchMouseEventType::MouseReleased
        ) {
            builder = builder.click_count(1);
        }
        let params = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build mouse event: {}", e))?;
        self.page
            .execute(params)
            .await
            .with_context(|| format!("Mouse {:?} at ({}, {}) failed", kind, at.x, at.y))?;
        Ok(())
    }
}

impl ChartPage for CdpChartPage {
    #[instrument(skip(self))]
    async fn open(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.page
            .wait_for_navigation()
            .await
            .context("Waiting for page load failed")?;
        debug!("Page loaded: {}", url);
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let count = self
            .page
            .evaluate(scripts::count(selector))
            .await
            .with_context(|| format!("Failed to count {}", selector))?
            .into_value::<usize>()?;
        Ok(count)
    }

    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>> {
        let elements = match self.page.find_elements(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("No elements for {}: {}", selector, e);
                return Ok(None);
            }
        };
        let Some(element) = elements.first() else {
            return Ok(None);
        };

        let rect = match element.bounding_box().await {
            Ok(b) => BoundingBox {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
            },
            Err(e) => {
                // SVG containers can lack a CDP box model; fall back to the client rect
                debug!("No box model for {} ({}), using client rect", selector, e);
                let probe = self
                    .page
                    .evaluate(scripts::bounding_rect(selector))
                    .await
                    .with_context(|| format!("Failed to measure {}", selector))?
                    .into_value::<RectProbe>()?;
                if !probe.found {
                    return Ok(None);
                }
                BoundingBox {
                    x: probe.x,
                    y: probe.y,
                    width: probe.width,
                    height: probe.height,
                }
            }
        };

        if rect.width <= 0.0 && rect.height <= 0.0 {
            warn!("{} has an empty layout box", selector);
            return Ok(None);
        }
        Ok(Some(rect))
    }

    #[instrument(skip(self))]
    async fn drag(&self, from: Point, to: Point) -> Result<()> {
        self.mouse(DispatchMouseEventType::MouseMoved, from, false).await?;
        self.mouse(DispatchMouseEventType::MousePressed, from, true).await?;
        self.mouse(DispatchMouseEventType::MouseMoved, to, true).await?;
        self.mouse(DispatchMouseEventType::MouseReleased, to, true).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn touch(&self, target: HitTarget) -> Result<TouchOutcome> {
        let script = scripts::touch(&self.selectors, target, self.touch_point);
        let outcome = self
            .page
            .evaluate(script)
            .await
            .with_context(|| format!("Touch on {:?} hit region failed", target))?
            .into_value::<TouchOutcome>()?;
        debug!("Touch outcome: {}", outcome);
        Ok(outcome)
    }

    async fn dimmed_hit_region_gating(&self) -> Result<DimmedGating> {
        let gating = self
            .page
            .evaluate(scripts::dimmed_gating(&self.selectors))
            .await
            .context("Failed to read pointer-events of dimmed hit regions")?
            .into_value::<DimmedGating>()?;
        debug!(
            "{} dimmed hit regions, {} ungated",
            gating.dimmed,
            gating.ungated.len()
        );
        Ok(gating)
    }

    async fn dismiss_tooltip(&self) -> Result<()> {
        let found = self
            .page
            .evaluate(scripts::dismiss_tooltip(&self.selectors))
            .await
            .context("Failed to dismiss tooltip")?
            .into_value::<bool>()?;
        if !found {
            warn!("No {} element to dismiss", self.selectors.tooltip);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_user_data_dirs_differ() {
        let a = unique_user_data_dir();
        let b = unique_user_data_dir();
        assert_ne!(a, b);
        assert!(a.starts_with(std::env::temp_dir()));
    }

    #[tokio::test]
    async fn test_failed_launch_removes_profile_dir() {
        let user_data_dir = unique_user_data_dir();
        std::fs::create_dir_all(&user_data_dir).unwrap();
        let options = BrowserOptions {
            chrome_executable: Some(std::env::temp_dir().join("touch-filter-check-no-such-chrome")),
            ..BrowserOptions::default()
        };

        let result =
            BrowserSession::launch_with_profile(&options, &ViewportConfig::default(), user_data_dir.clone())
                .await;

        assert!(result.is_err());
        assert!(!user_data_dir.exists());
    }

    #[test]
    fn test_rect_probe_parses_page_results() {
        let probe: RectProbe =
            serde_json::from_str(r#"{"found":true,"x":88,"y":60,"width":24,"height":400}"#)
                .unwrap();
        assert!(probe.found);
        assert_eq!((probe.x, probe.y, probe.width, probe.height), (88.0, 60.0, 24.0, 400.0));

        let probe: RectProbe = serde_json::from_str(r#"{"found":false}"#).unwrap();
        assert!(!probe.found);
    }
}
