//! The browser-automation surface the scenario drives
//!
//! [`ChartPage`] is the seam between the touch-filter protocol and the
//! browser. [`crate::browser::CdpChartPage`] implements it over the Chrome
//! DevTools Protocol; tests implement it in memory.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A viewport point in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Element geometry in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Horizontal centre of the box
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical drag along the centre line, `start` and `end` measured from the top edge
    pub fn vertical_drag(&self, start: f64, end: f64) -> (Point, Point) {
        let x = self.center_x();
        (Point::new(x, self.y + start), Point::new(x, self.y + end))
    }
}

/// Which hit region a synthetic touch is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The first hit region in document order, dimmed or not
    First,
    /// The hit region paired with the first dimmed foreground path
    FirstDimmed,
    /// The hit region paired with the first non-dimmed foreground path
    FirstActive,
}

/// What happened to a synthetic touch, as reported by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchOutcome {
    /// The target has `pointer-events: none`; nothing was dispatched
    #[serde(rename = "blocked")]
    Blocked,
    /// A `touchstart` was dispatched on the target
    #[serde(rename = "dispatched")]
    Dispatched,
    #[serde(rename = "no hit region")]
    NoHitRegion,
    #[serde(rename = "no dimmed paths")]
    NoDimmedPaths,
    #[serde(rename = "no active paths")]
    NoActivePaths,
}

impl TouchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TouchOutcome::Blocked => "blocked",
            TouchOutcome::Dispatched => "dispatched",
            TouchOutcome::NoHitRegion => "no hit region",
            TouchOutcome::NoDimmedPaths => "no dimmed paths",
            TouchOutcome::NoActivePaths => "no active paths",
        }
    }
}

impl fmt::Display for TouchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dimmed path whose hit region still accepts pointer input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngatedHitRegion {
    /// Position of the path among the foreground paths
    pub index: usize,
    /// Computed `pointer-events`, or `no hit region` when the pair is missing
    pub pointer_events: String,
}

/// Pointer-events gating across every dimmed path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimmedGating {
    /// Number of dimmed foreground paths
    pub dimmed: usize,
    /// Dimmed paths whose hit region is not `pointer-events: none`, in document order
    pub ungated: Vec<UngatedHitRegion>,
}

impl DimmedGating {
    /// First dimmed path that is not gated
    pub fn first_ungated(&self) -> Option<&UngatedHitRegion> {
        self.ungated.first()
    }
}

/// Operations the touch-filter scenario needs from a loaded page
///
/// Selectors and class names come from [`crate::config::Selectors`]; the
/// implementation is configured with them up front, so the methods here
/// speak in terms of the chart rather than raw CSS.
#[allow(async_fn_in_trait)]
pub trait ChartPage {
    /// Navigate to `url` and wait for the page load to finish
    async fn open(&self, url: &str) -> Result<()>;

    /// Number of elements matching a CSS selector
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Bounding box of the first element matching `selector`
    ///
    /// `None` when nothing matches or the element has no layout box.
    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>>;

    /// Mouse drag with the primary button: move, press, move, release
    async fn drag(&self, from: Point, to: Point) -> Result<()>;

    /// Dispatch a synthetic `touchstart` on a hit region
    ///
    /// For [`HitTarget::FirstDimmed`] the computed `pointer-events` of the
    /// target is checked first and [`TouchOutcome::Blocked`] is returned
    /// without dispatching when it is `none`.
    async fn touch(&self, target: HitTarget) -> Result<TouchOutcome>;

    /// Computed `pointer-events` of the hit region paired with each dimmed path
    async fn dimmed_hit_region_gating(&self) -> Result<DimmedGating>;

    /// Hide the tooltip by removing its visible class
    async fn dismiss_tooltip(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_drag_uses_center_line() {
        let brush = BoundingBox {
            x: 88.0,
            y: 60.0,
            width: 24.0,
            height: 400.0,
        };
        let (from, to) = brush.vertical_drag(50.0, 150.0);
        assert_eq!(from, Point::new(100.0, 110.0));
        assert_eq!(to, Point::new(100.0, 210.0));
    }

    #[test]
    fn test_touch_outcome_codes_match_page_strings() {
        for (code, outcome) in [
            ("\"blocked\"", TouchOutcome::Blocked),
            ("\"dispatched\"", TouchOutcome::Dispatched),
            ("\"no dimmed paths\"", TouchOutcome::NoDimmedPaths),
            ("\"no active paths\"", TouchOutcome::NoActivePaths),
            ("\"no hit region\"", TouchOutcome::NoHitRegion),
        ] {
            let parsed: TouchOutcome = serde_json::from_str(code).unwrap();
            assert_eq!(parsed, outcome);
            assert_eq!(format!("\"{}\"", outcome), code);
        }
    }

    #[test]
    fn test_dimmed_gating_parses_page_results() {
        let gating: DimmedGating = serde_json::from_str(
            r#"{"dimmed":3,"ungated":[{"index":7,"pointerEvents":"stroke"},{"index":9,"pointerEvents":"no hit region"}]}"#,
        )
        .unwrap();
        assert_eq!(gating.dimmed, 3);
        assert_eq!(gating.ungated.len(), 2);
        assert_eq!(
            gating.first_ungated(),
            Some(&UngatedHitRegion {
                index: 7,
                pointer_events: "stroke".to_string()
            })
        );

        let gating: DimmedGating = serde_json::from_str(r#"{"dimmed":0,"ungated":[]}"#).unwrap();
        assert_eq!(gating, DimmedGating::default());
        assert_eq!(gating.first_ungated(), None);
    }

    #[test]
    fn test_unknown_outcome_code_is_rejected() {
        assert!(serde_json::from_str::<TouchOutcome>("\"maybe\"").is_err());
    }
}
