//! In-memory chart page for driving the scenario without a browser

use anyhow::Result;
use std::sync::Mutex;
use std::time::Duration;
use touch_filter_check::config::{Config, Selectors};
use touch_filter_check::{
    BoundingBox, ChartPage, DimmedGating, HitTarget, Point, TouchOutcome, UngatedHitRegion,
};

/// How the fake chart behaves; defaults to a correctly gated chart
#[derive(Debug, Clone)]
pub struct Behavior {
    /// Number of data rows
    pub rows: usize,
    /// Brush geometry; `None` renders no brush
    pub brush: Option<BoundingBox>,
    /// Rows dimmed by a brush drag
    pub dimmed_after_drag: Vec<usize>,
    /// Dimmed hit regions get `pointer-events: none`
    pub gated: bool,
    /// Rows whose hit region stays interactive even when gated
    pub ungated_rows: Vec<usize>,
    /// Outcome reported for the dimmed touch instead of the computed one
    pub dimmed_touch_outcome: Option<TouchOutcome>,
    pub tooltip_initially_visible: bool,
    /// Touch handler on hit regions opens the tooltip
    pub touch_opens_tooltip: bool,
    /// Tooltip stops opening once a filter is applied
    pub broken_after_filter: bool,
    /// Removing the visible class has no effect
    pub dismiss_ignored: bool,
    /// Visibility queries that still report hidden after each touch
    pub tooltip_lag: usize,
    /// `open` fails as if navigation timed out
    pub unreachable: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            rows: 20,
            brush: Some(BoundingBox {
                x: 88.0,
                y: 60.0,
                width: 24.0,
                height: 400.0,
            }),
            dimmed_after_drag: (0..20).filter(|i| !(12..=16).contains(i)).collect(),
            gated: true,
            ungated_rows: Vec::new(),
            dimmed_touch_outcome: None,
            tooltip_initially_visible: false,
            touch_opens_tooltip: true,
            broken_after_filter: false,
            dismiss_ignored: false,
            tooltip_lag: 0,
            unreachable: false,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tooltip_visible: bool,
    pending_polls: usize,
    dimmed: Vec<bool>,
    filtered: bool,
    opened: Option<String>,
    drags: Vec<(Point, Point)>,
    touches: Vec<(HitTarget, TouchOutcome)>,
}

pub struct FakeChart {
    behavior: Behavior,
    selectors: Selectors,
    state: Mutex<State>,
}

impl FakeChart {
    pub fn new(behavior: Behavior) -> Self {
        let state = State {
            tooltip_visible: behavior.tooltip_initially_visible,
            dimmed: vec![false; behavior.rows],
            ..State::default()
        };
        Self {
            behavior,
            selectors: Selectors::default(),
            state: Mutex::new(state),
        }
    }

    pub fn opened(&self) -> Option<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn drags(&self) -> Vec<(Point, Point)> {
        self.state.lock().unwrap().drags.clone()
    }

    pub fn touches(&self) -> Vec<(HitTarget, TouchOutcome)> {
        self.state.lock().unwrap().touches.clone()
    }

    fn row_gated(&self, row: usize) -> bool {
        self.behavior.gated && !self.behavior.ungated_rows.contains(&row)
    }

    fn dispatch(&self, state: &mut State) -> TouchOutcome {
        let opens = self.behavior.touch_opens_tooltip
            && !(self.behavior.broken_after_filter && state.filtered);
        if opens {
            state.tooltip_visible = true;
            state.pending_polls = self.behavior.tooltip_lag;
        }
        TouchOutcome::Dispatched
    }
}

impl ChartPage for FakeChart {
    async fn open(&self, url: &str) -> Result<()> {
        if self.behavior.unreachable {
            anyhow::bail!("Failed to navigate to {}: net::ERR_CONNECTION_REFUSED", url);
        }
        self.state.lock().unwrap().opened = Some(url.to_string());
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let dimmed = state.dimmed.iter().filter(|d| **d).count();
        let count = if selector == self.selectors.visible_tooltip() {
            if state.pending_polls > 0 {
                state.pending_polls -= 1;
                0
            } else {
                usize::from(state.tooltip_visible)
            }
        } else if selector == self.selectors.dimmed_foreground() {
            dimmed
        } else if selector == self.selectors.active_foreground() {
            state.dimmed.len() - dimmed
        } else {
            anyhow::bail!("unexpected selector {}", selector)
        };
        Ok(count)
    }

    async fn bounding_box(&self, selector: &str) -> Result<Option<BoundingBox>> {
        assert_eq!(selector, self.selectors.brush);
        Ok(self.behavior.brush)
    }

    async fn drag(&self, from: Point, to: Point) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.drags.push((from, to));
        for &row in &self.behavior.dimmed_after_drag {
            if let Some(d) = state.dimmed.get_mut(row) {
                *d = true;
            }
        }
        state.filtered = true;
        Ok(())
    }

    async fn touch(&self, target: HitTarget) -> Result<TouchOutcome> {
        let mut state = self.state.lock().unwrap();
        let outcome = match target {
            HitTarget::First if state.dimmed.is_empty() => TouchOutcome::NoHitRegion,
            HitTarget::First => self.dispatch(&mut state),
            HitTarget::FirstDimmed => match self.behavior.dimmed_touch_outcome {
                Some(TouchOutcome::Dispatched) => self.dispatch(&mut state),
                Some(outcome) => outcome,
                None => match state.dimmed.iter().position(|d| *d) {
                    None => TouchOutcome::NoDimmedPaths,
                    Some(row) if self.row_gated(row) => TouchOutcome::Blocked,
                    Some(_) => self.dispatch(&mut state),
                },
            },
            HitTarget::FirstActive => match state.dimmed.iter().position(|d| !*d) {
                None => TouchOutcome::NoActivePaths,
                Some(_) => self.dispatch(&mut state),
            },
        };
        state.touches.push((target, outcome));
        Ok(outcome)
    }

    async fn dimmed_hit_region_gating(&self) -> Result<DimmedGating> {
        let state = self.state.lock().unwrap();
        let dimmed_rows: Vec<usize> = (0..state.dimmed.len())
            .filter(|&i| state.dimmed[i])
            .collect();
        Ok(DimmedGating {
            dimmed: dimmed_rows.len(),
            ungated: dimmed_rows
                .into_iter()
                .filter(|&row| !self.row_gated(row))
                .map(|index| UngatedHitRegion {
                    index,
                    pointer_events: "stroke".to_string(),
                })
                .collect(),
        })
    }

    async fn dismiss_tooltip(&self) -> Result<()> {
        if !self.behavior.dismiss_ignored {
            self.state.lock().unwrap().tooltip_visible = false;
        }
        Ok(())
    }
}

/// Default configuration with millisecond settle delays
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.timing.initial_settle = Duration::from_millis(1);
    config.timing.touch_settle = Duration::from_millis(1);
    config.timing.brush_settle = Duration::from_millis(1);
    config.timing.dismiss_settle = Duration::from_millis(1);
    config.settle.poll_interval = Duration::from_millis(1);
    config.settle.poll_timeout = Duration::from_millis(500);
    config
}
