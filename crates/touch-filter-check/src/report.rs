//! Scenario report with console and JSON renderings

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;
use std::time::Instant;

use crate::error::{CheckResult, Invariant};

/// The scenario steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Launch,
    Navigate,
    InitialState,
    TouchFirst,
    BrushFilter,
    PointerEventsGating,
    DismissTooltip,
    TouchDimmed,
    TouchActive,
    Close,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Launch => "launch browser",
            Step::Navigate => "navigate",
            Step::InitialState => "initial state",
            Step::TouchFirst => "touch first path",
            Step::BrushFilter => "brush filter",
            Step::PointerEventsGating => "pointer-events gating",
            Step::DismissTooltip => "dismiss tooltip",
            Step::TouchDimmed => "touch dimmed path",
            Step::TouchActive => "touch non-dimmed path",
            Step::Close => "close browser",
        }
    }
}

/// One completed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub duration_ms: u64,
    pub detail: String,
}

/// Foreground path counts observed after the brush gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCounts {
    pub dimmed: usize,
    pub active: usize,
}

/// Everything observed during one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Page that was checked
    pub target_url: String,
    /// RFC 3339 timestamp of the start of the run
    pub started_at: String,
    /// Completed steps
    pub steps: Vec<StepRecord>,
    /// Dimmed/non-dimmed counts, once the brush step ran
    pub path_counts: Option<PathCounts>,
    /// Whether the brush gesture found a brush to drag
    pub brush_applied: bool,
    pub total_duration_ms: u64,
    pub passed: bool,
    /// Invariant that broke, for assertion failures
    pub violated: Option<Invariant>,
    /// Failure message, for any failure
    pub failure: Option<String>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl ScenarioReport {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            started_at: chrono::Utc::now().to_rfc3339(),
            steps: Vec::new(),
            path_counts: None,
            brush_applied: false,
            total_duration_ms: 0,
            passed: false,
            violated: None,
            failure: None,
            started: Some(Instant::now()),
        }
    }

    /// Record a completed step that began at `started`
    pub fn record(&mut self, step: Step, started: Instant, detail: impl Into<String>) {
        self.steps.push(StepRecord {
            step,
            duration_ms: started.elapsed().as_millis() as u64,
            detail: detail.into(),
        });
    }

    /// Seal the report with the run's result
    pub fn finish(&mut self, result: &CheckResult<()>) {
        if let Some(started) = self.started {
            self.total_duration_ms = started.elapsed().as_millis() as u64;
        }
        match result {
            Ok(()) => {
                self.passed = true;
                self.violated = None;
                self.failure = None;
            }
            Err(e) => {
                self.passed = false;
                self.violated = e.violated();
                self.failure = Some(e.to_string());
            }
        }
    }

    /// Human-readable report
    pub fn to_console(&self) -> Result<String> {
        let mut output = String::new();

        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                  TOUCH FILTER CHECK                          ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "Target:    {}", self.target_url)?;
        writeln!(output, "Started:   {}", self.started_at)?;
        writeln!(output, "Duration:  {}ms", self.total_duration_ms)?;
        writeln!(output)?;

        writeln!(output, "  ┌─────────────────────────┬──────────┬──────────────────────────────")?;
        writeln!(output, "  │ Step                    │ Time     │ Detail")?;
        writeln!(output, "  ├─────────────────────────┼──────────┼──────────────────────────────")?;
        for record in &self.steps {
            writeln!(
                output,
                "  │ {:<23} │ {:>6}ms │ {}",
                record.step.label(),
                record.duration_ms,
                record.detail
            )?;
        }
        writeln!(output, "  └─────────────────────────┴──────────┴──────────────────────────────")?;

        if let Some(counts) = self.path_counts {
            writeln!(output)?;
            writeln!(
                output,
                "Paths after brush: {} dimmed, {} non-dimmed{}",
                counts.dimmed,
                counts.active,
                if self.brush_applied { "" } else { " (no brush found)" }
            )?;
        }

        writeln!(output)?;
        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        let status = if self.passed { "PASSED" } else { "FAILED" };
        let status_symbol = if self.passed { "✓" } else { "✗" };
        writeln!(output, "Overall Status: {} {}", status_symbol, status)?;

        if let Some(ref failure) = self.failure {
            writeln!(output)?;
            match self.violated {
                Some(invariant) => writeln!(output, "Violated:  {}", invariant)?,
                None => writeln!(output, "Aborted:   driver error")?,
            }
            writeln!(output, "  • {}", failure)?;
        }

        writeln!(output)?;
        Ok(output)
    }

    /// JSON report, optionally pretty-printed
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(output)
    }

    /// Write the pretty JSON report to `path`
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json(true)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckError;

    fn create_test_report() -> ScenarioReport {
        let mut report = ScenarioReport::new("http://localhost:8000");
        let now = Instant::now();
        report.record(Step::Navigate, now, "loaded");
        report.record(Step::BrushFilter, now, "dragged (100, 110) -> (100, 210)");
        report.path_counts = Some(PathCounts {
            dimmed: 18,
            active: 2,
        });
        report.brush_applied = true;
        report
    }

    #[test]
    fn test_finish_success() {
        let mut report = create_test_report();
        report.finish(&Ok(()));
        assert!(report.passed);
        assert_eq!(report.failure, None);

        let output = report.to_console().unwrap();
        assert!(output.contains("PASSED"));
        assert!(output.contains("✓"));
        assert!(output.contains("18 dimmed, 2 non-dimmed"));
        assert!(output.contains("brush filter"));
    }

    #[test]
    fn test_finish_invariant_failure() {
        let mut report = create_test_report();
        report.finish(&Err(CheckError::invariant(
            Invariant::BlockedTouch,
            "Dimmed path touch should be blocked, got dispatched",
        )));
        assert!(!report.passed);
        assert_eq!(report.violated, Some(Invariant::BlockedTouch));

        let output = report.to_console().unwrap();
        assert!(output.contains("FAILED"));
        assert!(output.contains("Violated:  blocked-touch behavior"));
        assert!(output.contains("got dispatched"));
    }

    #[test]
    fn test_finish_driver_failure() {
        let mut report = ScenarioReport::new("http://localhost:8000");
        report.finish(&Err(anyhow::anyhow!("Failed to launch browser").into()));
        assert_eq!(report.violated, None);
        let output = report.to_console().unwrap();
        assert!(output.contains("driver error"));
        assert!(output.contains("Failed to launch browser"));
    }

    #[test]
    fn test_missing_brush_is_called_out() {
        let mut report = create_test_report();
        report.brush_applied = false;
        let output = report.to_console().unwrap();
        assert!(output.contains("(no brush found)"));
    }

    #[test]
    fn test_json_format() {
        let mut report = create_test_report();
        report.finish(&Ok(()));

        let compact = report.to_json(false).unwrap();
        assert!(!compact.contains('\n'));
        assert!(compact.contains("\"step\":\"brush_filter\""));
        assert!(compact.contains("\"dimmed\":18"));

        let pretty = report.to_json(true).unwrap();
        assert!(pretty.contains('\n'));

        let parsed: ScenarioReport = serde_json::from_str(&compact).unwrap();
        assert_eq!(parsed.target_url, report.target_url);
        assert!(parsed.passed);
        assert_eq!(parsed.steps.len(), 2);
    }
}
