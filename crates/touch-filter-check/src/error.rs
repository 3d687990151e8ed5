//! Error types for the touch-filter check

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The UI invariants the scenario asserts, in the order they are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    /// No tooltip before any interaction
    InitialState,
    /// Touching a hit region opens the tooltip
    PostTouch,
    /// The brush dims some, but not all, paths
    FilterEffect,
    /// Dimmed hit regions have `pointer-events: none`
    PointerEventsGating,
    /// A touch on a dimmed hit region is blocked and leaves the tooltip hidden
    BlockedTouch,
    /// A touch on a surviving hit region still opens the tooltip
    ActiveTouch,
}

impl Invariant {
    pub fn label(&self) -> &'static str {
        match self {
            Invariant::InitialState => "initial state",
            Invariant::PostTouch => "post-touch state",
            Invariant::FilterEffect => "filter effect",
            Invariant::PointerEventsGating => "pointer-events gating",
            Invariant::BlockedTouch => "blocked-touch behavior",
            Invariant::ActiveTouch => "non-dimmed-touch behavior",
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("{invariant} violated: {message}")]
    Invariant {
        invariant: Invariant,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Browser error: {0:#}")]
    Driver(#[from] anyhow::Error),
}

impl CheckError {
    pub fn invariant(invariant: Invariant, message: impl Into<String>) -> Self {
        CheckError::Invariant {
            invariant,
            message: message.into(),
        }
    }

    /// The violated invariant, if this is an assertion failure
    pub fn violated(&self) -> Option<Invariant> {
        match self {
            CheckError::Invariant { invariant, .. } => Some(*invariant),
            _ => None,
        }
    }
}

pub type CheckResult<T> = Result<T, CheckError>;
