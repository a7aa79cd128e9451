//! # Interval Vocabulary
//!
//! Maps the step names used in challenge data to a step size in semitones.
//! The table is closed: a name that is not listed here is an error, never a
//! fallback to one semitone.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{TrainerError, TrainerResult};

/// Named step sizes, in semitones.
///
/// `P1`..`P19` are numbered steps of 1..19 semitones.
static STEP_TABLE: Lazy<BTreeMap<String, f64>> = Lazy::new(|| {
    let mut table: BTreeMap<String, f64> = [
        ("quartertone", 0.5),
        ("semitone", 1.0),
        ("tone", 2.0),
        ("minor_third", 3.0),
        ("major_third", 4.0),
    ]
    .into_iter()
    .map(|(name, step)| (name.to_string(), step))
    .collect();

    for n in 1..=19 {
        table.insert(format!("P{n}"), n as f64);
    }
    table
});

/// Looks up a named step by exact, case-sensitive match.
///
/// # Errors
/// * `UnknownIntervalName` - the name is not in the vocabulary
pub fn resolve_step(name: &str) -> TrainerResult<f64> {
    STEP_TABLE
        .get(name)
        .copied()
        .ok_or_else(|| TrainerError::UnknownIntervalName {
            name: name.to_string(),
        })
}

/// Every known step name with its size, smallest step first.
pub fn known_steps() -> Vec<(&'static str, f64)> {
    let mut steps: Vec<(&'static str, f64)> = STEP_TABLE
        .iter()
        .map(|(name, step)| (name.as_str(), *step))
        .collect();
    steps.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    steps
}

/// How a challenge spells its slider step: by name, or as a raw number of
/// semitones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepSpec {
    Semitones(f64),
    Named(String),
}

impl StepSpec {
    /// Step size in semitones. A raw `0` is returned as-is and selects the
    /// two-point range.
    pub fn semitones(&self) -> TrainerResult<f64> {
        match self {
            StepSpec::Named(name) => resolve_step(name),
            StepSpec::Semitones(step) if step.is_finite() => Ok(*step),
            StepSpec::Semitones(step) => Err(TrainerError::InvalidStep { step: *step }),
        }
    }
}

impl std::fmt::Display for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepSpec::Named(name) => write!(f, "{name}"),
            StepSpec::Semitones(step) => write!(f, "{step} semitones"),
        }
    }
}
