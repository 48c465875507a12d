use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("invalid_argument", message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new("configuration_error", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CalcError {}

/// Raw input for one test slot: the declared mark (if any) and the slot's maximum.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ScoreEntry {
    #[serde(default)]
    pub obtained: Option<f64>,
    pub max: f64,
}

impl ScoreEntry {
    pub fn new(obtained: Option<f64>, max: f64) -> Self {
        Self { obtained, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScore {
    pub obtained: Option<f64>,
    pub max: f64,
    pub percent: f64,
}

impl TestScore {
    /// Validates one slot and derives its percentage.
    ///
    /// An undeclared mark ranks as 0%. Declared marks outside `[0, max]` are kept as given.
    pub fn new(obtained: Option<f64>, max: f64) -> Result<Self, CalcError> {
        if !max.is_finite() || max <= 0.0 {
            return Err(CalcError::invalid_argument(format!(
                "max must be a positive number, got {max}"
            )));
        }
        let percent = match obtained {
            None => 0.0,
            Some(v) if !v.is_finite() => {
                return Err(CalcError::invalid_argument(format!(
                    "obtained must be a finite number, got {v}"
                )));
            }
            Some(v) => {
                if v < 0.0 || v > max {
                    tracing::warn!(obtained = v, max, "score outside [0, max] accepted as-is");
                }
                100.0 * v / max
            }
        };
        Ok(Self {
            obtained,
            max,
            percent,
        })
    }

    pub fn is_filled(&self) -> bool {
        self.obtained.is_some()
    }
}

impl TryFrom<ScoreEntry> for TestScore {
    type Error = CalcError;

    fn try_from(entry: ScoreEntry) -> Result<Self, Self::Error> {
        TestScore::new(entry.obtained, entry.max)
    }
}

pub fn compute_percentages(
    entries: &[ScoreEntry],
    expected_count: usize,
) -> Result<Vec<TestScore>, CalcError> {
    if entries.len() != expected_count {
        return Err(CalcError::invalid_argument(format!(
            "expected {} score entries, got {}",
            expected_count,
            entries.len()
        )));
    }
    entries
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            TestScore::try_from(*e).map_err(|err| {
                err.with_details(serde_json::json!({ "index": idx }))
            })
        })
        .collect()
}

/// Percentages sorted highest first. The input order is left untouched.
pub fn percents_descending(scores: &[TestScore]) -> Vec<f64> {
    let mut percents: Vec<f64> = scores.iter().map(|s| s.percent).collect();
    percents.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    percents
}

pub fn best_k_average(scores: &[TestScore], k: usize) -> Result<f64, CalcError> {
    if scores.is_empty() {
        return Err(CalcError::invalid_argument(
            "cannot average an empty score list",
        ));
    }
    if k == 0 || k > scores.len() {
        return Err(CalcError::invalid_argument(format!(
            "k must be between 1 and {}, got {}",
            scores.len(),
            k
        )));
    }
    let top: f64 = percents_descending(scores).iter().take(k).sum();
    Ok(top / (k as f64))
}
