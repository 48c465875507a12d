use crate::calc::CalcError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeTier {
    #[serde(alias = "grade")]
    pub label: String,
    #[serde(alias = "min")]
    pub min_percent: f64,
    #[serde(alias = "point")]
    pub grade_point: i64,
}

impl GradeTier {
    pub fn new(label: &str, min_percent: f64, grade_point: i64) -> Self {
        Self {
            label: label.to_string(),
            min_percent,
            grade_point,
        }
    }
}

/// Grading scale ordered by strictly descending `min_percent`, with a zero floor.
///
/// Construction rejects anything else, so `determine_grade` can scan front to back and always
/// find a tier for any percentage in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GradeScale {
    tiers: Vec<GradeTier>,
}

impl GradeScale {
    pub fn new(tiers: Vec<GradeTier>) -> Result<Self, CalcError> {
        if tiers.is_empty() {
            return Err(CalcError::configuration("grade scale has no tiers"));
        }

        let mut labels: HashSet<&str> = HashSet::new();
        for (idx, t) in tiers.iter().enumerate() {
            let label = t.label.trim();
            if label.is_empty() {
                return Err(CalcError::configuration(format!(
                    "grade tier {} has an empty label",
                    idx
                )));
            }
            if !labels.insert(label) {
                return Err(CalcError::configuration(format!(
                    "grade label {} appears more than once",
                    label
                )));
            }
            if !t.min_percent.is_finite() || !(0.0..=100.0).contains(&t.min_percent) {
                return Err(CalcError::configuration(format!(
                    "grade {} has minPercent {} outside [0, 100]",
                    label, t.min_percent
                )));
            }
            if idx > 0 && t.min_percent >= tiers[idx - 1].min_percent {
                return Err(CalcError::configuration(format!(
                    "grade {} must have a lower minPercent than {}",
                    label,
                    tiers[idx - 1].label
                ))
                .with_details(serde_json::json!({ "index": idx })));
            }
        }

        let floor = tiers.last().map(|t| t.min_percent).unwrap_or(f64::NAN);
        if floor != 0.0 {
            return Err(CalcError::configuration(
                "lowest grade must start at 0 percent",
            ));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[GradeTier] {
        &self.tiers
    }

    pub fn highest(&self) -> &GradeTier {
        &self.tiers[0]
    }

    pub fn lowest(&self) -> &GradeTier {
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.label == label)
    }

    pub fn find(&self, label: &str) -> Option<&GradeTier> {
        self.tiers.iter().find(|t| t.label == label)
    }

    /// The tier one step up from `label`, or `None` when `label` is already the top tier.
    pub fn next_above(&self, label: &str) -> Option<&GradeTier> {
        match self.position(label) {
            Some(0) | None => None,
            Some(idx) => self.tiers.get(idx - 1),
        }
    }

    pub fn determine_grade(&self, percent: f64) -> &GradeTier {
        self.tiers
            .iter()
            .find(|t| percent >= t.min_percent)
            .unwrap_or_else(|| self.lowest())
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

pub fn default_tiers() -> Vec<GradeTier> {
    vec![
        GradeTier::new("AA", 90.0, 10),
        GradeTier::new("AB", 80.0, 9),
        GradeTier::new("BB", 70.0, 8),
        GradeTier::new("BC", 60.0, 7),
        GradeTier::new("CC", 50.0, 6),
        GradeTier::new("CD", 40.0, 5),
        GradeTier::new("DD", 30.0, 4),
        GradeTier::new("F", 0.0, 0),
    ]
}

pub fn determine_grade(percent: f64, scale: &GradeScale) -> &GradeTier {
    scale.determine_grade(percent)
}
