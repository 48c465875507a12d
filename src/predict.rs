use crate::calc::{best_k_average, percents_descending, CalcError, TestScore};
use crate::scale::{GradeScale, GradeTier};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPolicy {
    pub weight: f64,
    pub best_k: usize,
    pub test_count: usize,
}

/// Per-category weights and best-k policy. The default is the PT 90% / NT 10%,
/// best 5 of 6 scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingScheme {
    pub pt: CategoryPolicy,
    pub nt: CategoryPolicy,
}

impl Default for GradingScheme {
    fn default() -> Self {
        Self {
            pt: CategoryPolicy {
                weight: 0.9,
                best_k: 5,
                test_count: 6,
            },
            nt: CategoryPolicy {
                weight: 0.1,
                best_k: 5,
                test_count: 6,
            },
        }
    }
}

impl GradingScheme {
    pub fn validate(&self) -> Result<(), CalcError> {
        for (name, p) in [("pt", &self.pt), ("nt", &self.nt)] {
            if !p.weight.is_finite() || p.weight <= 0.0 {
                return Err(CalcError::configuration(format!(
                    "scheme.{}.weight must be positive",
                    name
                )));
            }
            if p.best_k == 0 || p.best_k > p.test_count {
                return Err(CalcError::configuration(format!(
                    "scheme.{}.bestK must be between 1 and testCount ({})",
                    name, p.test_count
                )));
            }
        }
        // The pending PT slot needs at least one known slot beside it.
        if self.pt.test_count < 2 {
            return Err(CalcError::configuration(
                "scheme.pt.testCount must be at least 2",
            ));
        }
        if (self.pt.weight + self.nt.weight - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CalcError::configuration(format!(
                "scheme weights must sum to 1, got {}",
                self.pt.weight + self.nt.weight
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub pt_average: f64,
    pub nt_average: f64,
    pub pt_contribution: f64,
    pub nt_contribution: f64,
    pub total_percent: f64,
    pub matched_tier: GradeTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PredictionOutcome {
    /// The pending test already has a declared score.
    Unnecessary,
    Impossible {
        #[serde(rename = "targetTier")]
        target_tier: GradeTier,
    },
    /// The next tier is reached even with zero on the pending test.
    Guaranteed {
        #[serde(rename = "targetTier")]
        target_tier: GradeTier,
    },
    Achievable {
        #[serde(rename = "requiredRawScore")]
        required_raw_score: f64,
        #[serde(rename = "requiredPercent")]
        required_percent: f64,
        #[serde(rename = "targetTier")]
        target_tier: GradeTier,
    },
    AlreadyTopTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub result: CalculationResult,
    pub prediction: PredictionOutcome,
}

fn check_len(scores: &[TestScore], expected: usize, what: &str) -> Result<(), CalcError> {
    if scores.len() != expected {
        return Err(CalcError::invalid_argument(format!(
            "expected {} {} scores, got {}",
            expected,
            what,
            scores.len()
        )));
    }
    Ok(())
}

pub fn calculate_final(
    pt_scores: &[TestScore],
    nt_scores: &[TestScore],
    scheme: &GradingScheme,
    scale: &GradeScale,
) -> Result<CalculationResult, CalcError> {
    check_len(pt_scores, scheme.pt.test_count, "PT")?;
    check_len(nt_scores, scheme.nt.test_count, "NT")?;

    let pt_average = best_k_average(pt_scores, scheme.pt.best_k)?;
    let nt_average = best_k_average(nt_scores, scheme.nt.best_k)?;
    let pt_contribution = pt_average * scheme.pt.weight;
    let nt_contribution = nt_average * scheme.nt.weight;
    let total_percent = pt_contribution + nt_contribution;
    let matched_tier = scale.determine_grade(total_percent).clone();

    Ok(CalculationResult {
        pt_average,
        nt_average,
        pt_contribution,
        nt_contribution,
        total_percent,
        matched_tier,
    })
}

/// Minimum raw mark on the pending PT test that lifts the total to the next tier.
///
/// The pending score is assumed to replace the lowest of the known PT percentages inside the
/// best-k window. The case where it would not make the window at all is not modeled: the
/// average is unchanged there, and the bound check reports it as `Impossible` or `Guaranteed`.
pub fn predict_required_sixth_score(
    pt_known: &[TestScore],
    nt_contribution: f64,
    current_tier: &GradeTier,
    sixth_max: f64,
    scheme: &GradingScheme,
    scale: &GradeScale,
) -> Result<PredictionOutcome, CalcError> {
    check_len(pt_known, scheme.pt.test_count.saturating_sub(1), "known PT")?;
    if !sixth_max.is_finite() || sixth_max <= 0.0 {
        return Err(CalcError::invalid_argument(format!(
            "sixthMax must be a positive number, got {}",
            sixth_max
        )));
    }
    if !nt_contribution.is_finite() {
        return Err(CalcError::invalid_argument(
            "ntContribution must be a finite number",
        ));
    }
    if scale.position(&current_tier.label).is_none() {
        return Err(CalcError::invalid_argument(format!(
            "grade {} is not part of the active scale",
            current_tier.label
        )));
    }

    let Some(next_tier) = scale.next_above(&current_tier.label) else {
        return Ok(PredictionOutcome::AlreadyTopTier);
    };

    let best_k = scheme.pt.best_k;
    let needed_pt_avg = (next_tier.min_percent - nt_contribution) / scheme.pt.weight;
    let kept: f64 = percents_descending(pt_known)
        .iter()
        .take(best_k.saturating_sub(1))
        .sum();

    let required_percent = needed_pt_avg * (best_k as f64) - kept;
    let required_raw = required_percent / 100.0 * sixth_max;

    let outcome = if required_raw > sixth_max {
        PredictionOutcome::Impossible {
            target_tier: next_tier.clone(),
        }
    } else if required_raw <= 0.0 {
        PredictionOutcome::Guaranteed {
            target_tier: next_tier.clone(),
        }
    } else {
        PredictionOutcome::Achievable {
            required_raw_score: required_raw.ceil().min(sixth_max),
            required_percent,
            target_tier: next_tier.clone(),
        }
    };
    Ok(outcome)
}

/// Full calculation plus the pending-test prediction, keyed on the last PT slot.
pub fn assess(
    pt_scores: &[TestScore],
    nt_scores: &[TestScore],
    scheme: &GradingScheme,
    scale: &GradeScale,
) -> Result<Assessment, CalcError> {
    let result = calculate_final(pt_scores, nt_scores, scheme, scale)?;
    let Some((pending, known)) = pt_scores.split_last() else {
        return Err(CalcError::invalid_argument("no PT scores supplied"));
    };

    let prediction = if pending.is_filled() {
        PredictionOutcome::Unnecessary
    } else {
        predict_required_sixth_score(
            known,
            result.nt_contribution,
            &result.matched_tier,
            pending.max,
            scheme,
            scale,
        )?
    };

    tracing::debug!(
        total = result.total_percent,
        grade = %result.matched_tier.label,
        ?prediction,
        "assessment computed"
    );
    Ok(Assessment { result, prediction })
}
