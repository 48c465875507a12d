use crate::calc::TestScore;
use crate::predict::{Assessment, PredictionOutcome};
use crate::scale::GradeScale;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total_percent: String,
    pub grade: String,
    pub grade_point: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    pub label: String,
    pub average: Option<String>,
    pub contribution: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartModel {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub warning: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationReport {
    pub summary: SummaryView,
    pub breakdown: Vec<BreakdownRow>,
    pub chart: ChartModel,
    pub analysis: AnalysisView,
    pub generated_at: String,
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v)
}

fn fixed(v: f64) -> String {
    format!("{:.2}", v)
}

fn raw(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{}", v)
    }
}

pub fn analysis_view(
    assessment: &Assessment,
    pending_max: f64,
    scale: &GradeScale,
) -> AnalysisView {
    let current = &assessment.result.matched_tier;
    match &assessment.prediction {
        PredictionOutcome::Unnecessary => AnalysisView {
            kind: "final",
            title: "Status: Final".to_string(),
            message: "A score has been entered for the last PT. The results above are the final calculated grades."
                .to_string(),
            warning: false,
        },
        PredictionOutcome::AlreadyTopTier => AnalysisView {
            kind: "alreadyTopTier",
            title: "Excellent!".to_string(),
            message: format!(
                "You are already at the highest grade ({}). Check that it holds even with 0 in the last PT.",
                scale.highest().label
            ),
            warning: false,
        },
        PredictionOutcome::Impossible { target_tier } => AnalysisView {
            kind: "impossible",
            title: format!("Target: {}", target_tier.label),
            message: format!(
                "Reaching {} is mathematically impossible. Even with {}/{} in the last PT, the best possible average falls short.",
                target_tier.label,
                raw(pending_max),
                raw(pending_max)
            ),
            warning: true,
        },
        PredictionOutcome::Guaranteed { target_tier } => AnalysisView {
            kind: "guaranteed",
            title: format!("Target: {}", target_tier.label),
            message: format!(
                "You are practically guaranteed to reach {} provided your NT scores hold up.",
                target_tier.label
            ),
            warning: false,
        },
        PredictionOutcome::Achievable {
            required_raw_score,
            required_percent,
            target_tier,
        } => AnalysisView {
            kind: "achievable",
            title: format!("Target: {}", target_tier.label),
            message: format!(
                "To move from {} to {} you need at least {} / {} (approx {:.1}%) in the last PT. This score replaces your lowest PT in the calculation.",
                current.label,
                target_tier.label,
                raw(*required_raw_score),
                raw(pending_max),
                required_percent
            ),
            warning: false,
        },
    }
}

/// Render model for one calculation. Pure: everything shown comes from the arguments.
pub fn calculation_model(
    assessment: &Assessment,
    pt_scores: &[TestScore],
    nt_scores: &[TestScore],
    scale: &GradeScale,
) -> CalculationReport {
    let r = &assessment.result;
    let pending_max = pt_scores.last().map(|s| s.max).unwrap_or(0.0);
    let slots = pt_scores.len().max(nt_scores.len());

    CalculationReport {
        summary: SummaryView {
            total_percent: pct(r.total_percent),
            grade: r.matched_tier.label.clone(),
            grade_point: r.matched_tier.grade_point,
        },
        breakdown: vec![
            BreakdownRow {
                label: "PT".to_string(),
                average: Some(pct(r.pt_average)),
                contribution: fixed(r.pt_contribution),
            },
            BreakdownRow {
                label: "NT".to_string(),
                average: Some(pct(r.nt_average)),
                contribution: fixed(r.nt_contribution),
            },
            BreakdownRow {
                label: "Total".to_string(),
                average: None,
                contribution: fixed(r.total_percent),
            },
        ],
        chart: ChartModel {
            labels: (1..=slots).map(|n| n.to_string()).collect(),
            series: vec![
                ChartSeries {
                    label: "PT Performance (%)".to_string(),
                    data: pt_scores.iter().map(|s| s.percent).collect(),
                },
                ChartSeries {
                    label: "NPT Performance (%)".to_string(),
                    data: nt_scores.iter().map(|s| s.percent).collect(),
                },
            ],
        },
        analysis: analysis_view(assessment, pending_max, scale),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}
