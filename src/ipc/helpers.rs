use crate::calc::{self, CalcError, ScoreEntry, TestScore};
use crate::courses::{CourseMaxes, CUSTOM_COURSE};
use crate::ipc::error::{calc_err, err};
use crate::ipc::types::{AppState, Request};
use serde::de::DeserializeOwned;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a number", key),
                None,
            )
        })
}

pub fn required_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid {}: {}", key, e), None))
}

pub fn optional_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<Option<T>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(_) => required_param(req, key).map(Some),
    }
}

/// Max marks for a calculation: explicit `ptMaxes` + `ntMaxes`, else the `course` entry.
pub fn resolve_maxes(state: &AppState, req: &Request) -> Result<CourseMaxes, serde_json::Value> {
    let pt_maxes: Option<Vec<f64>> = optional_param(req, "ptMaxes")?;
    let nt_maxes: Option<Vec<f64>> = optional_param(req, "ntMaxes")?;
    match (pt_maxes, nt_maxes) {
        (Some(pt_maxes), Some(nt_maxes)) => Ok(CourseMaxes { pt_maxes, nt_maxes }),
        (None, None) => {
            let key: Option<String> = optional_param(req, "course")?;
            let key = key.unwrap_or_else(|| CUSTOM_COURSE.to_string());
            state.config.courses.get(&key).cloned().ok_or_else(|| {
                err(
                    &req.id,
                    "not_found",
                    format!("unknown course: {}", key),
                    None,
                )
            })
        }
        _ => Err(err(
            &req.id,
            "bad_params",
            "ptMaxes and ntMaxes must be given together",
            None,
        )),
    }
}

fn category_scores(
    obtained: &[Option<f64>],
    maxes: &[f64],
    expected: usize,
    what: &str,
) -> Result<Vec<TestScore>, CalcError> {
    if obtained.len() != maxes.len() {
        return Err(CalcError::invalid_argument(format!(
            "{} lists {} scores for {} maxes",
            what,
            obtained.len(),
            maxes.len()
        )));
    }
    let entries: Vec<ScoreEntry> = obtained
        .iter()
        .zip(maxes)
        .map(|(o, m)| ScoreEntry::new(*o, *m))
        .collect();
    calc::compute_percentages(&entries, expected)
}

/// PT and NT score lists for `calc.final`-shaped params.
pub fn score_lists(
    state: &AppState,
    req: &Request,
) -> Result<(Vec<TestScore>, Vec<TestScore>), serde_json::Value> {
    let maxes = resolve_maxes(state, req)?;
    let pt: Vec<Option<f64>> = required_param(req, "pt")?;
    let nt: Vec<Option<f64>> = required_param(req, "nt")?;
    let scheme = &state.config.scheme;

    let pt_scores = category_scores(&pt, &maxes.pt_maxes, scheme.pt.test_count, "pt")
        .map_err(|e| calc_err(&req.id, e))?;
    let nt_scores = category_scores(&nt, &maxes.nt_maxes, scheme.nt.test_count, "nt")
        .map_err(|e| calc_err(&req.id, e))?;
    Ok((pt_scores, nt_scores))
}
