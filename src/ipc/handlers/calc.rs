use crate::calc::{self, CalcError, ScoreEntry, TestScore};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{optional_param, required_f64, required_param, required_str, score_lists};
use crate::ipc::types::{AppState, Request};
use crate::predict;
use crate::scale;
use serde_json::json;

fn entries_to_scores(entries: Vec<ScoreEntry>) -> Result<Vec<TestScore>, CalcError> {
    entries.into_iter().map(TestScore::try_from).collect()
}

fn handle_calc_percentages(state: &mut AppState, req: &Request) -> serde_json::Value {
    let entries: Vec<ScoreEntry> = match required_param(req, "entries") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let category: Option<String> = match optional_param(req, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let expected = match category.as_deref().unwrap_or("pt") {
        "pt" => state.config.scheme.pt.test_count,
        "nt" => state.config.scheme.nt.test_count,
        other => {
            return err(
                &req.id,
                "bad_params",
                format!("category must be pt or nt, got {}", other),
                None,
            )
        }
    };
    match calc::compute_percentages(&entries, expected) {
        Ok(scores) => ok(&req.id, json!({ "scores": scores })),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_calc_best_k_average(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let entries: Vec<ScoreEntry> = match required_param(req, "entries") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let k: usize = match required_param(req, "k") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = entries_to_scores(entries).and_then(|scores| calc::best_k_average(&scores, k));
    match result {
        Ok(average) => ok(&req.id, json!({ "average": average })),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_calc_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let percent = match required_f64(req, "percent") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let tier = scale::determine_grade(percent, &state.config.grade_scale);
    ok(&req.id, json!({ "tier": tier }))
}

fn handle_calc_final(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (pt_scores, nt_scores) = match score_lists(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = &state.config;
    match predict::assess(&pt_scores, &nt_scores, &cfg.scheme, &cfg.grade_scale) {
        Ok(a) => ok(
            &req.id,
            json!({
                "result": a.result,
                "prediction": a.prediction,
                "ptScores": pt_scores,
                "ntScores": nt_scores,
            }),
        ),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_calc_predict(state: &mut AppState, req: &Request) -> serde_json::Value {
    let known: Vec<ScoreEntry> = match required_param(req, "ptKnown") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let nt_contribution = match required_f64(req, "ntContribution") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let current_label = match required_str(req, "currentTier") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let sixth_max = match required_f64(req, "sixthMax") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cfg = &state.config;
    let Some(current_tier) = cfg.grade_scale.find(&current_label) else {
        return err(
            &req.id,
            "invalid_argument",
            format!("grade {} is not part of the active scale", current_label),
            None,
        );
    };

    let result = entries_to_scores(known).and_then(|scores| {
        predict::predict_required_sixth_score(
            &scores,
            nt_contribution,
            current_tier,
            sixth_max,
            &cfg.scheme,
            &cfg.grade_scale,
        )
    });
    match result {
        Ok(prediction) => ok(&req.id, json!({ "prediction": prediction })),
        Err(e) => calc_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.percentages" => Some(handle_calc_percentages(state, req)),
        "calc.bestKAverage" => Some(handle_calc_best_k_average(state, req)),
        "calc.grade" => Some(handle_calc_grade(state, req)),
        "calc.final" => Some(handle_calc_final(state, req)),
        "calc.predict" => Some(handle_calc_predict(state, req)),
        _ => None,
    }
}
