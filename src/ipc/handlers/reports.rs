use crate::ipc::error::{calc_err, ok};
use crate::ipc::helpers::score_lists;
use crate::ipc::types::{AppState, Request};
use crate::predict;
use crate::report;
use serde_json::json;

fn handle_reports_calculation_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (pt_scores, nt_scores) = match score_lists(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cfg = &state.config;
    match predict::assess(&pt_scores, &nt_scores, &cfg.scheme, &cfg.grade_scale) {
        Ok(a) => {
            let model = report::calculation_model(&a, &pt_scores, &nt_scores, &cfg.grade_scale);
            ok(
                &req.id,
                serde_json::to_value(model).unwrap_or_else(|_| json!({})),
            )
        }
        Err(e) => calc_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.calculationModel" => Some(handle_reports_calculation_model(state, req)),
        _ => None,
    }
}
