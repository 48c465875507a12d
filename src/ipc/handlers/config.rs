use crate::calc::CalcError;
use crate::config::{AppConfig, ConfigPatch};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn config_json(state: &AppState) -> serde_json::Value {
    let mut v = serde_json::to_value(&state.config).unwrap_or_else(|_| json!({}));
    v["configSha256"] = json!(state.config.fingerprint());
    v["configSource"] = json!(state.config_source);
    v
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, config_json(state))
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params = if req.params.is_null() {
        json!({})
    } else {
        req.params.clone()
    };
    let patch: ConfigPatch = match serde_json::from_value(params) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    match state.config.apply(patch) {
        Ok(cfg) => {
            state.replace_config(cfg, "override");
            ok(&req.id, config_json(state))
        }
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_config_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    match AppConfig::load(&path) {
        Ok(cfg) => {
            state.replace_config(cfg, path.to_string_lossy());
            ok(&req.id, config_json(state))
        }
        Err(e) => {
            if let Some(calc) = e.downcast_ref::<CalcError>() {
                return calc_err(&req.id, calc.clone());
            }
            let code = if e.downcast_ref::<std::io::Error>().is_some() {
                "config_read_failed"
            } else {
                "configuration_error"
            };
            tracing::warn!(path = %path.to_string_lossy(), error = %format!("{e:#}"), "config load failed");
            err(&req.id, code, format!("{e:#}"), None)
        }
    }
}

fn handle_config_clear_override(state: &mut AppState, req: &Request) -> serde_json::Value {
    let cfg = state.startup_config.clone();
    let source = state.startup_source.clone();
    state.replace_config(cfg, source);
    ok(&req.id, config_json(state))
}

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let courses: Vec<serde_json::Value> = state
        .config
        .courses
        .iter()
        .map(|(key, c)| {
            json!({
                "key": key,
                "ptMaxes": c.pt_maxes,
                "ntMaxes": c.nt_maxes,
            })
        })
        .collect();
    ok(&req.id, json!({ "courses": courses }))
}

fn handle_scale_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "gradeScale": state.config.grade_scale.tiers() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.config.get" => Some(handle_config_get(state, req)),
        "calc.config.update" => Some(handle_config_update(state, req)),
        "calc.config.load" => Some(handle_config_load(state, req)),
        "calc.config.clearOverride" => Some(handle_config_clear_override(state, req)),
        "courses.list" => Some(handle_courses_list(state, req)),
        "scale.get" => Some(handle_scale_get(state, req)),
        _ => None,
    }
}
