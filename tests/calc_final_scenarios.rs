use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradecalcd");
    let mut child = Command::new(exe)
        .env_remove("GRADECALCD_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradecalcd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn approx(v: &serde_json::Value, expected: f64) -> bool {
    v.as_f64()
        .map(|x| (x - expected).abs() < 1e-6)
        .unwrap_or(false)
}

#[test]
fn da101_pt_eighty_nt_full_is_ab_and_final() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.final",
        json!({
            "course": "da101",
            "pt": [16, 16, 16, 16, 16, 0],
            "nt": [10, 10, 10, 10, 10, 10]
        }),
    );
    assert!(approx(&res["result"]["ptAverage"], 80.0));
    assert!(approx(&res["result"]["ntAverage"], 100.0));
    assert!(approx(&res["result"]["totalPercent"], 82.0));
    assert_eq!(res["result"]["matchedTier"]["label"], "AB");
    assert_eq!(res["result"]["matchedTier"]["gradePoint"], 9);
    assert_eq!(res["prediction"]["kind"], "unnecessary");
    assert_eq!(res["ptScores"].as_array().map(|a| a.len()), Some(6));
    let _ = child.kill();
}

#[test]
fn perfect_scores_with_pending_slot_are_top_tier() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.final",
        json!({
            "course": "da102",
            "pt": [10, 10, 10, 10, 10, null],
            "nt": [10, 10, 10, 10, 10, 10]
        }),
    );
    assert!(approx(&res["result"]["totalPercent"], 100.0));
    assert_eq!(res["result"]["matchedTier"]["label"], "AA");
    assert_eq!(res["result"]["matchedTier"]["gradePoint"], 10);
    assert_eq!(res["prediction"]["kind"], "alreadyTopTier");
    let _ = child.kill();
}

#[test]
fn pending_sixth_pt_gets_a_required_score() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    // 85/80/80/75/70 percent, NT 90 percent: total 79.2 (BB)
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.final",
        json!({
            "course": "da101",
            "pt": [17, 16, 16, 15, 14, null],
            "nt": [9, 9, 9, 9, 9, 9]
        }),
    );
    assert!(approx(&res["result"]["totalPercent"], 79.2));
    assert_eq!(res["result"]["matchedTier"]["label"], "BB");
    assert_eq!(res["prediction"]["kind"], "achievable");
    assert_eq!(res["prediction"]["requiredRawScore"], 15.0);
    assert_eq!(res["prediction"]["targetTier"]["label"], "AB");
    let _ = child.kill();
}

#[test]
fn all_scores_absent_fall_to_lowest_tier() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.final",
        json!({
            "course": "da103",
            "pt": [null, null, null, null, null, null],
            "nt": [null, null, null, null, null, null]
        }),
    );
    assert!(approx(&res["result"]["ptAverage"], 0.0));
    assert!(approx(&res["result"]["totalPercent"], 0.0));
    assert_eq!(res["result"]["matchedTier"]["label"], "F");
    assert_eq!(res["prediction"]["kind"], "impossible");
    assert_eq!(res["prediction"]["targetTier"]["label"], "DD");
    let _ = child.kill();
}

#[test]
fn explicit_maxes_override_course_lookup() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.final",
        json!({
            "course": "da101",
            "ptMaxes": [50, 50, 50, 50, 50, 50],
            "ntMaxes": [5, 5, 5, 5, 5, 5],
            "pt": [35, 35, 35, 35, 35, 35],
            "nt": [5, 5, 5, 5, 5, 5]
        }),
    );
    // 70 * 0.9 + 100 * 0.1 = 73
    assert!(approx(&res["result"]["totalPercent"], 73.0));
    assert_eq!(res["result"]["matchedTier"]["label"], "BB");
    let _ = child.kill();
}

#[test]
fn bad_inputs_are_rejected_without_partial_results() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let unknown = request(
        &mut stdin,
        &mut reader,
        "1",
        "calc.final",
        json!({ "course": "zz999", "pt": [], "nt": [] }),
    );
    assert_eq!(error_code(&unknown), "not_found");

    let short = request(
        &mut stdin,
        &mut reader,
        "2",
        "calc.final",
        json!({ "course": "da101", "pt": [1, 2, 3], "nt": [1, 2, 3, 4, 5, 6] }),
    );
    assert_eq!(error_code(&short), "invalid_argument");
    assert!(short.get("result").is_none());

    let half = request(
        &mut stdin,
        &mut reader,
        "3",
        "calc.final",
        json!({ "ptMaxes": [10, 10, 10, 10, 10, 10], "pt": [], "nt": [] }),
    );
    assert_eq!(error_code(&half), "bad_params");

    let zero_max = request(
        &mut stdin,
        &mut reader,
        "4",
        "calc.final",
        json!({
            "ptMaxes": [10, 10, 0, 10, 10, 10],
            "ntMaxes": [10, 10, 10, 10, 10, 10],
            "pt": [1, 1, 1, 1, 1, 1],
            "nt": [1, 1, 1, 1, 1, 1]
        }),
    );
    assert_eq!(error_code(&zero_max), "invalid_argument");
    assert_eq!(zero_max["error"]["details"]["index"], 2);

    let _ = child.kill();
}

#[test]
fn aggregator_methods_follow_best_k_rules() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let pcts = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calc.percentages",
        json!({
            "category": "nt",
            "entries": [
                { "obtained": 2, "max": 4 },
                { "obtained": 10, "max": 10 },
                { "max": 10 },
                { "obtained": 12, "max": 10 },
                { "obtained": 0, "max": 10 },
                { "obtained": null, "max": 10 }
            ]
        }),
    );
    let scores = pcts["scores"].as_array().expect("scores");
    assert!(approx(&scores[0]["percent"], 50.0));
    assert!(approx(&scores[2]["percent"], 0.0));
    assert!(scores[2]["obtained"].is_null());
    assert!(approx(&scores[3]["percent"], 120.0));

    let avg = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "calc.bestKAverage",
        json!({
            "k": 2,
            "entries": [
                { "obtained": 3, "max": 10 },
                { "obtained": 9, "max": 10 },
                { "obtained": 7, "max": 10 }
            ]
        }),
    );
    assert!(approx(&avg["average"], 80.0));

    let too_many = request(
        &mut stdin,
        &mut reader,
        "3",
        "calc.bestKAverage",
        json!({ "k": 4, "entries": [{ "obtained": 3, "max": 10 }] }),
    );
    assert_eq!(error_code(&too_many), "invalid_argument");

    let empty = request(
        &mut stdin,
        &mut reader,
        "4",
        "calc.bestKAverage",
        json!({ "k": 1, "entries": [] }),
    );
    assert_eq!(error_code(&empty), "invalid_argument");

    let boundary = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "calc.grade",
        json!({ "percent": 70 }),
    );
    assert_eq!(boundary["tier"]["label"], "BB");

    let _ = child.kill();
}
