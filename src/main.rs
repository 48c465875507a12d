mod calc;
mod config;
mod courses;
mod ipc;
mod predict;
mod report;
mod scale;
mod telemetry;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gradecalcd",
    about = "Grade projection sidecar: reads JSON requests on stdin, answers on stdout",
    version
)]
struct Cli {
    /// JSON file overriding the grading scheme, grade scale or course table
    #[arg(long, env = "GRADECALCD_CONFIG")]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "GRADECALCD_LOG", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    let (cfg, source) = match &cli.config {
        Some(path) => (
            config::AppConfig::load(path)?,
            path.to_string_lossy().to_string(),
        ),
        None => (config::AppConfig::default(), "defaults".to_string()),
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %source,
        fingerprint = %cfg.fingerprint(),
        "gradecalcd ready"
    );
    let mut state = ipc::AppState::new(cfg, source);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "bad request line");
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}
