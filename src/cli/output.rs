//! Rendering of a dispatch report.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use clap::ValueEnum;

use crate::remote::DispatchReport;
use crate::remote::types::DispatchResponse;

/// Report format.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Per-remote blocks with the command output
    #[default]
    Text,
    /// The full report as one JSON document
    Json,
}

/// Render `report` in `format`.
pub fn render(report: &DispatchReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    let response = DispatchResponse::from(report);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&response).map(|mut s| {
            s.push('\n');
            s
        }),
        OutputFormat::Text => Ok(render_text(&response)),
    }
}

fn render_text(response: &DispatchResponse) -> String {
    let mut out = String::new();

    for outcome in &response.outcomes {
        let _ = writeln!(out, "== {} ==", outcome.remote);

        if outcome.ok {
            out.push_str(&outcome.stdout);
            if !outcome.stdout.is_empty() && !outcome.stdout.ends_with('\n') {
                out.push('\n');
            }
            if !outcome.stderr.is_empty() {
                let _ = writeln!(out, "-- stderr --");
                out.push_str(&outcome.stderr);
                if !outcome.stderr.ends_with('\n') {
                    out.push('\n');
                }
            }
            match (&outcome.signal, outcome.exit_status) {
                (Some(signal), _) => {
                    let _ = writeln!(out, "killed by signal {signal}");
                }
                (None, Some(status)) if status != 0 => {
                    let _ = writeln!(out, "exit status {status}");
                }
                _ => {}
            }
        } else if let (Some(kind), Some(error)) = (&outcome.error_kind, &outcome.error) {
            let _ = writeln!(out, "error [{kind}]: {error}");
        }

        for cleanup in &outcome.cleanup_errors {
            let _ = writeln!(out, "warning: {cleanup}");
        }
    }

    let _ = writeln!(
        out,
        "{} succeeded, {} failed",
        response.succeeded, response.failed
    );
    out
}

/// Write rendered output to `path`, or to stdout when absent.
pub fn write_output(rendered: &str, path: Option<&Path>) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, rendered),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()
        }
    }
}
