//! Output layer: the result line on stdout, diagnostics on stderr.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"text"` | `"json"`
//! 3. Default: [`OutputMode::Text`]

use clap::ValueEnum;
use routecycle_core::error::ErrorCode;
use routecycle_search::{CycleResult, PartitionLength};
use serde::Serialize;
use std::io::{self, Write};

/// The output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// `claim_id,status_code,cycle_length` lines.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    #[cfg(test)]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Core resolution logic, separated from the environment for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    match format_env.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Text,
    }
}

/// Resolve the output mode from CLI flags and the `FORMAT` env var.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref())
}

fn write_json<T: Serialize + ?Sized>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    writeln!(w, "{json}")
}

/// Write the winning partition.
pub fn render_result(w: &mut dyn Write, result: &CycleResult, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Text => writeln!(w, "{result}"),
        OutputMode::Json => write_json(w, result),
    }
}

/// Write every partition's longest cycle length.
pub fn render_partitions(
    w: &mut dyn Write,
    lengths: &[PartitionLength],
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            for entry in lengths {
                writeln!(
                    w,
                    "{},{} nodes={} edges={} cycle={}",
                    entry.key.claim_id,
                    entry.key.status_code,
                    entry.nodes,
                    entry.edges,
                    entry.cycle_length
                )?;
            }
            Ok(())
        }
        OutputMode::Json => write_json(w, lengths),
    }
}

/// Write a fatal error.
///
/// Text mode writes `error[E####]: <message>: <detail>` and an optional
/// `hint:` line. JSON mode writes `{"error": {...}}` on one line.
pub fn render_error(
    w: &mut dyn Write,
    code: ErrorCode,
    detail: &str,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Text => {
            writeln!(w, "error[{code}]: {}: {detail}", code.message())?;
            if let Some(hint) = code.hint() {
                writeln!(w, "hint: {hint}")?;
            }
            Ok(())
        }
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": {
                    "error_code": code.code(),
                    "message": code.message(),
                    "detail": detail,
                    "hint": code.hint(),
                }
            });
            write_json(w, &wrapper)
        }
    }
}
