//! Runs JSON fixture suites against the compiler and validator.
//!
//! A suite file is a list of groups, each one schema with the documents it
//! should accept or reject:
//!
//! ```json
//! [{"description": "...", "schema": {...},
//!   "tests": [{"description": "...", "data": ..., "valid": true}]}]
//! ```
//!
//! Usage: `dev-test-runner [SUITE_DIR_OR_FILE...]` (defaults to `suites/`).
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use json_val::Compiler;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Group {
    description: String,
    schema: Value,
    tests: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    description: String,
    data: Value,
    valid: bool,
}

#[derive(Debug, Default)]
struct Tally {
    passed: usize,
    failed: Vec<String>,
}

fn load_suite(path: &Path) -> Result<Vec<Group>> {
    let src = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let at = err.path().to_string();
        anyhow::anyhow!("{}: at JSON path {at} → {}", path.display(), err.into_inner())
    })
}

fn run_suite(path: &Path, tally: &mut Tally) -> Result<()> {
    let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    for group in load_suite(path)? {
        let validator = match Compiler::new().compile(&group.schema) {
            Ok(v) => v,
            Err(error) => {
                tally.failed.push(format!("{name} / {}: schema did not compile: {error}", group.description));
                continue;
            }
        };
        for case in &group.tests {
            let outcome = validator.validate(&case.data);
            if outcome.is_ok() == case.valid {
                tally.passed += 1;
                continue;
            }
            let detail = match outcome {
                Ok(()) => "accepted, expected rejection".to_string(),
                Err(e) => format!("rejected ({e}), expected acceptance"),
            };
            tally
                .failed
                .push(format!("{name} / {} / {}: {detail}", group.description, case.description));
        }
    }
    Ok(())
}

fn suite_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for root in roots {
        if root.is_file() {
            out.push(root.clone());
            continue;
        }
        let entries = std::fs::read_dir(root).with_context(|| format!("failed to list {}", root.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn main() -> Result<ExitCode> {
    let mut roots: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if roots.is_empty() {
        roots.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("suites"));
    }

    let mut tally = Tally::default();
    for path in suite_files(&roots)? {
        run_suite(&path, &mut tally)?;
    }

    for failure in &tally.failed {
        println!("{} {failure}", "FAIL".red().bold());
    }
    let summary = format!("{} passed, {} failed", tally.passed, tally.failed.len());
    if tally.failed.is_empty() {
        println!("{}", summary.green());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", summary.red());
        Ok(ExitCode::FAILURE)
    }
}
