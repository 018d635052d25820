//! Command line: validate documents against a schema, or print the compiled schema.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::compiler::{CompileOptions, Compiler, DEFAULT_MAX_DEPTH};
use crate::describe;
use crate::validator::Validator;

// --------------------------------- Types --------------------------------- //

/// compile a JSON-Schema-like document and check JSON documents against it
#[derive(Parser, Debug)]
#[command(name = "json-val", version, about)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document and print PASS/FAIL per document
    Validate(ValidateCmd),
    /// compile the schema and print the constraint tree back as a schema
    Schema(SchemaCmd),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    /// JSON pointer to the sub-schema to use as the root (e.g. /definitions/user)
    #[arg(long)]
    pointer: Option<String>,

    /// reject properties an object schema does not declare, unless it says otherwise
    #[arg(long, default_value_t = false)]
    deny_unknown_properties: bool,

    /// schema nesting limit
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq filter applied to each document; every output is validated
    #[arg(long)]
    jq_expr: Option<String>,

    /// one or more inputs: literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct ValidateCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// only print failures
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct SchemaCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One document to validate, labelled by where it came from.
#[derive(Debug)]
struct Document {
    label: String,
    value: Value,
}

// ---------------------------- Implementation ----------------------------- //

impl SchemaSettings {
    fn compile(&self) -> Result<Validator> {
        let src = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema {}", self.schema.display()))?;
        let document: Value = serde_json::from_str(&src)
            .with_context(|| format!("schema {} is not valid JSON", self.schema.display()))?;

        let options = CompileOptions::new()
            .max_depth(self.max_depth)
            .deny_unknown_properties(self.deny_unknown_properties);
        let compiler = Compiler::with_options(options);
        let validator = match self.pointer.as_deref() {
            Some(pointer) => compiler.compile_at(&document, pointer),
            None => compiler.compile(&document),
        }
        .with_context(|| format!("failed to compile schema {}", self.schema.display()))?;

        debug!(references = ?validator.references().names(), "schema compiled");
        Ok(validator)
    }
}

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for path in resolve_file_path_patterns(&self.input)? {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path.to_string_lossy().to_string();

            if self.ndjson {
                for (i, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("{name}:{}: invalid JSON", i + 1))?;
                    self.select(format!("{name}:{}", i + 1), value, &mut docs)?;
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("{name}: invalid JSON"))?;
                self.select(name, value, &mut docs)?;
            }
        }
        info!(documents = docs.len(), "inputs loaded");
        Ok(docs)
    }

    /// Apply `--json-pointer` then `--jq-expr` to one parsed document.
    fn select(&self, label: String, value: Value, out: &mut Vec<Document>) -> Result<()> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => match value.pointer(pointer) {
                Some(v) => v.clone(),
                None => bail!("{label}: nothing at JSON pointer '{pointer}'"),
            },
        };
        match self.jq_expr.as_deref() {
            None => out.push(Document { label, value }),
            Some(expr) => {
                let results = crate::jq_exec::apply_filter(expr, &value)
                    .with_context(|| format!("{label}: jq expression failed"))?;
                for (i, value) in results.into_iter().enumerate() {
                    out.push(Document { label: format!("{label}#{i}"), value });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Validate(cmd) => cmd.run(),
            Command::Schema(cmd) => cmd.run().map(|()| ExitCode::SUCCESS),
        }
    }
}

impl ValidateCmd {
    fn run(&self) -> Result<ExitCode> {
        let validator = self.schema_settings.compile()?;
        let docs = self.input_settings.load()?;

        // the validator is only read from here on
        let outcomes: Vec<(&Document, Option<String>)> = docs
            .par_iter()
            .map(|doc| (doc, validator.validate(&doc.value).err().map(|e| e.to_string())))
            .collect();

        let mut failed = 0usize;
        for (doc, error) in &outcomes {
            match error {
                None if self.quiet => {}
                None => println!("{} {}", "PASS".green().bold(), doc.label),
                Some(error) => {
                    failed += 1;
                    println!("{} {}: {}", "FAIL".red().bold(), doc.label, error);
                }
            }
        }

        let summary = format!("{} of {} documents passed", outcomes.len() - failed, outcomes.len());
        if failed == 0 {
            eprintln!("{}", summary.green());
            Ok(ExitCode::SUCCESS)
        } else {
            eprintln!("{}", summary.red());
            Ok(ExitCode::FAILURE)
        }
    }
}

impl SchemaCmd {
    fn run(&self) -> Result<()> {
        let validator = self.schema_settings.compile()?;
        let schema = describe::validator_schema(&validator);
        let schema_src = serde_json::to_string_pretty(&schema)?;
        match self.out.as_ref() {
            Some(out) => write_output(out, &schema_src),
            None => {
                println!("{schema_src}");
                Ok(())
            }
        }
    }
}

// --------------------------- Internal helpers ---------------------------- //

fn write_output(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched_any = false;
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
            out.push(entry?);
            matched_any = true;
        }
        if !matched_any {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
