//! Developer CLI over resource dumps: check | defaults | conform
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::document::{CheckReport, ResourceDocument};
use crate::logging::{init_logging, LogConfig, LogFormat};
use crate::schema::{CodecOptions, FieldFailurePolicy};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// inspect resource dumps: validate stored values against their schemas, print defaults, or repair values
#[derive(Parser, Debug)]
#[command(name = "structural-inspector", version)]
pub struct CommandLineInterface {
    /// more log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// log line layout
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse every schema, verify it round-trips, and validate every stored value
    Check(CheckOut),
    /// print `{name: default}` for every root schema
    Defaults(DefaultsOut),
    /// rewrite stored values so they fit their schemas
    Conform(ConformOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// fail a whole struct when one of its fields is malformed, instead of dropping the field
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Parser, Debug)]
struct DefaultsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ConformOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// rewrite each input file in place
    #[arg(long, conflicts_with = "out")]
    in_place: bool,

    /// output .json file (stdout if omitted); only valid with a single input
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&Path, ResourceDocument) -> anyhow::Result<()>) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        for source_path in source_paths {
            let document = ResourceDocument::load(&source_path)?;
            tracing::info!(path = %source_path.display(), roots = document.properties.len(), "loaded document");
            apply(&source_path, document)?;
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) -> anyhow::Result<()> {
        let config = LogConfig::from_verbosity(self.verbose).with_format(self.log_format);
        init_logging(&config).context("failed to install log subscriber")
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Check(target) => {
                let field_failure = if target.strict {
                    FieldFailurePolicy::Abort
                } else {
                    FieldFailurePolicy::Skip
                };
                let opts = CodecOptions { field_failure };
                let mut dirty = 0usize;
                target.input_settings.load_process(|path, document| {
                    let report = document.check_with(opts);
                    print_report(path, &report);
                    if !report.is_clean() {
                        dirty += 1;
                    }
                    Ok(())
                })?;
                if dirty > 0 {
                    bail!("{dirty} document(s) failed the check");
                }
                Ok(())
            }
            Command::Defaults(target) => {
                let mut all = serde_json::Map::new();
                target.input_settings.load_process(|_, document| {
                    all.extend(document.defaults());
                    Ok(())
                })?;
                let src = serde_json::to_string_pretty(&all)?;
                write_output(target.out.as_deref(), &src)
            }
            Command::Conform(target) => {
                let mut outputs = Vec::new();
                target.input_settings.load_process(|path, mut document| {
                    let changed = document.conform_values();
                    eprintln!("{} {} ({changed} root(s) changed)", "conformed".green().bold(), path.display());
                    if target.in_place {
                        document.save(path)?;
                    } else {
                        outputs.push(document.to_pretty_string()?);
                    }
                    Ok(())
                })?;
                if target.in_place {
                    return Ok(());
                }
                if target.out.is_some() && outputs.len() > 1 {
                    bail!("--out takes a single input; got {}", outputs.len());
                }
                write_output(target.out.as_deref(), &outputs.join("\n"))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_report(path: &Path, report: &CheckReport) {
    if report.is_clean() {
        println!("{} {}", "ok".green().bold(), path.display());
        return;
    }
    println!("{} {}", "FAIL".red().bold(), path.display());
    for (index, error) in &report.skipped {
        println!("  {} properties[{index}]: {error}", "dropped".yellow());
    }
    for name in &report.unstable {
        println!("  {} {name}: schema does not survive save/parse", "unstable".yellow());
    }
    for (name, violation) in &report.violations {
        println!("  {} {name} at {violation}", "invalid".red());
    }
    for name in &report.missing {
        println!("  {} {name}: no stored value", "missing".yellow());
    }
    for name in &report.orphaned {
        println!("  {} {name}: stored value has no schema", "orphaned".yellow());
    }
}

fn write_output(out: Option<&Path>, src: &str) -> anyhow::Result<()> {
    let Some(out) = out else {
        println!("{src}");
        return Ok(());
    };
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(out, src).with_context(|| format!("writing {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
