// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Vellum CLI - renders a template file to stdout
//!
//! ```text
//! vellum render page.tpl --var name=Ada --var age=36 --config planner.json
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vellum::{CompileError, Planner, PlannerConfig, Value};

#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(about = "Compile and render vellum templates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template once and print the result
    Render {
        /// Path to the template file
        template: PathBuf,

        /// Top-level variable as name=value (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Planner configuration as JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid variable '{0}', expected name=value")]
    Var(String),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vellum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render {
            template,
            vars,
            config,
        } => match render_file(&template, &vars, config.as_deref()) {
            Ok(output) => print!("{}", output),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
    }
}

fn render_file(template: &Path, vars: &[String], config: Option<&Path>) -> Result<String, CliError> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => PlannerConfig::default(),
    };
    let source = read(template)?;
    info!("Rendering {}", template.display());
    render(&source, vars, config)
}

fn render(source: &str, vars: &[String], config: PlannerConfig) -> Result<String, CliError> {
    let mut planner = Planner::with_config(config);
    for var in vars {
        let (name, value) = parse_var(var)?;
        debug!(name, value = %value, "defining variable");
        planner.define_variable(name, value)?;
    }
    let execution = planner.compile_template(source)?;
    let mut state = execution.new_state();
    let output = execution.render(&mut state);
    for diagnostic in state.diagnostics() {
        error!("{}", diagnostic);
    }
    Ok(output)
}

fn load_config(path: &Path) -> Result<PlannerConfig, CliError> {
    let json = read(path)?;
    PlannerConfig::from_json_str(&json).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Split `name=value` and infer the value's type: bool, integer, float,
/// otherwise string.
fn parse_var(var: &str) -> Result<(&str, Value), CliError> {
    let (name, raw) = var
        .split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| CliError::Var(var.to_string()))?;
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Int(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::Float(f)
            } else {
                Value::from(raw)
            }
        }
    };
    Ok((name, value))
}
