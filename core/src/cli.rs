use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::interpreter::{
    parser, Compiler, ErrorStack, Outcome, ProcessOptions, ResultCode, Scope, Value,
};

#[derive(Parser)]
#[command(name = "helena")]
#[command(about = "Helena - a small scripting language with resumable execution", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script file
    Run {
        /// Script to run
        file: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run an inline script
    Eval {
        /// Script source
        script: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the AST of a script file as JSON
    Parse {
        /// Script to parse
        file: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
pub struct RunArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Attach an error stack to errors (overrides config)
    #[arg(long)]
    pub capture_error_stack: bool,

    /// Values fed to successive yields; nil once exhausted
    #[arg(long = "yield-back", value_name = "VALUE")]
    pub yield_back: Vec<String>,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    use std::env;

    if let Some(config_path) = &cli.config {
        env::set_var("HELENA_CONFIG_PATH", config_path);
    }

    // Load configuration before anything runs so config errors show first
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.log.filter);

    match cli.command {
        Commands::Run { file, run } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let source_name = file.display().to_string();
            let result = execute_source(&source, Some(&source_name), &config, &run)?;
            report(&result, run.json)
        }
        Commands::Eval { script, run } => {
            let source_name = config.process.source_name.clone();
            let result = execute_source(&script, source_name.as_deref(), &config, &run)?;
            report(&result, run.json)
        }
        Commands::Parse { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let script = parser::parse(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&script)?);
            Ok(())
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run a script to completion, answering each YIELD from `--yield-back`
pub fn execute_source(
    source: &str,
    source_name: Option<&str>,
    config: &Config,
    run: &RunArgs,
) -> Result<Outcome> {
    let script = parser::parse(source).context("Failed to parse script")?;
    let program = Compiler::new(source_name.map(Rc::from)).compile(&script);

    let mut options: ProcessOptions = config.process_options();
    options.capture_error_stack |= run.capture_error_stack;

    let scope = Scope::new_root();
    let mut process = scope.prepare_process_with(Rc::new(program), options);
    let mut answers = run.yield_back.iter();

    let mut result = process.run();
    while result.code == ResultCode::Yield {
        debug!(value = %result.value, "script yielded");
        let answer = answers
            .next()
            .map(|answer| Value::from(answer.as_str()))
            .unwrap_or_default();
        process.yield_back(answer);
        result = process.run();
    }
    Ok(result)
}

#[derive(Serialize)]
struct Report<'a> {
    code: &'static str,
    value: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_stack: Option<&'a ErrorStack>,
}

fn report(result: &Outcome, json: bool) -> Result<()> {
    if json {
        let report = Report {
            code: result.code.name(),
            value: &result.value,
            error_stack: result.error_stack(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match result.code {
        ResultCode::Ok | ResultCode::Return => {
            if !json && !result.value.is_nil() {
                println!("{}", result.value);
            }
            Ok(())
        }
        ResultCode::Error => match result.error_stack() {
            Some(stack) if !stack.is_empty() => bail!("{}\n{}", result.value, stack),
            _ => bail!("{}", result.value),
        },
        code => bail!("unexpected {}", code),
    }
}
