use anyhow::{Result, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use tfguard_policy::{PolicyConfig, Registry, Runner};

mod load;
mod report;

#[derive(Parser, Debug)]
#[command(author, version, about="tfguard — policy checks for Terraform resources")]
struct Cli {
    /// Log format (logs go to stderr)
    #[arg(long, value_enum, default_value_t=LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Log evaluation details
    #[arg(short, long, default_value_t=false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum LogFormat { Text, Json }

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum Output { Text, Json }

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Scan .tf, .tf.json, .json and .yaml files or directories
    Scan {
        #[arg(default_value=".")]
        paths: Vec<PathBuf>,

        /// Only run these checks (ids or globs)
        #[arg(long="check")]
        checks: Vec<String>,

        /// Report these checks as SKIPPED (ids or globs)
        #[arg(long="skip-check")]
        skip_checks: Vec<String>,

        /// Policy file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail every check whose attribute is missing
        #[arg(long, default_value_t=false)]
        strict_absent: bool,

        #[arg(short, long, value_enum, default_value_t=Output::Text)]
        output: Output,

        /// Exit 0 even when checks fail
        #[arg(long, default_value_t=false)]
        soft_fail: bool,

        /// Worker threads (1 = sequential)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// List registered checks
    List,
}

fn init_logging(format: LogFormat, verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let builder = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().with_span_events(FmtSpan::CLOSE).init(),
        LogFormat::Text => builder.init(),
    }
}

fn registry() -> Result<Registry> {
    let mut reg = Registry::new();
    tfguard_aws::register(&mut reg).context("register aws checks")?;
    Ok(reg)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let reg = registry()?;
    match cli.cmd {
        Cmd::List => {
            report::list(reg.checks(), &mut std::io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Scan { paths, checks, skip_checks, config, strict_absent, output, soft_fail, jobs } => {
            let base = match &config {
                Some(p) => {
                    let src = std::fs::read_to_string(p)
                        .with_context(|| format!("read policy config {}", p.display()))?;
                    PolicyConfig::from_yaml(&src)
                        .with_context(|| format!("parse policy config {}", p.display()))?
                }
                None => PolicyConfig::default(),
            };
            let flags = PolicyConfig { checks, skip_checks, strict_absent, ..Default::default() };
            let policy = base.merge(flags);

            let resources = load::load_resources(&paths)?;
            let mut runner = Runner::new(&reg, &policy)?;
            if let Some(n) = jobs { runner = runner.jobs(n); }
            let rep = runner.run(&resources);

            report::write(&rep, output, &mut std::io::stdout().lock())?;
            if rep.has_failures() && !soft_fail {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
