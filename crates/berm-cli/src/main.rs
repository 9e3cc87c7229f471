//! Berm CLI - policy-as-code checks for Terraform plans.

use anyhow::Result;
use berm_cli::commands::{run_check, run_explain, run_init, run_validate_rules, CheckOptions};
use berm_cli::{RunContext, EXIT_FAILURE};
use berm_core::{sanitize_for_output, Limits, OutputContext};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "berm", version)]
#[command(about = "Policy-as-code validator for Terraform plans", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file path (default: ./berm.toml, then the user config)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root directory every rule and plan path must stay inside
    #[arg(long, global = true, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Verbose logging on stderr
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Check a Terraform plan against policy rules
    ///
    /// PLAN is the JSON produced by `terraform show -json plan.tfplan`.
    Check {
        #[arg(value_name = "PLAN")]
        plan: PathBuf,

        /// Directory containing policy rules (default: .berm)
        #[arg(short, long, value_name = "DIR")]
        rules_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Treat warnings as errors (fail on any violation)
        #[arg(long)]
        strict: bool,
    },

    /// Test policy rules against a Terraform plan
    Test {
        /// Directory containing policy rules
        #[arg(short, long, value_name = "DIR")]
        rules: PathBuf,

        /// Path to the Terraform plan JSON file
        #[arg(short, long, value_name = "FILE")]
        plan: PathBuf,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Treat warnings as errors (fail on any violation)
        #[arg(long)]
        strict: bool,
    },

    /// Validate policy rules without running them
    ValidateRules {
        /// Rules directory or a single rule file (default: .berm)
        #[arg(short, long, value_name = "PATH")]
        rules_dir: Option<PathBuf>,
    },

    /// Explain what a specific rule checks
    Explain {
        rule_id: String,

        /// Directory containing policy rules (default: .berm)
        #[arg(short, long, value_name = "DIR")]
        rules_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: ExplainFormat,
    },

    /// Create a rules directory with example rules
    Init {
        /// Directory to create (default: .berm)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Overwrite the example rules if the directory exists
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Format {
    Terminal,
    Github,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ExplainFormat {
    Terminal,
    Json,
}

impl From<ExplainFormat> for OutputContext {
    fn from(format: ExplainFormat) -> Self {
        match format {
            ExplainFormat::Terminal => OutputContext::Terminal,
            ExplainFormat::Json => OutputContext::Json,
        }
    }
}

impl From<Format> for OutputContext {
    fn from(format: Format) -> Self {
        match format {
            Format::Terminal => OutputContext::Terminal,
            Format::Github => OutputContext::Github,
            Format::Json => OutputContext::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let message =
                sanitize_for_output(&format!("{e:#}"), OutputContext::Terminal, &Limits::default());
            eprintln!("Error: {message}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

/// `RUST_LOG` wins; otherwise `berm=info`, or `berm=debug` with `-v`.
fn init_tracing(verbose: u8) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose > 0 {
        EnvFilter::new("berm=debug")
    } else {
        EnvFilter::new("berm=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbose > 0)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", verbose);
}

fn run(cli: Cli) -> Result<i32> {
    let ctx = RunContext::load(cli.base_dir.as_deref(), cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let code = match cli.command {
        Command::Check {
            plan,
            rules_dir,
            format,
            strict,
        } => run_check(
            &ctx,
            &CheckOptions {
                plan,
                rules_dir,
                format: format.map(OutputContext::from),
                strict,
            },
            &mut out,
        )?,
        Command::Test {
            rules,
            plan,
            format,
            strict,
        } => run_check(
            &ctx,
            &CheckOptions {
                plan,
                rules_dir: Some(rules),
                format: format.map(OutputContext::from),
                strict,
            },
            &mut out,
        )?,
        Command::ValidateRules { rules_dir } => {
            run_validate_rules(&ctx, rules_dir.as_deref(), &mut out)?
        }
        Command::Explain {
            rule_id,
            rules_dir,
            format,
        } => run_explain(&ctx, &rule_id, rules_dir.as_deref(), format.into(), &mut out)?,
        Command::Init { dir, force } => run_init(&ctx, dir.as_deref(), force, &mut out)?,
    };

    out.flush()?;
    Ok(code)
}
