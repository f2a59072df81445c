use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tilearc_cli::{CommandContext, Commands, ConfigArgs, OutputFormat, run};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tilearc",
    about = "Build, validate and query the path index of 3D tile archives",
    version,
    long_about = "A command-line tool for the MD5-keyed side index of 3D tile zip archives (.3tz): generate it from an archive or a zipinfo report, extract it from an archive trailer, search, list, validate and repair it."
)]
struct Cli {
    /// Set the logging level (RUST_LOG takes precedence)
    #[arg(short, long, value_enum, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::default().add_directive(Level::from(cli.log_level).into())
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let ctx = CommandContext {
        format: cli.format,
        config: cli.config.to_config(),
    };

    if run(cli.command, &ctx)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
