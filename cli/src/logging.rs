//! Logging setup shared by all commands.

use clap::Args;
use tracing_subscriber::EnvFilter;

/// Log verbosity flags.
#[derive(Debug, Args)]
pub struct LogArgs {
    /// The log verbosity.
    #[arg(
        long = "log-level",
        default_value_t = LogLevel::Warn,
        value_enum,
        ignore_case = true,
        global = true
    )]
    pub level: LogLevel,
}

/// The log verbosity. Invalid values are rejected by the argument parser
/// before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Everything, token stream included.
    Trace,
    /// Resolution misses, constant cycles.
    Debug,
    /// Run progress.
    Info,
    /// Duplicates and skipped files.
    Warn,
    /// Failures only.
    Error,
    /// Nothing.
    Off,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Initializes logging. Panics if called twice.
pub fn init_logging(args: &LogArgs) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(args.level.as_filter()))
        .with_target(false)
        .init();
}
