use crate::cli::{Args, ColorChoice};

/// Environment variable holding the log filter, e.g. `AWSL_LOG=awsl=trace`.
pub const LOG_ENV: &str = "AWSL_LOG";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub json: bool,
    pub compact: bool,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            quiet: args.quiet,
            json: args.json,
            compact: args.compact,
        }
    }

    /// Filter used when `AWSL_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// Installs the stderr log subscriber. `AWSL_LOG` overrides the level chosen
/// by `--verbose`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(config.color_enabled);

    // A subscriber may already be installed when embedded in a host binary.
    let _ = tracing_subscriber::registry().with(layer).with(filter).try_init();
}
