//! Project-wide utility for initializing tracing output.
use serde::Deserialize;
use snafu::ResultExt;
use std::env;
use tracing::Subscriber;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, EnvFilter, Registry};

const DEFAULT_TRACING_FILTER_DIRECTIVE: LevelFilter = LevelFilter::INFO;

const TRACING_FILTER_DIRECTIVE_ENV_VAR: &str = "TRACING_FILTER_DIRECTIVE";
const LOGGING_FORMATTER_ENV_VAR: &str = "LOGGING_FORMATTER";
const LOGGING_ANSI_ENABLED_ENV_VAR: &str = "LOGGING_ANSI_ENABLED";

/// The message format for logging tracing events.
///
/// See https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/format/index.html
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, single-line logs for each event.
    Full,
    /// A variant of the default formatter optimized for short line lengths.
    Compact,
    #[default]
    /// Pretty-formatted multi-line logs optimized for human readability.
    Pretty,
    /// Newline-delimited JSON logs.
    Json,
}

impl LogFormat {
    fn try_from_env() -> Result<Self> {
        env::var(LOGGING_FORMATTER_ENV_VAR)
            .ok()
            .map(|format| {
                serde_plain::from_str(&format).context(error::LogFormatEnvSnafu { env_value: format })
            })
            .unwrap_or(Ok(Default::default()))
    }
}

fn ansi_enabled_from_env() -> Result<bool> {
    env::var(LOGGING_ANSI_ENABLED_ENV_VAR)
        .ok()
        .map(|ansi_enabled_str| {
            ansi_enabled_str
                .to_lowercase()
                .parse()
                .context(error::LogAnsiEnvSnafu {
                    env_value: ansi_enabled_str.to_string(),
                })
        })
        .unwrap_or(Ok(false))
}

pub fn init_telemetry_from_env() -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(DEFAULT_TRACING_FILTER_DIRECTIVE.into())
        .with_env_var(TRACING_FILTER_DIRECTIVE_ENV_VAR)
        .from_env_lossy();
    let ansi = ansi_enabled_from_env()?;

    let registry = Registry::default().with(env_filter);
    // The layers are all different types and can't be boxed individually, so box the whole
    // subscriber per format.
    let subscriber: Box<dyn Subscriber + Send + Sync> = match LogFormat::try_from_env()? {
        LogFormat::Full => Box::new(registry.with(fmt::layer().with_ansi(ansi))),
        LogFormat::Compact => Box::new(registry.with(fmt::layer().compact().with_ansi(ansi))),
        LogFormat::Pretty => Box::new(registry.with(fmt::layer().pretty().with_ansi(ansi))),
        LogFormat::Json => Box::new(registry.with(fmt::layer().json().with_ansi(ansi))),
    };

    tracing::subscriber::set_global_default(subscriber)
        .context(error::TracingConfigurationSnafu)?;

    Ok(())
}

pub mod error {
    use std::str::ParseBoolError;

    use super::*;
    use snafu::Snafu;

    #[derive(Debug, Snafu)]
    #[snafu(visibility(pub))]
    pub enum TelemetryConfigError {
        #[snafu(display("Error configuring tracing: '{}'", source))]
        TracingConfiguration {
            source: tracing::subscriber::SetGlobalDefaultError,
        },

        #[snafu(display(
            "Could not parse formatter from environment variable '{}={}': '{}'",
            LOGGING_FORMATTER_ENV_VAR,
            env_value,
            source
        ))]
        LogFormatEnv {
            source: serde_plain::Error,
            env_value: String,
        },

        #[snafu(display(
            "Could not parse ANSI enablement from environment variable '{}={}': '{}'",
            LOGGING_ANSI_ENABLED_ENV_VAR,
            env_value,
            source
        ))]
        LogAnsiEnv {
            source: ParseBoolError,
            env_value: String,
        },
    }
}

type Result<T> = std::result::Result<T, TelemetryConfigError>;
pub use error::TelemetryConfigError;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_documented_formatter_name_parses() {
        for (name, expected) in [
            ("full", LogFormat::Full),
            ("compact", LogFormat::Compact),
            ("pretty", LogFormat::Pretty),
            ("json", LogFormat::Json),
        ] {
            let parsed: LogFormat = serde_plain::from_str(name).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn pretty_is_the_default_format() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
