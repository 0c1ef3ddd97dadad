use crate::config::LogConfig;
use std::borrow::Cow;
use tracing::level_filters::{LevelFilter, ParseLevelFilterError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Layer, fmt};

#[crumb_derive::crumb_error]
pub enum TelemetryError {
    #[error("Invalid log level{}: {source}", format_context(.context))]
    Level { source: ParseLevelFilterError, context: Option<Cow<'static, str>> },

    #[error("Invalid log filter{}: {source}", format_context(.context))]
    Filter { source: tracing_subscriber::filter::ParseError, context: Option<Cow<'static, str>> },

    #[error("Subscriber initialization error{}: {source}", format_context(.context))]
    Init { source: tracing_subscriber::util::TryInitError, context: Option<Cow<'static, str>> },
}

/// Installs the global subscriber: an `EnvFilter` seeded from `RUST_LOG` and the configured
/// directives, and one console layer, compact or JSON.
///
/// # Errors
/// Fails on malformed directives or if a global subscriber is already set.
pub fn init(cfg: &LogConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(cfg)?;

    let layer = if cfg.json {
        fmt::layer().json().with_current_span(true).with_span_list(false).boxed()
    } else {
        fmt::layer().compact().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("Global subscriber already set")?;

    Ok(())
}

fn build_filter(cfg: &LogConfig) -> Result<EnvFilter, TelemetryError> {
    let level = cfg.level.parse::<LevelFilter>().context("Parsing log level")?;
    let mut filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    if let Some(directives) = &cfg.filter {
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let directive =
                directive.parse::<Directive>().context("Parsing log filter")?;
            filter = filter.add_directive(directive);
        }
    }

    Ok(filter)
}
