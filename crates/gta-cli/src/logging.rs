//! Tracing setup for the binary.
//!
//! `plain` prints info events as the bare message and prefixes every other
//! level, e.g. `[WARN] Failed to grant role role=roles/viewer`. `json` emits
//! one JSON object per event. Both write to stderr.

use std::fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LogFormat, Verbosity};

/// Dependencies that are noisy below `warn`.
const QUIET_TARGETS: &str = "hyper=warn,reqwest=warn,rustls=warn,h2=warn";

/// Event formatter for the `plain` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormat;

impl<S, N> FormatEvent<S, N> for PlainFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if let Some(prefix) = level_prefix(event.metadata().level()) {
            writer.write_str(prefix)?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_prefix(level: &Level) -> Option<&'static str> {
    match *level {
        Level::INFO => None,
        Level::WARN => Some("[WARN] "),
        Level::ERROR => Some("[ERROR] "),
        Level::DEBUG => Some("[DEBUG] "),
        _ => Some("[TRACE] "),
    }
}

/// Build the filter: the configured level, then any `RUST_LOG` directives.
pub fn build_filter(
    verbosity: Verbosity,
    rust_log: Option<&str>,
) -> Result<EnvFilter, ConfigError> {
    let mut directives = format!("{},{QUIET_TARGETS}", verbosity.as_directive());
    if let Some(extra) = rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        directives.push(',');
        directives.push_str(extra);
    }
    EnvFilter::try_new(&directives).map_err(|e| ConfigError::invalid_value("RUST_LOG", e))
}

/// Build the subscriber for `format`, writing events to `writer`.
pub fn subscriber<W>(
    format: LogFormat,
    filter: EnvFilter,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer);

    match format {
        LogFormat::Plain => Box::new(builder.event_format(PlainFormat).finish()),
        LogFormat::Json => Box::new(builder.json().with_current_span(false).finish()),
    }
}

/// Install the global subscriber.
pub fn init(verbosity: Verbosity, format: LogFormat) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref())?;

    subscriber(format, filter, std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}
