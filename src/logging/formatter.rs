use std::io::{self, Stdout};

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::Layer,
    registry::LookupSpan,
};

use super::config::{LogFormat, LoggingConfig};

/// Консольный слой форматирования по конфигурации.
///
/// Тип формата стирается через `Box`, чтобы все три варианта имели один тип.
pub fn build_formatter_from_config<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let writer: fn() -> Stdout = io::stdout;

    match config.format {
        LogFormat::Json => fmt::layer()
            .event_format(fmt::format().json().with_current_span(true))
            .with_writer(writer)
            .with_ansi(false)
            .with_target(config.with_target)
            .with_thread_ids(config.with_thread_ids)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .event_format(fmt::format().pretty())
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_thread_ids(config.with_thread_ids)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .event_format(fmt::format().compact())
            .with_writer(writer)
            .with_ansi(config.with_ansi)
            .with_target(config.with_target)
            .with_thread_ids(config.with_thread_ids)
            .boxed(),
    }
}
