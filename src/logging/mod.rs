//! Настройка `tracing` для приложений, использующих эмиттер.
//!
//! Библиотека сама подписчика не устанавливает: она только пишет события
//! через `tracing`. `init_logging` нужен бинарникам, бенчмаркам и примерам.

pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
use emitra_error::{EmitraResult, GenericError, StatusCode};
pub use filters::build_filter_from_config;
pub use formatter::build_formatter_from_config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Устанавливает глобальный подписчик.
///
/// Возвращает ошибку, если конфигурация некорректна или подписчик уже
/// установлен.
pub fn init_logging(config: &LoggingConfig) -> EmitraResult<()> {
    config.validate()?;

    let env_filter = build_filter_from_config(config);
    let formatter = build_formatter_from_config(config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatter)
        .try_init()
        .map_err(|e| {
            GenericError::new(
                StatusCode::Internal,
                format!("failed to install tracing subscriber: {e}"),
            )
        })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = %config.format,
        "Logging system initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что некорректный уровень отклоняется до установки
    /// подписчика.
    #[test]
    fn test_init_logging_rejects_invalid_level() {
        let cfg = LoggingConfig {
            level: "verbose".to_string(),
            ..LoggingConfig::default()
        };
        let err = init_logging(&cfg).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::ConfigInvalid);
    }
}
