use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

/// Фильтр уровней: `RUST_LOG` имеет приоритет, затем директива из
/// конфигурации, затем `info`.
pub fn build_filter_from_config(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return env_filter;
    }

    let directive = config.build_filter_directive();
    match EnvFilter::try_new(&directive) {
        Ok(filter) => filter,
        Err(e) => {
            // Подписчика ещё нет, поэтому только stderr.
            eprintln!("Invalid log filter directive '{directive}': {e}; falling back to 'info'");
            EnvFilter::new("info")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        sync::{Arc, Mutex},
    };

    use serial_test::serial;
    use tracing_subscriber::{fmt, prelude::*, registry::Registry};

    use super::*;

    struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> fmt::MakeWriter<'a> for VecMakeWriter {
        type Writer = VecWriterGuard;

        fn make_writer(&'a self) -> Self::Writer {
            VecWriterGuard(self.0.clone())
        }
    }

    struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for VecWriterGuard {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(
        filter: EnvFilter,
        emit: impl FnOnce(),
    ) -> String {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = fmt::layer()
            .with_writer(VecMakeWriter(buffer.clone()))
            .with_ansi(false)
            .with_filter(filter);
        tracing::subscriber::with_default(Registry::default().with(layer), emit);

        let out = buffer.lock().unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Тест проверяет, что уровень из конфигурации отсекает info.
    #[test]
    #[serial]
    fn test_filter_from_config_level() {
        env::remove_var("RUST_LOG");
        let cfg = LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };

        let out = capture(build_filter_from_config(&cfg), || {
            tracing::info!("info message is filtered");
            tracing::warn!("warn message passes");
        });

        assert!(out.contains("warn message passes"));
        assert!(!out.contains("info message is filtered"));
    }

    /// Тест проверяет, что `RUST_LOG` важнее конфигурации.
    #[test]
    #[serial]
    fn test_rust_log_wins() {
        env::set_var("RUST_LOG", "debug");
        let cfg = LoggingConfig {
            level: "error".to_string(),
            ..LoggingConfig::default()
        };
        let filter = build_filter_from_config(&cfg);
        env::remove_var("RUST_LOG");

        let out = capture(filter, || tracing::debug!("debug visible"));
        assert!(out.contains("debug visible"));
    }

    /// Тест проверяет откат на `info` при некорректной директиве.
    #[test]
    #[serial]
    fn test_invalid_directive_falls_back() {
        env::remove_var("RUST_LOG");
        let cfg = LoggingConfig {
            filter: Some("emitra=nonsense=level".to_string()),
            ..LoggingConfig::default()
        };

        let out = capture(build_filter_from_config(&cfg), || {
            tracing::debug!("debug hidden");
            tracing::info!("info shown");
        });
        assert!(out.contains("info shown"));
        assert!(!out.contains("debug hidden"));
    }
}
