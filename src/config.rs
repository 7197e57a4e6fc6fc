use config::{Config, Environment};
use emitra_error::{ConfigError, EmitraResult, ResultExt};
use serde::{Deserialize, Serialize};

/// Префикс переменных окружения по умолчанию (`EMITRA_MAX_LISTENERS=25`).
pub const ENV_PREFIX: &str = "EMITRA";

/// Лимит слушателей на событие, после которого выдаётся предупреждение.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Настройки эмиттера.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Порог предупреждения об утечке; `0` отключает проверку.
    pub max_listeners: usize,
    /// Отменять ли уже взведённые таймеры отложенного слушателя при отписке.
    pub cancel_pending_on_unsubscribe: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            cancel_pending_on_unsubscribe: false,
        }
    }
}

impl EmitterConfig {
    /// Загружает настройки: значения по умолчанию + переменные `EMITRA_*`.
    pub fn load() -> EmitraResult<Self> {
        Self::load_with_prefix(ENV_PREFIX)
    }

    pub fn load_with_prefix(prefix: &str) -> EmitraResult<Self> {
        let defaults = Self::default();
        let cfg = Config::builder()
            .set_default("max_listeners", defaults.max_listeners as i64)
            .and_then(|b| {
                b.set_default(
                    "cancel_pending_on_unsubscribe",
                    defaults.cancel_pending_on_unsubscribe,
                )
            })
            .map_err(load_error)?
            // EMITRA_MAX_LISTENERS, EMITRA_CANCEL_PENDING_ON_UNSUBSCRIBE
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()
            .map_err(load_error)?;

        let loaded: Self = cfg
            .try_deserialize()
            .map_err(load_error)
            .context(format!("reading {prefix}_* variables"))?;
        tracing::debug!(
            prefix,
            max_listeners = loaded.max_listeners,
            cancel_pending = loaded.cancel_pending_on_unsubscribe,
            "Emitter configuration loaded"
        );
        Ok(loaded)
    }
}

fn load_error(err: config::ConfigError) -> ConfigError {
    ConfigError::Load {
        reason: err.to_string(),
    }
}
