use std::{fmt, str::FromStr};

use config::{Config, Environment};
use emitra_error::{ConfigError, EmitraResult};
use serde::{Deserialize, Serialize};

/// Формат вывода логов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid {
                field: "logging.format".to_string(),
                reason: format!("unknown format '{other}'"),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: trace, debug, info, warn, error.
    pub level: String,
    /// Дополнительные директивы `EnvFilter`, например `emitra=trace`.
    pub filter: Option<String>,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            filter: None,
            format: LogFormat::Compact,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Загружает настройки из переменных `EMITRA_LOG_*`.
    pub fn load() -> EmitraResult<Self> {
        Self::load_with_prefix("EMITRA_LOG")
    }

    pub fn load_with_prefix(prefix: &str) -> EmitraResult<Self> {
        let cfg = Config::builder()
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()
            .map_err(|e| ConfigError::Load {
                reason: e.to_string(),
            })?;
        let loaded: Self = cfg.try_deserialize().map_err(|e| ConfigError::Load {
            reason: e.to_string(),
        })?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> EmitraResult<()> {
        tracing::Level::from_str(&self.level).map_err(|_| ConfigError::Invalid {
            field: "logging.level".to_string(),
            reason: format!("unknown level '{}'", self.level),
        })?;
        Ok(())
    }

    /// Директива для `EnvFilter`: уровень плюс дополнительные правила.
    pub fn build_filter_directive(&self) -> String {
        match self.filter.as_deref() {
            Some(extra) if !extra.trim().is_empty() => format!("{},{}", self.level, extra.trim()),
            _ => self.level.clone(),
        }
    }
}
