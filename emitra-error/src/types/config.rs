use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки загрузки и проверки конфигурации.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Значение поля не прошло проверку
    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
    /// Источник конфигурации не удалось прочитать или разобрать
    #[error("failed to load configuration: {reason}")]
    Load { reason: String },
}

impl ErrorExt for ConfigError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Invalid { .. } => StatusCode::ConfigInvalid,
            Self::Load { .. } => StatusCode::ConfigLoadFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
