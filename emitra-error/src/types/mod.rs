//! Типизированные ошибки, по одному enum на область.

mod callback;
mod config;
mod emitter;

use std::any::Any;

pub use callback::CallbackError;
pub use config::ConfigError;
pub use emitter::EmitterError;
use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка без собственного типа: только код и текст.
///
/// Используется там, где причина приходит из сторонней библиотеки строкой
/// (установка подписчика `tracing`, отсутствие runtime у планировщика).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenericError {
    code: StatusCode,
    message: String,
}

impl GenericError {
    pub fn new(
        code: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl ErrorExt for GenericError {
    fn status_code(&self) -> StatusCode {
        self.code
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет, что код и текст передаются как есть.
    #[test]
    fn test_generic_error() {
        let err = GenericError::new(StatusCode::SchedulerUnavailable, "no tokio runtime");
        assert_eq!(err.status_code(), StatusCode::SchedulerUnavailable);
        assert_eq!(err.to_string(), "no tokio runtime");
    }
}
