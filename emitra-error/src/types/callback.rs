use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка, пойманная при вызове слушателя.
///
/// Никогда не пробрасывается из `emit`: она занимает позицию слушателя в
/// векторе результатов, а обход остальных слушателей продолжается.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Слушатель запаниковал
    #[error("listener for event \"{event}\" panicked: {message}")]
    Panicked { event: String, message: String },
    /// Не удалось поставить отложенный вызов в планировщик
    #[error("failed to schedule delayed listener for event \"{event}\": {reason}")]
    ScheduleFailed { event: String, reason: String },
}

impl CallbackError {
    pub fn panicked(
        event: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Panicked {
            event: event.into(),
            message: message.into(),
        }
    }

    pub fn schedule_failed(
        event: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ScheduleFailed {
            event: event.into(),
            reason: reason.into(),
        }
    }

    /// Имя события, на котором произошла ошибка.
    pub fn event(&self) -> &str {
        match self {
            Self::Panicked { event, .. } | Self::ScheduleFailed { event, .. } => event,
        }
    }
}

impl ErrorExt for CallbackError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Panicked { .. } => StatusCode::CallbackPanicked,
            Self::ScheduleFailed { .. } => StatusCode::ScheduleFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
