use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки операций эмиттера, которые возвращаются вызывающему коду.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    /// Отрицательный (или не представимый в `usize`) лимит слушателей
    #[error("maxListeners must be a non-negative number (got {value})")]
    InvalidMaxListeners { value: String },
    /// Канал с таким именем не создавался
    #[error("channel not found: {name}")]
    UnknownChannel { name: String },
}

impl ErrorExt for EmitterError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidMaxListeners { .. } => StatusCode::InvalidArgs,
            Self::UnknownChannel { .. } => StatusCode::ChannelNotFound,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_max_listeners() {
        let err = EmitterError::InvalidMaxListeners {
            value: "-1".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
        assert_eq!(
            err.to_string(),
            "maxListeners must be a non-negative number (got -1)"
        );
    }

    #[test]
    fn test_unknown_channel() {
        let err = EmitterError::UnknownChannel {
            name: "billing".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::ChannelNotFound);
        assert_eq!(err.to_string(), "channel not found: billing");
    }
}
