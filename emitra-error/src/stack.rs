use std::{fmt, panic::Location, sync::Arc};

use crate::{ErrorExt, StatusCode};

/// Ошибка, которую возвращают все `EmitraResult`-операции.
///
/// Внутри лежит типизированная причина и список пояснений, добавленных по
/// пути наверх через [`StackError::context`]. Каждое пояснение помнит место
/// вызова.
#[derive(Clone)]
pub struct StackError {
    cause: Arc<dyn ErrorExt>,
    frames: Vec<Frame>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub message: String,
    pub location: &'static Location<'static>,
}

impl StackError {
    pub fn new<E: ErrorExt>(err: E) -> Self {
        Self {
            cause: Arc::new(err),
            frames: Vec::new(),
        }
    }

    #[track_caller]
    pub fn context(
        mut self,
        msg: impl Into<String>,
    ) -> Self {
        self.frames.push(Frame {
            message: msg.into(),
            location: Location::caller(),
        });
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.cause.status_code()
    }

    /// Пояснения в порядке добавления (от внутреннего к внешнему).
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn downcast_ref<T: ErrorExt>(&self) -> Option<&T> {
        self.cause.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "[{}] {}", self.status_code(), self.cause)?;
        for frame in self.frames.iter().rev() {
            writeln!(
                f,
                "  at {} ({}:{})",
                frame.message,
                frame.location.file(),
                frame.location.line()
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for StackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for frame in self.frames.iter().rev() {
            write!(f, "{}: ", frame.message)?;
        }
        write!(f, "{}", self.cause)
    }
}

impl std::error::Error for StackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

impl<E: ErrorExt> From<E> for StackError {
    fn from(e: E) -> Self {
        StackError::new(e)
    }
}
