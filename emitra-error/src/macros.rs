use crate::StackError;

/// Выходит из функции с ошибкой, завёрнутой в [`StackError`].
///
/// `bail!(err)` принимает любой тип с `ErrorExt`, а `bail!(code, "fmt", ..)`
/// собирает [`crate::GenericError`] из кода и сообщения.
#[macro_export]
macro_rules! bail {
    ($err:expr $(,)?) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $($fmt:tt)+) => {
        return Err($crate::StackError::new($crate::GenericError::new(
            $code,
            format!($($fmt)+),
        )))
    };
}

/// `.context(..)` для любого `Result`, ошибка которого сводится к
/// [`StackError`].
pub trait ResultExt<T> {
    fn context(
        self,
        msg: impl Into<String>,
    ) -> Result<T, StackError>;
}

impl<T, E: Into<StackError>> ResultExt<T> for Result<T, E> {
    #[track_caller]
    fn context(
        self,
        msg: impl Into<String>,
    ) -> Result<T, StackError> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(e.into().context(msg)),
        }
    }
}
