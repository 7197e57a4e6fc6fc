//! Ошибки эмиттера: коды статуса, типизированные ошибки по областям и
//! [`StackError`] с цепочкой пояснений.

mod ext;
mod macros;
mod stack;
mod status_code;
pub mod types;

pub use ext::ErrorExt;
pub use macros::ResultExt;
pub use stack::{Frame, StackError};
pub use status_code::StatusCode;
pub use types::{CallbackError, ConfigError, EmitterError, GenericError};

pub type EmitraResult<T> = Result<T, StackError>;
