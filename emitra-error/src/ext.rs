use std::{any::Any, error::Error};

use crate::StatusCode;

/// Общий интерфейс типизированных ошибок эмиттера.
///
/// Реализуется каждым enum из [`crate::types`]; [`crate::StackError`]
/// хранит ошибку как `dyn ErrorExt` и через [`ErrorExt::as_any`] отдаёт
/// исходный тип обратно.
pub trait ErrorExt: Error + Send + Sync + 'static {
    fn status_code(&self) -> StatusCode;

    fn as_any(&self) -> &dyn Any;
}
