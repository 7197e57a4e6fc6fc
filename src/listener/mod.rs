pub mod store;

use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use emitra_error::CallbackError;

pub use store::ListenerStore;

use crate::Event;

/// Пользовательский обработчик события `E`.
pub type Callback<E> = Arc<dyn Fn(&<E as Event>::Args) -> <E as Event>::Output + Send + Sync>;

/// Как слушатель реагирует на событие.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerMode {
    /// Вызывается на каждом `emit`.
    Always,
    /// Вызывается один раз и удаляется.
    Once,
    /// Вызов откладывается через планировщик.
    Delayed(Duration),
}

/// Зарегистрированный слушатель.
pub struct Listener<E: Event> {
    token: u64,
    priority: i32,
    mode: ListenerMode,
    callback: Callback<E>,
    consumed: AtomicBool,
}

impl<E: Event> Listener<E> {
    pub fn new(
        token: u64,
        priority: i32,
        mode: ListenerMode,
        callback: Callback<E>,
    ) -> Self {
        Self {
            token,
            priority,
            mode,
            callback,
            consumed: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn mode(&self) -> ListenerMode {
        self.mode
    }

    pub fn callback(&self) -> &Callback<E> {
        &self.callback
    }

    /// Помечает once-слушатель использованным.
    ///
    /// Возвращает `true` только для первого вызова.
    pub fn try_consume(&self) -> bool {
        !self.consumed.swap(true, Ordering::AcqRel)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    /// Вызывает обработчик, перехватывая панику.
    pub fn invoke(
        &self,
        args: &E::Args,
    ) -> Result<E::Output, CallbackError> {
        invoke::<E>(&self.callback, args)
    }
}

impl<E: Event> fmt::Debug for Listener<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event", &E::NAME)
            .field("token", &self.token)
            .field("priority", &self.priority)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Вызывает обработчик; паника превращается в `CallbackError::Panicked`.
pub(crate) fn invoke<E: Event>(
    callback: &Callback<E>,
    args: &E::Args,
) -> Result<E::Output, CallbackError> {
    catch_unwind(AssertUnwindSafe(|| callback(args)))
        .map_err(|payload| CallbackError::panicked(E::NAME, panic_message(payload.as_ref())))
}

/// Текст паники из её полезной нагрузки.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
