//! Однократные таймеры для отложенных слушателей.

use std::{fmt, time::Duration};

use emitra_error::{EmitraResult, GenericError, StatusCode};
use tokio::{runtime::Handle, task::AbortHandle, time::Instant};

/// Задача, которую планировщик выполняет после задержки.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Управление взведённым таймером.
pub trait TimerControl: Send + Sync {
    /// Отменяет таймер, если он ещё не сработал.
    fn cancel(&self);

    fn is_finished(&self) -> bool;
}

impl TimerControl for AbortHandle {
    fn cancel(&self) {
        self.abort();
    }

    fn is_finished(&self) -> bool {
        AbortHandle::is_finished(self)
    }
}

/// Дескриптор одного запланированного вызова.
pub struct TimerHandle(Box<dyn TimerControl>);

impl TimerHandle {
    pub fn new<T: TimerControl + 'static>(control: T) -> Self {
        Self(Box::new(control))
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Планировщик однократных отложенных задач.
pub trait Scheduler: Send + Sync {
    fn schedule(
        &self,
        delay: Duration,
        task: Task,
    ) -> EmitraResult<TimerHandle>;
}

/// Срок для задержек, не помещающихся в `Instant` (около 30 лет).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Планировщик поверх таймеров tokio.
///
/// Срок вычисляется в момент планирования (`Instant::now() + delay`), поэтому
/// задачи срабатывают в порядке своих сроков, а не порядке создания.
#[derive(Debug, Clone, Default)]
pub struct TokioScheduler {
    handle: Option<Handle>,
}

impl TokioScheduler {
    /// Использует runtime потока, вызвавшего `emit`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Всегда планирует на указанном runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Захватывает runtime текущего потока, если он есть.
    pub fn current() -> Self {
        Self {
            handle: Handle::try_current().ok(),
        }
    }

    fn runtime(&self) -> EmitraResult<Handle> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }
        Handle::try_current().map_err(|e| {
            GenericError::new(
                StatusCode::SchedulerUnavailable,
                format!("no tokio runtime available: {e}"),
            )
            .into()
        })
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        delay: Duration,
        task: Task,
    ) -> EmitraResult<TimerHandle> {
        let runtime = self.runtime()?;
        // Instant::now() под паузой тестового runtime читает его часы.
        let _enter = runtime.enter();
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);
        let join = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task();
        });
        Ok(TimerHandle::new(join.abort_handle()))
    }
}
