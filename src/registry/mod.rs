//! Реестр слушателей: подписка, отписка и вызов обработчиков.
//!
//! Всё изменяемое состояние лежит за одним `parking_lot::Mutex`, который
//! никогда не удерживается во время вызова обработчика. Поэтому обработчик
//! может подписывать, отписывать и повторно вызывать `emit` на том же
//! реестре. `emit` работает по снимку списка слушателей, сделанному в момент
//! вызова.

mod state;
mod subscription;

use std::{
    any::TypeId,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use emitra_error::{bail, CallbackError, EmitraResult, EmitterError};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use self::state::RegistryState;
pub use self::subscription::{ListenerSet, SubscriptionGroup, SubscriptionId};
use crate::{
    config::EmitterConfig,
    diagnostics::{DiagnosticSink, TracingSink},
    listener::{invoke, Callback, Listener, ListenerMode},
    scheduler::{Scheduler, Task, TokioScheduler},
    EmitResult, Event,
};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Реестр слушателей событий.
pub struct EventRegistry {
    id: u64,
    state: Mutex<RegistryState>,
    next_token: AtomicU64,
    sink: Arc<dyn DiagnosticSink>,
    scheduler: Arc<dyn Scheduler>,
    cancel_pending: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Создание
////////////////////////////////////////////////////////////////////////////////

impl EventRegistry {
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self::from_parts(
            &config,
            Arc::new(TracingSink),
            Arc::new(TokioScheduler::new()),
        )
    }

    pub(crate) fn from_parts(
        config: &EmitterConfig,
        sink: Arc<dyn DiagnosticSink>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(RegistryState::new(config.max_listeners)),
            next_token: AtomicU64::new(1),
            sink,
            scheduler,
            cancel_pending: config.cancel_pending_on_unsubscribe,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Подписка и отписка
////////////////////////////////////////////////////////////////////////////////

impl EventRegistry {
    /// Подписывает обработчик с приоритетом 0.
    pub fn subscribe<E, F>(
        &self,
        callback: F,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.subscribe_with_priority::<E, F>(callback, 0)
    }

    /// Подписывает обработчик; больший приоритет вызывается раньше.
    pub fn subscribe_with_priority<E, F>(
        &self,
        callback: F,
        priority: i32,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.register::<E>(Arc::new(callback), priority, ListenerMode::Always)
    }

    /// Подписывает обработчик, который сработает один раз.
    pub fn once<E, F>(
        &self,
        callback: F,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.once_with_priority::<E, F>(callback, 0)
    }

    pub fn once_with_priority<E, F>(
        &self,
        callback: F,
        priority: i32,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.register::<E>(Arc::new(callback), priority, ListenerMode::Once)
    }

    /// Подписывает обработчик, вызов которого откладывается на `delay` после
    /// каждого `emit`. Возвращаемое значение обработчика отбрасывается.
    pub fn subscribe_with_delay<E, F>(
        &self,
        callback: F,
        delay: Duration,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.subscribe_with_delay_and_priority::<E, F>(callback, delay, 0)
    }

    pub fn subscribe_with_delay_and_priority<E, F>(
        &self,
        callback: F,
        delay: Duration,
        priority: i32,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.register::<E>(Arc::new(callback), priority, ListenerMode::Delayed(delay))
    }

    /// Подписывает все обработчики набора с приоритетом 0.
    pub fn subscribe_list(
        &self,
        set: ListenerSet,
    ) -> SubscriptionGroup {
        set.register(self)
    }

    fn register<E: Event>(
        &self,
        callback: Callback<E>,
        priority: i32,
        mode: ListenerMode,
    ) -> SubscriptionId {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let listener = Listener::new(token, priority, mode, callback);

        let warning = {
            let mut state = self.state.lock();
            state.store_entry::<E>().enqueue(listener);
            state.check_max_listeners(TypeId::of::<E>())
        };

        debug!(event = E::NAME, token, priority, ?mode, "Listener subscribed");

        if let Some(warning) = warning {
            self.sink.listener_leak(&warning);
        }
        SubscriptionId::new::<E>(self.id, token)
    }

    /// Удаляет ровно одну регистрацию. `false`, если её уже нет.
    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> bool {
        if id.registry() != self.id {
            return false;
        }
        let (removed, timers) = {
            let mut state = self.state.lock();
            let removed = state.remove(id.event(), id.token());
            (removed, state.take_timers(id.token()))
        };

        for timer in &timers {
            timer.cancel();
        }
        if removed {
            debug!(
                event = id.event_name(),
                token = id.token(),
                cancelled_timers = timers.len(),
                "Listener unsubscribed"
            );
        }
        removed
    }

    /// Отписывает все регистрации группы; возвращает число реально удалённых.
    pub fn unsubscribe_group(
        &self,
        group: &SubscriptionGroup,
    ) -> usize {
        group.iter().filter(|id| self.unsubscribe(**id)).count()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Вызов
////////////////////////////////////////////////////////////////////////////////

impl EventRegistry {
    /// Вызывает слушателей события по снимку, сделанному в момент вызова.
    ///
    /// Паника обработчика не прерывает обход: её место в результате занимает
    /// `CallbackError::Panicked`. Отложенные слушатели места не занимают,
    /// если только планирование не завершилось ошибкой.
    pub fn emit<E: Event>(
        &self,
        args: &E::Args,
    ) -> EmitResult<E> {
        let snapshot = match self.state.lock().store::<E>() {
            Some(store) => store.snapshot(),
            None => return Vec::new(),
        };

        trace!(event = E::NAME, listeners = snapshot.len(), "Emitting event");

        let mut results = Vec::with_capacity(snapshot.len());
        for listener in snapshot {
            match listener.mode() {
                ListenerMode::Always => {
                    results.push(self.call(&listener, args));
                }
                ListenerMode::Once => {
                    // Уже сработал во вложенном emit.
                    if !listener.try_consume() {
                        continue;
                    }
                    let result = self.call(&listener, args);
                    self.state
                        .lock()
                        .remove(TypeId::of::<E>(), listener.token());
                    results.push(result);
                }
                ListenerMode::Delayed(delay) => {
                    if let Err(err) = self.schedule(&listener, delay, args) {
                        results.push(Err(err));
                    }
                }
            }
        }
        results
    }

    fn call<E: Event>(
        &self,
        listener: &Listener<E>,
        args: &E::Args,
    ) -> Result<E::Output, CallbackError> {
        let result = listener.invoke(args);
        if let Err(err) = &result {
            warn!(event = E::NAME, token = listener.token(), error = %err, "Listener failed");
        }
        result
    }

    fn schedule<E: Event>(
        &self,
        listener: &Listener<E>,
        delay: Duration,
        args: &E::Args,
    ) -> Result<(), CallbackError> {
        let callback = listener.callback().clone();
        let args = args.clone();
        let token = listener.token();
        let task: Task = Box::new(move || {
            if let Err(err) = invoke::<E>(&callback, &args) {
                error!(event = E::NAME, token, error = %err, "Delayed listener failed");
            }
        });

        let handle = self.scheduler.schedule(delay, task).map_err(|err| {
            warn!(event = E::NAME, token, error = %err, "Failed to schedule delayed listener");
            CallbackError::schedule_failed(E::NAME, err.to_string())
        })?;

        trace!(event = E::NAME, token, delay = ?delay, "Delayed listener armed");

        if self.cancel_pending {
            let mut state = self.state.lock();
            if state.contains(TypeId::of::<E>(), token) {
                state.track_timer(token, handle);
            } else {
                // Отписан, пока таймер взводился.
                drop(state);
                handle.cancel();
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Лимиты и запросы
////////////////////////////////////////////////////////////////////////////////

impl EventRegistry {
    /// Устанавливает порог предупреждения об утечке (`0` - без лимита) и
    /// сбрасывает метки уже выданных предупреждений.
    pub fn set_max_listeners<N>(
        &self,
        limit: N,
    ) -> EmitraResult<&Self>
    where
        N: TryInto<usize> + Copy + fmt::Display,
    {
        let Ok(value) = limit.try_into() else {
            bail!(EmitterError::InvalidMaxListeners {
                value: limit.to_string(),
            });
        };
        self.state.lock().set_max_listeners(value);
        debug!(max_listeners = value, "Listener limit updated");
        Ok(self)
    }

    pub fn max_listeners(&self) -> usize {
        self.state.lock().max_listeners()
    }

    pub fn listener_count<E: Event>(&self) -> usize {
        self.state.lock().len_of(TypeId::of::<E>())
    }

    /// События с живыми слушателями в порядке первой подписки.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.state.lock().event_names()
    }

    /// Обработчики события в порядке вызова, без приоритетов.
    pub fn listeners<E: Event>(&self) -> Vec<Callback<E>> {
        self.state
            .lock()
            .store::<E>()
            .map(|s| s.callbacks())
            .unwrap_or_default()
    }

    /// Удаляет всех слушателей события `E`.
    pub fn remove_listeners<E: Event>(&self) -> &Self {
        let timers: Vec<_> = {
            let mut state = self.state.lock();
            let tokens = state.remove_event(TypeId::of::<E>());
            tokens
                .into_iter()
                .flat_map(|token| state.take_timers(token))
                .collect()
        };
        for timer in &timers {
            timer.cancel();
        }
        debug!(event = E::NAME, "Listeners removed");
        self
    }

    /// Удаляет всех слушателей всех событий.
    pub fn remove_all_listeners(&self) -> &Self {
        let timers = self.state.lock().clear();
        for timer in &timers {
            timer.cancel();
        }
        debug!("All listeners removed");
        self
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventRegistry")
            .field("id", &self.id)
            .field("events", &state.event_names())
            .field("max_listeners", &state.max_listeners())
            .field("cancel_pending", &self.cancel_pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use emitra_error::StatusCode;

    use super::*;
    use crate::{define_event, diagnostics::MemorySink};

    define_event!(Data = "data", String => usize);
    define_event!(Other = "other", ());
    define_event!(DataAlias = "data", u8);

    fn registry_with_sink(limit: usize) -> (EventRegistry, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let config = EmitterConfig {
            max_listeners: limit,
            ..EmitterConfig::default()
        };
        let registry =
            EventRegistry::from_parts(&config, sink.clone(), Arc::new(TokioScheduler::new()));
        (registry, sink)
    }

    /// Тест проверяет, что `emit` без слушателей возвращает пустой вектор.
    #[test]
    fn test_emit_without_listeners() {
        let registry = EventRegistry::new();
        assert!(registry.emit::<Data>(&"x".to_string()).is_empty());
    }

    /// Тест проверяет порядок вызова по приоритетам.
    #[test]
    fn test_priority_order() {
        let registry = EventRegistry::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        for (tag, priority) in [(0, 0), (10, 10), (-10, -10)] {
            let log = log.clone();
            registry.subscribe_with_priority::<Other, _>(
                move |_| log.lock().unwrap().push(tag),
                priority,
            );
        }

        registry.emit::<Other>(&());
        assert_eq!(*log.lock().unwrap(), vec![10, 0, -10]);
    }

    /// Тест проверяет, что повторная отписка ничего не ломает.
    #[test]
    fn test_unsubscribe_idempotent() {
        let registry = EventRegistry::new();
        let a = registry.subscribe::<Data, _>(|s| s.len());
        let _b = registry.subscribe::<Data, _>(|s| s.len() * 2);

        assert!(registry.unsubscribe(a));
        assert!(!registry.unsubscribe(a));

        let results = registry.emit::<Data>(&"abc".to_string());
        assert_eq!(results, vec![Ok(6)]);
    }

    /// Тест проверяет, что дескриптор чужого реестра игнорируется.
    #[test]
    fn test_unsubscribe_foreign_id() {
        let first = EventRegistry::new();
        let second = EventRegistry::new();
        let id = first.subscribe::<Other, _>(|_| {});
        second.subscribe::<Other, _>(|_| {});

        assert!(!second.unsubscribe(id));
        assert_eq!(second.listener_count::<Other>(), 1);
        assert!(first.unsubscribe(id));
    }

    /// Тест проверяет, что паника занимает свою позицию в результате.
    #[test]
    fn test_panic_isolated() {
        let registry = EventRegistry::new();
        registry.subscribe::<Data, _>(|_| panic!("broken listener"));
        registry.subscribe::<Data, _>(|s| s.len());

        let results = registry.emit::<Data>(&"four".to_string());
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            Err(CallbackError::panicked("data", "broken listener"))
        );
        assert_eq!(results[1], Ok(4));
    }

    /// Тест проверяет, что once-слушатель вызывается один раз даже при
    /// вложенном `emit`.
    #[test]
    fn test_once_reentrant() {
        let registry = Arc::new(EventRegistry::new());
        let calls = Arc::new(StdMutex::new(0));

        let inner = Arc::downgrade(&registry);
        let c = calls.clone();
        registry.once::<Other, _>(move |_| {
            *c.lock().unwrap() += 1;
            if let Some(reg) = inner.upgrade() {
                reg.emit::<Other>(&());
            }
        });

        let results = registry.emit::<Other>(&());
        assert_eq!(results.len(), 1);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(registry.listener_count::<Other>(), 0);
    }

    /// Тест проверяет предупреждение об утечке и его сброс.
    #[test]
    fn test_leak_warning_once_per_event() {
        let (registry, sink) = registry_with_sink(3);
        for _ in 0..5 {
            registry.subscribe::<Other, _>(|_| {});
        }
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.warnings()[0].count, 4);

        registry.set_max_listeners(3).unwrap();
        registry.subscribe::<Other, _>(|_| {});
        assert_eq!(sink.len(), 2);
    }

    /// Тест проверяет отказ для отрицательного лимита.
    #[test]
    fn test_set_max_listeners_negative() {
        let registry = EventRegistry::new();
        let err = registry.set_max_listeners(-1).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidArgs);
        assert!(err
            .to_string()
            .contains("maxListeners must be a non-negative number"));
        assert_eq!(registry.max_listeners(), 10);
    }

    /// Тест проверяет, что без runtime отложенный слушатель даёт
    /// `ScheduleFailed`.
    #[test]
    fn test_delay_without_runtime() {
        let registry = EventRegistry::new();
        registry.subscribe_with_delay::<Data, _>(|s| s.len(), Duration::from_millis(5));
        registry.subscribe::<Data, _>(|s| s.len());

        let results = registry.emit::<Data>(&"ab".to_string());
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(CallbackError::ScheduleFailed { .. })
        ));
        assert_eq!(results[1], Ok(2));
    }

    /// Тест проверяет, что два типа с одним именем хранятся раздельно, а в
    /// `event_names` имя не повторяется.
    #[test]
    fn test_same_name_different_types() {
        let registry = EventRegistry::new();
        registry.subscribe::<Data, _>(|s| s.len());
        registry.subscribe::<Other, _>(|_| {});
        registry.subscribe::<DataAlias, _>(|_| {});

        assert_eq!(registry.event_names(), vec!["data", "other"]);
        assert_eq!(registry.listener_count::<Data>(), 1);
        assert_eq!(registry.listener_count::<DataAlias>(), 1);
        assert_eq!(registry.emit::<DataAlias>(&7).len(), 1);
    }

    /// Тест проверяет, что взведённый таймер попадает в трассировку с
    /// задержкой в исходном виде.
    #[tokio::test(start_paused = true)]
    async fn test_delay_traced_without_truncation() {
        use std::io;

        use tracing_subscriber::{fmt, prelude::*, registry::Registry};

        #[derive(Clone)]
        struct Buf(Arc<StdMutex<Vec<u8>>>);

        impl io::Write for Buf {
            fn write(
                &mut self,
                data: &[u8],
            ) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buf = Buf(Arc::new(StdMutex::new(Vec::new())));
        let writer = buf.clone();
        let layer = fmt::layer()
            .with_writer(move || writer.clone())
            .with_ansi(false);
        let _guard = tracing::subscriber::set_default(Registry::default().with(layer));

        let registry = EventRegistry::new();
        registry.subscribe_with_delay::<Data, _>(|s| s.len(), Duration::MAX);
        assert!(registry.emit::<Data>(&"x".to_string()).is_empty());

        let out = String::from_utf8_lossy(&buf.0.lock().unwrap()).to_string();
        assert!(out.contains("Delayed listener armed"));
        assert!(out.contains(&format!("delay={:?}", Duration::MAX)));
    }
}
