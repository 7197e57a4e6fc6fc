use std::{fmt, sync::Arc, time::Duration};

use emitra_error::EmitraResult;

use crate::{
    channel::{Channel, ChannelRegistry},
    config::EmitterConfig,
    diagnostics::{DiagnosticSink, TracingSink},
    listener::Callback,
    registry::{EventRegistry, ListenerSet, SubscriptionGroup, SubscriptionId},
    scheduler::{Scheduler, TokioScheduler},
    EmitResult, Event,
};

/// Эмиттер событий: глобальное пространство плюс именованные каналы.
///
/// ```
/// use emitra::{define_event, Emitter};
///
/// define_event!(MyEvent = "myEvent", () => i64);
///
/// let emitter = Emitter::new();
/// emitter.subscribe::<MyEvent, _>(|_| 1);
/// emitter.subscribe::<MyEvent, _>(|_| 2);
///
/// let results: Vec<i64> = emitter
///     .emit::<MyEvent>(&())
///     .into_iter()
///     .map(Result::unwrap)
///     .collect();
/// assert_eq!(results, vec![1, 2]);
/// ```
pub struct Emitter {
    registry: EventRegistry,
    channels: ChannelRegistry,
}

////////////////////////////////////////////////////////////////////////////////
// Создание
////////////////////////////////////////////////////////////////////////////////

impl Emitter {
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> EmitterBuilder {
        EmitterBuilder::default()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Делегирование реестру
////////////////////////////////////////////////////////////////////////////////

impl Emitter {
    pub fn subscribe<E, F>(
        &self,
        callback: F,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.registry.subscribe::<E, F>(callback)
    }

    pub fn subscribe_with_priority<E, F>(
        &self,
        callback: F,
        priority: i32,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.registry
            .subscribe_with_priority::<E, F>(callback, priority)
    }

    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> bool {
        self.registry.unsubscribe(id)
    }

    pub fn emit<E: Event>(
        &self,
        args: &E::Args,
    ) -> EmitResult<E> {
        self.registry.emit::<E>(args)
    }

    pub fn once<E, F>(
        &self,
        callback: F,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.registry.once::<E, F>(callback)
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
        self.registry.once_with_priority::<E, F>(callback, priority)
    }

    pub fn subscribe_list(
        &self,
        set: ListenerSet,
    ) -> SubscriptionGroup {
        self.registry.subscribe_list(set)
    }

    pub fn unsubscribe_group(
        &self,
        group: &SubscriptionGroup,
    ) -> usize {
        self.registry.unsubscribe_group(group)
    }

    pub fn subscribe_with_delay<E, F>(
        &self,
        callback: F,
        delay: Duration,
    ) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.registry.subscribe_with_delay::<E, F>(callback, delay)
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
        self.registry
            .subscribe_with_delay_and_priority::<E, F>(callback, delay, priority)
    }

    pub fn set_max_listeners<N>(
        &self,
        limit: N,
    ) -> EmitraResult<&Self>
    where
        N: TryInto<usize> + Copy + fmt::Display,
    {
        self.registry.set_max_listeners(limit)?;
        self.channels.set_max_listeners(self.registry.max_listeners());
        Ok(self)
    }

    pub fn max_listeners(&self) -> usize {
        self.registry.max_listeners()
    }

    pub fn listener_count<E: Event>(&self) -> usize {
        self.registry.listener_count::<E>()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.registry.event_names()
    }

    pub fn listeners<E: Event>(&self) -> Vec<Callback<E>> {
        self.registry.listeners::<E>()
    }

    pub fn remove_listeners<E: Event>(&self) -> &Self {
        self.registry.remove_listeners::<E>();
        self
    }

    pub fn remove_all_listeners(&self) -> &Self {
        self.registry.remove_all_listeners();
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Каналы
////////////////////////////////////////////////////////////////////////////////

impl Emitter {
    /// Канал `name`; создаётся при первом обращении.
    pub fn channel(
        &self,
        name: &str,
    ) -> Arc<Channel> {
        self.channels.channel(name)
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }
}

impl fmt::Debug for Emitter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("registry", &self.registry)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Построитель [`Emitter`].
#[derive(Default)]
pub struct EmitterBuilder {
    config: EmitterConfig,
    sink: Option<Arc<dyn DiagnosticSink>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl EmitterBuilder {
    pub fn config(
        mut self,
        config: EmitterConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn max_listeners(
        mut self,
        limit: usize,
    ) -> Self {
        self.config.max_listeners = limit;
        self
    }

    pub fn cancel_pending_on_unsubscribe(
        mut self,
        cancel: bool,
    ) -> Self {
        self.config.cancel_pending_on_unsubscribe = cancel;
        self
    }

    /// Приёмник предупреждений (по умолчанию [`TracingSink`]).
    pub fn sink(
        mut self,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Планировщик отложенных вызовов (по умолчанию [`TokioScheduler`]).
    pub fn scheduler(
        mut self,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Emitter {
        let sink: Arc<dyn DiagnosticSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(TracingSink),
        };
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::new()),
        };

        Emitter {
            registry: EventRegistry::from_parts(
                &self.config,
                Arc::clone(&sink),
                Arc::clone(&scheduler),
            ),
            channels: ChannelRegistry::new(self.config, sink, scheduler),
        }
    }
}

impl fmt::Debug for EmitterBuilder {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("config", &self.config)
            .field("custom_sink", &self.sink.is_some())
            .field("custom_scheduler", &self.scheduler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{define_event, diagnostics::MemorySink};

    define_event!(Hit = "hit", ());

    /// Тест проверяет, что построитель передаёт лимит и приёмник каналам.
    #[test]
    fn test_builder_propagates_to_channels() {
        let sink = Arc::new(MemorySink::new());
        let emitter = Emitter::builder()
            .max_listeners(1)
            .sink(sink.clone())
            .build();

        assert_eq!(emitter.max_listeners(), 1);

        let ch = emitter.channel("audit");
        ch.subscribe::<Hit, _>(|_| {});
        ch.subscribe::<Hit, _>(|_| {});
        assert_eq!(sink.len(), 1);
        assert_eq!(ch.registry().max_listeners(), 1);
    }

    /// Тест проверяет цепочку вызовов после `set_max_listeners`.
    #[test]
    fn test_chaining() {
        let emitter = Emitter::new();
        emitter.subscribe::<Hit, _>(|_| {});

        let count = emitter
            .set_max_listeners(20)
            .unwrap()
            .remove_all_listeners()
            .listener_count::<Hit>();

        assert_eq!(count, 0);
        assert_eq!(emitter.max_listeners(), 20);
    }
}
