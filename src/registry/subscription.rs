use std::{any::TypeId, fmt};

use super::EventRegistry;
use crate::Event;

/// Дескриптор одной регистрации слушателя.
///
/// Возвращается каждой операцией подписки и передаётся в
/// [`EventRegistry::unsubscribe`]. Повторная отписка по тому же дескриптору
/// ничего не делает.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    registry: u64,
    event: TypeId,
    name: &'static str,
    token: u64,
}

impl SubscriptionId {
    pub(crate) fn new<E: Event>(
        registry: u64,
        token: u64,
    ) -> Self {
        Self {
            registry,
            event: TypeId::of::<E>(),
            name: E::NAME,
            token,
        }
    }

    pub(crate) fn registry(&self) -> u64 {
        self.registry
    }

    pub(crate) fn event(&self) -> TypeId {
        self.event
    }

    /// Имя события, на которое оформлена подписка.
    pub fn event_name(&self) -> &'static str {
        self.name
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.token)
    }
}

/// Регистрации, сделанные одним вызовом `subscribe_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionGroup {
    ids: Vec<SubscriptionId>,
}

impl SubscriptionGroup {
    pub(crate) fn new(ids: Vec<SubscriptionId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[SubscriptionId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubscriptionId> {
        self.ids.iter()
    }
}

type Registration = Box<dyn FnOnce(&EventRegistry) -> SubscriptionId + Send>;

/// Набор пар «событие - обработчик» для `subscribe_list`.
///
/// ```
/// use emitra::{define_event, Emitter, ListenerSet};
///
/// define_event!(Connect = "connect", String);
/// define_event!(Disconnect = "disconnect", String);
///
/// let emitter = Emitter::new();
/// let group = emitter.subscribe_list(
///     ListenerSet::new()
///         .on::<Connect, _>(|peer| println!("connected: {peer}"))
///         .maybe::<Disconnect, fn(&String)>(None),
/// );
/// assert_eq!(group.len(), 1);
/// ```
#[derive(Default)]
pub struct ListenerSet {
    entries: Vec<(&'static str, Registration)>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет обработчик события `E` с приоритетом 0.
    pub fn on<E, F>(
        mut self,
        callback: F,
    ) -> Self
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        self.entries.push((
            E::NAME,
            Box::new(move |registry: &EventRegistry| registry.subscribe::<E, F>(callback)),
        ));
        self
    }

    /// Как [`ListenerSet::on`], но `None` пропускается.
    pub fn maybe<E, F>(
        self,
        callback: Option<F>,
    ) -> Self
    where
        E: Event,
        F: Fn(&E::Args) -> E::Output + Send + Sync + 'static,
    {
        match callback {
            Some(cb) => self.on::<E, F>(cb),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn register(
        self,
        registry: &EventRegistry,
    ) -> SubscriptionGroup {
        let ids = self
            .entries
            .into_iter()
            .map(|(_, register)| register(registry))
            .collect();
        SubscriptionGroup::new(ids)
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let events: Vec<&str> = self.entries.iter().map(|(name, _)| *name).collect();
        f.debug_struct("ListenerSet")
            .field("events", &events)
            .finish()
    }
}
