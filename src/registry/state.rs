use std::{
    any::{Any, TypeId},
    collections::{HashMap, HashSet},
};

use crate::{
    diagnostics::LeakWarning,
    listener::ListenerStore,
    scheduler::TimerHandle,
    Event,
};

/// Хранилище слушателей со стёртым типом события.
pub(crate) trait ErasedStore: Send {
    fn name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn remove(
        &mut self,
        token: u64,
    ) -> bool;

    fn tokens(&self) -> Vec<u64>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Event> ErasedStore for ListenerStore<E> {
    fn name(&self) -> &'static str {
        E::NAME
    }

    fn len(&self) -> usize {
        ListenerStore::len(self)
    }

    fn remove(
        &mut self,
        token: u64,
    ) -> bool {
        ListenerStore::remove(self, token)
    }

    fn tokens(&self) -> Vec<u64> {
        ListenerStore::tokens(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Изменяемое состояние реестра, защищённое одним мьютексом.
pub(crate) struct RegistryState {
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
    /// Порядок первого появления событий.
    order: Vec<TypeId>,
    max_listeners: usize,
    warned: HashSet<TypeId>,
    /// Взведённые таймеры отложенных слушателей по токену регистрации.
    timers: HashMap<u64, Vec<TimerHandle>>,
}

impl RegistryState {
    pub(crate) fn new(max_listeners: usize) -> Self {
        Self {
            stores: HashMap::new(),
            order: Vec::new(),
            max_listeners,
            warned: HashSet::new(),
            timers: HashMap::new(),
        }
    }

    pub(crate) fn store<E: Event>(&self) -> Option<&ListenerStore<E>> {
        self.stores
            .get(&TypeId::of::<E>())
            .and_then(|s| s.as_any().downcast_ref::<ListenerStore<E>>())
    }

    /// Хранилище события `E`, создаётся при первом обращении.
    pub(crate) fn store_entry<E: Event>(&mut self) -> &mut ListenerStore<E> {
        let type_id = TypeId::of::<E>();
        if !self.stores.contains_key(&type_id) {
            self.order.push(type_id);
        }
        self.stores
            .entry(type_id)
            .or_insert_with(|| Box::new(ListenerStore::<E>::new()))
            .as_any_mut()
            .downcast_mut::<ListenerStore<E>>()
            .unwrap_or_else(|| unreachable!("store for \"{}\" has a foreign type", E::NAME))
    }

    pub(crate) fn contains(
        &self,
        event: TypeId,
        token: u64,
    ) -> bool {
        self.stores
            .get(&event)
            .is_some_and(|s| s.tokens().contains(&token))
    }

    pub(crate) fn remove(
        &mut self,
        event: TypeId,
        token: u64,
    ) -> bool {
        self.stores
            .get_mut(&event)
            .is_some_and(|s| s.remove(token))
    }

    pub(crate) fn len_of(
        &self,
        event: TypeId,
    ) -> usize {
        self.stores.get(&event).map_or(0, |s| s.len())
    }

    /// Выдаёт предупреждение один раз на событие, пока метка не сброшена.
    pub(crate) fn check_max_listeners(
        &mut self,
        event: TypeId,
    ) -> Option<LeakWarning> {
        if self.max_listeners == 0 {
            return None;
        }
        let store = self.stores.get(&event)?;
        let count = store.len();
        if count > self.max_listeners && self.warned.insert(event) {
            return Some(LeakWarning::new(store.name(), count, self.max_listeners));
        }
        None
    }

    pub(crate) fn max_listeners(&self) -> usize {
        self.max_listeners
    }

    pub(crate) fn set_max_listeners(
        &mut self,
        limit: usize,
    ) {
        self.max_listeners = limit;
        self.warned.clear();
    }

    /// Имена событий с живыми слушателями в порядке первой подписки.
    /// Разные типы с одним `NAME` дают одно имя.
    pub(crate) fn event_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::with_capacity(self.order.len());
        for store in self.order.iter().filter_map(|id| self.stores.get(id)) {
            if store.len() > 0 && !names.contains(&store.name()) {
                names.push(store.name());
            }
        }
        names
    }

    /// Удаляет хранилище события; возвращает токены удалённых слушателей.
    pub(crate) fn remove_event(
        &mut self,
        event: TypeId,
    ) -> Vec<u64> {
        self.warned.remove(&event);
        self.order.retain(|id| *id != event);
        self.stores
            .remove(&event)
            .map(|s| s.tokens())
            .unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) -> Vec<TimerHandle> {
        self.stores.clear();
        self.order.clear();
        self.warned.clear();
        self.timers.drain().flat_map(|(_, t)| t).collect()
    }

    pub(crate) fn track_timer(
        &mut self,
        token: u64,
        handle: TimerHandle,
    ) {
        let timers = self.timers.entry(token).or_default();
        timers.retain(|t| !t.is_finished());
        timers.push(handle);
    }

    pub(crate) fn take_timers(
        &mut self,
        token: u64,
    ) -> Vec<TimerHandle> {
        self.timers.remove(&token).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        define_event,
        listener::{Listener, ListenerMode},
    };

    define_event!(Alpha = "alpha", ());
    define_event!(Beta = "beta", ());

    fn add<E: Event<Args = (), Output = ()>>(
        state: &mut RegistryState,
        token: u64,
    ) {
        state.store_entry::<E>().enqueue(Listener::new(
            token,
            0,
            ListenerMode::Always,
            Arc::new(|_: &()| {}),
        ));
    }

    /// Тест проверяет порядок имён событий и пропуск пустых хранилищ.
    #[test]
    fn test_event_names_order() {
        let mut state = RegistryState::new(10);
        add::<Beta>(&mut state, 1);
        add::<Alpha>(&mut state, 2);
        assert_eq!(state.event_names(), vec!["beta", "alpha"]);

        assert!(state.remove(TypeId::of::<Beta>(), 1));
        assert_eq!(state.event_names(), vec!["alpha"]);

        add::<Beta>(&mut state, 3);
        assert_eq!(state.event_names(), vec!["beta", "alpha"]);
    }

    /// Тест проверяет, что предупреждение выдаётся один раз до сброса метки.
    #[test]
    fn test_check_max_listeners_once() {
        let mut state = RegistryState::new(1);
        let id = TypeId::of::<Alpha>();

        add::<Alpha>(&mut state, 1);
        assert!(state.check_max_listeners(id).is_none());

        add::<Alpha>(&mut state, 2);
        let warning = state.check_max_listeners(id).unwrap();
        assert_eq!((warning.event, warning.count, warning.limit), ("alpha", 2, 1));

        add::<Alpha>(&mut state, 3);
        assert!(state.check_max_listeners(id).is_none());

        state.set_max_listeners(2);
        assert!(state.check_max_listeners(id).is_some());
    }

    /// Тест проверяет, что нулевой лимит отключает проверку.
    #[test]
    fn test_zero_limit_disables_check() {
        let mut state = RegistryState::new(0);
        for token in 0..50 {
            add::<Alpha>(&mut state, token);
        }
        assert!(state.check_max_listeners(TypeId::of::<Alpha>()).is_none());
    }

    /// Тест проверяет удаление хранилища события целиком.
    #[test]
    fn test_remove_event() {
        let mut state = RegistryState::new(10);
        add::<Alpha>(&mut state, 1);
        add::<Alpha>(&mut state, 2);

        let tokens = state.remove_event(TypeId::of::<Alpha>());
        assert_eq!(tokens, vec![1, 2]);
        assert_eq!(state.len_of(TypeId::of::<Alpha>()), 0);
        assert!(state.store::<Alpha>().is_none());
        assert!(state.event_names().is_empty());
    }
}
