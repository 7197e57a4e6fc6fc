use std::sync::Arc;

use super::{Callback, Listener};
use crate::Event;

/// Упорядоченный список слушателей одного события.
///
/// Порядок: по убыванию приоритета, при равных приоритетах - в порядке
/// добавления.
pub struct ListenerStore<E: Event> {
    listeners: Vec<Arc<Listener<E>>>,
}

impl<E: Event> ListenerStore<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Вставляет слушателя перед первым элементом со строго меньшим
    /// приоритетом.
    pub fn enqueue(
        &mut self,
        listener: Listener<E>,
    ) {
        let pos = self
            .listeners
            .iter()
            .position(|l| l.priority() < listener.priority())
            .unwrap_or(self.listeners.len());
        self.listeners.insert(pos, Arc::new(listener));
    }

    /// Удаляет слушателя с указанным токеном. `false`, если его нет.
    pub fn remove(
        &mut self,
        token: u64,
    ) -> bool {
        match self.listeners.iter().position(|l| l.token() == token) {
            Some(pos) => {
                self.listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(
        &self,
        token: u64,
    ) -> bool {
        self.listeners.iter().any(|l| l.token() == token)
    }

    /// Копия текущего порядка для одного `emit`.
    pub fn snapshot(&self) -> Vec<Arc<Listener<E>>> {
        self.listeners.clone()
    }

    pub fn callbacks(&self) -> Vec<Callback<E>> {
        self.listeners.iter().map(|l| l.callback().clone()).collect()
    }

    pub fn tokens(&self) -> Vec<u64> {
        self.listeners.iter().map(|l| l.token()).collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<E: Event> Default for ListenerStore<E> {
    fn default() -> Self {
        Self::new()
    }
}
