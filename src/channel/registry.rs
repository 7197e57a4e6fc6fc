use std::{fmt, sync::Arc};

use dashmap::DashMap;
use emitra_error::{EmitraResult, EmitterError};
use parking_lot::RwLock;
use tracing::debug;

use super::Channel;
use crate::{config::EmitterConfig, diagnostics::DiagnosticSink, scheduler::Scheduler};

/// Реестр каналов: имя → канал, создаётся при первом обращении.
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<Channel>>,
    config: RwLock<EmitterConfig>,
    sink: Arc<dyn DiagnosticSink>,
    scheduler: Arc<dyn Scheduler>,
}

impl ChannelRegistry {
    /// Каналы наследуют конфигурацию, приёмник и планировщик.
    ///
    /// Конфигурация берётся на момент создания канала: после этого лимит
    /// канала меняется только через `channel.registry()`.
    pub fn new(
        config: EmitterConfig,
        sink: Arc<dyn DiagnosticSink>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            channels: DashMap::new(),
            config: RwLock::new(config),
            sink,
            scheduler,
        }
    }

    /// Возвращает канал `name`, создавая его при первом обращении.
    ///
    /// Повторные вызовы с тем же именем возвращают тот же `Arc`.
    pub fn channel(
        &self,
        name: &str,
    ) -> Arc<Channel> {
        if let Some(existing) = self.channels.get(name) {
            return Arc::clone(existing.value());
        }
        let entry = self.channels.entry(name.to_string()).or_insert_with(|| {
            debug!(channel = name, "Channel created");
            Arc::new(Channel::new(
                name,
                &self.config.read(),
                Arc::clone(&self.sink),
                Arc::clone(&self.scheduler),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Лимит слушателей для каналов, которые будут созданы позже.
    pub(crate) fn set_max_listeners(
        &self,
        limit: usize,
    ) {
        self.config.write().max_listeners = limit;
    }

    /// Существующий канал без создания.
    pub fn get(
        &self,
        name: &str,
    ) -> EmitraResult<Arc<Channel>> {
        match self.channels.get(name) {
            Some(ch) => Ok(Arc::clone(ch.value())),
            None => Err(EmitterError::UnknownChannel {
                name: name.to_string(),
            }
            .into()),
        }
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.channels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Имена каналов в алфавитном порядке.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.names())
            .finish()
    }
}
