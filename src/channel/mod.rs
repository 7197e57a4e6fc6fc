mod registry;

use std::{fmt, sync::Arc};

pub use registry::ChannelRegistry;

use crate::{
    config::EmitterConfig,
    diagnostics::DiagnosticSink,
    registry::{EventRegistry, SubscriptionId},
    scheduler::Scheduler,
    EmitResult, Event,
};

/// Именованное пространство событий со своим реестром.
///
/// Слушатели канала не видят события родительского эмиттера и других
/// каналов, и наоборот.
pub struct Channel {
    name: String,
    registry: EventRegistry,
}

impl Channel {
    pub(crate) fn new(
        name: impl Into<String>,
        config: &EmitterConfig,
        sink: Arc<dyn DiagnosticSink>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            name: name.into(),
            registry: EventRegistry::from_parts(config, sink, scheduler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

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

    pub fn listener_count<E: Event>(&self) -> usize {
        self.registry.listener_count::<E>()
    }

    /// Полный API реестра канала (once, отложенные слушатели и т.д.).
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }
}

impl fmt::Debug for Channel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .finish()
    }
}
