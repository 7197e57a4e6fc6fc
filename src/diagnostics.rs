//! Приёмник диагностических сообщений реестра.
//!
//! Реестр не пишет предупреждения напрямую: он передаёт их в
//! [`DiagnosticSink`], заданный при создании. По умолчанию используется
//! [`TracingSink`], в тестах удобен [`MemorySink`].

use std::fmt;

use emitra_error::StatusCode;
use parking_lot::Mutex;

/// Цель `tracing`, под которой выдаются предупреждения об утечке.
pub const LEAK_TARGET: &str = "emitra::leak";

/// Предупреждение о возможной утечке слушателей.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakWarning {
    pub event: &'static str,
    pub count: usize,
    pub limit: usize,
}

impl LeakWarning {
    pub fn new(
        event: &'static str,
        count: usize,
        limit: usize,
    ) -> Self {
        Self {
            event,
            count,
            limit,
        }
    }

    /// Код, под которым предупреждение попадает в логи и метрики.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::ListenerLimitExceeded
    }
}

impl fmt::Display for LeakWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "Possible memory leak detected. {} listeners added for event \"{}\". \
             Use set_max_listeners() to increase limit. Current limit: {}",
            self.count, self.event, self.limit
        )
    }
}

/// Получатель диагностических сообщений.
pub trait DiagnosticSink: Send + Sync {
    fn listener_leak(
        &self,
        warning: &LeakWarning,
    );
}

/// Пишет предупреждения через `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn listener_leak(
        &self,
        warning: &LeakWarning,
    ) {
        tracing::warn!(
            target: LEAK_TARGET,
            code = %warning.status_code(),
            event = warning.event,
            count = warning.count,
            limit = warning.limit,
            "{warning}"
        );
    }
}

/// Игнорирует все сообщения.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn listener_leak(
        &self,
        _warning: &LeakWarning,
    ) {
    }
}

/// Накапливает предупреждения в памяти.
#[derive(Debug, Default)]
pub struct MemorySink {
    warnings: Mutex<Vec<LeakWarning>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<LeakWarning> {
        self.warnings.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.warnings.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().is_empty()
    }

    pub fn clear(&self) {
        self.warnings.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn listener_leak(
        &self,
        warning: &LeakWarning,
    ) {
        self.warnings.lock().push(warning.clone());
    }
}
