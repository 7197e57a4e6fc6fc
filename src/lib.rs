//! emitra: an in-process, strongly-typed event emitter.
//!
//! Producers emit events described by types implementing [`Event`];
//! consumers subscribe callbacks that run synchronously in priority order
//! (higher first, ties in subscription order). Listeners can fire once, be
//! deferred through a [`Scheduler`], or live in isolated named [`Channel`]s.

/// Event descriptors and the `define_event!` macro.
pub mod event;
/// Listener records and the priority-ordered store.
pub mod listener;
/// Event registry: subscribe, unsubscribe, emit, leak bookkeeping.
pub mod registry;
/// Named channels with independent registries.
pub mod channel;
/// Emitter facade composing a registry and a channel registry.
pub mod emitter;
/// Single-shot timers for delayed listeners.
pub mod scheduler;
/// Leak advisories and their sinks.
pub mod diagnostics;
/// Emitter configuration (defaults plus `EMITRA_*` environment).
pub mod config;
/// Tracing subscriber setup.
pub mod logging;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use channel::{Channel, ChannelRegistry};
pub use config::EmitterConfig;
pub use diagnostics::{DiagnosticSink, LeakWarning, MemorySink, NoopSink, TracingSink};
/// Error types shared with the `emitra-error` crate.
pub use emitra_error::{
    CallbackError, ConfigError, EmitraResult, EmitterError, ErrorExt, StackError, StatusCode,
};
pub use emitter::{Emitter, EmitterBuilder};
pub use event::{EmitResult, Event};
pub use listener::{Callback, ListenerMode};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use registry::{EventRegistry, ListenerSet, SubscriptionGroup, SubscriptionId};
pub use scheduler::{Scheduler, Task, TimerControl, TimerHandle, TokioScheduler};
