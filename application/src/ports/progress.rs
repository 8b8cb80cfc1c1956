//! Progress notification port
//!
//! Use cases publish [`OrchestrationEvent`]s on an [`EventBus`]; the bus
//! forwards each event to every registered [`ProgressListener`]. A listener
//! that errors or panics is logged and skipped, and never affects the run.

use squadforge_domain::OrchestrationEvent;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ListenerError(pub String);

/// Callback for orchestration events
///
/// Implementations live in the presentation and infrastructure layers
/// (console progress, JSONL event log).
pub trait ProgressListener: Send + Sync {
    fn name(&self) -> &str;

    fn on_event(&self, event: &OrchestrationEvent) -> Result<(), ListenerError>;
}

/// Fan-out of events to listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn ProgressListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.subscribe(listener);
        self
    }

    pub fn subscribe(&mut self, listener: Arc<dyn ProgressListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&self, event: OrchestrationEvent) {
        for listener in &self.listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        "Listener {} failed on {}: {}",
                        listener.name(),
                        event.kind(),
                        e
                    );
                }
                Err(_) => {
                    warn!("Listener {} panicked on {}", listener.name(), event.kind());
                }
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records event names in emission order.
    #[derive(Default)]
    pub struct RecordingListener {
        events: Mutex<Vec<OrchestrationEvent>>,
    }

    impl RecordingListener {
        pub fn kinds(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().iter().map(|e| e.kind()).collect()
        }

        pub fn events(&self) -> Vec<OrchestrationEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressListener for RecordingListener {
        fn name(&self) -> &str {
            "recording"
        }

        fn on_event(&self, event: &OrchestrationEvent) -> Result<(), ListenerError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingListener;
    use super::*;

    struct FailingListener;

    impl ProgressListener for FailingListener {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, _event: &OrchestrationEvent) -> Result<(), ListenerError> {
            Err(ListenerError("disk full".to_string()))
        }
    }

    struct PanickingListener;

    impl ProgressListener for PanickingListener {
        fn name(&self) -> &str {
            "panicking"
        }

        fn on_event(&self, _event: &OrchestrationEvent) -> Result<(), ListenerError> {
            panic!("listener bug");
        }
    }

    #[test]
    fn test_bad_listeners_do_not_block_others() {
        let recorder = Arc::new(RecordingListener::default());
        let bus = EventBus::new()
            .with_listener(Arc::new(FailingListener))
            .with_listener(Arc::new(PanickingListener))
            .with_listener(recorder.clone());

        bus.emit(OrchestrationEvent::CheckStarted {
            check: "lint".to_string(),
        });
        bus.emit(OrchestrationEvent::CheckpointReached {
            step: "snapshot".to_string(),
        });

        assert_eq!(bus.listener_count(), 3);
        assert_eq!(recorder.kinds(), ["check_started", "checkpoint_reached"]);
    }
}
