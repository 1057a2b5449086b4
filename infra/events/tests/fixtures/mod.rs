use eventbus::{Event, ListenerResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared, ordered log of what listeners observed.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<(&'static str, Event)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that records `label` together with the event it received.
    pub fn listener(
        &self,
        label: &'static str,
    ) -> impl Fn(&Event) -> ListenerResult + Send + Sync + 'static {
        let entries = Arc::clone(&self.entries);
        move |event: &Event| -> ListenerResult {
            entries.lock().push((label, event.clone()));
            Ok(())
        }
    }

    /// Records `label` from inside a hand-written listener body.
    pub fn mark(&self, label: &'static str, event: &Event) {
        self.entries.lock().push((label, event.clone()));
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.lock().iter().map(|(label, _)| *label).collect()
    }

    pub fn events(&self) -> Vec<Event> {
        self.entries.lock().iter().map(|(_, event)| event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
