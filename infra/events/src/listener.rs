use crate::event::Event;

/// Error type a listener reports back to the bus.
///
/// Any `std::error::Error + Send + Sync` converts into it with `?` or `.into()`,
/// as do `&str` and `String`.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a single listener invocation.
pub type ListenerResult = Result<(), ListenerError>;

/// A callback registered under an event name.
///
/// Implemented for every `Fn(&Event) -> ListenerResult` closure; implement it directly
/// when the listener carries its own state.
pub trait Listener: Send + Sync + 'static {
    /// Handles one event. Returning an error is reported as a fault by the bus.
    ///
    /// # Errors
    /// Whatever the listener considers a failed handling of `event`.
    fn on_event(&self, event: &Event) -> ListenerResult;
}

impl<F> Listener for F
where
    F: Fn(&Event) -> ListenerResult + Send + Sync + 'static,
{
    #[inline]
    fn on_event(&self, event: &Event) -> ListenerResult {
        self(event)
    }
}
