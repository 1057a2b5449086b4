use crate::listener::ListenerError;
use std::borrow::Cow;

/// Errors that can occur while dispatching or encoding events.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    /// A listener returned an error during dispatch.
    #[error("Listener failed{}: {source}", format_context(.context))]
    Listener { source: ListenerError, context: Option<Cow<'static, str>> },

    /// A listener panicked while faults were being isolated.
    #[error("Listener panicked{}: {message}", format_context(.context))]
    ListenerPanicked { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A typed payload could not be converted to or from event data.
    #[error("Payload error{}: {source}", format_context(.context))]
    Payload { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A typed payload did not serialize into a key/value mapping.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Adds `.context(...)` to results that can be converted into [`EventBusError`].
pub trait EventBusErrorExt<T> {
    /// Attaches a human-readable context to the error, if any.
    ///
    /// # Errors
    /// Returns the original error converted into [`EventBusError`].
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, EventBusError>;

    /// Like [`context`](Self::context), but only builds the context on the error path.
    ///
    /// # Errors
    /// Returns the original error converted into [`EventBusError`].
    fn with_context<C, F>(self, context: F) -> Result<T, EventBusError>
    where
        C: Into<Cow<'static, str>>,
        F: FnOnce() -> C;
}

impl<T> EventBusErrorExt<T> for Result<T, EventBusError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                EventBusError::Listener { context: c, .. }
                | EventBusError::ListenerPanicked { context: c, .. }
                | EventBusError::Payload { context: c, .. }
                | EventBusError::InvalidPayload { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }

    #[inline]
    fn with_context<C, F>(self, context: F) -> Self
    where
        C: Into<Cow<'static, str>>,
        F: FnOnce() -> C,
    {
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(e).context(context()),
        }
    }
}

impl<T> EventBusErrorExt<T> for Result<T, ListenerError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, EventBusError> {
        self.map_err(|source| EventBusError::Listener { source, context: Some(context.into()) })
    }

    #[inline]
    fn with_context<C, F>(self, context: F) -> Result<T, EventBusError>
    where
        C: Into<Cow<'static, str>>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| EventBusError::Listener { source, context: Some(context().into()) })
    }
}

impl<T> EventBusErrorExt<T> for Result<T, serde_json::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, EventBusError> {
        self.map_err(|source| EventBusError::Payload { source, context: Some(context.into()) })
    }

    #[inline]
    fn with_context<C, F>(self, context: F) -> Result<T, EventBusError>
    where
        C: Into<Cow<'static, str>>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| EventBusError::Payload { source, context: Some(context().into()) })
    }
}

impl From<serde_json::Error> for EventBusError {
    #[inline]
    fn from(source: serde_json::Error) -> Self {
        Self::Payload { source, context: None }
    }
}

pub(crate) fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err: Result<(), ListenerError> = Err("boom".into());
        let err = err.context("event 'orders', listener #2").unwrap_err();

        assert_eq!(err.to_string(), "Listener failed (event 'orders', listener #2): boom");
    }

    #[test]
    fn test_display_without_context() {
        let err = EventBusError::InvalidPayload { message: "expected an object".into(), context: None };

        assert_eq!(err.to_string(), "Invalid payload: expected an object");
    }

    #[test]
    fn test_context_overrides_existing() {
        let err: Result<(), EventBusError> = Err(EventBusError::ListenerPanicked {
            message: "kaboom".into(),
            context: Some("first".into()),
        });

        let err = err.context("second").unwrap_err();
        assert!(matches!(
            err,
            EventBusError::ListenerPanicked { context: Some(ref c), .. } if c == "second"
        ));
    }

    #[test]
    fn test_with_context_is_lazy_on_success() {
        let ok: Result<u8, ListenerError> = Ok(7);
        let value = ok.with_context(|| -> String { panic!("context built on success") }).unwrap();
        assert_eq!(value, 7);

        let err: Result<(), ListenerError> = Err("boom".into());
        let err = err.with_context(|| format!("listener #{}", 3)).unwrap_err();
        assert_eq!(err.to_string(), "Listener failed (listener #3): boom");
    }

    #[test]
    fn test_listener_error_keeps_source() {
        use std::error::Error as _;

        let err: Result<(), ListenerError> = Err("root cause".into());
        let err = err.context("dispatch").unwrap_err();

        let source = err.source().expect("listener error should expose its source");
        assert_eq!(source.to_string(), "root cause");
    }
}
