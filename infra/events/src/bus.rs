use crate::builder::EventBusBuilder;
use crate::config::{BusConfig, FaultPolicy};
use crate::error::{EventBusError, EventBusErrorExt};
use crate::event::{Event, EventData, encode_payload};
use crate::listener::{Listener, ListenerResult};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{trace, warn};

/// Listeners of one event name, in subscription order.
///
/// Appends go through [`Arc::make_mut`], so a snapshot held by an in-flight
/// dispatch never observes them.
type Listeners = Arc<Vec<Arc<dyn Listener>>>;

/// Outcome of a single [`EventBus::publish`] call.
#[derive(Debug, Default)]
pub struct Delivery {
    invoked: usize,
    faults: Vec<EventBusError>,
}

impl Delivery {
    /// Number of listeners that were invoked.
    #[must_use]
    pub const fn invoked(&self) -> usize {
        self.invoked
    }

    /// Faults isolated under [`FaultPolicy::Continue`], in listener order.
    #[must_use]
    pub fn faults(&self) -> &[EventBusError] {
        &self.faults
    }

    /// Returns `true` when every invoked listener succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    #[must_use]
    pub fn into_faults(self) -> Vec<EventBusError> {
        self.faults
    }
}

/// A thread-safe registry of listeners keyed by event name.
///
/// Cloning is cheap and every clone shares the same listeners, so a handle can be
/// passed to components (or captured by listeners) instead of living in a global.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<FxHashMap<String, Listeners>>>,
    config: BusConfig,
}

impl EventBus {
    /// Creates a new, empty `EventBus` with the default [`BusConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty `EventBus` with the given settings.
    #[must_use]
    pub fn with_config(config: BusConfig) -> Self {
        Self { listeners: Arc::default(), config }
    }

    /// Returns a builder for configuring a new `EventBus`.
    ///
    /// # Examples
    /// ```rust
    /// use eventbus::{EventBus, FaultPolicy};
    ///
    /// let bus = EventBus::builder().fault_policy(FaultPolicy::Continue).build();
    /// assert_eq!(bus.fault_policy(), FaultPolicy::Continue);
    /// ```
    #[must_use = "The builder must be configured before it can be used to build the bus."]
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Registers `listener` under `name`.
    ///
    /// Every later [`publish`](Self::publish) of `name` invokes it after all listeners
    /// subscribed before it. Subscribing the same listener twice invokes it twice.
    ///
    /// # Examples
    /// ```rust
    /// use eventbus::EventBus;
    ///
    /// # fn main() -> Result<(), eventbus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.subscribe("user.created", |event| {
    ///     assert_eq!(event.name(), "user.created");
    ///     Ok(())
    /// });
    /// assert_eq!(bus.publish("user.created", None)?.invoked(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<F>(&self, name: impl Into<String>, listener: F)
    where
        F: Fn(&Event) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe_listener(name, Arc::new(listener));
    }

    /// Registers a shared [`Listener`] under `name`.
    pub fn subscribe_listener(&self, name: impl Into<String>, listener: Arc<dyn Listener>) {
        let name = name.into();
        let mut listeners = self.listeners.write();
        let registered = listeners.entry(name.clone()).or_default();
        Arc::make_mut(registered).push(listener);
        let count = registered.len();
        drop(listeners);

        trace!(event = %name, count, "Listener registered");
    }

    /// Delivers an event to every listener registered under `name`, in subscription order.
    ///
    /// Dispatch is synchronous: this returns once every listener has returned. Publishing
    /// a name nobody listens to is a no-op. `None` and an empty payload are delivered alike.
    ///
    /// The listener set is fixed when the call starts, so listeners may subscribe or
    /// publish on this bus; a listener they add is not invoked by this call.
    ///
    /// # Errors
    /// Under [`FaultPolicy::Abort`] returns [`EventBusError::Listener`] from the first
    /// failing listener; listeners after it are not invoked. Under
    /// [`FaultPolicy::Continue`] faults are reported in the [`Delivery`] instead.
    ///
    /// # Panics
    /// Under [`FaultPolicy::Abort`] a panicking listener unwinds through this call.
    pub fn publish(&self, name: &str, data: Option<EventData>) -> Result<Delivery, EventBusError> {
        let Some(listeners) = self.snapshot(name) else {
            trace!(event = name, "Event dropped: no listeners");
            return Ok(Delivery::default());
        };

        let event = Event::new(name, data);
        trace!(event = name, listeners = listeners.len(), "Dispatching event");

        match self.config.fault_policy {
            FaultPolicy::Abort => dispatch(&event, &listeners),
            FaultPolicy::Continue => Ok(dispatch_isolated(&event, &listeners)),
        }
    }

    /// Publishes a typed payload, see [`encode_payload`].
    ///
    /// # Errors
    /// Returns [`EventBusError::Payload`] or [`EventBusError::InvalidPayload`] if the
    /// payload cannot be encoded, otherwise the same errors as [`publish`](Self::publish).
    ///
    /// # Examples
    /// ```rust
    /// use eventbus::EventBus;
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), eventbus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.subscribe("test", |event| {
    ///     assert!(event.get("pi").is_some());
    ///     Ok(())
    /// });
    /// bus.publish_with("test", &json!({ "pi": 3.14159 }))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn publish_with<T>(&self, name: &str, payload: &T) -> Result<Delivery, EventBusError>
    where
        T: Serialize + ?Sized,
    {
        let data = encode_payload(payload)?;
        self.publish(name, Some(data))
    }

    /// Number of listeners registered under `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.read().get(name).map_or(0, |registered| registered.len())
    }

    #[must_use]
    pub fn has_listeners(&self, name: &str) -> bool {
        self.listeners.read().contains_key(name)
    }

    /// Every event name with at least one listener, sorted.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub const fn fault_policy(&self) -> FaultPolicy {
        self.config.fault_policy
    }

    #[must_use]
    pub const fn config(&self) -> &BusConfig {
        &self.config
    }

    fn snapshot(&self, name: &str) -> Option<Listeners> {
        self.listeners.read().get(name).cloned()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.listeners.read().len())
            .field("config", &self.config)
            .finish()
    }
}

fn dispatch(event: &Event, listeners: &[Arc<dyn Listener>]) -> Result<Delivery, EventBusError> {
    for (position, listener) in listeners.iter().enumerate() {
        listener.on_event(event).with_context(|| listener_context(event, position))?;
    }
    Ok(Delivery { invoked: listeners.len(), faults: Vec::new() })
}

fn dispatch_isolated(event: &Event, listeners: &[Arc<dyn Listener>]) -> Delivery {
    let mut faults = Vec::new();

    for (position, listener) in listeners.iter().enumerate() {
        let fault = match panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
            Ok(Ok(())) => continue,
            Ok(Err(source)) => {
                EventBusError::Listener { source, context: Some(listener_context(event, position)) }
            },
            Err(payload) => EventBusError::ListenerPanicked {
                message: panic_message(payload.as_ref()),
                context: Some(listener_context(event, position)),
            },
        };
        warn!(event = event.name(), position, error = %fault, "Listener fault isolated");
        faults.push(fault);
    }

    Delivery { invoked: listeners.len(), faults }
}

fn listener_context(event: &Event, position: usize) -> Cow<'static, str> {
    format!("event '{}', listener #{position}", event.name()).into()
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'static, str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Cow::Owned(message.clone())
    } else {
        Cow::Borrowed("non-string panic payload")
    }
}
