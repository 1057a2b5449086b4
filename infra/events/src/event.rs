use crate::error::{EventBusError, EventBusErrorExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Payload carried by an [`Event`]: string keys mapped to dynamically typed values.
pub type EventData = serde_json::Map<String, Value>;

/// An immutable event delivered to every listener registered under its name.
///
/// A missing payload and an explicitly empty one are indistinguishable: both are
/// delivered as an empty [`EventData`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    data: EventData,
}

impl Event {
    /// Creates an event from a name and an optional payload.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Option<EventData>) -> Self {
        Self { name: name.into(), data: data.unwrap_or_default() }
    }

    /// The name the event was published under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn data(&self) -> &EventData {
        &self.data
    }

    /// Looks up a single payload value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns `true` when the event carries no payload entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes the payload into a typed value agreed on by publisher and listener.
    ///
    /// # Errors
    /// Returns [`EventBusError::Payload`] if the payload does not match `T`.
    ///
    /// # Examples
    /// ```rust
    /// use eventbus::{Event, encode_payload};
    ///
    /// #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    /// struct Tick { seq: u64 }
    ///
    /// # fn main() -> Result<(), eventbus::EventBusError> {
    /// let event = Event::new("tick", Some(encode_payload(&Tick { seq: 7 })?));
    /// assert_eq!(event.decode::<Tick>()?, Tick { seq: 7 });
    /// # Ok(())
    /// # }
    /// ```
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EventBusError> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .with_context(|| format!("Failed to decode payload of '{}'", self.name))
    }
}

/// Serializes a typed payload into [`EventData`].
///
/// `()` and `None` encode to an empty payload.
///
/// # Errors
/// Returns [`EventBusError::Payload`] if serialization fails, or
/// [`EventBusError::InvalidPayload`] if `payload` is not a struct or map.
pub fn encode_payload<T: Serialize + ?Sized>(payload: &T) -> Result<EventData, EventBusError> {
    match serde_json::to_value(payload).context("Failed to encode payload")? {
        Value::Object(data) => Ok(data),
        Value::Null => Ok(EventData::new()),
        other => Err(EventBusError::InvalidPayload {
            message: format!("expected a key/value mapping, found {}", kind_of(&other)).into(),
            context: None,
        }),
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::approx_constant)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Reading {
        sensor: String,
        value: f64,
    }

    #[test]
    fn test_absent_payload_is_empty() {
        let event = Event::new("test", None);
        assert_eq!(event.name(), "test");
        assert!(event.is_empty());
        assert_eq!(event, Event::new("test", Some(EventData::new())));
    }

    #[test]
    fn test_get_returns_payload_value() {
        let data = encode_payload(&json!({ "pi": 3.14159 })).unwrap();
        let event = Event::new("test", Some(data));

        assert_eq!(event.get("pi").and_then(Value::as_f64), Some(3.14159));
        assert!(event.get("tau").is_none());
    }

    #[test]
    fn test_typed_payload_roundtrip() {
        let reading = Reading { sensor: "boiler".to_owned(), value: 81.5 };
        let event = Event::new("reading", Some(encode_payload(&reading).unwrap()));

        assert_eq!(event.decode::<Reading>().unwrap(), reading);
    }

    #[test]
    fn test_decode_mismatch_is_payload_error() {
        let event = Event::new("reading", Some(encode_payload(&json!({ "sensor": 1 })).unwrap()));

        let err = event.decode::<Reading>().unwrap_err();
        assert!(matches!(err, EventBusError::Payload { .. }));
        assert!(err.to_string().contains("'reading'"));
    }

    #[test]
    fn test_unit_and_none_encode_empty() {
        assert!(encode_payload(&()).unwrap().is_empty());
        assert!(encode_payload(&Option::<Reading>::None).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_payload_rejected() {
        let err = encode_payload(&42).unwrap_err();
        assert!(matches!(err, EventBusError::InvalidPayload { .. }));
        assert!(err.to_string().contains("a number"));
    }
}
