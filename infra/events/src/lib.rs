//! # Event Bus
//!
//! An in-process, thread-safe registry of named events.
//!
//! ## Overview
//!
//! Components subscribe listeners under an event name; other components publish that
//! name with an optional key/value payload. Neither side holds a reference to the other,
//! only to a shared [`EventBus`] handle.
//!
//! ## Features
//!
//! * **Synchronous fan-out**: `publish` invokes every listener in subscription order
//!   and returns once all of them have returned.
//! * **Stable dispatch**: the listener set is fixed when `publish` starts; listeners
//!   may subscribe or publish re-entrantly.
//! * **Explicit fault policy**: abort on the first failing listener, or attempt all of
//!   them and report every fault ([`FaultPolicy`]).
//! * **Typed payloads**: `publish_with` / [`Event::decode`] over `serde`.
//! * **High Performance**: `FxHashMap` + `parking_lot::RwLock`.
//!
//! # Example
//!
//! ```rust
//! use eventbus::{EventBus, EventBusError};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let last_id = Arc::new(AtomicU64::new(0));
//!
//!     let seen = Arc::clone(&last_id);
//!     bus.subscribe("user.created", move |event| {
//!         let id = event.get("id").and_then(serde_json::Value::as_u64).ok_or("missing id")?;
//!         seen.store(id, Ordering::SeqCst);
//!         Ok(())
//!     });
//!
//!     bus.publish_with("user.created", &json!({ "id": 42 }))?;
//!     assert_eq!(last_id.load(Ordering::SeqCst), 42);
//!
//!     // Nobody listens to this one: a silent no-op.
//!     assert_eq!(bus.publish("user.deleted", None)?.invoked(), 0);
//!     Ok(())
//! }
//! ```

mod builder;
mod bus;
mod config;
mod error;
mod event;
mod listener;

pub use crate::builder::EventBusBuilder;
pub use crate::bus::{Delivery, EventBus};
pub use crate::config::{BusConfig, ConfigError, ConfigErrorExt, FaultPolicy, load_config};
pub use crate::error::{EventBusError, EventBusErrorExt};
pub use crate::event::{Event, EventData, encode_payload};
pub use crate::listener::{Listener, ListenerError, ListenerResult};
