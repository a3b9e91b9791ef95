//! Outbound notification channel and event payloads.
//!
//! The host reports additions, removals, selection changes, and list
//! snapshots to an external observer through an [`EventChannel`]. Sends are
//! fire-and-forget: the host never waits on, or reacts to, the channel.
//!
//! Payload shapes are part of the wire contract and covered by tests; the
//! field names (`appRecord`, `lastInspectedComponentId`, `iframe`) must not
//! drift.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Mutex;

/// Minimized projection of an application record, as carried by
/// `APP_ADD` and `APP_LIST` payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinimalAppRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Path of the owning document when the application's root element lives
    /// outside the host document; `null` otherwise.
    pub iframe: Option<String>,
}

/// An event reported to the outbound channel.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// An application record was created and published.
    Added { app_record: MinimalAppRecord },
    /// The selected record changed.
    Selected {
        id: String,
        last_inspected_component_id: Option<String>,
    },
    /// Full snapshot of the visible application list.
    List { apps: Vec<MinimalAppRecord> },
    /// An application record was removed.
    Removed { id: String },
}

impl AppEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::Added { .. } => "APP_ADD",
            AppEvent::Selected { .. } => "APP_SELECTED",
            AppEvent::List { .. } => "APP_LIST",
            AppEvent::Removed { .. } => "APP_REMOVE",
        }
    }

    /// The wire payload of this event.
    pub fn payload(&self) -> Value {
        match self {
            AppEvent::Added { app_record } => json!({ "appRecord": app_record }),
            AppEvent::Selected {
                id,
                last_inspected_component_id,
            } => json!({
                "id": id,
                "lastInspectedComponentId": last_inspected_component_id,
            }),
            AppEvent::List { apps } => json!({ "apps": apps }),
            AppEvent::Removed { id } => json!({ "id": id }),
        }
    }
}

/// Outbound notification channel.
///
/// Implementations bridge the host to whatever transport the observer sits
/// behind. `send` must not block.
pub trait EventChannel: Send + Sync {
    /// Deliver one event. Fire-and-forget.
    fn send(&self, event: AppEvent);
}

/// Channel that drops every event. Used when no observer is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl EventChannel for NullChannel {
    fn send(&self, _event: AppEvent) {}
}

/// Channel that buffers `(name, payload)` pairs for later inspection.
#[derive(Debug, Default)]
pub struct BufferedChannel {
    events: Mutex<Vec<(String, Value)>>,
}

impl BufferedChannel {
    /// Create an empty buffered channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the buffered events without clearing them.
    pub fn events(&self) -> Vec<(String, Value)> {
        self.lock().clone()
    }

    /// Drain the buffered events.
    pub fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.lock())
    }

    /// Snapshot just the event names, in delivery order.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Value)>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventChannel for BufferedChannel {
    fn send(&self, event: AppEvent) {
        self.lock().push((event.name().to_string(), event.payload()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> MinimalAppRecord {
        MinimalAppRecord {
            id: "shop".into(),
            name: "Shop".into(),
            version: "3.2.0".into(),
            iframe: None,
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(AppEvent::Added { app_record: minimal() }.name(), "APP_ADD");
        assert_eq!(
            AppEvent::Selected {
                id: "shop".into(),
                last_inspected_component_id: None
            }
            .name(),
            "APP_SELECTED"
        );
        assert_eq!(AppEvent::List { apps: vec![] }.name(), "APP_LIST");
        assert_eq!(AppEvent::Removed { id: "shop".into() }.name(), "APP_REMOVE");
    }

    #[test]
    fn test_add_payload_shape() {
        let payload = AppEvent::Added { app_record: minimal() }.payload();
        assert_eq!(payload["appRecord"]["id"], "shop");
        assert_eq!(payload["appRecord"]["name"], "Shop");
        assert_eq!(payload["appRecord"]["version"], "3.2.0");
        assert!(payload["appRecord"]["iframe"].is_null());
    }

    #[test]
    fn test_selected_payload_shape() {
        let payload = AppEvent::Selected {
            id: "shop".into(),
            last_inspected_component_id: Some("shop:12".into()),
        }
        .payload();
        assert_eq!(payload["id"], "shop");
        assert_eq!(payload["lastInspectedComponentId"], "shop:12");
    }

    #[test]
    fn test_list_payload_shape() {
        let payload = AppEvent::List { apps: vec![minimal()] }.payload();
        assert_eq!(payload["apps"].as_array().unwrap().len(), 1);
        assert_eq!(payload["apps"][0]["id"], "shop");
    }

    #[test]
    fn test_buffered_channel_records_in_order() {
        let channel = BufferedChannel::new();
        channel.send(AppEvent::Added { app_record: minimal() });
        channel.send(AppEvent::Removed { id: "shop".into() });

        assert_eq!(channel.names(), vec!["APP_ADD", "APP_REMOVE"]);
        assert_eq!(channel.take().len(), 2);
        assert!(channel.events().is_empty());
    }
}
