//! Status snapshot to event translation
//!
//! The vendor SDK pushes a whole [`VehicleStatus`] on every internal change.
//! [`LastSeen`] remembers the previously reported value of each field and
//! [`LastSeen::diff`] turns one snapshot into the list of events that actually
//! need forwarding. [`EventRelay`] owns a [`LastSeen`] plus the registered
//! [`EventSink`] and plugs both into the [`StatusHandler`] seam.
//!
//! Diff rules, matching what app layers were built against:
//!
//! * Connection is compared on the raw sub-state. Two sub-states that map to
//!   the same coarse [`crate::event::ConnectionState`] still produce two events.
//! * Door, ignition, telematics and location are only looked at while the
//!   snapshot reports an established connection.
//! * Door and ignition are compared on the raw value.
//! * Telematics entries are query answers, not state. Every entry is forwarded,
//!   including repeats of an unchanged value.
//! * A location answer identical to the previous one is suppressed.
//! * Last seen values survive disconnects. Reconnecting to a vehicle in an
//!   unchanged state produces no door or ignition event.

use std::fmt;
use std::sync::Arc;

use crate::event::VehicleEvent;
use crate::sdk::{
    ConnectionStatus, DoorStatus, ImmobilizerStatus, LocationResponse, StatusHandler,
    VehicleStatus,
};

/// Receiver for events leaving the bridge
///
/// Implementations wrap whatever channel the host framework provides and must
/// not block the caller.
pub trait EventSink: Send + Sync {
    /// Hands one event to the app layer
    fn deliver(&self, event: &VehicleEvent);
}

/// Per field last reported values
///
/// All fields start unset, so the first snapshot reports every field it is
/// allowed to (see the connection gate above).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LastSeen {
    connection: Option<ConnectionStatus>,
    doors: Option<DoorStatus>,
    immobilizer: Option<ImmobilizerStatus>,
    location: Option<LocationResponse>,
}

impl LastSeen {
    /// Fresh state with nothing reported yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares a snapshot against the last reported values and returns the
    /// events to forward, updating the last reported values in the process.
    pub fn diff(&mut self, status: &VehicleStatus) -> Vec<VehicleEvent> {
        let mut events = Vec::new();

        if self.connection != Some(status.connection) {
            self.connection = Some(status.connection);
            events.push(VehicleEvent::connection(status.connection));
        }

        // Everything below reflects vehicle state, meaningless without a session
        if !status.connection.is_connected() {
            return events;
        }

        if self.doors != Some(status.doors) {
            self.doors = Some(status.doors);
            events.push(VehicleEvent::door(status.doors));
        }

        if self.immobilizer != Some(status.immobilizer) {
            self.immobilizer = Some(status.immobilizer);
            events.push(VehicleEvent::ignition(status.immobilizer));
        }

        for data in &status.telematics {
            events.push(VehicleEvent::telematics(data));
        }

        if let Some(response) = status.location {
            if self.location != Some(response) {
                self.location = Some(response);
                events.push(VehicleEvent::location(response));
            }
        }

        events
    }
}

/// De-duplicating event forwarder
///
/// One relay lives for the whole bridge lifetime and survives session
/// re-initialization, so the app layer never sees a spurious repeat just
/// because the SDK session was rebuilt.
#[derive(Default)]
pub struct EventRelay {
    sink: Option<Arc<dyn EventSink>>,
    last: LastSeen,
}

impl fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRelay")
            .field("sink_registered", &self.sink.is_some())
            .field("last", &self.last)
            .finish()
    }
}

impl EventRelay {
    /// Relay with no sink and nothing reported yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the sink all further events go to, replacing any previous one
    pub fn register_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sink = Some(sink);
    }

    /// Drops the registered sink. Further events are discarded.
    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// Hands one event to the registered sink.
    ///
    /// Without a sink the event is logged and dropped. It is not queued: the
    /// diff state has already advanced, replaying stale events after a late
    /// channel setup would contradict newer ones.
    pub fn emit(&self, event: &VehicleEvent) {
        match &self.sink {
            Some(sink) => sink.deliver(event),
            None => log::debug!("no event channel registered, dropping {}", event.name()),
        }
    }
}

impl StatusHandler for EventRelay {
    fn on_vehicle_status(&mut self, status: &VehicleStatus) {
        log::debug!("vehicle status pushed: {status:?}");
        for event in self.last.diff(status) {
            self.emit(&event);
        }
    }
}
