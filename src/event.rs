//! Application facing event model
//!
//! Everything the bridge tells the app layer travels as a named event with a
//! small JSON payload. [`VehicleEvent`] is the typed form; [`VehicleEvent::envelope`]
//! produces the wire form, a `{"type": "tacs:<name>", "detail": {...}}` object
//! matching what webview listeners already expect.
//!
//! The mapping from vendor status values to event payloads is deliberately
//! lossy. The app layer only distinguishes three connection states and treats
//! every door or immobilizer state outside the two expected ones as an error
//! with the raw vendor text attached.

use serde::Serialize;
use serde_json::Value;
use strum_macros::Display;

use crate::sdk::{
    ConnectionStatus, DoorStatus, ImmobilizerStatus, LocationResponse, TelematicsData,
    TelematicsResponse,
};

/// Scheme prefixed to every event name on the wire
pub const EVENT_SCHEME: &str = "tacs";

/// Coarse connection state exposed to the app layer
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    /// Session established
    Connected,
    /// Search or session establishment in progress
    Connecting,
    /// No session and no attempt in progress
    Disconnected,
}

impl From<ConnectionStatus> for ConnectionState {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Connected => ConnectionState::Connected,
            ConnectionStatus::Searching | ConnectionStatus::Connecting => {
                ConnectionState::Connecting
            }
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Door state exposed to the app layer
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DoorState {
    /// All doors locked
    Locked,
    /// Doors released
    Unlocked,
    /// Anything else, raw vendor text in the event message
    Error,
}

/// Ignition state exposed to the app layer
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IgnitionState {
    /// Immobilizer released, engine may be started
    Enabled,
    /// Immobilizer engaged
    Disabled,
    /// Anything else, raw vendor text in the event message
    Error,
}

/// One event addressed to the app layer
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleEvent {
    /// The event channel is open, emitted once at channel setup
    Initialized,
    /// The coarse connection state changed
    ConnectionStateChanged {
        /// New state
        state: ConnectionState,
    },
    /// The door state changed
    DoorStatusChanged {
        /// New state
        state: DoorState,
        /// Raw vendor text, present when `state` is [`DoorState::Error`]
        message: Option<String>,
    },
    /// The ignition state changed
    IgnitionStatusChanged {
        /// New state
        state: IgnitionState,
        /// Raw vendor text, present when `state` is [`IgnitionState::Error`]
        message: Option<String>,
    },
    /// The vehicle answered one telematics query entry
    TelematicsDataChanged {
        /// Tag naming the quantity, camelCase on the wire
        kind: String,
        /// The answer
        response: TelematicsResponse,
    },
    /// The vehicle answered a location query
    LocationChanged {
        /// The answer
        response: LocationResponse,
    },
}

#[derive(Serialize)]
struct StateDetail {
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct TelematicsDetail {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct LocationDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl VehicleEvent {
    /// Builds the connection event for a raw status value
    pub fn connection(status: ConnectionStatus) -> Self {
        VehicleEvent::ConnectionStateChanged {
            state: status.into(),
        }
    }

    /// Builds the door event for a raw status value
    pub fn door(status: DoorStatus) -> Self {
        let (state, message) = match status {
            DoorStatus::Locked => (DoorState::Locked, None),
            DoorStatus::Unlocked => (DoorState::Unlocked, None),
            other => (DoorState::Error, Some(other.to_string())),
        };
        VehicleEvent::DoorStatusChanged { state, message }
    }

    /// Builds the ignition event for a raw immobilizer value
    pub fn ignition(status: ImmobilizerStatus) -> Self {
        let (state, message) = match status {
            ImmobilizerStatus::Released => (IgnitionState::Enabled, None),
            ImmobilizerStatus::Engaged => (IgnitionState::Disabled, None),
            other => (IgnitionState::Error, Some(other.to_string())),
        };
        VehicleEvent::IgnitionStatusChanged { state, message }
    }

    /// Builds the telematics event for one query answer
    pub fn telematics(data: &TelematicsData) -> Self {
        VehicleEvent::TelematicsDataChanged {
            kind: data.kind.to_string(),
            response: data.response.clone(),
        }
    }

    /// Builds the location event for a query answer
    pub fn location(response: LocationResponse) -> Self {
        VehicleEvent::LocationChanged { response }
    }

    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            VehicleEvent::Initialized => "initialized",
            VehicleEvent::ConnectionStateChanged { .. } => "connectionStateChanged",
            VehicleEvent::DoorStatusChanged { .. } => "doorStatusChanged",
            VehicleEvent::IgnitionStatusChanged { .. } => "ignitionStatusChanged",
            VehicleEvent::TelematicsDataChanged { .. } => "telematicsDataChanged",
            VehicleEvent::LocationChanged { .. } => "locationChanged",
        }
    }

    /// Serializes the payload without the envelope
    pub fn detail(&self) -> serde_json::Result<Value> {
        match self {
            VehicleEvent::Initialized => Ok(Value::Object(serde_json::Map::new())),
            VehicleEvent::ConnectionStateChanged { state } => {
                serde_json::to_value(StateDetail {
                    state: state.to_string(),
                    message: None,
                })
            }
            VehicleEvent::DoorStatusChanged { state, message } => {
                serde_json::to_value(StateDetail {
                    state: state.to_string(),
                    message: message.clone(),
                })
            }
            VehicleEvent::IgnitionStatusChanged { state, message } => {
                serde_json::to_value(StateDetail {
                    state: state.to_string(),
                    message: message.clone(),
                })
            }
            VehicleEvent::TelematicsDataChanged { kind, response } => {
                let detail = match response {
                    TelematicsResponse::Success { unit, value } => TelematicsDetail {
                        kind: kind.clone(),
                        unit: Some(unit.clone()),
                        value: Some(*value),
                        error: None,
                    },
                    TelematicsResponse::Error(error) => TelematicsDetail {
                        kind: kind.clone(),
                        unit: None,
                        value: None,
                        error: Some(error.to_string()),
                    },
                };
                serde_json::to_value(detail)
            }
            VehicleEvent::LocationChanged { response } => {
                let detail = match response {
                    LocationResponse::Success(fix) => LocationDetail {
                        latitude: Some(fix.latitude),
                        longitude: Some(fix.longitude),
                        accuracy: Some(fix.accuracy),
                        error: None,
                    },
                    LocationResponse::Error(error) => LocationDetail {
                        latitude: None,
                        longitude: None,
                        accuracy: None,
                        error: Some(error.to_string()),
                    },
                };
                serde_json::to_value(detail)
            }
        }
    }

    /// Serializes the full wire form, `{"type": "tacs:<name>", "detail": {...}}`
    pub fn envelope(&self) -> serde_json::Result<Value> {
        let mut envelope = serde_json::Map::new();
        envelope.insert(
            "type".to_string(),
            Value::String(format!("{}:{}", EVENT_SCHEME, self.name())),
        );
        envelope.insert("detail".to_string(), self.detail()?);
        Ok(Value::Object(envelope))
    }
}

#[cfg(test)]
pub mod event_test {
    use super::*;
    use crate::sdk::{LocationFix, QueryError, TelematicsKind};
    use serde_json::json;

    #[test]
    fn coarse_connection_mapping() {
        assert_eq!(
            ConnectionState::from(ConnectionStatus::Connected),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionState::from(ConnectionStatus::Searching),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::from(ConnectionStatus::Connecting),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::from(ConnectionStatus::Disconnected),
            ConnectionState::Disconnected
        );
        assert_eq!(
            ConnectionState::from(ConnectionStatus::ConnectionLost),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn door_payloads() {
        let locked = VehicleEvent::door(DoorStatus::Locked);
        assert_eq!(locked.detail().unwrap(), json!({"state": "locked"}));

        let blocked = VehicleEvent::door(DoorStatus::Blocked);
        assert_eq!(
            blocked.detail().unwrap(),
            json!({"state": "error", "message": "BLOCKED"})
        );
    }

    #[test]
    fn ignition_payloads() {
        let enabled = VehicleEvent::ignition(ImmobilizerStatus::Released);
        assert_eq!(enabled.detail().unwrap(), json!({"state": "enabled"}));

        let unknown = VehicleEvent::ignition(ImmobilizerStatus::Unknown);
        assert_eq!(
            unknown.detail().unwrap(),
            json!({"state": "error", "message": "UNKNOWN"})
        );
    }

    #[test]
    fn telematics_payloads() {
        let reading = VehicleEvent::telematics(&TelematicsData::reading(
            TelematicsKind::Odometer,
            33000.25,
        ));
        assert_eq!(
            reading.detail().unwrap(),
            json!({"type": "odometer", "unit": "km", "value": 33000.25})
        );

        let failed = VehicleEvent::telematics(&TelematicsData::failed(
            TelematicsKind::FuelLevelPercentage,
            QueryError::Denied,
        ));
        assert_eq!(
            failed.detail().unwrap(),
            json!({"type": "fuelLevelPercentage", "error": "DENIED"})
        );
    }

    #[test]
    fn location_payloads() {
        let fix = LocationFix {
            latitude: 53.5511,
            longitude: 9.9937,
            accuracy: 12.5,
        };
        let ok = VehicleEvent::location(LocationResponse::Success(fix));
        assert_eq!(
            ok.detail().unwrap(),
            json!({"latitude": 53.5511, "longitude": 9.9937, "accuracy": 12.5})
        );

        let failed = VehicleEvent::location(LocationResponse::Error(QueryError::NotSupported));
        assert_eq!(failed.detail().unwrap(), json!({"error": "NOT_SUPPORTED"}));
    }

    #[test]
    fn envelope_shape() {
        let event = VehicleEvent::connection(ConnectionStatus::Connected);
        assert_eq!(
            event.envelope().unwrap(),
            json!({"type": "tacs:connectionStateChanged", "detail": {"state": "connected"}})
        );

        let initialized = VehicleEvent::Initialized;
        assert_eq!(
            initialized.envelope().unwrap(),
            json!({"type": "tacs:initialized", "detail": {}})
        );
    }
}
