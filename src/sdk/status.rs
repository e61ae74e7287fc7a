//! Status vocabulary reported by the vehicle SDK
//!
//! The vendor SDK does not report individual change notifications. It pushes a
//! whole [`VehicleStatus`] snapshot on every internal change, and the bridge is
//! expected to work out what actually changed (see [`crate::relay`]).
//!
//! All enums here are closed: the bridge only ever distinguishes the states
//! listed, everything else a future SDK revision might add has to be folded into
//! one of these by the connector.

use bitflags::bitflags;
use strum_macros::Display;

/// BLE session state between phone and vehicle
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// No session and no attempt in progress
    Disconnected,
    /// Scanning for the vehicle advertisement
    Searching,
    /// Vehicle found, BLE session being established
    Connecting,
    /// Session established, commands can be sent
    Connected,
    /// Session dropped without a disconnect request
    ConnectionLost,
}

impl ConnectionStatus {
    /// True while commands can be sent to the vehicle.
    ///
    /// Door, immobilizer, telematics and location values in a snapshot are
    /// only meaningful while this holds.
    pub fn is_connected(&self) -> bool {
        *self == ConnectionStatus::Connected
    }
}

/// Central locking state of the vehicle
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DoorStatus {
    /// All doors locked
    Locked,
    /// Doors released
    Unlocked,
    /// Lock actuator reported a jam or refusal
    Blocked,
    /// Lock state not (yet) known to the SDK
    Unknown,
}

/// Immobilizer state of the vehicle
///
/// The immobilizer is inverse to the "ignition" wording the app layer uses. A
/// *released* immobilizer means the engine may be started.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ImmobilizerStatus {
    /// Immobilizer released, vehicle start possible
    Released,
    /// Immobilizer engaged, vehicle start impossible
    Engaged,
    /// Immobilizer state not (yet) known to the SDK
    Unknown,
}

/// One measurable quantity the vehicle can report on request
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "camelCase")]
pub enum TelematicsKind {
    /// Total distance counter
    Odometer,
    /// Remaining fuel by volume
    FuelLevelAbsolute,
    /// Remaining fuel relative to tank size
    FuelLevelPercentage,
}

impl TelematicsKind {
    /// Unit string the vehicle reports this quantity in
    pub fn unit(&self) -> &'static str {
        match self {
            TelematicsKind::Odometer => "km",
            TelematicsKind::FuelLevelAbsolute => "l",
            TelematicsKind::FuelLevelPercentage => "%",
        }
    }
}

bitflags! {
    /// Request set for a telematics query
    ///
    /// The vehicle answers one [`TelematicsData`] entry per requested kind, each
    /// carrying its own success or error response.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TelematicsKinds: u8 {
        /// Total distance counter
        const ODOMETER = 1 << 0;
        /// Remaining fuel by volume
        const FUEL_LEVEL_ABSOLUTE = 1 << 1;
        /// Remaining fuel relative to tank size
        const FUEL_LEVEL_PERCENTAGE = 1 << 2;
    }
}

impl From<TelematicsKind> for TelematicsKinds {
    fn from(kind: TelematicsKind) -> Self {
        match kind {
            TelematicsKind::Odometer => TelematicsKinds::ODOMETER,
            TelematicsKind::FuelLevelAbsolute => TelematicsKinds::FUEL_LEVEL_ABSOLUTE,
            TelematicsKind::FuelLevelPercentage => TelematicsKinds::FUEL_LEVEL_PERCENTAGE,
        }
    }
}

impl TelematicsKinds {
    /// Kinds contained in this request set, in reporting order
    pub fn kinds(&self) -> Vec<TelematicsKind> {
        [
            TelematicsKind::Odometer,
            TelematicsKind::FuelLevelAbsolute,
            TelematicsKind::FuelLevelPercentage,
        ]
        .into_iter()
        .filter(|kind| self.contains(TelematicsKinds::from(*kind)))
        .collect()
    }
}

/// Why a telematics or location query produced no value
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryError {
    /// The vehicle does not provide this quantity
    NotSupported,
    /// The active service grants do not cover the query
    Denied,
    /// The vehicle accepted the query but failed to answer it
    RemoteFailed,
}

/// Outcome of a single telematics query
#[derive(Debug, Clone, PartialEq)]
pub enum TelematicsResponse {
    /// The vehicle answered with a measurement
    Success {
        /// Unit of the measurement, see [`TelematicsKind::unit`]
        unit: String,
        /// The measured value
        value: f64,
    },
    /// The query failed
    Error(QueryError),
}

/// One telematics entry inside a status snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct TelematicsData {
    /// Which quantity this entry answers
    pub kind: TelematicsKind,
    /// The answer itself
    pub response: TelematicsResponse,
}

impl TelematicsData {
    /// Successful reading with the kind's default unit
    pub fn reading(kind: TelematicsKind, value: f64) -> Self {
        Self {
            kind,
            response: TelematicsResponse::Success {
                unit: kind.unit().to_string(),
                value,
            },
        }
    }

    /// Failed query for a kind
    pub fn failed(kind: TelematicsKind, error: QueryError) -> Self {
        Self {
            kind,
            response: TelematicsResponse::Error(error),
        }
    }
}

/// GNSS fix reported by the vehicle
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocationFix {
    /// Degrees north, WGS84
    pub latitude: f64,
    /// Degrees east, WGS84
    pub longitude: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy: f64,
}

/// Outcome of a location query
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LocationResponse {
    /// The vehicle answered with a fix
    Success(LocationFix),
    /// The query failed
    Error(QueryError),
}

/// Whole state snapshot as pushed by the vehicle SDK
///
/// Pushed on every internal change. Door, immobilizer, telematics and location
/// fields carry stale or placeholder values while [`VehicleStatus::connection`]
/// is not [`ConnectionStatus::Connected`].
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleStatus {
    /// BLE session state
    pub connection: ConnectionStatus,
    /// Central locking state
    pub doors: DoorStatus,
    /// Immobilizer state
    pub immobilizer: ImmobilizerStatus,
    /// Answers to a preceding telematics query, empty otherwise
    pub telematics: Vec<TelematicsData>,
    /// Answer to a preceding location query, if any
    pub location: Option<LocationResponse>,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            doors: DoorStatus::Unknown,
            immobilizer: ImmobilizerStatus::Unknown,
            telematics: Vec::new(),
            location: None,
        }
    }
}

impl VehicleStatus {
    /// Snapshot of an established session with no query answers yet
    pub fn connected() -> Self {
        Self {
            connection: ConnectionStatus::Connected,
            ..Default::default()
        }
    }
}

/// State of the phone side Bluetooth device
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BluetoothDeviceStatus {
    /// Radio is on and usable
    PoweredOn,
    /// Radio is switched off
    PoweredOff,
    /// The app may not use Bluetooth
    Unauthorized,
    /// The device has no usable Bluetooth radio
    Unsupported,
}

/// Log line forwarded from inside the vendor SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Severity as graded by the SDK
    pub level: log::Level,
    /// The message text
    pub message: String,
}

impl LogEvent {
    /// Convenience constructor for connector implementations
    pub fn new(level: log::Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}
