#![warn(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_numeric_casts,
    //unstable_features,
    //unused_imports,
    unused_import_braces,
    unused_qualifications,
    clippy::uninlined_format_args
)]

//! A crate which provides the mobile plugin bridge layer used by keyless vehicle
//! access apps, independent of any particular host framework
//!
//! Keyless access apps (car sharing, fleet management, rental) talk to the vehicle
//! through a closed vendor SDK: they load a keyring issued by a backend, open a BLE
//! session to the vehicle and then issue door, immobilizer, location and telematics
//! commands over it. The app layer itself usually runs in a webview or a Dart
//! runtime, so a thin native bridge sits in between. This crate implements that
//! bridge:
//!
//! ## Command dispatch
//! A fixed vocabulary of named actions ([`cordova::Action`]) is mapped onto single
//! calls into the vehicle SDK session. Every handled action is acknowledged
//! synchronously; command *outcomes* arrive later as events. See
//! [`cordova::VehiclePlugin`] for the webview style surface and
//! [`flutter::VehicleChannel`] for the method channel variant.
//!
//! ## Status events
//! The vendor SDK reports whole status snapshots. [`relay::EventRelay`] diffs each
//! snapshot against the last seen values and forwards only genuine changes as
//! [`event::VehicleEvent`]s, so the app layer never sees the same state twice.
//!
//! ## Environment guard
//! Establishing a BLE session needs Bluetooth, location services and a location
//! permission. [`guard::check_environment`] walks those prerequisites in order over
//! a host supplied [`guard::Environment`] and reports the first missing one.
//!
//! ## Vehicle SDK access
//! The vendor SDK itself sits behind the [`sdk::VehicleSdk`] and
//! [`sdk::SdkConnector`] traits, with a complete in-memory implementation in
//! [`sdk::mock`] for exercising bridges without a vehicle.

pub mod cordova;
pub mod event;
pub mod flutter;
pub mod guard;
pub mod keyring;
pub mod manager;
pub mod relay;
pub mod sdk;

/// Bridge operation result
pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, thiserror::Error)]
/// Bridge operation error
pub enum BridgeError {
    /// The keyring payload could not be deserialized
    #[error("Keyring payload is not valid JSON")]
    KeyringParse(
        #[from]
        #[source]
        serde_json::Error,
    ),
    /// The vehicle SDK did not accept the access grant and keyring pair
    #[error("Access grant '{grant_id}' was rejected by the vehicle SDK")]
    KeyringRejected {
        /// Access grant the keyring was checked against
        grant_id: String,
    },
    /// The initialize action was invoked without its two credential arguments
    #[error("Initialize requires an access grant id and a serialized keyring")]
    MissingCredentials,
    /// The connector could not produce a vehicle SDK session
    #[error("Vehicle SDK session could not be opened: {desc}")]
    SessionOpen {
        /// Connector specific description of the failure
        desc: String,
    },
}
