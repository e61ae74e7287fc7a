//! Vehicle SDK abstraction
//!
//! The actual keyless access stack is a closed vendor library. Everything the
//! bridge needs from it fits behind two seams:
//!
//! * [`SdkConnector`] opens sessions. A production connector wraps the vendor
//!   library's builder, the [`mock`] connector fabricates sessions in memory.
//! * [`VehicleSdk`] is one opened session. All vehicle commands are fire and
//!   forget: the session acknowledges nothing, outcomes appear asynchronously
//!   on the [`StatusHandler`] the session was opened with.

use std::sync::{Arc, Mutex};

use crate::BridgeResult;
use crate::keyring::Keyring;

pub mod mock;

mod status;
pub use status::*;

/// Tuning for opening a vehicle SDK session
///
/// Timeouts mirror the vendor builder. Defaults match the values production
/// apps ship with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionConfig {
    /// Replace the BLE stack with the vendor's built in simulator
    pub mock_mode: bool,
    /// Time after which an ongoing search is reported overdue (ms)
    pub search_overdue_ms: u32,
    /// Time after which an unsuccessful search is aborted (ms)
    pub search_abort_ms: u32,
    /// Total time the SDK keeps retrying a lost connection (ms)
    pub connection_retry_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            search_overdue_ms: 10000,
            search_abort_ms: 30000,
            connection_retry_ms: 20000,
        }
    }
}

/// Receiver for everything a session reports back
///
/// Implementations are registered once at session open and called from the
/// connector's callback context, hence the [`Mutex`] in [`SharedStatusHandler`].
pub trait StatusHandler: Send {
    /// A new whole-state snapshot was pushed by the SDK
    fn on_vehicle_status(&mut self, status: &VehicleStatus);

    /// The phone side Bluetooth device changed state
    fn on_device_status(&mut self, status: BluetoothDeviceStatus, info: &str) {
        log::debug!("bluetooth device now {status}: {info}");
    }

    /// The SDK forwarded one of its internal log lines
    fn on_log_event(&mut self, event: &LogEvent) {
        log::log!(target: "vehicle_sdk", event.level, "{}", event.message);
    }
}

/// Handler as shared with a connector
pub type SharedStatusHandler = Arc<Mutex<dyn StatusHandler>>;

/// One opened vehicle SDK session
///
/// Command methods never block and never fail synchronously. A command sent
/// without an established BLE connection is silently absorbed by the SDK; its
/// effect, if any, shows up in later status snapshots.
pub trait VehicleSdk: Send {
    /// Selects the access grant all following commands act under.
    ///
    /// Returns false when the keyring does not back the grant, in which case
    /// the session is unusable and should be closed.
    fn use_access_grant(&mut self, vehicle_access_grant_id: &str, keyring: &Keyring) -> bool;

    /// Starts scanning for the granted vehicle and connects when found
    fn search_and_connect(&mut self);

    /// Stops an ongoing vehicle scan
    fn cancel_search(&mut self);

    /// Drops the established BLE connection
    fn cancel_connection(&mut self);

    /// Stops scanning and drops any connection
    fn cancel_all(&mut self) {
        self.cancel_search();
        self.cancel_connection();
    }

    /// Engages the central locking
    fn lock_doors(&mut self);

    /// Releases the central locking
    fn unlock_doors(&mut self);

    /// Engages (`true`) or releases (`false`) the immobilizer.
    ///
    /// Releasing the immobilizer is what app layers call *enabling ignition*.
    fn control_immobilizer(&mut self, engage: bool);

    /// Asks the vehicle for a location fix
    fn query_location(&mut self);

    /// Asks the vehicle for the given telematics quantities
    fn query_telematics_data(&mut self, kinds: TelematicsKinds);

    /// Releases the session and all OS resources behind it.
    ///
    /// After close the session absorbs all further commands. Dropping a
    /// session must behave like close.
    fn close(&mut self);
}

/// Factory for vehicle SDK sessions
pub trait SdkConnector: Send {
    /// Opens a session with the given tuning, wiring all SDK callbacks to
    /// `handler` for the session's whole lifetime.
    fn open(
        &mut self,
        config: &SessionConfig,
        handler: SharedStatusHandler,
    ) -> BridgeResult<Box<dyn VehicleSdk>>;
}
