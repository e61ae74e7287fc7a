//! Mock vehicle SDK for unit testing bridges
//!
//! [`MockConnector`] hands out [`MockVehicle`] sessions that validate access
//! grants against the keyring structure, record every command they receive and
//! let tests push arbitrary status snapshots into the registered handler, as a
//! real vehicle would.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::keyring::Keyring;
use crate::{BridgeError, BridgeResult};

use super::{
    BluetoothDeviceStatus, LogEvent, SdkConnector, SessionConfig, SharedStatusHandler,
    TelematicsKinds, VehicleSdk, VehicleStatus,
};

/// One recorded call into a [`MockVehicle`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SdkCall {
    UseAccessGrant {
        vehicle_access_grant_id: String,
        accepted: bool,
    },
    SearchAndConnect,
    CancelSearch,
    CancelConnection,
    LockDoors,
    UnlockDoors,
    ControlImmobilizer {
        engage: bool,
    },
    QueryLocation,
    QueryTelematicsData {
        kinds: TelematicsKinds,
    },
    Close,
}

/// In-memory vehicle SDK session
///
/// Cloning yields a second handle onto the same session, so a test can keep
/// one handle while the bridge owns the other.
#[derive(Clone)]
pub struct MockVehicle {
    config: SessionConfig,
    handler: SharedStatusHandler,
    calls: Arc<RwLock<Vec<SdkCall>>>,
    closed: Arc<RwLock<bool>>,
}

impl fmt::Debug for MockVehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockVehicle")
            .field("config", &self.config)
            .field("calls", &self.calls.read().unwrap().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl MockVehicle {
    /// Creates a session wired to `handler`
    pub fn new(config: SessionConfig, handler: SharedStatusHandler) -> Self {
        Self {
            config,
            handler,
            calls: Arc::new(RwLock::new(Vec::new())),
            closed: Arc::new(RwLock::new(false)),
        }
    }

    /// Tuning the session was opened with
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Everything the session was asked to do so far, in order
    pub fn calls(&self) -> Vec<SdkCall> {
        self.calls.read().unwrap().clone()
    }

    /// True once [`VehicleSdk::close`] was called
    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap()
    }

    /// Pushes a status snapshot into the registered handler.
    ///
    /// A closed session no longer reports anything, matching the vendor SDK.
    pub fn push_status(&self, status: &VehicleStatus) {
        if self.is_closed() {
            return;
        }
        self.handler.lock().unwrap().on_vehicle_status(status);
    }

    /// Pushes a Bluetooth device state change into the registered handler
    pub fn push_device_status(&self, status: BluetoothDeviceStatus, info: &str) {
        if self.is_closed() {
            return;
        }
        self.handler.lock().unwrap().on_device_status(status, info);
    }

    /// Forwards a fabricated SDK log line into the registered handler
    pub fn push_log_event(&self, event: &LogEvent) {
        if self.is_closed() {
            return;
        }
        self.handler.lock().unwrap().on_log_event(event);
    }

    fn record(&self, call: SdkCall) {
        self.calls.write().unwrap().push(call);
    }
}

impl VehicleSdk for MockVehicle {
    fn use_access_grant(&mut self, vehicle_access_grant_id: &str, keyring: &Keyring) -> bool {
        let accepted = keyring.grant_is_complete(vehicle_access_grant_id);
        self.record(SdkCall::UseAccessGrant {
            vehicle_access_grant_id: vehicle_access_grant_id.to_string(),
            accepted,
        });
        accepted
    }

    fn search_and_connect(&mut self) {
        self.record(SdkCall::SearchAndConnect);
    }

    fn cancel_search(&mut self) {
        self.record(SdkCall::CancelSearch);
    }

    fn cancel_connection(&mut self) {
        self.record(SdkCall::CancelConnection);
    }

    fn lock_doors(&mut self) {
        self.record(SdkCall::LockDoors);
    }

    fn unlock_doors(&mut self) {
        self.record(SdkCall::UnlockDoors);
    }

    fn control_immobilizer(&mut self, engage: bool) {
        self.record(SdkCall::ControlImmobilizer { engage });
    }

    fn query_location(&mut self) {
        self.record(SdkCall::QueryLocation);
    }

    fn query_telematics_data(&mut self, kinds: TelematicsKinds) {
        self.record(SdkCall::QueryTelematicsData { kinds });
    }

    fn close(&mut self) {
        self.record(SdkCall::Close);
        *self.closed.write().unwrap() = true;
    }
}

/// Connector producing [`MockVehicle`] sessions
///
/// Clones share state, so a test can hold one clone and hand the other to the
/// bridge under test, then inspect whatever sessions the bridge opened.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    sessions: Arc<RwLock<Vec<MockVehicle>>>,
    refuse_open: Arc<RwLock<Option<String>>>,
}

impl MockConnector {
    /// Creates a connector with no opened sessions
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next [`SdkConnector::open`] fail with the given description
    pub fn refuse_next_open(&self, desc: &str) {
        *self.refuse_open.write().unwrap() = Some(desc.to_string());
    }

    /// Number of sessions opened through this connector so far
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// Handle onto the most recently opened session
    pub fn last_session(&self) -> Option<MockVehicle> {
        self.sessions.read().unwrap().last().cloned()
    }
}

impl SdkConnector for MockConnector {
    fn open(
        &mut self,
        config: &SessionConfig,
        handler: SharedStatusHandler,
    ) -> BridgeResult<Box<dyn VehicleSdk>> {
        if let Some(desc) = self.refuse_open.write().unwrap().take() {
            return Err(BridgeError::SessionOpen { desc });
        }
        let session = MockVehicle::new(*config, handler);
        self.sessions.write().unwrap().push(session.clone());
        Ok(Box::new(session))
    }
}
