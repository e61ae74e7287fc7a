//! Session lifecycle and command core shared by all bridge frontends
//!
//! [`AccessManager`] owns the one vehicle SDK session a bridge may hold, the
//! [`EventRelay`] wired into it and the [`SessionConfig`] sessions are opened
//! with. The Cordova and Flutter frontends are thin argument translators on
//! top of this type.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::event::VehicleEvent;
use crate::keyring::Keyring;
use crate::relay::{EventRelay, EventSink};
use crate::sdk::{SdkConnector, SessionConfig, SharedStatusHandler, TelematicsKinds, VehicleSdk};
use crate::{BridgeError, BridgeResult};

/// Owner of the bridge's vehicle SDK session
///
/// The relay outlives sessions: re-initializing keeps the last seen event
/// state, so the app layer is not flooded with repeats after every keyring
/// refresh.
pub struct AccessManager {
    connector: Box<dyn SdkConnector>,
    config: SessionConfig,
    session: Option<Box<dyn VehicleSdk>>,
    relay: Arc<Mutex<EventRelay>>,
}

impl fmt::Debug for AccessManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessManager")
            .field("config", &self.config)
            .field("session_open", &self.session.is_some())
            .finish()
    }
}

impl AccessManager {
    /// Manager with default session tuning
    pub fn new(connector: Box<dyn SdkConnector>) -> Self {
        Self::with_config(connector, SessionConfig::default())
    }

    /// Manager with explicit session tuning
    pub fn with_config(connector: Box<dyn SdkConnector>, config: SessionConfig) -> Self {
        Self {
            connector,
            config,
            session: None,
            relay: Arc::new(Mutex::new(EventRelay::new())),
        }
    }

    /// Tuning used for every session this manager opens
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// True while an initialized session is held
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Registers the sink all further events go to
    pub fn register_event_sink(&self, sink: Arc<dyn EventSink>) {
        self.relay.lock().unwrap().register_sink(sink);
    }

    /// Drops the registered event sink
    pub fn clear_event_sink(&self) {
        self.relay.lock().unwrap().clear_sink();
    }

    /// Emits an event past the diff logic, used for channel handshakes
    pub fn emit_event(&self, event: &VehicleEvent) {
        self.relay.lock().unwrap().emit(event);
    }

    /// Opens a session for an access grant backed by the given keyring JSON.
    ///
    /// Any previously held session is closed first, whatever the outcome, so a
    /// failed call never leaves a connectable session behind. The three
    /// failure modes map to [`BridgeError::KeyringParse`],
    /// [`BridgeError::SessionOpen`] and [`BridgeError::KeyringRejected`].
    pub fn initialize(
        &mut self,
        vehicle_access_grant_id: &str,
        keyring_json: &str,
    ) -> BridgeResult<()> {
        self.teardown();

        let keyring = Keyring::from_json(keyring_json)?;

        log::info!("opening vehicle SDK session for grant '{vehicle_access_grant_id}'");
        let handler: SharedStatusHandler = self.relay.clone();
        let mut session = self.connector.open(&self.config, handler)?;

        if session.use_access_grant(vehicle_access_grant_id, &keyring) {
            self.session = Some(session);
            Ok(())
        } else {
            log::warn!("vehicle SDK rejected grant '{vehicle_access_grant_id}'");
            session.close();
            Err(BridgeError::KeyringRejected {
                grant_id: vehicle_access_grant_id.to_string(),
            })
        }
    }

    /// Starts searching for the granted vehicle
    pub fn connect(&mut self) {
        self.with_session("connect", |session| session.search_and_connect());
    }

    /// Stops searching and drops any established connection
    pub fn disconnect(&mut self) {
        self.with_session("disconnect", |session| session.cancel_all());
    }

    /// Engages the central locking
    pub fn lock(&mut self) {
        self.with_session("lock", |session| session.lock_doors());
    }

    /// Releases the central locking
    pub fn unlock(&mut self) {
        self.with_session("unlock", |session| session.unlock_doors());
    }

    /// Releases the immobilizer so the engine can be started
    pub fn enable_ignition(&mut self) {
        self.with_session("enableIgnition", |session| {
            session.control_immobilizer(false)
        });
    }

    /// Engages the immobilizer
    pub fn disable_ignition(&mut self) {
        self.with_session("disableIgnition", |session| {
            session.control_immobilizer(true)
        });
    }

    /// Asks the vehicle for a location fix
    pub fn request_location(&mut self) {
        self.with_session("requestLocation", |session| session.query_location());
    }

    /// Asks the vehicle for the given telematics quantities
    pub fn request_telematics_data(&mut self, kinds: TelematicsKinds) {
        self.with_session("requestTelematicsData", |session| {
            session.query_telematics_data(kinds)
        });
    }

    /// Closes the held session, if any
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            log::info!("closing vehicle SDK session");
            session.close();
        }
    }

    fn with_session(&mut self, op: &'static str, f: impl FnOnce(&mut dyn VehicleSdk)) {
        match self.session.as_deref_mut() {
            Some(session) => f(session),
            None => log::warn!("{op} requested without an initialized session, ignoring"),
        }
    }
}

impl Drop for AccessManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
