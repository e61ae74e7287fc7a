//! Webview plugin bridge
//!
//! Reproduces the execute contract webview plugin frameworks use: the app
//! layer calls a named action with a JSON argument array and a callback, the
//! bridge answers every *known* action with a synchronous [`PluginResult`] and
//! reports unknown actions as not handled. The callback passed to
//! [`Action::SetupEventChannel`] is kept open and carries every
//! [`VehicleEvent`] from then on, wrapped in the `tacs:` envelope.
//!
//! Command acknowledgments only confirm hand-off to the vehicle SDK. Whether a
//! door actually unlocked arrives later as an event.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use strum_macros::{Display, EnumString};

use crate::event::VehicleEvent;
use crate::guard::{Environment, check_environment};
use crate::manager::AccessManager;
use crate::relay::EventSink;
use crate::sdk::{SdkConnector, SessionConfig, TelematicsKinds};
use crate::{BridgeError, BridgeResult};

/// Actions the plugin handles, wire spelling is the camelCase variant name
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase")]
#[allow(missing_docs)]
pub enum Action {
    SetupEventChannel,
    Initialize,
    Connect,
    Disconnect,
    Unlock,
    Lock,
    EnableIgnition,
    DisableIgnition,
    RequestLocation,
    RequestTelematicsData,
}

/// Acknowledge status of a plugin result
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AckStatus {
    /// The action was handed to the vehicle SDK
    Ok,
    /// The action could not be carried out
    Error,
}

/// One message back to the app layer
///
/// Mirrors the result object webview frameworks hand to their callbacks. A
/// result with [`PluginResult::keep_callback`] set tells the framework to keep
/// the callback alive for further results on the same channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginResult {
    /// Outcome of the action
    pub status: AckStatus,
    /// Payload, a plain string for acks and an event envelope on the channel
    pub message: Option<Value>,
    /// Keep the callback open for further results
    pub keep_callback: bool,
}

impl PluginResult {
    /// Plain success acknowledgment
    pub fn ok() -> Self {
        Self {
            status: AckStatus::Ok,
            message: None,
            keep_callback: false,
        }
    }

    /// Success acknowledgment with a payload
    pub fn ok_with(message: impl Into<Value>) -> Self {
        Self {
            status: AckStatus::Ok,
            message: Some(message.into()),
            keep_callback: false,
        }
    }

    /// Error acknowledgment with a reason
    pub fn error(message: impl Into<Value>) -> Self {
        Self {
            status: AckStatus::Error,
            message: Some(message.into()),
            keep_callback: false,
        }
    }

    /// Event delivery on a kept open callback
    pub fn event(envelope: Value) -> Self {
        Self {
            status: AckStatus::Ok,
            message: Some(envelope),
            keep_callback: true,
        }
    }
}

/// Receiver for plugin results, the callback side of the host framework
///
/// Must not block: results can arrive from SDK callback contexts.
pub trait ResultSink: Send + Sync {
    /// Hands one result to the app layer callback
    fn send_result(&self, result: PluginResult);
}

/// Queue backed sink, convenient for tests and headless hosts
impl ResultSink for std::sync::mpsc::Sender<PluginResult> {
    fn send_result(&self, result: PluginResult) {
        if self.send(result).is_err() {
            log::warn!("plugin result dropped, receiver is gone");
        }
    }
}

/// Event sink wrapping the kept open channel callback
struct ChannelSink {
    ctx: Arc<dyn ResultSink>,
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: &VehicleEvent) {
        match event.envelope() {
            Ok(envelope) => self.ctx.send_result(PluginResult::event(envelope)),
            Err(err) => log::error!("could not send {} event: {err}", event.name()),
        }
    }
}

/// The plugin bridge itself
///
/// One instance lives as long as the hosting webview. The connector opens
/// vendor SDK sessions, the environment answers the prerequisite checks run on
/// [`Action::Initialize`].
pub struct VehiclePlugin {
    manager: AccessManager,
    environment: Box<dyn Environment>,
}

impl fmt::Debug for VehiclePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehiclePlugin")
            .field("manager", &self.manager)
            .finish()
    }
}

impl VehiclePlugin {
    /// Plugin with default session tuning
    pub fn new(connector: Box<dyn SdkConnector>, environment: Box<dyn Environment>) -> Self {
        Self::with_config(connector, environment, SessionConfig::default())
    }

    /// Plugin with explicit session tuning
    pub fn with_config(
        connector: Box<dyn SdkConnector>,
        environment: Box<dyn Environment>,
        config: SessionConfig,
    ) -> Self {
        Self {
            manager: AccessManager::with_config(connector, config),
            environment,
        }
    }

    /// True while an initialized session is held
    pub fn has_session(&self) -> bool {
        self.manager.has_session()
    }

    /// Entry point called by the host framework for every app layer call.
    ///
    /// Returns false when `action` is not part of the plugin's vocabulary, in
    /// which case nothing was sent to `ctx` and the framework should try the
    /// next plugin. Every known action sends exactly one result to `ctx`,
    /// except [`Action::SetupEventChannel`] whose results keep flowing for the
    /// plugin's lifetime.
    pub fn execute(&mut self, action: &str, args: &[Value], ctx: Arc<dyn ResultSink>) -> bool {
        let Ok(known) = action.parse::<Action>() else {
            log::debug!("action '{action}' not handled by the vehicle plugin");
            return false;
        };
        log::info!("executing vehicle plugin action '{known}'");

        match known {
            Action::SetupEventChannel => self.setup_event_channel(ctx),
            Action::Initialize => self.initialize(args, ctx),
            Action::Connect => {
                self.manager.connect();
                ctx.send_result(PluginResult::ok());
            }
            Action::Disconnect => {
                self.manager.disconnect();
                ctx.send_result(PluginResult::ok());
            }
            Action::Unlock => {
                self.manager.unlock();
                ctx.send_result(PluginResult::ok());
            }
            Action::Lock => {
                self.manager.lock();
                ctx.send_result(PluginResult::ok());
            }
            Action::EnableIgnition => {
                self.manager.enable_ignition();
                ctx.send_result(PluginResult::ok());
            }
            Action::DisableIgnition => {
                self.manager.disable_ignition();
                ctx.send_result(PluginResult::ok());
            }
            Action::RequestLocation => {
                self.manager.request_location();
                ctx.send_result(PluginResult::ok());
            }
            Action::RequestTelematicsData => {
                self.manager.request_telematics_data(TelematicsKinds::all());
                ctx.send_result(PluginResult::ok());
            }
        }
        true
    }

    /// Host lifecycle hook, closes the session when the webview goes away
    pub fn on_destroy(&mut self) {
        self.manager.teardown();
    }

    fn setup_event_channel(&mut self, ctx: Arc<dyn ResultSink>) {
        log::info!("setting up the vehicle event channel");
        self.manager.register_event_sink(Arc::new(ChannelSink { ctx }));
        self.manager.emit_event(&VehicleEvent::Initialized);
    }

    fn initialize(&mut self, args: &[Value], ctx: Arc<dyn ResultSink>) {
        // side effecting walk, steers the user but never blocks initialization
        let readiness = check_environment(self.environment.as_mut());
        if !readiness.is_ready() {
            log::warn!("environment not ready for a vehicle search: {readiness:?}");
        }

        let outcome = Self::credentials(args)
            .and_then(|(grant, keyring)| self.manager.initialize(grant, keyring));
        match outcome {
            Ok(()) => ctx.send_result(PluginResult::ok_with("Ready to connect")),
            Err(err @ (BridgeError::KeyringParse(_) | BridgeError::KeyringRejected { .. })) => {
                log::warn!("initialization failed: {err}");
                ctx.send_result(PluginResult::error("Keyring invalid"));
            }
            Err(err) => {
                log::error!("initialization failed: {err}");
                ctx.send_result(PluginResult::error(err.to_string()));
            }
        }
    }

    fn credentials(args: &[Value]) -> BridgeResult<(&str, &str)> {
        match args {
            [Value::String(grant), Value::String(keyring), ..] => Ok((grant, keyring)),
            _ => Err(BridgeError::MissingCredentials),
        }
    }
}
