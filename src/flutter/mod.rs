//! Method channel bridge
//!
//! The Dart side talks to vehicle access over a single method channel named
//! [`CHANNEL`]. This variant carries the same operations as the webview bridge
//! under its own historical method spellings (`enableEngine` instead of
//! `enableIgnition`, `buildKeyring` instead of `initialize`) and answers every
//! dispatched method with a [`MethodResult`] instead of a plugin result object.
//!
//! Differences to [`crate::cordova`] kept on purpose: there is no environment
//! guard here (Dart hosts run their own permission flow before touching the
//! channel) and events are attached explicitly via
//! [`VehicleChannel::attach_event_sink`] rather than through a channel setup
//! method, mirroring how method and event channels are separate things in
//! Flutter.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::manager::AccessManager;
use crate::relay::EventSink;
use crate::sdk::{SdkConnector, SessionConfig, TelematicsKinds};
use crate::{BridgeError, BridgeResult};

/// Name of the method channel the Dart side opens
pub const CHANNEL: &str = "tacsflutter";

/// One invocation arriving over the method channel
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Method name as spelled by the Dart side
    pub method: String,
    /// Arguments, [`Value::Null`] when the method takes none
    pub arguments: Value,
}

impl MethodCall {
    /// Call with arguments
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Call without arguments
    pub fn plain(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }
}

/// Answer to one method call
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    /// The method was carried out
    Success(Value),
    /// The method failed
    Error {
        /// Machine readable error code
        code: String,
        /// Human readable description
        message: String,
    },
    /// The method is not part of this channel's vocabulary
    NotImplemented,
}

impl MethodResult {
    fn error(code: &str, message: impl Into<String>) -> Self {
        MethodResult::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Handler side of the vehicle access method channel
pub struct VehicleChannel {
    manager: AccessManager,
    platform: String,
}

impl fmt::Debug for VehicleChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleChannel")
            .field("manager", &self.manager)
            .field("platform", &self.platform)
            .finish()
    }
}

impl VehicleChannel {
    /// Channel handler with default session tuning
    ///
    /// `platform` is the host's version label, answered verbatim to the
    /// `getPlatformVersion` probe the Dart template sends.
    pub fn new(connector: Box<dyn SdkConnector>, platform: impl Into<String>) -> Self {
        Self::with_config(connector, platform, SessionConfig::default())
    }

    /// Channel handler with explicit session tuning
    pub fn with_config(
        connector: Box<dyn SdkConnector>,
        platform: impl Into<String>,
        config: SessionConfig,
    ) -> Self {
        Self {
            manager: AccessManager::with_config(connector, config),
            platform: platform.into(),
        }
    }

    /// True while an initialized session is held
    pub fn has_session(&self) -> bool {
        self.manager.has_session()
    }

    /// Wires the event channel counterpart.
    ///
    /// Vehicle events start flowing to `sink` immediately; events raised while
    /// no sink was attached are dropped, not queued.
    pub fn attach_event_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.manager.register_event_sink(sink);
    }

    /// Handler entry point for every method call from the Dart side
    pub fn on_method_call(&mut self, call: &MethodCall) -> MethodResult {
        log::info!("method channel call '{}'", call.method);
        match call.method.as_str() {
            "getPlatformVersion" => MethodResult::Success(Value::from(self.platform.clone())),
            "buildKeyring" => self.build_keyring(&call.arguments),
            "connect" => {
                self.manager.connect();
                MethodResult::Success(Value::Null)
            }
            "disconnect" => {
                self.manager.disconnect();
                MethodResult::Success(Value::Null)
            }
            "lock" => {
                self.manager.lock();
                MethodResult::Success(Value::Null)
            }
            "unlock" => {
                self.manager.unlock();
                MethodResult::Success(Value::Null)
            }
            "enableEngine" => {
                self.manager.enable_ignition();
                MethodResult::Success(Value::Null)
            }
            "disableEngine" => {
                self.manager.disable_ignition();
                MethodResult::Success(Value::Null)
            }
            "location" => {
                self.manager.request_location();
                MethodResult::Success(Value::Null)
            }
            "telematics" => {
                self.manager.request_telematics_data(TelematicsKinds::all());
                MethodResult::Success(Value::Null)
            }
            other => {
                log::debug!("method '{other}' not implemented on {CHANNEL}");
                MethodResult::NotImplemented
            }
        }
    }

    /// Host lifecycle hook for engine detach, closes the session
    pub fn on_detach(&mut self) {
        self.manager.clear_event_sink();
        self.manager.teardown();
    }

    fn build_keyring(&mut self, arguments: &Value) -> MethodResult {
        let outcome = Self::credentials(arguments)
            .and_then(|(grant, keyring)| self.manager.initialize(grant, keyring));
        match outcome {
            Ok(()) => MethodResult::Success(Value::from("Keyring")),
            Err(err @ BridgeError::MissingCredentials) => {
                log::warn!("buildKeyring failed: {err}");
                MethodResult::error("BAD_ARGUMENTS", err.to_string())
            }
            Err(err @ (BridgeError::KeyringParse(_) | BridgeError::KeyringRejected { .. })) => {
                log::warn!("buildKeyring failed: {err}");
                MethodResult::error("KEYRING_INVALID", "Keyring invalid")
            }
            Err(err) => {
                log::error!("buildKeyring failed: {err}");
                MethodResult::error("SDK_UNAVAILABLE", err.to_string())
            }
        }
    }

    fn credentials(arguments: &Value) -> BridgeResult<(&str, &str)> {
        match arguments {
            Value::Array(items) => match items.as_slice() {
                [Value::String(grant), Value::String(keyring), ..] => Ok((grant, keyring)),
                _ => Err(BridgeError::MissingCredentials),
            },
            _ => Err(BridgeError::MissingCredentials),
        }
    }
}

#[cfg(test)]
pub mod channel_test {
    use super::*;
    use crate::keyring::keyring_test::DEMO_KEYRING;
    use crate::sdk::mock::{MockConnector, SdkCall};
    use serde_json::json;

    fn channel() -> (VehicleChannel, MockConnector) {
        let connector = MockConnector::new();
        let channel = VehicleChannel::new(Box::new(connector.clone()), "Android 13");
        (channel, connector)
    }

    fn keyring_args() -> Value {
        json!(["grant-4711", DEMO_KEYRING])
    }

    #[test]
    fn platform_probe() {
        let (mut channel, _connector) = channel();
        assert_eq!(
            channel.on_method_call(&MethodCall::plain("getPlatformVersion")),
            MethodResult::Success(Value::from("Android 13"))
        );
    }

    #[test]
    fn unknown_method_not_implemented() {
        let (mut channel, _connector) = channel();
        assert_eq!(
            channel.on_method_call(&MethodCall::plain("flyToTheMoon")),
            MethodResult::NotImplemented
        );
    }

    #[test]
    fn build_keyring_initializes() {
        let (mut channel, connector) = channel();
        let result = channel.on_method_call(&MethodCall::new("buildKeyring", keyring_args()));
        assert_eq!(result, MethodResult::Success(Value::from("Keyring")));
        assert!(channel.has_session());
        assert_eq!(connector.session_count(), 1);
    }

    #[test]
    fn build_keyring_rejects_bad_arguments() {
        let (mut channel, connector) = channel();
        let result = channel.on_method_call(&MethodCall::plain("buildKeyring"));
        assert!(matches!(result, MethodResult::Error { ref code, .. } if code == "BAD_ARGUMENTS"));
        assert_eq!(connector.session_count(), 0);
    }

    #[test]
    fn build_keyring_reports_invalid_keyring() {
        let (mut channel, _connector) = channel();
        let result = channel.on_method_call(&MethodCall::new(
            "buildKeyring",
            json!(["grant-unknown", DEMO_KEYRING]),
        ));
        assert_eq!(
            result,
            MethodResult::error("KEYRING_INVALID", "Keyring invalid")
        );
        assert!(!channel.has_session());
    }

    #[test]
    fn methods_map_onto_sdk_calls() {
        let (mut channel, connector) = channel();
        channel.on_method_call(&MethodCall::new("buildKeyring", keyring_args()));

        let methods = [
            "connect",
            "unlock",
            "lock",
            "enableEngine",
            "disableEngine",
            "location",
            "telematics",
            "disconnect",
        ];
        for method in methods {
            assert_eq!(
                channel.on_method_call(&MethodCall::plain(method)),
                MethodResult::Success(Value::Null),
                "method '{method}'"
            );
        }

        let calls = connector.last_session().unwrap().calls();
        assert_eq!(
            calls[1..],
            [
                SdkCall::SearchAndConnect,
                SdkCall::UnlockDoors,
                SdkCall::LockDoors,
                SdkCall::ControlImmobilizer { engage: false },
                SdkCall::ControlImmobilizer { engage: true },
                SdkCall::QueryLocation,
                SdkCall::QueryTelematicsData {
                    kinds: TelematicsKinds::all()
                },
                SdkCall::CancelSearch,
                SdkCall::CancelConnection,
            ]
        );
    }

    #[test]
    fn detach_closes_the_session() {
        let (mut channel, connector) = channel();
        channel.on_method_call(&MethodCall::new("buildKeyring", keyring_args()));
        let session = connector.last_session().unwrap();

        channel.on_detach();
        assert!(session.is_closed());
        assert!(!channel.has_session());
    }
}
