use std::sync::{Arc, Mutex, mpsc};

use serde_json::{Value, json};
use vehicle_access::cordova::{AckStatus, PluginResult, ResultSink, VehiclePlugin};
use vehicle_access::guard::{
    Environment, PermissionState, ReadyEnvironment, SettingsPage, SettingsPrompt,
};
use vehicle_access::sdk::mock::{MockConnector, SdkCall};
use vehicle_access::sdk::{SessionConfig, TelematicsKinds};

pub fn demo_keyring() -> String {
    json!({
        "tacsLeaseTokenTableVersion": "1",
        "tacsLeaseTokenTable": [{
            "vehicleAccessGrantId": "grant-it",
            "leaseToken": {
                "leaseTokenDocumentVersion": "1",
                "leaseTokenId": "c14f1636-0d5d-4a73-b0a2-2b3c58b07d7a",
                "leaseId": "9c2dcd4a-0b51-4c37-9b62-6b4d09cc2fd0",
                "userId": "driver-1",
                "sorcId": "b7e0dc1f-69fd-48c8-93e0-4cc83a3a8fd2",
                "sorcAccessKey": "0123456789abcdef0123456789abcdef",
                "startTime": "2026-01-01T00:00:00Z",
                "endTime": "2026-12-31T23:59:59Z",
                "serviceGrantList": []
            }
        }],
        "tacsSorcBlobTableVersion": "1",
        "tacsSorcBlobTable": [{
            "tenantId": "tenant-1",
            "externalVehicleRef": "WVWZZZ1KZAW000001",
            "blob": {
                "sorcId": "b7e0dc1f-69fd-48c8-93e0-4cc83a3a8fd2",
                "blob": "ZGVtbyBibG9i",
                "blobMessageCounter": "5"
            }
        }]
    })
    .to_string()
}

/// Environment reporting switched off Bluetooth, recording what the guard did
struct BluetoothOffEnvironment {
    prompts: Arc<Mutex<Vec<SettingsPage>>>,
}

impl Environment for BluetoothOffEnvironment {
    fn bluetooth_adapter_present(&self) -> bool {
        true
    }

    fn bluetooth_enabled(&self) -> bool {
        false
    }

    fn location_services_enabled(&self) -> bool {
        panic!("guard must stop at the bluetooth check");
    }

    fn fine_location_permission(&self) -> PermissionState {
        panic!("guard must stop at the bluetooth check");
    }

    fn prompt_settings(&mut self, prompt: &SettingsPrompt) {
        self.prompts.lock().unwrap().push(prompt.page);
    }

    fn open_settings(&mut self, _page: SettingsPage) {}

    fn continue_permission_request(&mut self) {}
}

fn plugin() -> (VehiclePlugin, MockConnector) {
    env_logger::try_init();
    let connector = MockConnector::new();
    let plugin = VehiclePlugin::new(Box::new(connector.clone()), Box::new(ReadyEnvironment));
    (plugin, connector)
}

fn result_channel() -> (Arc<dyn ResultSink>, mpsc::Receiver<PluginResult>) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(tx), rx)
}

fn initialize(plugin: &mut VehiclePlugin, grant: &str) -> PluginResult {
    let (sink, rx) = result_channel();
    let args = [Value::from(grant), Value::from(demo_keyring())];
    assert!(plugin.execute("initialize", &args, sink));
    rx.try_recv().expect("initialize must ack synchronously")
}

#[test]
fn every_command_maps_onto_one_sdk_call() {
    let (mut plugin, connector) = plugin();
    assert_eq!(
        initialize(&mut plugin, "grant-it"),
        PluginResult::ok_with("Ready to connect")
    );

    let (sink, rx) = result_channel();
    for action in [
        "connect",
        "unlock",
        "lock",
        "enableIgnition",
        "disableIgnition",
        "requestLocation",
        "requestTelematicsData",
        "disconnect",
    ] {
        assert!(plugin.execute(action, &[], sink.clone()), "action '{action}'");
    }

    // one plain OK ack per command, none kept open
    let acks: Vec<PluginResult> = rx.try_iter().collect();
    assert_eq!(acks.len(), 8);
    assert!(acks.iter().all(|ack| *ack == PluginResult::ok()));

    let session = connector.last_session().unwrap();
    assert_eq!(
        session.calls(),
        vec![
            SdkCall::UseAccessGrant {
                vehicle_access_grant_id: "grant-it".into(),
                accepted: true
            },
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
fn commands_ack_success_even_without_a_session() {
    let (mut plugin, connector) = plugin();
    let (sink, rx) = result_channel();

    for action in ["connect", "disconnect", "lock", "unlock", "requestLocation"] {
        assert!(plugin.execute(action, &[], sink.clone()));
    }

    let acks: Vec<PluginResult> = rx.try_iter().collect();
    assert_eq!(acks.len(), 5);
    assert!(acks.iter().all(|ack| ack.status == AckStatus::Ok));
    // nothing was there to receive the commands
    assert_eq!(connector.session_count(), 0);
}

#[test]
fn unknown_action_is_left_to_other_plugins() {
    let (mut plugin, connector) = plugin();
    let (sink, rx) = result_channel();

    assert!(!plugin.execute("warpDrive", &[], sink));
    assert!(rx.try_recv().is_err());
    assert_eq!(connector.session_count(), 0);
}

#[test]
fn invalid_keyring_payload_leaves_no_session() {
    let (mut plugin, connector) = plugin();
    let (sink, rx) = result_channel();
    let args = [Value::from("grant-it"), Value::from("{not keyring json")];

    assert!(plugin.execute("initialize", &args, sink));
    let ack = rx.try_recv().unwrap();
    assert_eq!(ack.status, AckStatus::Error);
    assert_eq!(ack.message, Some(Value::from("Keyring invalid")));
    assert!(!plugin.has_session());
    assert_eq!(connector.session_count(), 0);
}

#[test]
fn unknown_grant_is_keyring_invalid_too() {
    let (mut plugin, connector) = plugin();
    let ack = initialize(&mut plugin, "grant-nobody-has");
    assert_eq!(ack, PluginResult::error("Keyring invalid"));
    assert!(!plugin.has_session());
    // the trial session was closed again
    assert!(connector.last_session().unwrap().is_closed());
}

#[test]
fn reinitializing_releases_the_previous_session() {
    let (mut plugin, connector) = plugin();
    initialize(&mut plugin, "grant-it");
    let first = connector.last_session().unwrap();

    initialize(&mut plugin, "grant-it");
    assert!(first.is_closed());
    assert_eq!(connector.session_count(), 2);

    let (sink, _rx) = result_channel();
    plugin.execute("connect", &[], sink);
    let second = connector.last_session().unwrap();
    assert!(second.calls().contains(&SdkCall::SearchAndConnect));
    assert!(!first.calls().contains(&SdkCall::SearchAndConnect));
}

#[test]
fn guard_prompts_but_initialization_proceeds() {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let environment = BluetoothOffEnvironment {
        prompts: prompts.clone(),
    };
    let connector = MockConnector::new();
    let mut plugin = VehiclePlugin::new(Box::new(connector.clone()), Box::new(environment));

    let ack = initialize(&mut plugin, "grant-it");

    // the user was pointed at the bluetooth settings
    assert_eq!(*prompts.lock().unwrap(), vec![SettingsPage::Bluetooth]);
    // but the keyring was still loaded
    assert_eq!(ack, PluginResult::ok_with("Ready to connect"));
    assert!(plugin.has_session());
}

#[test]
fn session_tuning_reaches_the_connector() {
    let config = SessionConfig {
        mock_mode: true,
        search_overdue_ms: 5000,
        search_abort_ms: 15000,
        connection_retry_ms: 8000,
    };
    let connector = MockConnector::new();
    let mut plugin = VehiclePlugin::with_config(
        Box::new(connector.clone()),
        Box::new(ReadyEnvironment),
        config,
    );

    initialize(&mut plugin, "grant-it");
    assert_eq!(connector.last_session().unwrap().config(), config);
}

#[test]
fn destroy_hook_closes_the_session() {
    let (mut plugin, connector) = plugin();
    initialize(&mut plugin, "grant-it");
    let session = connector.last_session().unwrap();

    plugin.on_destroy();
    assert!(session.is_closed());
    assert!(!plugin.has_session());
}
