use std::sync::{Arc, mpsc};

use serde_json::{Value, json};

use vehicle_access::cordova::VehiclePlugin;
use vehicle_access::guard::ReadyEnvironment;
use vehicle_access::sdk::mock::MockConnector;
use vehicle_access::sdk::{
    BluetoothDeviceStatus, ConnectionStatus, DoorStatus, ImmobilizerStatus, LogEvent,
    TelematicsData, TelematicsKind, VehicleStatus,
};

extern crate vehicle_access;

fn keyring() -> String {
    json!({
        "tacsLeaseTokenTableVersion": "1",
        "tacsLeaseTokenTable": [{
            "vehicleAccessGrantId": "demo-grant",
            "leaseToken": {
                "leaseTokenDocumentVersion": "1",
                "leaseTokenId": "0a0a0a0a-1111-2222-3333-444444444444",
                "leaseId": "0b0b0b0b-1111-2222-3333-444444444444",
                "userId": "demo-user",
                "sorcId": "0c0c0c0c-1111-2222-3333-444444444444",
                "sorcAccessKey": "00112233445566778899aabbccddeeff",
                "startTime": "2026-01-01T00:00:00Z",
                "endTime": "2026-12-31T23:59:59Z",
                "serviceGrantList": []
            }
        }],
        "tacsSorcBlobTableVersion": "1",
        "tacsSorcBlobTable": [{
            "tenantId": "demo-tenant",
            "externalVehicleRef": "DEMO0000000000001",
            "blob": {
                "sorcId": "0c0c0c0c-1111-2222-3333-444444444444",
                "blob": "ZGVtbw==",
                "blobMessageCounter": "1"
            }
        }]
    })
    .to_string()
}

fn main() {
    env_logger::init();

    let connector = MockConnector::new();
    let mut plugin = VehiclePlugin::new(Box::new(connector.clone()), Box::new(ReadyEnvironment));

    // the app layer side of the bridge, a result queue standing in for the webview
    let (tx, rx) = mpsc::channel();
    plugin.execute("setupEventChannel", &[], Arc::new(tx.clone()));
    plugin.execute(
        "initialize",
        &[Value::from("demo-grant"), Value::from(keyring())],
        Arc::new(tx.clone()),
    );
    plugin.execute("connect", &[], Arc::new(tx.clone()));
    plugin.execute("unlock", &[], Arc::new(tx.clone()));
    plugin.execute("requestTelematicsData", &[], Arc::new(tx));

    // the vehicle side, pushing what a real SDK would during a drive
    let vehicle = connector.last_session().unwrap();
    vehicle.push_device_status(BluetoothDeviceStatus::PoweredOn, "adapter ready");
    vehicle.push_log_event(&LogEvent::new(log::Level::Info, "BLE scan window opened"));
    vehicle.push_status(&VehicleStatus {
        connection: ConnectionStatus::Searching,
        ..Default::default()
    });
    vehicle.push_status(&VehicleStatus {
        connection: ConnectionStatus::Connecting,
        ..Default::default()
    });
    vehicle.push_status(&VehicleStatus {
        connection: ConnectionStatus::Connected,
        doors: DoorStatus::Locked,
        immobilizer: ImmobilizerStatus::Engaged,
        ..Default::default()
    });
    vehicle.push_status(&VehicleStatus {
        connection: ConnectionStatus::Connected,
        doors: DoorStatus::Unlocked,
        immobilizer: ImmobilizerStatus::Engaged,
        telematics: vec![
            TelematicsData::reading(TelematicsKind::Odometer, 33000.25),
            TelematicsData::reading(TelematicsKind::FuelLevelPercentage, 73.0),
        ],
        ..Default::default()
    });

    println!("SDK session saw: {:#?}", vehicle.calls());
    println!("App layer received:");
    for result in rx.try_iter() {
        println!("  {:?} {}", result.status, result.message.unwrap_or(Value::Null));
    }
}
