//! Keyring data model
//!
//! A keyring is the credential bundle a fleet backend issues to an app so that it
//! may talk to specific vehicles. It pairs *lease tokens* (per user access grants,
//! each naming the vehicle side secure element they unlock) with *blobs* (opaque
//! encrypted payloads the secure element itself consumes). The bridge never
//! interprets the cryptographic material; it only deserializes the bundle and
//! hands it to the vehicle SDK, which performs the actual validation.
//!
//! Field spellings follow the backend wire format, hence the camelCase rename on
//! every type here.

use serde::{Deserialize, Serialize};

/// Credential bundle issued by a fleet backend
///
/// Obtained by the app layer as a JSON document via [`Keyring::from_json`].
/// A keyring can cover several vehicles and several access grants at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyring {
    /// Version tag of the lease token table format
    pub tacs_lease_token_table_version: String,
    /// One entry per access grant the user holds
    pub tacs_lease_token_table: Vec<LeaseTokenEntry>,
    /// Version tag of the blob table format
    pub tacs_sorc_blob_table_version: String,
    /// One entry per vehicle the keyring can address
    pub tacs_sorc_blob_table: Vec<SorcBlobEntry>,
}

/// Binds an access grant id to the lease token that backs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTokenEntry {
    /// Access grant id the app layer selects a vehicle by
    pub vehicle_access_grant_id: String,
    /// Lease token granting access to one vehicle
    pub lease_token: LeaseToken,
}

/// Time boxed permission for one user to use one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseToken {
    /// Version tag of the lease token document format
    pub lease_token_document_version: String,
    /// Unique id of this token
    pub lease_token_id: String,
    /// Id of the lease this token was minted for
    pub lease_id: String,
    /// User the lease was issued to
    pub user_id: String,
    /// Secure element in the vehicle this token addresses
    pub sorc_id: String,
    /// Key material for the BLE challenge, opaque to the bridge
    pub sorc_access_key: String,
    /// Start of the validity window (ISO-8601)
    pub start_time: String,
    /// End of the validity window (ISO-8601)
    pub end_time: String,
    /// Operations the token permits on the vehicle
    pub service_grant_list: Vec<ServiceGrant>,
}

/// Single permitted operation inside a lease token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGrant {
    /// Vendor assigned id of the operation (lock, unlock, engine start, ...)
    pub service_grant_id: String,
    /// Validity window for this single operation
    pub validators: Validators,
}

/// Validity window of a service grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validators {
    /// Start of the window (ISO-8601)
    pub start_time: String,
    /// End of the window (ISO-8601)
    pub end_time: String,
}

/// Binds a vehicle reference to the blob its secure element consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SorcBlobEntry {
    /// Tenant (fleet operator) the vehicle belongs to
    pub tenant_id: String,
    /// Operator facing vehicle reference (usually the VIN)
    pub external_vehicle_ref: String,
    /// Physical keyholder device, when the fleet uses them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyholder_id: Option<String>,
    /// Encrypted payload for the vehicle secure element
    pub blob: Blob,
}

/// Encrypted payload addressed to one vehicle secure element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// Secure element the payload is encrypted for
    pub sorc_id: String,
    /// The encrypted payload itself, base64
    pub blob: String,
    /// Rollover counter, prevents replay of stale blobs
    pub blob_message_counter: String,
}

impl Keyring {
    /// Deserializes a keyring from the JSON document handed over by the app layer.
    ///
    /// Only checks that the document is well formed. Whether the contained
    /// credentials are *valid* is decided by the vehicle SDK when an access
    /// grant is selected.
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Looks up the lease token entry for an access grant id
    pub fn lease_token_entry(&self, vehicle_access_grant_id: &str) -> Option<&LeaseTokenEntry> {
        self.tacs_lease_token_table
            .iter()
            .find(|entry| entry.vehicle_access_grant_id == vehicle_access_grant_id)
    }

    /// Looks up the blob entry addressed to a vehicle secure element
    pub fn blob_entry(&self, sorc_id: &str) -> Option<&SorcBlobEntry> {
        self.tacs_sorc_blob_table
            .iter()
            .find(|entry| entry.blob.sorc_id == sorc_id)
    }

    /// Checks that an access grant resolves to both a lease token and a blob.
    ///
    /// This is the structural half of what the vehicle SDK verifies when the
    /// grant is selected. A keyring that fails this check can never produce a
    /// connectable session.
    pub fn grant_is_complete(&self, vehicle_access_grant_id: &str) -> bool {
        self.lease_token_entry(vehicle_access_grant_id)
            .and_then(|entry| self.blob_entry(&entry.lease_token.sorc_id))
            .is_some()
    }
}
