//! Environment readiness guard
//!
//! BLE vehicle access needs three things from the phone before a search can
//! succeed: Bluetooth switched on, location services enabled (Android gates BLE
//! scanning behind them) and the fine location runtime permission. The guard
//! walks these in order over a host supplied [`Environment`] and stops at the
//! first unmet prerequisite, steering the user towards the right settings page
//! on the way.
//!
//! The guard never fails an initialization. Its side effects are user facing
//! dialogs and settings intents; the bridge proceeds regardless and a vehicle
//! search started in a non ready environment simply finds nothing.

use bitflags::bitflags;

bitflags! {
    /// Prerequisites for a successful vehicle search
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Prerequisites: u8 {
        /// Bluetooth radio present and switched on
        const BLUETOOTH = 1 << 0;
        /// OS location services enabled
        const LOCATION_SERVICES = 1 << 1;
        /// Fine location runtime permission granted
        const FINE_LOCATION_PERMISSION = 1 << 2;
    }
}

/// State of the fine location runtime permission
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PermissionState {
    /// Granted, nothing to do
    Granted,
    /// Denied so far, the OS asks for a rationale before re-prompting
    RationaleNeeded,
    /// Denied, but the user may still be asked again
    Denied,
    /// Denied with "don't ask again", only the settings app can change it
    PermanentlyDenied,
}

/// Settings page the guard can steer the user to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SettingsPage {
    /// System Bluetooth settings
    Bluetooth,
    /// System location services settings
    LocationServices,
    /// Per app details page, where permissions can be changed
    AppDetails,
}

/// User facing prompt offering to open a settings page
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SettingsPrompt {
    /// Dialog title
    pub title: &'static str,
    /// Dialog body
    pub message: &'static str,
    /// Page to open when the user accepts
    pub page: SettingsPage,
}

/// Prompt shown when Bluetooth is switched off
pub const BLUETOOTH_PROMPT: SettingsPrompt = SettingsPrompt {
    title: "Turn on Bluetooth",
    message: "Please turn on the Bluetooth on your phone in order to establish a secure connection to your vehicle.",
    page: SettingsPage::Bluetooth,
};

/// Prompt shown when location services are disabled
pub const LOCATION_SERVICES_PROMPT: SettingsPrompt = SettingsPrompt {
    title: "Turn on Location Services",
    message: "Some Android phones require Location Services to be enabled in order to scan nearby Bluetooth devices.",
    page: SettingsPage::LocationServices,
};

/// Host platform capabilities the guard runs against
///
/// Query methods are cheap state reads. The remaining methods are the guard's
/// only side effects and map onto dialogs and settings intents on a real
/// device.
pub trait Environment: Send {
    /// True when the device has a usable Bluetooth radio at all
    fn bluetooth_adapter_present(&self) -> bool;

    /// True when the Bluetooth radio is switched on
    fn bluetooth_enabled(&self) -> bool;

    /// True when OS location services are enabled
    fn location_services_enabled(&self) -> bool;

    /// Current state of the fine location runtime permission
    fn fine_location_permission(&self) -> PermissionState;

    /// Shows a prompt offering to open `prompt.page`
    fn prompt_settings(&mut self, prompt: &SettingsPrompt);

    /// Opens a settings page directly, without a prompt
    fn open_settings(&mut self, page: SettingsPage);

    /// Continues a paused permission request after its rationale was shown
    fn continue_permission_request(&mut self);
}

/// Outcome of an environment walk
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// All prerequisites met
    Ready,
    /// The device has no Bluetooth radio, nothing the user can do
    BluetoothUnavailable,
    /// Bluetooth is switched off, the user was prompted
    BluetoothDisabled,
    /// Location services are disabled, the user was prompted
    LocationServicesDisabled,
    /// The fine location permission is denied
    PermissionDenied {
        /// With "don't ask again"; the app details page was opened
        permanently: bool,
    },
    /// The permission request was re-triggered after its rationale
    PermissionRequested,
}

impl Readiness {
    /// True when a vehicle search can succeed right now
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    /// Prerequisites known to be met when the walk ended here
    pub fn satisfied(&self) -> Prerequisites {
        match self {
            Readiness::Ready => Prerequisites::all(),
            Readiness::BluetoothUnavailable | Readiness::BluetoothDisabled => {
                Prerequisites::empty()
            }
            Readiness::LocationServicesDisabled => Prerequisites::BLUETOOTH,
            Readiness::PermissionDenied { .. } | Readiness::PermissionRequested => {
                Prerequisites::BLUETOOTH | Prerequisites::LOCATION_SERVICES
            }
        }
    }
}

/// Walks the prerequisite chain, stopping at the first unmet one.
///
/// Later prerequisites are not even queried once an earlier one fails, since
/// their dialogs would otherwise stack on a device missing several things at
/// once.
pub fn check_environment(env: &mut dyn Environment) -> Readiness {
    if !env.bluetooth_adapter_present() {
        // nothing a dialog could fix
        log::warn!("no bluetooth adapter on this device");
        return Readiness::BluetoothUnavailable;
    }
    if !env.bluetooth_enabled() {
        log::warn!("bluetooth is switched off");
        env.prompt_settings(&BLUETOOTH_PROMPT);
        return Readiness::BluetoothDisabled;
    }
    if !env.location_services_enabled() {
        log::warn!("location services are disabled");
        env.prompt_settings(&LOCATION_SERVICES_PROMPT);
        return Readiness::LocationServicesDisabled;
    }
    match env.fine_location_permission() {
        PermissionState::Granted => Readiness::Ready,
        PermissionState::RationaleNeeded => {
            log::info!("fine location permission pending a rationale, continuing request");
            env.continue_permission_request();
            Readiness::PermissionRequested
        }
        PermissionState::Denied => {
            log::warn!("fine location permission denied");
            Readiness::PermissionDenied { permanently: false }
        }
        PermissionState::PermanentlyDenied => {
            log::warn!("fine location permission permanently denied, opening app settings");
            env.open_settings(SettingsPage::AppDetails);
            Readiness::PermissionDenied { permanently: true }
        }
    }
}

/// Environment with every prerequisite met and no-op side effects
///
/// Useful on hosts without the OS surfaces involved, and together with
/// [`crate::sdk::mock`] for running a whole bridge in tests.
#[derive(Debug, Copy, Clone, Default)]
pub struct ReadyEnvironment;

impl Environment for ReadyEnvironment {
    fn bluetooth_adapter_present(&self) -> bool {
        true
    }

    fn bluetooth_enabled(&self) -> bool {
        true
    }

    fn location_services_enabled(&self) -> bool {
        true
    }

    fn fine_location_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn prompt_settings(&mut self, prompt: &SettingsPrompt) {
        log::debug!("settings prompt suppressed: {}", prompt.title);
    }

    fn open_settings(&mut self, page: SettingsPage) {
        log::debug!("settings navigation suppressed: {page:?}");
    }

    fn continue_permission_request(&mut self) {}
}
