//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

/// Wizard configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Base URL of the marketplace backend (create-company, create-job,
    /// create-gig, conversation log).
    pub api_base_url: String,
    /// Bearer token presented to the marketplace backend.
    pub api_token: Option<SecretString>,
    /// Base URL of the reverse-geocoding service.
    pub geocode_base_url: String,
    /// Base URL of the pincode directory service.
    pub pincode_base_url: String,
    /// Base URL of the logo discovery service.
    pub logo_base_url: String,
    /// Delay between revealed characters in the typing simulation.
    pub typing_delay: Duration,
    /// Extra attempts after the first, on network-level failure only.
    pub submit_retries: u32,
    /// Snapshots older than this are discarded on restore.
    pub snapshot_max_age: chrono::Duration,
    /// Maximum number of pincodes offered in the choice widget.
    pub pincode_choices: usize,
    /// Directory for local session snapshots.
    pub snapshot_dir: std::path::PathBuf,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            api_token: None,
            geocode_base_url: "https://nominatim.openstreetmap.org".to_string(),
            pincode_base_url: "https://api.postalpincode.in".to_string(),
            logo_base_url: "https://img.logo.dev".to_string(),
            typing_delay: Duration::from_millis(12),
            submit_retries: 2,
            snapshot_max_age: chrono::Duration::hours(24),
            pincode_choices: 8,
            snapshot_dir: std::path::PathBuf::from("./data/snapshots"),
        }
    }
}
