//! Enrichment adapters — best-effort external lookups that auto-fill fields
//! from a coarser answer (coordinates, district, URL).
//!
//! These services are stateless collaborators; the controller calls them and
//! treats every failure as "no data".

pub mod http;

use async_trait::async_trait;

use crate::error::EnrichmentError;

pub use http::HttpEnrichment;

/// Result of a reverse geocode. All fields are best-effort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeResult {
    pub state: Option<String>,
    pub district: Option<String>,
    pub postcode: Option<String>,
}

/// Coordinates resolved from a bare pincode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PincodeLocation {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Result of a logo discovery attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogoLookup {
    pub found: bool,
    pub logo_url: Option<String>,
}

/// Company details scraped from a website URL.
///
/// The controller merges this into the answer record only when `state`,
/// `district`, `lat`, and `lon` are all present; partial results are
/// discarded entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyMetadata {
    pub state: Option<String>,
    pub district: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub pincode: Option<String>,
}

impl CompanyMetadata {
    /// Whether the mandatory quartet is present and the result may be merged.
    pub fn is_complete(&self) -> bool {
        self.state.is_some() && self.district.is_some() && self.lat.is_some() && self.lon.is_some()
    }
}

/// External lookup services consulted by the controller.
#[async_trait]
pub trait EnrichmentService: Send + Sync {
    /// lat/lon → state/district/postcode, any of which may be missing.
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<GeocodeResult, EnrichmentError>;

    /// Ordered pincode list for a district. The controller takes the first
    /// few (see `WizardConfig::pincode_choices`).
    async fn pincodes_by_district(
        &self,
        district: &str,
        state: &str,
    ) -> Result<Vec<String>, EnrichmentError>;

    /// Bare pincode → coordinates, used when only a pincode was given.
    async fn pincode_lookup(&self, pincode: &str) -> Result<PincodeLocation, EnrichmentError>;

    /// Discover a logo for a website URL.
    async fn fetch_logo(&self, site_url: &str) -> Result<LogoLookup, EnrichmentError>;

    /// Scrape company location details from a website URL.
    async fn company_metadata(&self, site_url: &str)
        -> Result<CompanyMetadata, EnrichmentError>;
}
