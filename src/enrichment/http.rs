//! HTTP implementation of the enrichment lookups.
//!
//! Reverse geocoding talks to a Nominatim-compatible endpoint, the pincode
//! directory to a postalpincode-style API, logo discovery to an image CDN
//! that answers HEAD-able logo URLs, and company metadata to the marketplace
//! backend's scraper endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::WizardConfig;
use crate::error::EnrichmentError;

use super::{CompanyMetadata, EnrichmentService, GeocodeResult, LogoLookup, PincodeLocation};

/// Reqwest-backed enrichment client.
pub struct HttpEnrichment {
    client: reqwest::Client,
    geocode_base: String,
    pincode_base: String,
    logo_base: String,
    api_base: String,
}

impl HttpEnrichment {
    pub fn new(config: &WizardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            geocode_base: config.geocode_base_url.clone(),
            pincode_base: config.pincode_base_url.clone(),
            logo_base: config.logo_base_url.clone(),
            api_base: config.api_base_url.clone(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        capability: &str,
        url: String,
    ) -> Result<T, EnrichmentError> {
        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "listing-wizard/0.1")
            .send()
            .await
            .map_err(|e| EnrichmentError::RequestFailed {
                capability: capability.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(EnrichmentError::BadStatus {
                capability: capability.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.json::<T>().await.map_err(|e| EnrichmentError::BadBody {
            capability: capability.to_string(),
            reason: e.to_string(),
        })
    }
}

// ── Wire DTOs ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    state: Option<String>,
    /// Nominatim reports the district under varying keys depending on the
    /// admin hierarchy; state_district is the common one for India.
    state_district: Option<String>,
    county: Option<String>,
    postcode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostalResponse {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "PostOffice", default)]
    post_offices: Option<Vec<PostOffice>>,
}

#[derive(Debug, Deserialize)]
struct PostOffice {
    #[serde(rename = "Pincode")]
    pincode: Option<String>,
    #[serde(rename = "State")]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PincodeGeo {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ScrapedMetadata {
    state: Option<String>,
    district: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    pincode: Option<String>,
}

#[async_trait]
impl EnrichmentService for HttpEnrichment {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<GeocodeResult, EnrichmentError> {
        let url = format!(
            "{}/reverse?lat={lat}&lon={lon}&format=jsonv2&addressdetails=1",
            self.geocode_base
        );
        let body: NominatimReverse = self.get_json("reverse-geocode", url).await?;
        Ok(GeocodeResult {
            state: body.address.state,
            district: body.address.state_district.or(body.address.county),
            postcode: body.address.postcode,
        })
    }

    async fn pincodes_by_district(
        &self,
        district: &str,
        state: &str,
    ) -> Result<Vec<String>, EnrichmentError> {
        let url = format!("{}/postoffice/{district}", self.pincode_base);
        let bodies: Vec<PostalResponse> = self.get_json("pincodes-by-district", url).await?;

        let mut pincodes = Vec::new();
        for body in bodies {
            if body.status != "Success" {
                continue;
            }
            for office in body.post_offices.unwrap_or_default() {
                // The directory is national; keep only offices in our state.
                let state_matches = office
                    .state
                    .as_deref()
                    .is_none_or(|s| s.eq_ignore_ascii_case(state));
                if let Some(pin) = office.pincode {
                    if state_matches && !pincodes.contains(&pin) {
                        pincodes.push(pin);
                    }
                }
            }
        }
        Ok(pincodes)
    }

    async fn pincode_lookup(&self, pincode: &str) -> Result<PincodeLocation, EnrichmentError> {
        let url = format!("{}/geo/pincode/{pincode}", self.api_base);
        let body: PincodeGeo = self.get_json("pincode-by-pincode", url).await?;
        Ok(PincodeLocation { lat: body.latitude, lon: body.longitude })
    }

    async fn fetch_logo(&self, site_url: &str) -> Result<LogoLookup, EnrichmentError> {
        let domain = domain_of(site_url);
        let logo_url = format!("{}/{domain}", self.logo_base);

        let resp = self
            .client
            .head(&logo_url)
            .send()
            .await
            .map_err(|e| EnrichmentError::RequestFailed {
                capability: "logo-fetch".to_string(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(LogoLookup { found: true, logo_url: Some(logo_url) })
        } else {
            Ok(LogoLookup { found: false, logo_url: None })
        }
    }

    async fn company_metadata(
        &self,
        site_url: &str,
    ) -> Result<CompanyMetadata, EnrichmentError> {
        let url = format!("{}/companies/metadata?url={site_url}", self.api_base);
        let body: ScrapedMetadata = self.get_json("company-metadata", url).await?;
        Ok(CompanyMetadata {
            state: body.state,
            district: body.district,
            lat: body.latitude,
            lon: body.longitude,
            pincode: body.pincode,
        })
    }
}

/// Strip scheme, path, and www prefix from a site URL.
fn domain_of(url: &str) -> String {
    let without_scheme = url
        .trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))
        .unwrap_or(url.trim());
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    host.strip_prefix("www.").unwrap_or(host).to_string()
}
