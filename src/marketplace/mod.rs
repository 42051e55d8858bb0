//! Marketplace backend contracts — the payloads and remote-write API the
//! wizard commits to once a flow completes.

pub mod http;
pub mod orchestrator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, SubmissionError};
use crate::wizard::{AnswerRecord, FieldKey};

pub use http::HttpMarketplace;
pub use orchestrator::{SubmissionOrchestrator, SubmissionOutcome};

/// A logo file riding along with a company creation. Optional: the
/// orchestrator drops it on a server fault rather than failing the whole
/// submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Payload for create-company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyPayload {
    pub name: String,
    pub state: String,
    pub district: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub funding_series: Option<String>,
    pub logo_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pincode: Option<String>,
    /// File attachment; travels as multipart, never as JSON.
    #[serde(skip)]
    pub logo_upload: Option<LogoUpload>,
}

impl CompanyPayload {
    /// Assemble from the answer record. Required fields missing here fail
    /// locally, before any network call.
    pub fn from_record(
        record: &AnswerRecord,
        logo_url: Option<String>,
        logo_upload: Option<LogoUpload>,
    ) -> Result<Self, SubmissionError> {
        Ok(Self {
            name: required_text(record, FieldKey::CompanyName)?,
            state: required_text(record, FieldKey::LocationState)?,
            district: required_text(record, FieldKey::LocationDistrict)?,
            description: record.text(FieldKey::CompanyDescription).map(String::from),
            website_url: record.text(FieldKey::CompanyWebsite).map(String::from),
            funding_series: record
                .text(FieldKey::CompanyFundingSeries)
                .map(String::from),
            logo_url,
            latitude: record
                .coordinate(FieldKey::LocationCoordinates)
                .map(|(lat, _)| lat),
            longitude: record
                .coordinate(FieldKey::LocationCoordinates)
                .map(|(_, lon)| lon),
            pincode: record.text(FieldKey::LocationPincode).map(String::from),
            logo_upload,
        })
    }

    /// The same payload with the optional attachment dropped.
    pub fn without_logo_upload(&self) -> Self {
        Self { logo_upload: None, ..self.clone() }
    }
}

/// Payload for create-job. Requires the company id from a prior
/// create-company response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub title: String,
    pub category: String,
    pub description: String,
    pub company_id: String,
    pub years_required: i64,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub remote_type: Option<String>,
    pub seniority_level: Option<String>,
    pub application_url: Option<String>,
}

impl JobPayload {
    pub fn from_record(
        record: &AnswerRecord,
        company_id: String,
    ) -> Result<Self, SubmissionError> {
        Ok(Self {
            title: required_text(record, FieldKey::JobTitle)?,
            category: required_text(record, FieldKey::JobCategory)?,
            description: required_text(record, FieldKey::JobDescription)?,
            company_id,
            years_required: record.number(FieldKey::JobYearsRequired).ok_or(
                SubmissionError::MissingField {
                    field: FieldKey::JobYearsRequired.to_string(),
                },
            )?,
            salary_min: record.number(FieldKey::JobSalaryMin),
            salary_max: record.number(FieldKey::JobSalaryMax),
            remote_type: record.text(FieldKey::JobRemoteType).map(String::from),
            seniority_level: record.text(FieldKey::JobSeniority).map(String::from),
            application_url: record.text(FieldKey::JobApplicationUrl).map(String::from),
        })
    }
}

/// Payload for create-gig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GigPayload {
    pub title: String,
    pub service_type: String,
    pub description: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pincode: Option<String>,
    pub expected_salary: Option<i64>,
    pub experience_with_gig: Option<i64>,
    pub customers_till_date: Option<i64>,
}

impl GigPayload {
    /// Assemble from the answer record. Precondition: either state+district
    /// or a coordinate pair must be present.
    pub fn from_record(record: &AnswerRecord) -> Result<Self, SubmissionError> {
        let state = record.text(FieldKey::LocationState).map(String::from);
        let district = record.text(FieldKey::LocationDistrict).map(String::from);
        let coords = record.coordinate(FieldKey::LocationCoordinates);

        let has_named_location = state.is_some() && district.is_some();
        if !has_named_location && coords.is_none() {
            return Err(SubmissionError::NoLocation);
        }

        Ok(Self {
            title: required_text(record, FieldKey::GigTitle)?,
            service_type: required_text(record, FieldKey::GigServiceType)?,
            description: record.text(FieldKey::GigDescription).map(String::from),
            state,
            district,
            latitude: coords.map(|(lat, _)| lat),
            longitude: coords.map(|(_, lon)| lon),
            pincode: record.text(FieldKey::LocationPincode).map(String::from),
            expected_salary: record.number(FieldKey::GigExpectedSalary),
            experience_with_gig: record.number(FieldKey::GigExperience),
            customers_till_date: record.number(FieldKey::GigCustomers),
        })
    }
}

fn required_text(record: &AnswerRecord, key: FieldKey) -> Result<String, SubmissionError> {
    record
        .text(key)
        .map(String::from)
        .ok_or(SubmissionError::MissingField { field: key.to_string() })
}

/// create-company response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyCreated {
    pub id: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// create-job response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    pub id: String,
}

/// create-gig response.
#[derive(Debug, Clone, Deserialize)]
pub struct GigCreated {
    pub id: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Remote writes the orchestrator performs.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn create_company(&self, payload: &CompanyPayload)
        -> Result<CompanyCreated, ApiError>;

    async fn create_job(&self, payload: &JobPayload) -> Result<JobCreated, ApiError>;

    async fn create_gig(&self, payload: &GigPayload) -> Result<GigCreated, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::AnswerValue;

    fn gig_record() -> AnswerRecord {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::GigTitle, AnswerValue::Text("Electrician".into()));
        record.set(
            FieldKey::GigServiceType,
            AnswerValue::Choice("Electrical".into()),
        );
        record
    }

    #[test]
    fn gig_accepts_named_location_without_coordinates() {
        let mut record = gig_record();
        record.set(FieldKey::LocationState, AnswerValue::Text("Kerala".into()));
        record.set(FieldKey::LocationDistrict, AnswerValue::Text("Kollam".into()));

        let payload = GigPayload::from_record(&record).unwrap();
        assert_eq!(payload.state.as_deref(), Some("Kerala"));
        assert_eq!(payload.district.as_deref(), Some("Kollam"));
        assert_eq!(payload.pincode, None);
        assert_eq!(payload.latitude, None);
        assert_eq!(payload.longitude, None);

        // Skipped optionals serialize as null, not as the skip literal.
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["pincode"].is_null());
        assert!(json["latitude"].is_null());
        assert!(json["longitude"].is_null());
    }

    #[test]
    fn gig_accepts_coordinates_without_named_location() {
        let mut record = gig_record();
        record.set(
            FieldKey::LocationCoordinates,
            AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
        );
        let payload = GigPayload::from_record(&record).unwrap();
        assert_eq!(payload.latitude, Some(8.89));
        assert!(payload.state.is_none());
    }

    #[test]
    fn gig_without_any_location_fails_locally() {
        let record = gig_record();
        assert!(matches!(
            GigPayload::from_record(&record),
            Err(SubmissionError::NoLocation)
        ));
    }

    #[test]
    fn company_requires_state() {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::CompanyName, AnswerValue::Text("Acme".into()));
        record.set(FieldKey::LocationDistrict, AnswerValue::Text("Kollam".into()));

        let err = CompanyPayload::from_record(&record, None, None).unwrap_err();
        assert!(
            matches!(err, SubmissionError::MissingField { ref field } if field == "location_state")
        );
    }

    #[test]
    fn without_logo_upload_keeps_everything_else() {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::CompanyName, AnswerValue::Text("Acme".into()));
        record.set(FieldKey::LocationState, AnswerValue::Text("Kerala".into()));
        record.set(FieldKey::LocationDistrict, AnswerValue::Text("Kollam".into()));

        let upload = LogoUpload { file_name: "logo.png".into(), bytes: vec![1, 2, 3] };
        let payload =
            CompanyPayload::from_record(&record, Some("https://cdn/logo.png".into()), Some(upload))
                .unwrap();
        let stripped = payload.without_logo_upload();
        assert!(stripped.logo_upload.is_none());
        assert_eq!(stripped.name, "Acme");
        assert_eq!(stripped.logo_url.as_deref(), Some("https://cdn/logo.png"));
    }

    #[test]
    fn job_requires_years() {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::JobTitle, AnswerValue::Text("Electrician".into()));
        record.set(FieldKey::JobCategory, AnswerValue::Choice("Operations".into()));
        record.set(FieldKey::JobDescription, AnswerValue::Text("Wiring".into()));

        let err = JobPayload::from_record(&record, "c-1".into()).unwrap_err();
        assert!(
            matches!(err, SubmissionError::MissingField { ref field } if field == "job_years_required")
        );
    }
}
