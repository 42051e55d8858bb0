//! Field keys, answer values, and the accumulated answer record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable identifier for one question/slot in a collection flow.
///
/// Location keys are shared between the company and gig flows: a session
/// collects exactly one location, so the ladder logic exists once instead of
/// being duplicated per entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    CompanyName,
    CompanyDescription,
    CompanyWebsite,
    CompanyFundingSeries,
    LocationCoordinates,
    LocationState,
    LocationDistrict,
    LocationPincode,
    JobTitle,
    JobCategory,
    JobDescription,
    JobYearsRequired,
    JobSalaryMin,
    JobSalaryMax,
    JobRemoteType,
    JobSeniority,
    JobApplicationUrl,
    GigTitle,
    GigDescription,
    GigServiceType,
    GigExpectedSalary,
    GigExperience,
    GigCustomers,
}

impl FieldKey {
    /// Stable snake_case name, used for conversation log entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyName => "company_name",
            Self::CompanyDescription => "company_description",
            Self::CompanyWebsite => "company_website",
            Self::CompanyFundingSeries => "company_funding_series",
            Self::LocationCoordinates => "location_coordinates",
            Self::LocationState => "location_state",
            Self::LocationDistrict => "location_district",
            Self::LocationPincode => "location_pincode",
            Self::JobTitle => "job_title",
            Self::JobCategory => "job_category",
            Self::JobDescription => "job_description",
            Self::JobYearsRequired => "job_years_required",
            Self::JobSalaryMin => "job_salary_min",
            Self::JobSalaryMax => "job_salary_max",
            Self::JobRemoteType => "job_remote_type",
            Self::JobSeniority => "job_seniority",
            Self::JobApplicationUrl => "job_application_url",
            Self::GigTitle => "gig_title",
            Self::GigDescription => "gig_description",
            Self::GigServiceType => "gig_service_type",
            Self::GigExpectedSalary => "gig_expected_salary",
            Self::GigExperience => "gig_experience",
            Self::GigCustomers => "gig_customers",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Number(i64),
    Coordinate { lat: f64, lon: f64 },
    Choice(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// Textual content if this is a Text or Choice value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_coordinate(&self) -> Option<(f64, f64)> {
        match self {
            Self::Coordinate { lat, lon } => Some((*lat, *lon)),
            _ => None,
        }
    }
}

/// The accumulated answers for one session.
///
/// Invariant: a field is only ever overwritten by a later visit to the same
/// field key (re-entrant steps). Unrelated steps never clobber it; the only
/// wholesale mutation is an explicit reset, which replaces the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    answers: BTreeMap<FieldKey, AnswerValue>,
}

impl AnswerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a field.
    pub fn set(&mut self, key: FieldKey, value: AnswerValue) {
        self.answers.insert(key, value);
    }

    pub fn get(&self, key: FieldKey) -> Option<&AnswerValue> {
        self.answers.get(&key)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.answers.contains_key(&key)
    }

    /// Remove a field (used when a re-entrant optional step is skipped).
    pub fn remove(&mut self, key: FieldKey) -> Option<AnswerValue> {
        self.answers.remove(&key)
    }

    pub fn text(&self, key: FieldKey) -> Option<&str> {
        self.get(key).and_then(AnswerValue::as_text)
    }

    pub fn number(&self, key: FieldKey) -> Option<i64> {
        self.get(key).and_then(AnswerValue::as_number)
    }

    pub fn coordinate(&self, key: FieldKey) -> Option<(f64, f64)> {
        self.get(key).and_then(AnswerValue::as_coordinate)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_key_serde_matches_as_str() {
        let keys = [
            FieldKey::CompanyName,
            FieldKey::LocationState,
            FieldKey::JobSalaryMin,
            FieldKey::GigServiceType,
        ];
        for key in keys {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn same_key_overwrites_without_side_effects() {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::LocationPincode, AnswerValue::Text("691001".into()));
        record.set(FieldKey::LocationState, AnswerValue::Text("Kerala".into()));

        // Re-entrant visit to the same key replaces the old value.
        record.set(FieldKey::LocationPincode, AnswerValue::Text("691583".into()));

        assert_eq!(record.text(FieldKey::LocationPincode), Some("691583"));
        assert_eq!(record.text(FieldKey::LocationState), Some("Kerala"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn typed_accessors() {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::JobYearsRequired, AnswerValue::Number(3));
        record.set(
            FieldKey::LocationCoordinates,
            AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
        );
        record.set(
            FieldKey::JobRemoteType,
            AnswerValue::Choice("Hybrid".into()),
        );

        assert_eq!(record.number(FieldKey::JobYearsRequired), Some(3));
        assert_eq!(
            record.coordinate(FieldKey::LocationCoordinates),
            Some((8.89, 76.61))
        );
        assert_eq!(record.text(FieldKey::JobRemoteType), Some("Hybrid"));
        assert_eq!(record.number(FieldKey::JobRemoteType), None);
    }

    #[test]
    fn record_serde_roundtrip() {
        let mut record = AnswerRecord::new();
        record.set(FieldKey::GigTitle, AnswerValue::Text("Electrician".into()));
        record.set(FieldKey::GigCustomers, AnswerValue::Number(40));

        let json = serde_json::to_string(&record).unwrap();
        let parsed: AnswerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
