//! Submission orchestration — ordered remote writes with bounded retry and
//! graceful degradation.

use std::sync::Arc;

use crate::error::{ApiError, SubmissionError};
use crate::wizard::{AnswerRecord, EntityKind};

use super::{CompanyPayload, GigPayload, JobPayload, LogoUpload, MarketplaceApi};

/// What a successful commit produced.
#[derive(Debug, Clone, Default)]
pub struct SubmissionOutcome {
    pub company_id: Option<String>,
    pub job_id: Option<String>,
    pub gig_id: Option<String>,
    /// Echoed logo URL, absent when the upload was dropped on fallback.
    pub logo_url: Option<String>,
    /// Total network attempts across all writes.
    pub attempts: u32,
}

/// Turns a completed answer record into the ordered remote writes.
pub struct SubmissionOrchestrator {
    api: Arc<dyn MarketplaceApi>,
    /// Extra attempts after the first, on network-level failure only.
    retries: u32,
}

impl SubmissionOrchestrator {
    pub fn new(api: Arc<dyn MarketplaceApi>, retries: u32) -> Self {
        Self { api, retries }
    }

    /// Commit the collected answers.
    ///
    /// Company/Job flows create the company first; the job write needs the
    /// resolved company id and is never attempted when the company write
    /// failed. Payload assembly failures surface before any network call.
    pub async fn commit(
        &self,
        kind: EntityKind,
        record: &AnswerRecord,
        logo_url: Option<String>,
        logo_upload: Option<LogoUpload>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        match kind {
            EntityKind::Company => {
                let payload = CompanyPayload::from_record(record, logo_url, logo_upload)?;
                let mut outcome = SubmissionOutcome::default();
                let company = self.create_company(&payload, &mut outcome).await?;
                outcome.logo_url = company.logo_url;
                outcome.company_id = Some(company.id);
                Ok(outcome)
            }
            EntityKind::Job => {
                let payload = CompanyPayload::from_record(record, logo_url, logo_upload)?;
                let mut outcome = SubmissionOutcome::default();
                let company = self.create_company(&payload, &mut outcome).await?;
                outcome.logo_url = company.logo_url;

                let job_payload = JobPayload::from_record(record, company.id.clone())?;
                outcome.company_id = Some(company.id);

                let job = self
                    .with_network_retry("job", &mut outcome, || {
                        self.api.create_job(&job_payload)
                    })
                    .await?;
                outcome.job_id = Some(job.id);
                Ok(outcome)
            }
            EntityKind::Gig => {
                let payload = GigPayload::from_record(record)?;
                let mut outcome = SubmissionOutcome::default();
                let gig = self
                    .with_network_retry("gig", &mut outcome, || self.api.create_gig(&payload))
                    .await?;
                outcome.gig_id = Some(gig.id);
                Ok(outcome)
            }
        }
    }

    /// create-company with the 5xx degradation path: when the first pass
    /// fails with a server fault and an optional logo upload is present, the
    /// upload is dropped and the write redone exactly once.
    async fn create_company(
        &self,
        payload: &CompanyPayload,
        outcome: &mut SubmissionOutcome,
    ) -> Result<super::CompanyCreated, SubmissionError> {
        let first = self
            .with_network_retry_raw(outcome, || self.api.create_company(payload))
            .await;

        match first {
            Ok(company) => Ok(company),
            Err(err) if err.is_server_error() && payload.logo_upload.is_some() => {
                tracing::warn!(
                    "create-company failed with {err}; retrying once without the logo upload"
                );
                let stripped = payload.without_logo_upload();
                outcome.attempts += 1;
                self.api
                    .create_company(&stripped)
                    .await
                    .map_err(|e| classify("company", outcome.attempts, e))
            }
            Err(err) => Err(classify("company", outcome.attempts, err)),
        }
    }

    /// Run a remote write with bounded retry on network-level failure only.
    /// A well-formed error response from the server is never retried here.
    async fn with_network_retry<T, F, Fut>(
        &self,
        entity: &str,
        outcome: &mut SubmissionOutcome,
        mut call: F,
    ) -> Result<T, SubmissionError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        self.with_network_retry_raw(outcome, &mut call)
            .await
            .map_err(|e| classify(entity, outcome.attempts, e))
    }

    async fn with_network_retry_raw<T, F, Fut>(
        &self,
        outcome: &mut SubmissionOutcome,
        mut call: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        let mut last_err = None;
        for attempt in 0..=self.retries {
            outcome.attempts += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(err @ ApiError::Network { .. }) => {
                    tracing::warn!(attempt, "network failure on remote write: {err}");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.expect("retry loop runs at least once"))
    }
}

/// Map a terminal API error to the submission taxonomy: 4xx surfaces the
/// server's message verbatim, everything else is exhaustion.
fn classify(entity: &str, attempts: u32, err: ApiError) -> SubmissionError {
    if err.is_client_error() {
        let message = match &err {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Network { reason, .. } => reason.clone(),
        };
        SubmissionError::Rejected { entity: entity.to_string(), message }
    } else {
        SubmissionError::Exhausted {
            entity: entity.to_string(),
            attempts,
            reason: err.to_string(),
        }
    }
}
