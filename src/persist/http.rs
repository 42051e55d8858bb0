//! HTTP conversation log — posts entries to the backend's log endpoint.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::WizardConfig;
use crate::error::PersistenceError;

use super::{ConversationLog, LogEntry};

/// Reqwest-backed conversation log client.
pub struct HttpConversationLog {
    client: reqwest::Client,
    endpoint: String,
    token: Option<secrecy::SecretString>,
}

impl HttpConversationLog {
    pub fn new(config: &WizardConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/conversation-log", config.api_base_url),
            token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl ConversationLog for HttpConversationLog {
    async fn append(&self, entry: &LogEntry) -> Result<(), PersistenceError> {
        let mut request = self.client.post(&self.endpoint).json(entry);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| PersistenceError::LogAppend(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PersistenceError::LogAppend(format!(
                "log endpoint returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
