//! Persistence — the durable conversation log and the local session
//! snapshot used to resume after a reload.

pub mod file;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::wizard::{AnswerRecord, Session, StepState, Transcript};

pub use file::FileSnapshotStore;
pub use http::HttpConversationLog;

/// One audit entry for a question/answer exchange. Append-only; the
/// order index is monotonically increasing per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub session_id: Uuid,
    pub step_key: String,
    pub question_text: String,
    pub answer_text: String,
    pub order_index: u64,
}

/// Remote conversation log. Best-effort: the controller never blocks a step
/// on an append, and failures are only logged.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(&self, entry: &LogEntry) -> Result<(), PersistenceError>;
}

/// Serialized wizard state for resume-after-reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub session: Session,
    pub step_state: StepState,
    pub answers: AnswerRecord,
    pub transcript: Transcript,
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether the snapshot is still within the freshness bound.
    pub fn is_fresh(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.saved_at) <= max_age
    }
}

/// Local snapshot store, keyed by a stable user identifier.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// Load the snapshot for a user, if one exists. Freshness is the
    /// caller's concern (see [`Snapshot::is_fresh`]); the store returns
    /// whatever it has.
    async fn load(&self, user_id: &str) -> Result<Option<Snapshot>, PersistenceError>;

    async fn clear(&self, user_id: &str) -> Result<(), PersistenceError>;
}
