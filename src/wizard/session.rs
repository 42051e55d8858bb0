//! Session, step cursor, and chat transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields::FieldKey;
use super::widgets::WidgetKind;

/// Which entity flow a session is collecting.
///
/// The Job flow collects a company first (the posting needs a company id),
/// the Company flow ends after the location sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    Job,
    Gig,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Company => "company",
            Self::Job => "job",
            Self::Gig => "gig",
        };
        write!(f, "{s}")
    }
}

/// One in-progress wizard instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Stable user identifier that keys the local snapshot.
    pub user_id: String,
    pub entity_kind: EntityKind,
    pub created_at: DateTime<Utc>,
    /// Next conversation-log order index; monotonically increasing.
    pub order_index: u64,
    /// Previously known company name, offered as a suggestion at the
    /// company_name step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_company: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, entity_kind: EntityKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            entity_kind,
            created_at: Utc::now(),
            order_index: 0,
            suggested_company: None,
        }
    }

    /// Take the next log order index.
    pub fn next_order_index(&mut self) -> u64 {
        let idx = self.order_index;
        self.order_index += 1;
        idx
    }
}

/// Where the wizard currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// Collecting the named field.
    Field(FieldKey),
    /// The terminal submission is in flight.
    Submitting,
    /// Submission succeeded; only a reset leaves this state.
    Done,
    /// Submission failed terminally; answers are retained for retry.
    Failed,
}

impl Cursor {
    pub fn field(&self) -> Option<FieldKey> {
        match self {
            Self::Field(key) => Some(*key),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// The live step state — exactly one per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepState {
    pub cursor: Cursor,
    /// The widget the current step presents. Rebuilt from the cursor on
    /// restore, never replayed from a snapshot mid-callback.
    pub pending_widget: Option<WidgetKind>,
    pub last_prompt: String,
}

impl StepState {
    pub fn at(field: FieldKey) -> Self {
        Self {
            cursor: Cursor::Field(field),
            pending_widget: None,
            last_prompt: String::new(),
        }
    }
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    User,
}

/// One committed transcript line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Append-only chat transcript for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
