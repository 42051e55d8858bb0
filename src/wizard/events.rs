//! Events the wizard emits toward its UI surface.

use super::fields::FieldKey;
use super::session::Speaker;
use super::widgets::WidgetKind;
use crate::marketplace::SubmissionOutcome;

/// One event on the wizard's outbound stream. The UI surface renders these;
/// it never mutates wizard state directly.
#[derive(Debug, Clone)]
pub enum WizardEvent {
    /// One character of the typing simulation.
    RevealChunk { text: String },
    /// A full message became permanent transcript.
    MessageCommitted { speaker: Speaker, text: String },
    /// The current step wants this inline widget presented.
    WidgetRequested { field: FieldKey, widget: WidgetKind },
    /// A required field was blank; the step did not advance.
    ValidationMessage { text: String },
    /// Terminal submission succeeded.
    FlowCompleted { outcome: SubmissionOutcome },
    /// Terminal submission failed; answers are retained for retry.
    SubmissionFailed { message: String },
}
