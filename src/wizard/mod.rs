//! The wizard core: field vocabulary, step table, session state, and the
//! controller that drives a conversation through them.

pub mod controller;
pub mod events;
pub mod fields;
pub mod registry;
pub mod session;
pub mod widgets;

pub use controller::{ConversationController, WizardDeps};
pub use events::WizardEvent;
pub use fields::{AnswerRecord, AnswerValue, FieldKey};
pub use registry::{ladder_widget, NextStep, StepRegistry, TransitionCtx};
pub use session::{Cursor, EntityKind, Session, Speaker, StepState, Transcript};
pub use widgets::WidgetKind;
