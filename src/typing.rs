//! Typing presenter — cooperative character-by-character reveal of
//! assistant text.
//!
//! Last-call-wins: a fresh reveal (or a wizard reset) bumps the generation
//! counter, and the superseded loop notices at its next character and bows
//! out without committing, so interleaved text can never reach the
//! transcript.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::wizard::{Speaker, WizardEvent};

pub struct TypingPresenter {
    events: mpsc::UnboundedSender<WizardEvent>,
    delay: Duration,
    generation: AtomicU64,
}

impl TypingPresenter {
    pub fn new(events: mpsc::UnboundedSender<WizardEvent>, delay: Duration) -> Self {
        Self { events, delay, generation: AtomicU64::new(0) }
    }

    /// Reveal `text` one character at a time, then commit it.
    ///
    /// Returns true if the reveal ran to completion and the commit event was
    /// emitted; false if it was superseded mid-reveal.
    pub async fn reveal(&self, speaker: Speaker, text: &str) -> bool {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        for ch in text.chars() {
            if self.generation.load(Ordering::SeqCst) != my_generation {
                return false;
            }
            let _ = self
                .events
                .send(WizardEvent::RevealChunk { text: ch.to_string() });
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        if self.generation.load(Ordering::SeqCst) != my_generation {
            return false;
        }
        let _ = self.events.send(WizardEvent::MessageCommitted {
            speaker,
            text: text.to_string(),
        });
        true
    }

    /// Supersede any in-flight reveal without starting a new one (used on
    /// reset).
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
