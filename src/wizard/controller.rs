//! Conversation controller — owns the live session and dispatches answers
//! and widget events through the step table.
//!
//! Single logical surface: a busy flag drops input that arrives while an
//! answer is still being processed, and a session generation counter gates
//! state writes from lookups that resolve after a reset.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use regex::Regex;
use tokio::sync::{mpsc, RwLock};

use crate::config::WizardConfig;
use crate::enrichment::{EnrichmentService, GeocodeResult};
use crate::error::EnrichmentError;
use crate::marketplace::{LogoUpload, MarketplaceApi, SubmissionOrchestrator};
use crate::persist::{ConversationLog, LogEntry, Snapshot, SnapshotStore};
use crate::typing::TypingPresenter;

use super::events::WizardEvent;
use super::fields::{AnswerRecord, AnswerValue, FieldKey};
use super::registry::{ladder_widget, NextStep, Requirement, StepRegistry, TransitionCtx, ValueParse};
use super::session::{Cursor, EntityKind, Session, Speaker, StepState, Transcript};
use super::widgets::WidgetKind;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://)?[\w-]+(\.[\w-]+)+(/\S*)?$").unwrap());
static PINCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap());

const AFFIRMATIONS: &[&str] = &["yes", "y", "ok", "okay", "yeah", "sure"];

/// Shared collaborators for the controller.
pub struct WizardDeps {
    pub enrichment: Arc<dyn EnrichmentService>,
    pub marketplace: Arc<dyn MarketplaceApi>,
    pub log: Arc<dyn ConversationLog>,
    pub snapshots: Arc<dyn SnapshotStore>,
}

/// Mutable wizard state, exactly one per session.
struct WizardState {
    session: Session,
    step: StepState,
    answers: AnswerRecord,
    transcript: Transcript,
    /// Discovered logo URL, from the website enrichment.
    logo_url: Option<String>,
    /// Logo file handed in by the (out-of-scope) file-picker surface.
    logo_upload: Option<LogoUpload>,
}

/// Drives one wizard session: looks up the current step, applies the
/// answer, runs enrichment, and advances.
pub struct ConversationController {
    registry: StepRegistry,
    enrichment: Arc<dyn EnrichmentService>,
    log: Arc<dyn ConversationLog>,
    snapshots: Arc<dyn SnapshotStore>,
    orchestrator: SubmissionOrchestrator,
    typing: TypingPresenter,
    events: mpsc::UnboundedSender<WizardEvent>,
    state: RwLock<WizardState>,
    /// At most one answer is processed at a time; input while busy is
    /// silently dropped.
    busy: AtomicBool,
    /// Bumped on reset; in-flight lookups compare before writing back.
    generation: AtomicU64,
    snapshot_max_age: chrono::Duration,
    pincode_choices: usize,
}

impl ConversationController {
    /// Build a controller for one flow. Returns the event stream the UI
    /// surface consumes.
    pub fn new(
        config: &WizardConfig,
        deps: WizardDeps,
        user_id: &str,
        entity_kind: EntityKind,
    ) -> (Self, mpsc::UnboundedReceiver<WizardEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = StepRegistry::new();
        let session = Session::new(user_id, entity_kind);
        let first = registry.first_step(entity_kind);

        let controller = Self {
            registry,
            enrichment: deps.enrichment,
            log: deps.log,
            snapshots: deps.snapshots,
            orchestrator: SubmissionOrchestrator::new(deps.marketplace, config.submit_retries),
            typing: TypingPresenter::new(tx.clone(), config.typing_delay),
            events: tx,
            state: RwLock::new(WizardState {
                session,
                step: StepState::at(first),
                answers: AnswerRecord::new(),
                transcript: Transcript::default(),
                logo_url: None,
                logo_upload: None,
            }),
            busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            snapshot_max_age: config.snapshot_max_age,
            pincode_choices: config.pincode_choices,
        };
        (controller, rx)
    }

    // ── Public surface ──────────────────────────────────────────────

    /// Present the first prompt of the flow.
    pub async fn start(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let first = {
            let st = self.state.read().await;
            self.registry.first_step(st.session.entity_kind)
        };
        self.enter_step(first, None, generation).await;
    }

    /// Handle a text answer for the active field.
    pub async fn submit_answer(&self, raw: &str) {
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::debug!("answer dropped: previous answer still processing");
            return;
        }
        let generation = self.generation.load(Ordering::SeqCst);
        self.process_answer(raw, generation).await;
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Handle a non-text widget callback for the active field.
    pub async fn submit_widget_event(&self, field: FieldKey, value: AnswerValue) {
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::debug!("widget event dropped: previous answer still processing");
            return;
        }
        let generation = self.generation.load(Ordering::SeqCst);
        self.process_widget_event(field, value, generation).await;
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Re-run the terminal submission after a failure. Answers were
    /// retained, so nothing needs re-entering.
    pub async fn retry_submission(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            return;
        }
        let generation = self.generation.load(Ordering::SeqCst);
        let failed = {
            let st = self.state.read().await;
            st.step.cursor == Cursor::Failed
        };
        if failed {
            self.submit_flow(generation).await;
        }
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Abandon the session: supersede any in-flight reveal or lookup, clear
    /// all state, and drop the local snapshot.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.typing.cancel_pending();

        let user_id = {
            let mut st = self.state.write().await;
            let kind = st.session.entity_kind;
            let user_id = st.session.user_id.clone();
            let first = self.registry.first_step(kind);
            st.session = Session::new(user_id.clone(), kind);
            st.step = StepState::at(first);
            st.answers = AnswerRecord::new();
            st.transcript = Transcript::default();
            st.logo_url = None;
            st.logo_upload = None;
            user_id
        };
        if let Err(e) = self.snapshots.clear(&user_id).await {
            tracing::warn!("failed to clear snapshot on reset: {e}");
        }
        self.busy.store(false, Ordering::SeqCst);
    }

    /// Rehydrate from the local snapshot, if a fresh one exists. The pending
    /// widget is rebuilt from the current field, never replayed.
    pub async fn restore(&self) -> bool {
        let user_id = self.state.read().await.session.user_id.clone();
        let snapshot = match self.snapshots.load(&user_id).await {
            Ok(Some(s)) => s,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("failed to load snapshot: {e}");
                return false;
            }
        };
        if !snapshot.is_fresh(self.snapshot_max_age, chrono::Utc::now()) {
            tracing::info!("snapshot for {user_id} is stale; discarding");
            let _ = self.snapshots.clear(&user_id).await;
            return false;
        }

        let mut st = self.state.write().await;
        let widget = snapshot
            .step_state
            .cursor
            .field()
            .map(|f| self.registry.widget_for(f, &snapshot.answers));
        st.session = snapshot.session;
        st.answers = snapshot.answers;
        st.transcript = snapshot.transcript;
        st.step = StepState { pending_widget: widget.clone(), ..snapshot.step_state };

        if let (Some(field), Some(widget)) = (st.step.cursor.field(), widget) {
            let _ = self.events.send(WizardEvent::WidgetRequested { field, widget });
        }
        true
    }

    /// Attach a logo file picked by the user. Travels with create-company as
    /// an optional attachment.
    pub async fn attach_logo(&self, upload: LogoUpload) {
        self.state.write().await.logo_upload = Some(upload);
    }

    /// Offer a previously known company name at the company_name step.
    pub async fn suggest_company(&self, name: impl Into<String>) {
        self.state.write().await.session.suggested_company = Some(name.into());
    }

    // ── Introspection (UI surface and tests) ────────────────────────

    pub async fn cursor(&self) -> Cursor {
        self.state.read().await.step.cursor
    }

    pub async fn current_field(&self) -> Option<FieldKey> {
        self.state.read().await.step.cursor.field()
    }

    pub async fn pending_widget(&self) -> Option<WidgetKind> {
        self.state.read().await.step.pending_widget.clone()
    }

    pub async fn answers(&self) -> AnswerRecord {
        self.state.read().await.answers.clone()
    }

    pub async fn transcript(&self) -> Transcript {
        self.state.read().await.transcript.clone()
    }

    // ── Answer processing ───────────────────────────────────────────

    fn stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    async fn process_answer(&self, raw: &str, generation: u64) {
        let Some(field) = self.current_field().await else {
            tracing::debug!("answer ignored: no active field");
            return;
        };
        let step = self.registry.step(field);
        let mut normalized = normalize_answer(raw);

        // Unprompted confirmations ("yes"/"ok") adopt the suggested company
        // when one exists; with no suggestion they are a literal name.
        if field == FieldKey::CompanyName
            && AFFIRMATIONS.contains(&normalized.to_lowercase().as_str())
        {
            let suggested = self.state.read().await.session.suggested_company.clone();
            if let Some(name) = suggested {
                normalized = name;
            }
        }

        let is_skip = normalized.is_empty() || normalized.eq_ignore_ascii_case("skip");
        if is_skip {
            if step.requirement == Requirement::Required {
                self.validation(generation, "I need an answer for this one before we move on.")
                    .await;
                return;
            }
            self.accept_skip(field, generation).await;
            return;
        }

        // The coordinate step only takes the share widget; any typed answer
        // counts as declining to share.
        if field == FieldKey::LocationCoordinates {
            self.accept_skip(field, generation).await;
            return;
        }

        let value = match step.parse {
            ValueParse::Text => AnswerValue::Text(normalized.clone()),
            ValueParse::Number => match normalized.replace(',', "").parse::<i64>() {
                Ok(n) => AnswerValue::Number(n),
                Err(_) => {
                    self.validation(generation, "Please give me a number for this one.").await;
                    return;
                }
            },
            ValueParse::Url => {
                if URL_RE.is_match(&normalized) {
                    AnswerValue::Text(normalized.clone())
                } else {
                    self.validation(generation, "That doesn't look like a URL — try again, or type skip.")
                        .await;
                    return;
                }
            }
        };

        if field == FieldKey::LocationPincode && !PINCODE_RE.is_match(&normalized) {
            self.validation(generation, "A pincode is six digits — try again, or type skip.")
                .await;
            return;
        }

        self.accept_answer(field, value, normalized, generation).await;
    }

    async fn process_widget_event(&self, field: FieldKey, value: AnswerValue, generation: u64) {
        let current = self.current_field().await;
        if current != Some(field) {
            tracing::debug!("widget event for {field} ignored: not the active field");
            return;
        }

        if let AnswerValue::Coordinate { lat, lon } = value {
            self.process_coordinates(lat, lon, generation).await;
            return;
        }

        let display = match &value {
            AnswerValue::Text(s) | AnswerValue::Choice(s) => s.clone(),
            AnswerValue::Number(n) => n.to_string(),
            AnswerValue::List(items) => items.join(", "),
            AnswerValue::Coordinate { .. } => unreachable!(),
        };
        self.accept_answer(field, value, display, generation).await;
    }

    /// Record the answer, log it, run enrichment hooks, and advance.
    async fn accept_answer(
        &self,
        field: FieldKey,
        value: AnswerValue,
        display: String,
        generation: u64,
    ) {
        {
            let mut st = self.state.write().await;
            if self.stale(generation) {
                return;
            }
            st.answers.set(field, value);
            st.transcript.push(Speaker::User, display.clone());
            self.append_log(&mut st, field, &display);
        }
        let _ = self.events.send(WizardEvent::MessageCommitted {
            speaker: Speaker::User,
            text: display,
        });

        let widget_override = self.run_enrichment_hooks(field, generation).await;
        if self.stale(generation) {
            return;
        }
        self.advance(field, widget_override, generation).await;
    }

    /// Optional field skipped: leave it absent (clearing any value from a
    /// previous visit) and move on.
    async fn accept_skip(&self, field: FieldKey, generation: u64) {
        {
            let mut st = self.state.write().await;
            if self.stale(generation) {
                return;
            }
            st.answers.remove(field);
            st.transcript.push(Speaker::User, "skip");
            self.append_log(&mut st, field, "skip");
        }
        let _ = self.events.send(WizardEvent::MessageCommitted {
            speaker: Speaker::User,
            text: "skip".to_string(),
        });
        self.advance(field, None, generation).await;
    }

    /// Coordinate capture: reverse-geocode, merge what resolved, and land on
    /// the ladder's chosen widget.
    async fn process_coordinates(&self, lat: f64, lon: f64, generation: u64) {
        let display = format!("Shared location ({lat:.4}, {lon:.4})");
        {
            let mut st = self.state.write().await;
            if self.stale(generation) {
                return;
            }
            st.answers
                .set(FieldKey::LocationCoordinates, AnswerValue::Coordinate { lat, lon });
            st.transcript.push(Speaker::User, display.clone());
            self.append_log(&mut st, FieldKey::LocationCoordinates, &display);
        }
        let _ = self.events.send(WizardEvent::MessageCommitted {
            speaker: Speaker::User,
            text: display,
        });

        let geo = swallow("reverse-geocode", self.enrichment.reverse_geocode(lat, lon).await)
            .unwrap_or_default();
        let GeocodeResult { state, district, postcode } = geo;

        let mut pincodes = Vec::new();
        if let (Some(state), Some(district)) = (&state, &district) {
            pincodes = swallow(
                "pincodes-by-district",
                self.enrichment.pincodes_by_district(district, state).await,
            )
            .unwrap_or_default();
        }
        if let Some(direct) = &postcode {
            pincodes.retain(|p| p != direct);
            pincodes.insert(0, direct.clone());
        }
        pincodes.truncate(self.pincode_choices);

        {
            let mut st = self.state.write().await;
            if self.stale(generation) {
                return;
            }
            if let Some(state) = &state {
                st.answers
                    .set(FieldKey::LocationState, AnswerValue::Text(state.clone()));
            }
            if let Some(district) = &district {
                st.answers
                    .set(FieldKey::LocationDistrict, AnswerValue::Text(district.clone()));
            }
        }

        let (next_field, widget) =
            ladder_widget(state.as_deref(), district.as_deref(), &pincodes);
        self.enter_step(next_field, Some(widget), generation).await;
    }

    /// Field-specific lookups that run after an answer lands. Returns a
    /// widget override for the next step where the lookup produced one.
    async fn run_enrichment_hooks(
        &self,
        field: FieldKey,
        generation: u64,
    ) -> Option<WidgetKind> {
        match field {
            FieldKey::CompanyWebsite => {
                self.enrich_from_website(generation).await;
                None
            }
            FieldKey::LocationDistrict => self.pincode_options_for_district().await,
            FieldKey::LocationPincode => {
                self.coordinates_from_pincode(generation).await;
                None
            }
            _ => None,
        }
    }

    /// Website answered: discover a logo and scrape location metadata. The
    /// metadata merge is all-or-nothing — state, district, and both
    /// coordinates must be present, otherwise the result is discarded.
    async fn enrich_from_website(&self, generation: u64) {
        let url = {
            let st = self.state.read().await;
            match st.answers.text(FieldKey::CompanyWebsite) {
                Some(url) => url.to_string(),
                None => return,
            }
        };

        let logo = swallow("logo-fetch", self.enrichment.fetch_logo(&url).await);
        let metadata = swallow("company-metadata", self.enrichment.company_metadata(&url).await);

        let mut st = self.state.write().await;
        if self.stale(generation) {
            return;
        }
        if let Some(logo) = logo {
            if logo.found {
                st.logo_url = logo.logo_url;
            }
        }
        if let Some(meta) = metadata {
            if meta.is_complete() {
                st.answers.set(
                    FieldKey::LocationState,
                    AnswerValue::Text(meta.state.unwrap_or_default()),
                );
                st.answers.set(
                    FieldKey::LocationDistrict,
                    AnswerValue::Text(meta.district.unwrap_or_default()),
                );
                st.answers.set(
                    FieldKey::LocationCoordinates,
                    AnswerValue::Coordinate {
                        lat: meta.lat.unwrap_or_default(),
                        lon: meta.lon.unwrap_or_default(),
                    },
                );
                if let Some(pincode) = meta.pincode {
                    st.answers
                        .set(FieldKey::LocationPincode, AnswerValue::Text(pincode));
                }
            } else {
                tracing::debug!("company metadata incomplete; discarding");
            }
        }
    }

    /// District answered manually: offer looked-up pincodes as a choice
    /// widget, or fall back to free text when the directory has nothing.
    async fn pincode_options_for_district(&self) -> Option<WidgetKind> {
        let (district, state) = {
            let st = self.state.read().await;
            (
                st.answers.text(FieldKey::LocationDistrict)?.to_string(),
                st.answers.text(FieldKey::LocationState)?.to_string(),
            )
        };
        let mut pincodes = swallow(
            "pincodes-by-district",
            self.enrichment.pincodes_by_district(&district, &state).await,
        )
        .unwrap_or_default();
        pincodes.truncate(self.pincode_choices);

        if pincodes.is_empty() {
            None
        } else {
            Some(WidgetKind::PincodeChoice { options: pincodes })
        }
    }

    /// A bare pincode was given without coordinates: resolve lat/lon from
    /// the directory, best-effort.
    async fn coordinates_from_pincode(&self, generation: u64) {
        let pincode = {
            let st = self.state.read().await;
            if st.answers.contains(FieldKey::LocationCoordinates) {
                return;
            }
            match st.answers.text(FieldKey::LocationPincode) {
                Some(p) => p.to_string(),
                None => return,
            }
        };
        let location = swallow(
            "pincode-by-pincode",
            self.enrichment.pincode_lookup(&pincode).await,
        );
        if let Some(location) = location {
            if let (Some(lat), Some(lon)) = (location.lat, location.lon) {
                let mut st = self.state.write().await;
                if self.stale(generation) {
                    return;
                }
                st.answers
                    .set(FieldKey::LocationCoordinates, AnswerValue::Coordinate { lat, lon });
            }
        }
    }

    // ── Step transitions ────────────────────────────────────────────

    async fn advance(&self, field: FieldKey, widget_override: Option<WidgetKind>, generation: u64) {
        let next = {
            let st = self.state.read().await;
            let ctx = TransitionCtx {
                entity_kind: st.session.entity_kind,
                record: &st.answers,
            };
            self.registry.next_step(field, &ctx)
        };
        match next {
            NextStep::Field(next) => self.enter_step(next, widget_override, generation).await,
            NextStep::Terminal => self.submit_flow(generation).await,
        }
    }

    async fn enter_step(
        &self,
        field: FieldKey,
        widget_override: Option<WidgetKind>,
        generation: u64,
    ) {
        let (prompt, widget) = {
            let mut st = self.state.write().await;
            if self.stale(generation) {
                return;
            }
            let prompt = self.registry.prompt_for(field, &st.session, &st.answers);
            let widget =
                widget_override.unwrap_or_else(|| self.registry.widget_for(field, &st.answers));
            st.step = StepState {
                cursor: Cursor::Field(field),
                pending_widget: Some(widget.clone()),
                last_prompt: prompt.clone(),
            };
            (prompt, widget)
        };

        let committed = self.typing.reveal(Speaker::Assistant, &prompt).await;
        if committed && !self.stale(generation) {
            self.state.write().await.transcript.push(Speaker::Assistant, &prompt);
        }
        let _ = self.events.send(WizardEvent::WidgetRequested { field, widget });
        self.save_snapshot(generation).await;
    }

    /// Re-prompt without advancing.
    async fn validation(&self, generation: u64, message: &str) {
        let _ = self.events.send(WizardEvent::ValidationMessage {
            text: message.to_string(),
        });
        let committed = self.typing.reveal(Speaker::Assistant, message).await;
        if committed && !self.stale(generation) {
            self.state.write().await.transcript.push(Speaker::Assistant, message);
        }
    }

    // ── Terminal submission ─────────────────────────────────────────

    async fn submit_flow(&self, generation: u64) {
        let (kind, record, logo_url, logo_upload, user_id) = {
            let mut st = self.state.write().await;
            if self.stale(generation) {
                return;
            }
            st.step.cursor = Cursor::Submitting;
            st.step.pending_widget = None;
            (
                st.session.entity_kind,
                st.answers.clone(),
                st.logo_url.clone(),
                st.logo_upload.clone(),
                st.session.user_id.clone(),
            )
        };

        let committed = self
            .typing
            .reveal(Speaker::Assistant, "All set — submitting now…")
            .await;
        if committed && !self.stale(generation) {
            self.state
                .write()
                .await
                .transcript
                .push(Speaker::Assistant, "All set — submitting now…");
        }

        match self
            .orchestrator
            .commit(kind, &record, logo_url, logo_upload)
            .await
        {
            Ok(outcome) => {
                if self.stale(generation) {
                    return;
                }
                if let Err(e) = self.snapshots.clear(&user_id).await {
                    tracing::warn!("failed to clear snapshot after submit: {e}");
                }
                let message = match kind {
                    EntityKind::Company => "Your company profile is live!",
                    EntityKind::Job => "Done! Your job posting is live.",
                    EntityKind::Gig => "Done! Your gig is live.",
                };
                let committed = self.typing.reveal(Speaker::Assistant, message).await;
                let mut st = self.state.write().await;
                if self.stale(generation) {
                    return;
                }
                if committed {
                    st.transcript.push(Speaker::Assistant, message);
                }
                st.step.cursor = Cursor::Done;
                let _ = self.events.send(WizardEvent::FlowCompleted { outcome });
            }
            Err(err) => {
                if self.stale(generation) {
                    return;
                }
                let message = err.to_string();
                tracing::warn!("submission failed: {message}");
                let committed = self.typing.reveal(Speaker::Assistant, &message).await;
                let mut st = self.state.write().await;
                if self.stale(generation) {
                    return;
                }
                if committed {
                    st.transcript.push(Speaker::Assistant, &message);
                }
                // Answers are retained so the user can retry without
                // re-entering anything.
                st.step.cursor = Cursor::Failed;
                let _ = self.events.send(WizardEvent::SubmissionFailed { message });
            }
        }
    }

    // ── Persistence helpers ─────────────────────────────────────────

    /// Append a conversation-log entry, fire-and-forget.
    fn append_log(&self, st: &mut WizardState, field: FieldKey, answer: &str) {
        let entry = LogEntry {
            session_id: st.session.id,
            step_key: field.as_str().to_string(),
            question_text: st.step.last_prompt.clone(),
            answer_text: answer.to_string(),
            order_index: st.session.next_order_index(),
        };
        let log = self.log.clone();
        tokio::spawn(async move {
            if let Err(e) = log.append(&entry).await {
                tracing::warn!("conversation log append failed: {e}");
            }
        });
    }

    async fn save_snapshot(&self, generation: u64) {
        let (user_id, snapshot) = {
            let st = self.state.read().await;
            if self.stale(generation) {
                return;
            }
            (
                st.session.user_id.clone(),
                Snapshot {
                    session: st.session.clone(),
                    step_state: st.step.clone(),
                    answers: st.answers.clone(),
                    transcript: st.transcript.clone(),
                    saved_at: chrono::Utc::now(),
                },
            )
        };
        if let Err(e) = self.snapshots.save(&user_id, &snapshot).await {
            tracing::warn!("failed to save snapshot: {e}");
        }
    }
}

/// Trim and strip one layer of surrounding quotes.
fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    strip_quotes(trimmed).trim().to_string()
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Collapse an enrichment failure to "no data", with a warning.
fn swallow<T>(capability: &str, result: Result<T, EnrichmentError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{capability} lookup failed, continuing without it: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::enrichment::{CompanyMetadata, LogoLookup, PincodeLocation};
    use crate::error::{ApiError, PersistenceError};
    use crate::marketplace::{CompanyCreated, CompanyPayload, GigCreated, GigPayload, JobCreated, JobPayload};

    #[test]
    fn normalize_strips_one_quote_layer() {
        assert_eq!(normalize_answer("  Acme Tools  "), "Acme Tools");
        assert_eq!(normalize_answer("\"Acme Tools\""), "Acme Tools");
        assert_eq!(normalize_answer("'Acme'"), "Acme");
        // Only one layer comes off.
        assert_eq!(normalize_answer("\"\"Acme\"\""), "\"Acme\"");
        // Mismatched quotes stay.
        assert_eq!(normalize_answer("\"Acme'"), "\"Acme'");
        assert_eq!(normalize_answer(""), "");
    }

    #[test]
    fn url_and_pincode_patterns() {
        assert!(URL_RE.is_match("https://acme.in"));
        assert!(URL_RE.is_match("acme.in/careers"));
        assert!(!URL_RE.is_match("not a url"));
        assert!(PINCODE_RE.is_match("691001"));
        assert!(!PINCODE_RE.is_match("069100"));
        assert!(!PINCODE_RE.is_match("69100"));
        assert!(!PINCODE_RE.is_match("6910011"));
    }

    // ── Test doubles ────────────────────────────────────────────────

    #[derive(Default)]
    struct StubEnrichment {
        geocode: Mutex<Option<GeocodeResult>>,
        pincodes: Mutex<Vec<String>>,
        pincode_location: Mutex<Option<PincodeLocation>>,
        metadata: Mutex<Option<CompanyMetadata>>,
        logo: Mutex<Option<LogoLookup>>,
        /// When set, reverse_geocode parks on a timer first (for reset
        /// races under paused time).
        geocode_delay: Option<Duration>,
    }

    #[async_trait]
    impl EnrichmentService for StubEnrichment {
        async fn reverse_geocode(
            &self,
            _lat: f64,
            _lon: f64,
        ) -> Result<GeocodeResult, EnrichmentError> {
            if let Some(delay) = self.geocode_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.geocode.lock().unwrap().clone().unwrap_or_default())
        }

        async fn pincodes_by_district(
            &self,
            _district: &str,
            _state: &str,
        ) -> Result<Vec<String>, EnrichmentError> {
            Ok(self.pincodes.lock().unwrap().clone())
        }

        async fn pincode_lookup(
            &self,
            _pincode: &str,
        ) -> Result<PincodeLocation, EnrichmentError> {
            Ok(self.pincode_location.lock().unwrap().clone().unwrap_or_default())
        }

        async fn fetch_logo(&self, _site_url: &str) -> Result<LogoLookup, EnrichmentError> {
            Ok(self.logo.lock().unwrap().clone().unwrap_or_default())
        }

        async fn company_metadata(
            &self,
            _site_url: &str,
        ) -> Result<CompanyMetadata, EnrichmentError> {
            Ok(self.metadata.lock().unwrap().clone().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct StubApi {
        gig_responses: Mutex<Vec<Result<GigCreated, ApiError>>>,
        gig_calls: Mutex<Vec<GigPayload>>,
    }

    #[async_trait]
    impl MarketplaceApi for StubApi {
        async fn create_company(
            &self,
            _payload: &CompanyPayload,
        ) -> Result<CompanyCreated, ApiError> {
            Ok(CompanyCreated { id: "c-1".into(), logo_url: None })
        }

        async fn create_job(&self, _payload: &JobPayload) -> Result<JobCreated, ApiError> {
            Ok(JobCreated { id: "j-1".into() })
        }

        async fn create_gig(&self, payload: &GigPayload) -> Result<GigCreated, ApiError> {
            self.gig_calls.lock().unwrap().push(payload.clone());
            self.gig_responses.lock().unwrap().pop().unwrap_or(Ok(GigCreated {
                id: "g-1".into(),
                latitude: None,
                longitude: None,
            }))
        }
    }

    #[derive(Default)]
    struct MemLog {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl ConversationLog for MemLog {
        async fn append(&self, entry: &LogEntry) -> Result<(), PersistenceError> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemSnapshots {
        slot: Mutex<Option<(String, Snapshot)>>,
    }

    #[async_trait]
    impl SnapshotStore for MemSnapshots {
        async fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), PersistenceError> {
            *self.slot.lock().unwrap() = Some((user_id.to_string(), snapshot.clone()));
            Ok(())
        }

        async fn load(&self, user_id: &str) -> Result<Option<Snapshot>, PersistenceError> {
            Ok(self
                .slot
                .lock()
                .unwrap()
                .as_ref()
                .filter(|(u, _)| u == user_id)
                .map(|(_, s)| s.clone()))
        }

        async fn clear(&self, _user_id: &str) -> Result<(), PersistenceError> {
            *self.slot.lock().unwrap() = None;
            Ok(())
        }
    }

    struct Harness {
        controller: ConversationController,
        rx: mpsc::UnboundedReceiver<WizardEvent>,
        enrichment: Arc<StubEnrichment>,
        api: Arc<StubApi>,
        log: Arc<MemLog>,
        snapshots: Arc<MemSnapshots>,
    }

    fn harness(kind: EntityKind, enrichment: StubEnrichment) -> Harness {
        let enrichment = Arc::new(enrichment);
        let api = Arc::new(StubApi::default());
        let log = Arc::new(MemLog::default());
        let snapshots = Arc::new(MemSnapshots::default());
        let config = WizardConfig {
            typing_delay: Duration::ZERO,
            ..WizardConfig::default()
        };
        let deps = WizardDeps {
            enrichment: enrichment.clone(),
            marketplace: api.clone(),
            log: log.clone(),
            snapshots: snapshots.clone(),
        };
        let (controller, rx) = ConversationController::new(&config, deps, "user-1", kind);
        Harness { controller, rx, enrichment, api, log, snapshots }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<WizardEvent>) -> Vec<WizardEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn last_widget(events: &[WizardEvent]) -> Option<(FieldKey, WidgetKind)> {
        events.iter().rev().find_map(|e| match e {
            WizardEvent::WidgetRequested { field, widget } => Some((*field, widget.clone())),
            _ => None,
        })
    }

    // ── Skip and validation semantics ───────────────────────────────

    #[tokio::test]
    async fn skip_variants_leave_optional_field_absent() {
        for token in ["skip", "SKIP", "  ", ""] {
            let h = harness(EntityKind::Gig, StubEnrichment::default());
            h.controller.start().await;
            h.controller.submit_answer("Electrician").await;
            assert_eq!(h.controller.current_field().await, Some(FieldKey::GigDescription));

            h.controller.submit_answer(token).await;
            let answers = h.controller.answers().await;
            assert!(
                !answers.contains(FieldKey::GigDescription),
                "token {token:?} should leave the field absent"
            );
            // And the flow advanced.
            assert_eq!(
                h.controller.current_field().await,
                Some(FieldKey::GigServiceType)
            );
        }
    }

    #[tokio::test]
    async fn required_blank_reprompts_without_advancing() {
        let mut h = harness(EntityKind::Gig, StubEnrichment::default());
        h.controller.start().await;

        h.controller.submit_answer("   ").await;
        assert_eq!(h.controller.current_field().await, Some(FieldKey::GigTitle));
        let events = drain(&mut h.rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, WizardEvent::ValidationMessage { .. })));

        // A real answer still advances afterwards.
        h.controller.submit_answer("Electrician").await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::GigDescription)
        );
    }

    #[tokio::test]
    async fn skip_on_required_field_reprompts() {
        let h = harness(EntityKind::Gig, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("skip").await;
        assert_eq!(h.controller.current_field().await, Some(FieldKey::GigTitle));
    }

    #[tokio::test]
    async fn malformed_url_reprompts_but_skip_is_allowed() {
        let mut h = harness(EntityKind::Job, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("Acme Tools").await;
        h.controller.submit_answer("skip").await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::CompanyWebsite)
        );
        drain(&mut h.rx);

        h.controller.submit_answer("not a url").await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::CompanyWebsite)
        );
        let events = drain(&mut h.rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, WizardEvent::ValidationMessage { .. })));
        assert!(!h.controller.answers().await.contains(FieldKey::CompanyWebsite));

        // The field is optional, so skip moves on without a value.
        h.controller.submit_answer("skip").await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::CompanyFundingSeries)
        );
    }

    #[tokio::test]
    async fn malformed_pincode_reprompts() {
        let h = harness(EntityKind::Gig, StubEnrichment::default());
        to_coordinates(&h).await;
        h.controller.submit_answer("skip").await;
        h.controller
            .submit_widget_event(FieldKey::LocationState, AnswerValue::Choice("Kerala".into()))
            .await;
        h.controller
            .submit_widget_event(FieldKey::LocationDistrict, AnswerValue::Choice("Kollam".into()))
            .await;

        h.controller.submit_answer("12345").await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::LocationPincode)
        );
        assert!(!h.controller.answers().await.contains(FieldKey::LocationPincode));
    }

    // ── Coordinate ladder ───────────────────────────────────────────

    async fn to_coordinates(h: &Harness) {
        h.controller.start().await;
        h.controller.submit_answer("Electrician").await;
        h.controller.submit_answer("skip").await;
        h.controller
            .submit_widget_event(FieldKey::GigServiceType, AnswerValue::Choice("Electrical".into()))
            .await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::LocationCoordinates)
        );
    }

    #[tokio::test]
    async fn full_geocode_presents_pincode_choice_with_direct_postcode_first() {
        let enrichment = StubEnrichment::default();
        *enrichment.geocode.lock().unwrap() = Some(GeocodeResult {
            state: Some("Kerala".into()),
            district: Some("Kollam".into()),
            postcode: Some("691001".into()),
        });
        *enrichment.pincodes.lock().unwrap() =
            vec!["691583".into(), "691001".into(), "691004".into()];

        let mut h = harness(EntityKind::Gig, enrichment);
        to_coordinates(&h).await;
        drain(&mut h.rx);

        h.controller
            .submit_widget_event(
                FieldKey::LocationCoordinates,
                AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
            )
            .await;

        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::LocationPincode)
        );
        let events = drain(&mut h.rx);
        let (field, widget) = last_widget(&events).unwrap();
        assert_eq!(field, FieldKey::LocationPincode);
        // Direct postcode prepended, duplicate removed.
        assert_eq!(
            widget,
            WidgetKind::PincodeChoice {
                options: vec!["691001".into(), "691583".into(), "691004".into()]
            }
        );

        let answers = h.controller.answers().await;
        assert_eq!(answers.text(FieldKey::LocationState), Some("Kerala"));
        assert_eq!(answers.text(FieldKey::LocationDistrict), Some("Kollam"));
    }

    #[tokio::test]
    async fn state_only_geocode_degrades_to_scoped_district_select() {
        let enrichment = StubEnrichment::default();
        *enrichment.geocode.lock().unwrap() = Some(GeocodeResult {
            state: Some("Kerala".into()),
            district: None,
            postcode: None,
        });

        let mut h = harness(EntityKind::Gig, enrichment);
        to_coordinates(&h).await;
        drain(&mut h.rx);

        h.controller
            .submit_widget_event(
                FieldKey::LocationCoordinates,
                AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
            )
            .await;

        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::LocationDistrict)
        );
        let events = drain(&mut h.rx);
        let (_, widget) = last_widget(&events).unwrap();
        assert_eq!(widget, WidgetKind::DistrictSelect { state: "Kerala".into() });
    }

    #[tokio::test]
    async fn empty_geocode_degrades_to_state_select() {
        let mut h = harness(EntityKind::Gig, StubEnrichment::default());
        to_coordinates(&h).await;
        drain(&mut h.rx);

        h.controller
            .submit_widget_event(
                FieldKey::LocationCoordinates,
                AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
            )
            .await;

        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::LocationState)
        );
        let events = drain(&mut h.rx);
        let (_, widget) = last_widget(&events).unwrap();
        assert_eq!(widget.kind_name(), "state_select");
    }

    #[tokio::test]
    async fn empty_pincode_directory_falls_back_to_free_text() {
        let enrichment = StubEnrichment::default();
        *enrichment.geocode.lock().unwrap() = Some(GeocodeResult {
            state: Some("Kerala".into()),
            district: Some("Kollam".into()),
            postcode: None,
        });

        let mut h = harness(EntityKind::Gig, enrichment);
        to_coordinates(&h).await;
        drain(&mut h.rx);

        h.controller
            .submit_widget_event(
                FieldKey::LocationCoordinates,
                AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
            )
            .await;

        let events = drain(&mut h.rx);
        let (field, widget) = last_widget(&events).unwrap();
        assert_eq!(field, FieldKey::LocationPincode);
        assert_eq!(widget, WidgetKind::FreeText);
    }

    // ── Website enrichment ──────────────────────────────────────────

    async fn to_website(h: &Harness) {
        h.controller.start().await;
        h.controller.submit_answer("Acme Tools").await;
        h.controller.submit_answer("skip").await;
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::CompanyWebsite)
        );
    }

    #[tokio::test]
    async fn partial_metadata_is_discarded_entirely() {
        let enrichment = StubEnrichment::default();
        *enrichment.metadata.lock().unwrap() = Some(CompanyMetadata {
            state: Some("Kerala".into()),
            district: Some("Kollam".into()),
            lat: Some(8.89),
            lon: None, // incomplete
            pincode: Some("691001".into()),
        });

        let h = harness(EntityKind::Job, enrichment);
        to_website(&h).await;
        h.controller.submit_answer("https://acme.in").await;

        let answers = h.controller.answers().await;
        assert!(!answers.contains(FieldKey::LocationState));
        assert!(!answers.contains(FieldKey::LocationDistrict));
        assert!(!answers.contains(FieldKey::LocationCoordinates));
        assert!(!answers.contains(FieldKey::LocationPincode));
    }

    #[tokio::test]
    async fn complete_metadata_merges_and_skips_location_subflow() {
        let enrichment = StubEnrichment::default();
        *enrichment.metadata.lock().unwrap() = Some(CompanyMetadata {
            state: Some("Kerala".into()),
            district: Some("Kollam".into()),
            lat: Some(8.89),
            lon: Some(76.61),
            pincode: None,
        });

        let h = harness(EntityKind::Job, enrichment);
        to_website(&h).await;
        h.controller.submit_answer("https://acme.in").await;

        let answers = h.controller.answers().await;
        assert_eq!(answers.text(FieldKey::LocationState), Some("Kerala"));
        assert_eq!(answers.coordinate(FieldKey::LocationCoordinates), Some((8.89, 76.61)));

        // Funding is next; skipping it jumps straight to the job steps.
        assert_eq!(
            h.controller.current_field().await,
            Some(FieldKey::CompanyFundingSeries)
        );
        h.controller.submit_answer("skip").await;
        assert_eq!(h.controller.current_field().await, Some(FieldKey::JobTitle));
    }

    // ── Normalization and confirmation ──────────────────────────────

    #[tokio::test]
    async fn quoted_answer_is_unwrapped() {
        let h = harness(EntityKind::Job, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("\"Acme Tools\"").await;
        assert_eq!(
            h.controller.answers().await.text(FieldKey::CompanyName),
            Some("Acme Tools")
        );
    }

    #[tokio::test]
    async fn confirmation_adopts_suggested_company() {
        let h = harness(EntityKind::Job, StubEnrichment::default());
        h.controller.suggest_company("Acme Tools").await;
        h.controller.start().await;
        h.controller.submit_answer("yes").await;
        assert_eq!(
            h.controller.answers().await.text(FieldKey::CompanyName),
            Some("Acme Tools")
        );
    }

    #[tokio::test]
    async fn confirmation_without_suggestion_is_a_literal_name() {
        let h = harness(EntityKind::Job, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("ok").await;
        assert_eq!(
            h.controller.answers().await.text(FieldKey::CompanyName),
            Some("ok")
        );
    }

    // ── Pincode lookup merge ────────────────────────────────────────

    #[tokio::test]
    async fn typed_pincode_without_coordinates_merges_latlon() {
        let enrichment = StubEnrichment::default();
        *enrichment.pincode_location.lock().unwrap() =
            Some(PincodeLocation { lat: Some(8.89), lon: Some(76.61) });

        let h = harness(EntityKind::Gig, enrichment);
        to_coordinates(&h).await;
        // Manual path: skip coordinates, pick state/district, type pincode.
        h.controller.submit_answer("skip").await;
        h.controller
            .submit_widget_event(FieldKey::LocationState, AnswerValue::Choice("Kerala".into()))
            .await;
        h.controller
            .submit_widget_event(FieldKey::LocationDistrict, AnswerValue::Choice("Kollam".into()))
            .await;
        h.controller.submit_answer("691001").await;

        let answers = h.controller.answers().await;
        assert_eq!(answers.text(FieldKey::LocationPincode), Some("691001"));
        assert_eq!(
            answers.coordinate(FieldKey::LocationCoordinates),
            Some((8.89, 76.61))
        );
    }

    // ── Snapshot restore ────────────────────────────────────────────

    #[tokio::test]
    async fn restore_reproduces_answers_and_cursor() {
        let h = harness(EntityKind::Gig, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("Electrician").await;
        h.controller.submit_answer("House wiring and repair").await;

        let answers_before = h.controller.answers().await;
        let field_before = h.controller.current_field().await;

        // A second controller sharing the snapshot store picks it all up.
        let config = WizardConfig { typing_delay: Duration::ZERO, ..WizardConfig::default() };
        let deps = WizardDeps {
            enrichment: h.enrichment.clone(),
            marketplace: h.api.clone(),
            log: h.log.clone(),
            snapshots: h.snapshots.clone(),
        };
        let (revived, mut rx) = ConversationController::new(&config, deps, "user-1", EntityKind::Gig);
        assert!(revived.restore().await);

        assert_eq!(revived.answers().await, answers_before);
        assert_eq!(revived.current_field().await, field_before);
        // The pending widget was rebuilt, and announced to the UI.
        assert!(revived.pending_widget().await.is_some());
        let events = drain(&mut rx);
        assert!(matches!(
            last_widget(&events),
            Some((field, _)) if Some(field) == field_before
        ));
    }

    #[tokio::test]
    async fn stale_snapshot_is_discarded_on_restore() {
        let h = harness(EntityKind::Gig, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("Electrician").await;

        // Age the stored snapshot past the freshness bound.
        {
            let mut slot = h.snapshots.slot.lock().unwrap();
            let (_, snap) = slot.as_mut().unwrap();
            snap.saved_at = chrono::Utc::now() - chrono::Duration::hours(25);
        }

        let config = WizardConfig { typing_delay: Duration::ZERO, ..WizardConfig::default() };
        let deps = WizardDeps {
            enrichment: h.enrichment.clone(),
            marketplace: h.api.clone(),
            log: h.log.clone(),
            snapshots: h.snapshots.clone(),
        };
        let (revived, _rx) = ConversationController::new(&config, deps, "user-1", EntityKind::Gig);
        assert!(!revived.restore().await);
        assert!(h.snapshots.slot.lock().unwrap().is_none());
    }

    // ── Reset races ─────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn reset_during_inflight_geocode_discards_the_result() {
        let enrichment = StubEnrichment {
            geocode_delay: Some(Duration::from_millis(50)),
            ..StubEnrichment::default()
        };
        *enrichment.geocode.lock().unwrap() = Some(GeocodeResult {
            state: Some("Kerala".into()),
            district: Some("Kollam".into()),
            postcode: None,
        });

        let h = harness(EntityKind::Gig, enrichment);
        to_coordinates(&h).await;

        let controller = Arc::new(h.controller);
        let inflight = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .submit_widget_event(
                        FieldKey::LocationCoordinates,
                        AnswerValue::Coordinate { lat: 8.89, lon: 76.61 },
                    )
                    .await;
            })
        };
        // Let the widget event start and park on the geocode delay.
        tokio::task::yield_now().await;
        controller.reset().await;
        inflight.await.unwrap();

        // The resolved lookup must not have written into the fresh session.
        let answers = controller.answers().await;
        assert!(answers.is_empty());
        assert_eq!(controller.current_field().await, Some(FieldKey::GigTitle));
    }

    // ── Submission outcomes ─────────────────────────────────────────

    #[tokio::test]
    async fn failed_submission_keeps_answers_and_allows_retry() {
        let mut h = harness(EntityKind::Gig, StubEnrichment::default());
        h.api.gig_responses.lock().unwrap().push(Err(ApiError::Status {
            endpoint: "create-gig".into(),
            status: 422,
            message: "service_type not recognized".into(),
        }));

        h.controller.start().await;
        h.controller.submit_answer("Electrician").await;
        h.controller.submit_answer("skip").await;
        h.controller
            .submit_widget_event(FieldKey::GigServiceType, AnswerValue::Choice("Electrical".into()))
            .await;
        h.controller.submit_answer("skip").await; // coordinates
        h.controller
            .submit_widget_event(FieldKey::LocationState, AnswerValue::Choice("Kerala".into()))
            .await;
        h.controller
            .submit_widget_event(FieldKey::LocationDistrict, AnswerValue::Choice("Kollam".into()))
            .await;
        h.controller.submit_answer("skip").await; // pincode
        h.controller.submit_answer("skip").await; // expected salary
        h.controller.submit_answer("skip").await; // experience
        h.controller.submit_answer("skip").await; // customers → terminal

        assert_eq!(h.controller.cursor().await, Cursor::Failed);
        let events = drain(&mut h.rx);
        assert!(events.iter().any(|e| matches!(
            e,
            WizardEvent::SubmissionFailed { message } if message.contains("service_type not recognized")
        )));
        // Answers retained for retry.
        let answers = h.controller.answers().await;
        assert_eq!(answers.text(FieldKey::GigTitle), Some("Electrician"));

        // Retry succeeds (stub default response is Ok).
        h.controller.retry_submission().await;
        assert_eq!(h.controller.cursor().await, Cursor::Done);
        let events = drain(&mut h.rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, WizardEvent::FlowCompleted { .. })));
        // Snapshot cleared on success.
        assert!(h.snapshots.slot.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn conversation_log_order_index_is_monotonic() {
        let h = harness(EntityKind::Gig, StubEnrichment::default());
        h.controller.start().await;
        h.controller.submit_answer("Electrician").await;
        h.controller.submit_answer("skip").await;
        h.controller
            .submit_widget_event(FieldKey::GigServiceType, AnswerValue::Choice("Electrical".into()))
            .await;
        // Let the spawned log appends run.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        let mut entries = h.log.entries.lock().unwrap().clone();
        assert_eq!(entries.len(), 3);
        entries.sort_by_key(|e| e.order_index);
        let indexes: Vec<u64> = entries.iter().map(|e| e.order_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(entries[0].step_key, "gig_title");
        assert_eq!(entries[0].answer_text, "Electrician");
        assert_eq!(entries[1].answer_text, "skip");
    }
}
