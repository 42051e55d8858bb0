//! Step registry — the transition table for every collection flow.
//!
//! Each step declares its prompt, its widget, how its raw answer parses, and
//! its successor (static, answer-dependent, or terminal). All branching
//! lives in this one table keyed by [`FieldKey`], so every transition is
//! independently testable.

use std::collections::HashMap;

use super::fields::{AnswerRecord, FieldKey};
use super::session::{EntityKind, Session};
use super::widgets::WidgetKind;

/// States offered by the state-select widget.
pub const STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Delhi",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
];

const FUNDING_SERIES: &[&str] = &[
    "Bootstrapped",
    "Seed",
    "Series A",
    "Series B",
    "Series C+",
    "Public",
];

const JOB_CATEGORIES: &[&str] = &[
    "Engineering",
    "Design",
    "Sales",
    "Marketing",
    "Operations",
    "Finance",
    "Support",
];

const REMOTE_TYPES: &[&str] = &["On-site", "Hybrid", "Remote"];

const SENIORITY_LEVELS: &[&str] = &["Junior", "Mid", "Senior", "Lead"];

const GIG_SERVICES: &[&str] = &[
    "Electrical",
    "Plumbing",
    "Carpentry",
    "Painting",
    "Cleaning",
    "Appliance Repair",
    "Driving",
    "Tutoring",
];

/// Whether a blank/skip answer is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// How the raw answer text parses into an [`super::fields::AnswerValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueParse {
    Text,
    Number,
    Url,
}

/// The successor of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Field(FieldKey),
    Terminal,
}

/// Context available to dynamic transitions.
pub struct TransitionCtx<'a> {
    pub entity_kind: EntityKind,
    pub record: &'a AnswerRecord,
}

/// How a step picks its successor.
pub enum Transition {
    Static(FieldKey),
    Dynamic(fn(&TransitionCtx<'_>) -> NextStep),
    Terminal,
}

/// One entry in the step table.
pub struct Step {
    pub requirement: Requirement,
    pub parse: ValueParse,
    pub prompt: fn(&Session, &AnswerRecord) -> String,
    pub widget: fn(&AnswerRecord) -> WidgetKind,
    pub transition: Transition,
}

/// The step table for all three flows.
pub struct StepRegistry {
    steps: HashMap<FieldKey, Step>,
}

impl StepRegistry {
    pub fn new() -> Self {
        let mut steps = HashMap::new();
        company_steps(&mut steps);
        location_steps(&mut steps);
        job_steps(&mut steps);
        gig_steps(&mut steps);
        Self { steps }
    }

    /// The first field of a flow.
    pub fn first_step(&self, kind: EntityKind) -> FieldKey {
        match kind {
            EntityKind::Company | EntityKind::Job => FieldKey::CompanyName,
            EntityKind::Gig => FieldKey::GigTitle,
        }
    }

    pub fn step(&self, key: FieldKey) -> &Step {
        self.steps
            .get(&key)
            .unwrap_or_else(|| panic!("no step registered for field {key}"))
    }

    /// Compute the successor of `current`.
    pub fn next_step(&self, current: FieldKey, ctx: &TransitionCtx<'_>) -> NextStep {
        match &self.step(current).transition {
            Transition::Static(key) => NextStep::Field(*key),
            Transition::Dynamic(f) => f(ctx),
            Transition::Terminal => NextStep::Terminal,
        }
    }

    /// The widget a field presents given the answers so far. Used both when
    /// entering a step and when reconstructing the pending widget after a
    /// snapshot restore.
    pub fn widget_for(&self, key: FieldKey, record: &AnswerRecord) -> WidgetKind {
        (self.step(key).widget)(record)
    }

    /// The prompt text for a field.
    pub fn prompt_for(&self, key: FieldKey, session: &Session, record: &AnswerRecord) -> String {
        (self.step(key).prompt)(session, record)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The coordinate→pincode fallback ladder.
///
/// Total over every combination of (state resolved?, district resolved?):
/// both → pincode choice (or free text when the directory came back empty),
/// state only → district select scoped to that state, no state → state
/// select. Deterministic by construction.
pub fn ladder_widget(
    state: Option<&str>,
    district: Option<&str>,
    pincodes: &[String],
) -> (FieldKey, WidgetKind) {
    match (state, district) {
        (Some(_), Some(_)) if !pincodes.is_empty() => (
            FieldKey::LocationPincode,
            WidgetKind::PincodeChoice { options: pincodes.to_vec() },
        ),
        (Some(_), Some(_)) => (FieldKey::LocationPincode, WidgetKind::FreeText),
        (Some(state), None) => (
            FieldKey::LocationDistrict,
            WidgetKind::DistrictSelect { state: state.to_string() },
        ),
        (None, _) => (FieldKey::LocationState, state_select()),
    }
}

fn options(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn state_select() -> WidgetKind {
    WidgetKind::StateSelect { options: options(STATES) }
}

fn free_text(_: &AnswerRecord) -> WidgetKind {
    WidgetKind::FreeText
}

/// After the funding step the location sub-flow is skipped entirely when
/// company metadata already supplied a full location.
fn after_company_details(ctx: &TransitionCtx<'_>) -> NextStep {
    if ctx.record.contains(FieldKey::LocationState)
        && ctx.record.contains(FieldKey::LocationDistrict)
    {
        after_location(ctx)
    } else {
        NextStep::Field(FieldKey::LocationCoordinates)
    }
}

/// The location sub-flow feeds three flows; where it exits depends on the
/// entity kind.
fn after_location(ctx: &TransitionCtx<'_>) -> NextStep {
    match ctx.entity_kind {
        EntityKind::Company => NextStep::Terminal,
        EntityKind::Job => NextStep::Field(FieldKey::JobTitle),
        EntityKind::Gig => NextStep::Field(FieldKey::GigExpectedSalary),
    }
}

fn company_steps(steps: &mut HashMap<FieldKey, Step>) {
    steps.insert(
        FieldKey::CompanyName,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |session, _| match &session.suggested_company {
                Some(name) => format!(
                    "What's your company called? Using existing company \"{name}\" — reply yes to keep it, or type a different name."
                ),
                None => "What's your company called?".to_string(),
            },
            widget: free_text,
            transition: Transition::Static(FieldKey::CompanyDescription),
        },
    );
    steps.insert(
        FieldKey::CompanyDescription,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, record| {
                let name = record.text(FieldKey::CompanyName).unwrap_or("your company");
                format!("Tell me a little about {name}. (Or type skip.)")
            },
            widget: free_text,
            transition: Transition::Static(FieldKey::CompanyWebsite),
        },
    );
    steps.insert(
        FieldKey::CompanyWebsite,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Url,
            prompt: |_, _| {
                "Do you have a website? Share the URL and I'll pull in your logo and details. (Or type skip.)"
                    .to_string()
            },
            widget: |_| WidgetKind::UrlCapture,
            transition: Transition::Static(FieldKey::CompanyFundingSeries),
        },
    );
    steps.insert(
        FieldKey::CompanyFundingSeries,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, _| "What funding stage are you at? (Or type skip.)".to_string(),
            widget: |_| WidgetKind::SingleSelect { options: options(FUNDING_SERIES) },
            transition: Transition::Dynamic(after_company_details),
        },
    );
}

fn location_steps(steps: &mut HashMap<FieldKey, Step>) {
    steps.insert(
        FieldKey::LocationCoordinates,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, _| {
                "Where are you located? Share your location, or type skip to pick a state instead."
                    .to_string()
            },
            widget: |_| WidgetKind::CoordinateCapture,
            transition: Transition::Static(FieldKey::LocationState),
        },
    );
    steps.insert(
        FieldKey::LocationState,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, _| "Which state are you in?".to_string(),
            widget: |_| state_select(),
            transition: Transition::Static(FieldKey::LocationDistrict),
        },
    );
    steps.insert(
        FieldKey::LocationDistrict,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, record| {
                let state = record.text(FieldKey::LocationState).unwrap_or("your state");
                format!("Which district in {state}?")
            },
            widget: |record| WidgetKind::DistrictSelect {
                state: record
                    .text(FieldKey::LocationState)
                    .unwrap_or_default()
                    .to_string(),
            },
            transition: Transition::Static(FieldKey::LocationPincode),
        },
    );
    steps.insert(
        FieldKey::LocationPincode,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, _| "What's your pincode? (Or type skip.)".to_string(),
            // Default widget for the manual path; the controller swaps in a
            // PincodeChoice when the directory lookup produced options.
            widget: free_text,
            transition: Transition::Dynamic(after_location),
        },
    );
}

fn job_steps(steps: &mut HashMap<FieldKey, Step>) {
    steps.insert(
        FieldKey::JobTitle,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, record| {
                let company = record.text(FieldKey::CompanyName).unwrap_or("your company");
                format!("Now the job posting for {company}. What's the job title?")
            },
            widget: free_text,
            transition: Transition::Static(FieldKey::JobCategory),
        },
    );
    steps.insert(
        FieldKey::JobCategory,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, _| "Which category does this role fall under?".to_string(),
            widget: |_| WidgetKind::SingleSelect { options: options(JOB_CATEGORIES) },
            transition: Transition::Static(FieldKey::JobDescription),
        },
    );
    steps.insert(
        FieldKey::JobDescription,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, _| "Describe the role — responsibilities, stack, anything a candidate should know."
                .to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::JobYearsRequired),
        },
    );
    steps.insert(
        FieldKey::JobYearsRequired,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Number,
            prompt: |_, _| "How many years of experience are required?".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::JobSalaryMin),
        },
    );
    steps.insert(
        FieldKey::JobSalaryMin,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Number,
            prompt: |_, _| "Minimum salary for the role? (Or type skip.)".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::JobSalaryMax),
        },
    );
    steps.insert(
        FieldKey::JobSalaryMax,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Number,
            prompt: |_, _| "Maximum salary? (Or type skip.)".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::JobRemoteType),
        },
    );
    steps.insert(
        FieldKey::JobRemoteType,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, _| "Is the role on-site, hybrid, or remote? (Or type skip.)".to_string(),
            widget: |_| WidgetKind::SingleSelect { options: options(REMOTE_TYPES) },
            transition: Transition::Static(FieldKey::JobSeniority),
        },
    );
    steps.insert(
        FieldKey::JobSeniority,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, _| "What seniority level? (Or type skip.)".to_string(),
            widget: |_| WidgetKind::SingleSelect { options: options(SENIORITY_LEVELS) },
            transition: Transition::Static(FieldKey::JobApplicationUrl),
        },
    );
    steps.insert(
        FieldKey::JobApplicationUrl,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Url,
            prompt: |_, _| "Any external application link? (Or type skip.)".to_string(),
            widget: |_| WidgetKind::UrlCapture,
            transition: Transition::Terminal,
        },
    );
}

fn gig_steps(steps: &mut HashMap<FieldKey, Step>) {
    steps.insert(
        FieldKey::GigTitle,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, _| "What gig are you offering? Give it a short title.".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::GigDescription),
        },
    );
    steps.insert(
        FieldKey::GigDescription,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Text,
            prompt: |_, _| "Describe what you offer. (Or type skip.)".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::GigServiceType),
        },
    );
    steps.insert(
        FieldKey::GigServiceType,
        Step {
            requirement: Requirement::Required,
            parse: ValueParse::Text,
            prompt: |_, _| "What kind of service is this?".to_string(),
            widget: |_| WidgetKind::SingleSelect { options: options(GIG_SERVICES) },
            transition: Transition::Static(FieldKey::LocationCoordinates),
        },
    );
    steps.insert(
        FieldKey::GigExpectedSalary,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Number,
            prompt: |_, _| "What do you expect to earn per month? (Or type skip.)".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::GigExperience),
        },
    );
    steps.insert(
        FieldKey::GigExperience,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Number,
            prompt: |_, _| "How many years have you been doing this? (Or type skip.)".to_string(),
            widget: free_text,
            transition: Transition::Static(FieldKey::GigCustomers),
        },
    );
    steps.insert(
        FieldKey::GigCustomers,
        Step {
            requirement: Requirement::Optional,
            parse: ValueParse::Number,
            prompt: |_, _| "Roughly how many customers have you served so far? (Or type skip.)"
                .to_string(),
            widget: free_text,
            transition: Transition::Terminal,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::fields::AnswerValue;

    fn ctx(kind: EntityKind, record: &AnswerRecord) -> TransitionCtx<'_> {
        TransitionCtx { entity_kind: kind, record }
    }

    #[test]
    fn every_flow_reaches_terminal() {
        let registry = StepRegistry::new();
        for kind in [EntityKind::Company, EntityKind::Job, EntityKind::Gig] {
            let mut record = AnswerRecord::new();
            // Fill location so dynamic branches have something to read.
            record.set(FieldKey::LocationState, AnswerValue::Text("Kerala".into()));
            record.set(FieldKey::LocationDistrict, AnswerValue::Text("Kollam".into()));

            let mut current = registry.first_step(kind);
            let mut hops = 0;
            loop {
                match registry.next_step(current, &ctx(kind, &record)) {
                    NextStep::Field(next) => {
                        current = next;
                        hops += 1;
                        assert!(hops < 50, "flow for {kind} does not terminate");
                    }
                    NextStep::Terminal => break,
                }
            }
        }
    }

    #[test]
    fn job_flow_walks_company_then_job() {
        let registry = StepRegistry::new();
        let record = AnswerRecord::new();
        let ctx = ctx(EntityKind::Job, &record);

        assert_eq!(registry.first_step(EntityKind::Job), FieldKey::CompanyName);
        assert_eq!(
            registry.next_step(FieldKey::CompanyName, &ctx),
            NextStep::Field(FieldKey::CompanyDescription)
        );
        // No merged location: funding leads into the location sub-flow.
        assert_eq!(
            registry.next_step(FieldKey::CompanyFundingSeries, &ctx),
            NextStep::Field(FieldKey::LocationCoordinates)
        );
        assert_eq!(
            registry.next_step(FieldKey::LocationPincode, &ctx),
            NextStep::Field(FieldKey::JobTitle)
        );
        assert_eq!(
            registry.next_step(FieldKey::JobApplicationUrl, &ctx),
            NextStep::Terminal
        );
    }

    #[test]
    fn merged_metadata_skips_location_subflow() {
        let registry = StepRegistry::new();
        let mut record = AnswerRecord::new();
        record.set(FieldKey::LocationState, AnswerValue::Text("Kerala".into()));
        record.set(FieldKey::LocationDistrict, AnswerValue::Text("Kollam".into()));

        assert_eq!(
            registry.next_step(FieldKey::CompanyFundingSeries, &ctx(EntityKind::Job, &record)),
            NextStep::Field(FieldKey::JobTitle)
        );
        assert_eq!(
            registry.next_step(
                FieldKey::CompanyFundingSeries,
                &ctx(EntityKind::Company, &record)
            ),
            NextStep::Terminal
        );
    }

    #[test]
    fn location_exit_depends_on_entity() {
        let registry = StepRegistry::new();
        let record = AnswerRecord::new();
        assert_eq!(
            registry.next_step(FieldKey::LocationPincode, &ctx(EntityKind::Company, &record)),
            NextStep::Terminal
        );
        assert_eq!(
            registry.next_step(FieldKey::LocationPincode, &ctx(EntityKind::Gig, &record)),
            NextStep::Field(FieldKey::GigExpectedSalary)
        );
    }

    #[test]
    fn ladder_is_total_and_deterministic() {
        let pins = vec!["691001".to_string(), "691583".to_string()];
        let none: Vec<String> = vec![];

        let (field, widget) = ladder_widget(Some("Kerala"), Some("Kollam"), &pins);
        assert_eq!(field, FieldKey::LocationPincode);
        assert_eq!(widget.kind_name(), "pincode_choice");

        let (field, widget) = ladder_widget(Some("Kerala"), Some("Kollam"), &none);
        assert_eq!(field, FieldKey::LocationPincode);
        assert_eq!(widget.kind_name(), "free_text");

        let (field, widget) = ladder_widget(Some("Kerala"), None, &none);
        assert_eq!(field, FieldKey::LocationDistrict);
        assert_eq!(
            widget,
            WidgetKind::DistrictSelect { state: "Kerala".into() }
        );

        let (field, widget) = ladder_widget(None, None, &none);
        assert_eq!(field, FieldKey::LocationState);
        assert_eq!(widget.kind_name(), "state_select");

        // District without state degrades to state selection too.
        let (field, _) = ladder_widget(None, Some("Kollam"), &pins);
        assert_eq!(field, FieldKey::LocationState);
    }

    #[test]
    fn district_widget_is_scoped_to_state() {
        let registry = StepRegistry::new();
        let mut record = AnswerRecord::new();
        record.set(FieldKey::LocationState, AnswerValue::Text("Kerala".into()));
        assert_eq!(
            registry.widget_for(FieldKey::LocationDistrict, &record),
            WidgetKind::DistrictSelect { state: "Kerala".into() }
        );
    }

    #[test]
    fn company_prompt_embeds_suggestion() {
        let registry = StepRegistry::new();
        let mut session = Session::new("u", EntityKind::Job);
        session.suggested_company = Some("Acme Tools".into());
        let prompt = registry.prompt_for(FieldKey::CompanyName, &session, &AnswerRecord::new());
        assert!(prompt.contains("Using existing company \"Acme Tools\""));
    }

    #[test]
    fn requirements_match_contract() {
        let registry = StepRegistry::new();
        for key in [
            FieldKey::CompanyName,
            FieldKey::LocationState,
            FieldKey::LocationDistrict,
            FieldKey::JobTitle,
            FieldKey::JobDescription,
            FieldKey::GigTitle,
            FieldKey::GigServiceType,
        ] {
            assert_eq!(registry.step(key).requirement, Requirement::Required, "{key}");
        }
        for key in [
            FieldKey::CompanyDescription,
            FieldKey::LocationPincode,
            FieldKey::GigDescription,
            FieldKey::JobSalaryMin,
        ] {
            assert_eq!(registry.step(key).requirement, Requirement::Optional, "{key}");
        }
    }
}
