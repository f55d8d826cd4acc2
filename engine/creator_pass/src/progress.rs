//! # Progress tracker
//!
//! One onboarding [`Flow`] per role: an ordered list of steps, each moving
//! through [`StepState`] at most once.
//!
//! ## Transition guards
//!
//! A transition on step `i` is accepted only when
//!
//! 1. the step exists in the role's flow,
//! 2. the step is still `Pending`,
//! 3. for `skip`, the step is optional,
//! 4. every step before `i` is `Completed` or `Skipped`.
//!
//! Guards run before any mutation; a rejected transition leaves the flow
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Role, StepState};
use crate::Error;

/// Catalog entry for a step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StepDef {
    pub id: &'static str,
    pub title: &'static str,
    pub optional: bool,
}

const fn required(id: &'static str, title: &'static str) -> StepDef {
    StepDef {
        id,
        title,
        optional: false,
    }
}

const fn optional(id: &'static str, title: &'static str) -> StepDef {
    StepDef {
        id,
        title,
        optional: true,
    }
}

const SOLO_CREATOR_STEPS: [StepDef; 5] = [
    required("install", "Install Dream Mover CLI"),
    required("auth", "Authenticate Your Account"),
    required("profile", "Set Your Creator Profile"),
    required("first-gen", "Generate Your First Content"),
    optional("templates", "Setup Content Templates"),
];

const AGENCY_STEPS: [StepDef; 7] = [
    required("install", "Install Vauntico Agency CLI"),
    required("auth", "Authenticate Agency Account"),
    required("agency-mode", "Enable Agency Mode"),
    required("onboard-client", "Onboard Your First Client"),
    required("run-audit", "Run Your First Audit"),
    optional("branding", "Setup Custom Branding"),
    optional("automation", "Enable Automation"),
];

const TEAM_LEAD_STEPS: [StepDef; 4] = [
    required("install", "Install Team CLI"),
    required("auth", "Authenticate Team Lead"),
    required("team-setup", "Create Your Team"),
    required("shared-templates", "Setup Shared Templates"),
];

pub fn steps_for(role: Role) -> &'static [StepDef] {
    match role {
        Role::SoloCreator => &SOLO_CREATOR_STEPS,
        Role::Agency => &AGENCY_STEPS,
        Role::TeamLead => &TEAM_LEAD_STEPS,
    }
}

/// Persisted shape of `cli_onboarding_<roleId>`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OnboardingRecord {
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionRejection {
    UnknownStep,
    AlreadyResolved,
    NotOptional,
    OutOfOrder,
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownStep => "step is not part of this flow",
            Self::AlreadyResolved => "step is already completed or skipped",
            Self::NotOptional => "only optional steps can be skipped",
            Self::OutOfOrder => "an earlier step is still pending",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    Complete,
    Skip,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Step {
    pub id: &'static str,
    pub title: &'static str,
    pub optional: bool,
    pub state: StepState,
}

/// Coarse progress band used for status copy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    NotStarted,
    JustStarted,
    MakingProgress,
    AlmostThere,
    Complete,
}

impl ProgressBand {
    fn for_percent(percent: u8) -> Self {
        match percent {
            0 => Self::NotStarted,
            1..=29 => Self::JustStarted,
            30..=59 => Self::MakingProgress,
            60..=99 => Self::AlmostThere,
            _ => Self::Complete,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NotStarted => "Ready to begin your journey",
            Self::JustStarted => "Just getting started",
            Self::MakingProgress => "Making great progress",
            Self::AlmostThere => "Almost there!",
            Self::Complete => "Onboarding complete!",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Flow {
    pub role: Role,
    pub steps: Vec<Step>,
}

impl Flow {
    /// A flow with every step pending.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            steps: steps_for(role)
                .iter()
                .map(|def| Step {
                    id: def.id,
                    title: def.title,
                    optional: def.optional,
                    state: StepState::Pending,
                })
                .collect(),
        }
    }

    /// Rebuild a flow from its persisted record.
    ///
    /// Unknown step ids are dropped. A required step listed as skipped is
    /// treated as pending. A step listed in both lists counts as completed.
    /// Steps resolved after the first pending one go back to pending, so a
    /// loaded flow is always sequential.
    pub fn from_record(role: Role, record: &OnboardingRecord) -> Self {
        let mut flow = Self::new(role);

        for id in record.completed.iter().chain(&record.skipped) {
            if flow.index_of(id).is_none() {
                warn!(role = %role, step = %id, "dropping unknown onboarding step");
            }
        }

        for step in &mut flow.steps {
            if record.completed.iter().any(|id| id == step.id) {
                step.state = StepState::Completed;
            } else if record.skipped.iter().any(|id| id == step.id) {
                if step.optional {
                    step.state = StepState::Skipped;
                } else {
                    warn!(role = %role, step = step.id, "ignoring skip of a required step");
                }
            }
        }

        if let Some(first_pending) = flow.steps.iter().position(|s| !s.state.is_resolved()) {
            for step in &mut flow.steps[first_pending + 1..] {
                if step.state.is_resolved() {
                    warn!(role = %role, step = step.id, "reopening step resolved out of order");
                    step.state = StepState::Pending;
                }
            }
        }

        flow
    }

    pub fn to_record(&self) -> OnboardingRecord {
        let ids_in = |state: StepState| -> Vec<String> {
            self.steps
                .iter()
                .filter(|s| s.state == state)
                .map(|s| s.id.to_string())
                .collect()
        };
        OnboardingRecord {
            completed: ids_in(StepState::Completed),
            skipped: ids_in(StepState::Skipped),
        }
    }

    fn index_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn state_of(&self, step_id: &str) -> Option<StepState> {
        self.step(step_id).map(|s| s.state)
    }

    pub fn has_completed(&self, step_id: &str) -> bool {
        self.state_of(step_id) == Some(StepState::Completed)
    }

    /// Check a transition without applying it.
    pub fn check(&self, step_id: &str, transition: Transition) -> Result<usize, TransitionRejection> {
        let index = self
            .index_of(step_id)
            .ok_or(TransitionRejection::UnknownStep)?;
        let step = &self.steps[index];

        if step.state.is_resolved() {
            return Err(TransitionRejection::AlreadyResolved);
        }
        if transition == Transition::Skip && !step.optional {
            return Err(TransitionRejection::NotOptional);
        }
        if !self.steps[..index].iter().all(|s| s.state.is_resolved()) {
            return Err(TransitionRejection::OutOfOrder);
        }
        Ok(index)
    }

    pub fn apply(&mut self, step_id: &str, transition: Transition) -> Result<(), Error> {
        let index = self
            .check(step_id, transition)
            .map_err(|reason| Error::InvalidStepTransition {
                step: step_id.to_string(),
                reason,
            })?;

        self.steps[index].state = match transition {
            Transition::Complete => StepState::Completed,
            Transition::Skip => StepState::Skipped,
        };
        Ok(())
    }

    pub fn complete(&mut self, step_id: &str) -> Result<(), Error> {
        self.apply(step_id, Transition::Complete)
    }

    pub fn skip(&mut self, step_id: &str) -> Result<(), Error> {
        self.apply(step_id, Transition::Skip)
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn completed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.state == StepState::Completed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.state == StepState::Skipped)
            .count()
    }

    /// `completed / total`, rounded to a whole percent. Skipped steps do not
    /// count as completed.
    pub fn percent_complete(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        (self.completed_count() as f64 / self.steps.len() as f64 * 100.0).round() as u8
    }

    pub fn status_band(&self) -> ProgressBand {
        ProgressBand::for_percent(self.percent_complete())
    }

    /// The first pending step.
    pub fn current_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| !s.state.is_resolved())
    }

    /// Whether navigation may jump to the step at `index`.
    pub fn can_visit(&self, index: usize) -> bool {
        index < self.steps.len() && self.steps[..index].iter().all(|s| s.state.is_resolved())
    }

    /// Every step resolved.
    pub fn is_finished(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.state.is_resolved())
    }
}

/// Render-ready summary of a flow.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    #[serde(flatten)]
    pub flow: Flow,
    pub percent_complete: u8,
    pub current_step: Option<&'static str>,
    pub band: ProgressBand,
    pub message: &'static str,
    pub finished: bool,
}

impl From<Flow> for FlowSummary {
    fn from(flow: Flow) -> Self {
        let band = flow.status_band();
        Self {
            percent_complete: flow.percent_complete(),
            current_step: flow.current_step().map(|s| s.id),
            band,
            message: band.message(),
            finished: flow.is_finished(),
            flow,
        }
    }
}
