use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::certificates::{CertificateGroup, CertificateType, IssuanceOutcome};
use crate::directory::{Club, User};
use crate::wizard::{LineDefaults, LineItem, LookupRequest, RecipientChoices, RecipientInput, Step2Action, WizardState};

/// Query of `GET /api/wizard/step1`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Step1Query {
    /// Department to list signatures for
    pub department: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Step1View {
    pub state: WizardState,
    /// Saved step-1 data, blank when nothing was saved
    pub input: RecipientInput,
    pub choices: RecipientChoices,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Step1Saved {
    pub state: WizardState,
    pub warnings: Vec<String>,
}

/// Body of `POST /api/wizard/step1/lookup`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Step1LookupRequest {
    /// Form data as currently entered; the saved step 1 is used when absent
    pub input: Option<RecipientInput>,
    #[serde(flatten)]
    pub lookup: LookupRequest,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LookupResponse {
    pub members: Vec<User>,
    /// Form data, pre-filled when exactly one member matched
    pub input: RecipientInput,
}

/// A certificate type offered on step 2 with the values a new line gets
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TypeChoice {
    #[serde(flatten)]
    pub certificate_type: CertificateType,
    pub defaults: LineDefaults,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Step2View {
    pub state: WizardState,
    pub lines: Vec<LineItem>,
    pub types: Vec<TypeChoice>,
    pub clubs: Vec<Club>,
    pub groups: Vec<CertificateGroup>,
    pub template_group: Option<String>,
    pub limit: usize,
    /// Line to scroll back to after an edit
    pub refocus: Option<String>,
    pub warnings: Vec<String>,
}

/// Body of `POST /api/wizard/step2`
///
/// `fields` carries every line's inputs as `gc{key}-{field}`; when present it
/// replaces the saved values of the lines before the action runs.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Step2Request {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub action: Step2Action,
}

/// What a step-2 post produced
#[derive(Debug, Clone)]
pub enum Step2Outcome {
    Edited(Step2View),
    Submitted(IssuanceOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConfirmationView {
    pub success: bool,
    pub batch_id: Option<i32>,
    pub emailed_to: Option<String>,
    pub errors: Vec<String>,
}

impl From<&IssuanceOutcome> for ConfirmationView {
    fn from(outcome: &IssuanceOutcome) -> Self {
        Self {
            success: outcome.success,
            batch_id: outcome.batch_id,
            emailed_to: outcome.emailed_to.clone(),
            errors: outcome.unique_errors(),
        }
    }
}
