// HTTP handlers for the issuance wizard

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::Operator;
use crate::wizard::{
    ConfirmationView, LookupResponse, RecipientInput, Step1LookupRequest, Step1Query, Step1Saved,
    Step1View, Step2Outcome, Step2Request, Step2View, WizardError,
};
use crate::AppState;

/// Handler for GET /api/wizard/step1
#[utoipa::path(
    get,
    path = "/api/wizard/step1",
    params(("department" = Option<uuid::Uuid>, Query, description = "Department to list signatures for")),
    responses(
        (status = 200, description = "Saved recipient and choices", body = Step1View),
        (status = 403, description = "Not allowed", body = String, example = json!({"error": "Staff access required"}))
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn get_step1(
    State(state): State<AppState>,
    operator: Operator,
    Query(query): Query<Step1Query>,
) -> Result<Json<Step1View>, WizardError> {
    let view = state.wizard.step1_view(&operator.user, query.department).await?;
    Ok(Json(view))
}

/// Handler for POST /api/wizard/step1
#[utoipa::path(
    post,
    path = "/api/wizard/step1",
    request_body = RecipientInput,
    responses(
        (status = 200, description = "Recipient saved", body = Step1Saved),
        (status = 422, description = "Invalid recipient", body = String, example = json!({"error": "Please correct the errors below", "details": {"recipient_email": ["Enter a valid email address."]}}))
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn save_step1(
    State(state): State<AppState>,
    operator: Operator,
    Json(input): Json<RecipientInput>,
) -> Result<Json<Step1Saved>, WizardError> {
    let saved = state.wizard.save_step1(&operator.user, input).await?;
    Ok(Json(saved))
}

/// Handler for DELETE /api/wizard/step1
#[utoipa::path(
    delete,
    path = "/api/wizard/step1",
    responses((status = 204, description = "Step 1 cleared")),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn reset_step1(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<StatusCode, WizardError> {
    state.wizard.reset_step1(&operator.user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/wizard/step1/lookup
#[utoipa::path(
    post,
    path = "/api/wizard/step1/lookup",
    request_body = Step1LookupRequest,
    responses((status = 200, description = "Matching members", body = LookupResponse)),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn lookup_step1_member(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<Step1LookupRequest>,
) -> Result<Json<LookupResponse>, WizardError> {
    let response = state.wizard.lookup(&operator.user, request).await?;
    Ok(Json(response))
}

/// Handler for GET /api/wizard/step2
#[utoipa::path(
    get,
    path = "/api/wizard/step2",
    responses(
        (status = 200, description = "Certificate lines", body = Step2View),
        (status = 409, description = "Step 1 incomplete", body = String, example = json!({"error": "You must complete this step before proceeding.", "redirect": "step1"}))
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn get_step2(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<Step2View>, WizardError> {
    let view = state.wizard.step2_view(&operator.user).await?;
    Ok(Json(view))
}

/// Handler for POST /api/wizard/step2
/// Edits the lines, or submits the batch when the action is `submit`
#[utoipa::path(
    post,
    path = "/api/wizard/step2",
    request_body = Step2Request,
    responses(
        (status = 200, description = "Lines edited, or batch submitted", body = Step2View),
        (status = 409, description = "Step 1 incomplete or duplicate submission", body = String),
        (status = 422, description = "Invalid lines", body = String)
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn post_step2(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<Step2Request>,
) -> Result<Response, WizardError> {
    let response = match state.wizard.step2_post(&operator.user, request).await? {
        Step2Outcome::Edited(view) => Json(view).into_response(),
        Step2Outcome::Submitted(outcome) => {
            Json(json!({ "submitted": true, "outcome": outcome, "redirect": "confirmation" }))
                .into_response()
        }
    };
    Ok(response)
}

/// Handler for GET /api/wizard/confirmation
#[utoipa::path(
    get,
    path = "/api/wizard/confirmation",
    responses(
        (status = 200, description = "Result of the last submission", body = ConfirmationView),
        (status = 409, description = "Nothing submitted", body = String)
    ),
    security(("bearer" = [])),
    tag = "wizard"
)]
pub async fn get_confirmation(
    State(state): State<AppState>,
    operator: Operator,
) -> Result<Json<ConfirmationView>, WizardError> {
    let view = state.wizard.confirmation(&operator.user).await?;
    Ok(Json(view))
}
