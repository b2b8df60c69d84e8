// HTTP handlers for certificates, batches and the public download

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Operator, StaffIdentity};
use crate::certificates::{
    decode_download_ref, download_response, CertificateError,
    CreateCertificateRequest, IssuanceOutcome,
};
use crate::delivery::DeliveryOptions;
use crate::AppState;

/// Body of `POST /api/batches/{id}/email`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ResendEmailRequest {
    /// Send to this address instead of the batch recipient
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub skip_bcc: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResendEmailResponse {
    pub emailed_to: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedBatchesResponse {
    pub deleted: u64,
}

/// Handler for GET /api/certificates/{id}/preview
/// Renders one certificate inline, looked up by id and then by code
#[utoipa::path(
    get,
    path = "/api/certificates/{id}/preview",
    params(("id" = String, Path, description = "Certificate id or code")),
    responses(
        (status = 200, description = "Certificate PDF", content_type = "application/pdf"),
        (status = 404, description = "Certificate not found", body = String, example = json!({"error": "Certificate not found"}))
    ),
    security(("bearer" = [])),
    tag = "certificates"
)]
pub async fn preview_certificate(
    State(state): State<AppState>,
    _staff: StaffIdentity,
    Path(id): Path<String>,
) -> Result<Response, CertificateError> {
    tracing::debug!("Previewing certificate {}", id);

    let by_id = match id.parse::<i32>() {
        Ok(numeric) => state.store.find_certificate(numeric).await?,
        Err(_) => None,
    };
    let certificate = match by_id {
        Some(certificate) => certificate,
        None => state
            .store
            .find_certificate_by_code(&id)
            .await?
            .ok_or(CertificateError::NotFound)?,
    };

    let batch = match certificate.batch_id {
        Some(batch_id) => state.store.find_batch(batch_id).await?,
        None => None,
    };

    let rendered = state.documents.render(&certificate, batch.as_ref()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "inline; filename=\"{}\"",
                    urlencoding::encode(&rendered.filename)
                ),
            ),
        ],
        rendered.bytes,
    )
        .into_response())
}

/// Handler for POST /api/certificates
/// Issues a single certificate in a batch of its own
#[utoipa::path(
    post,
    path = "/api/certificates",
    request_body = CreateCertificateRequest,
    responses(
        (status = 200, description = "Certificate issued", body = IssuanceOutcome),
        (status = 400, description = "Registration failed, nothing was kept", body = IssuanceOutcome),
        (status = 422, description = "Invalid request", body = String, example = json!({"error": "Invalid certificate request", "details": {"cert_type": ["Certificate type does not exist"]}}))
    ),
    security(("bearer" = [])),
    tag = "certificates"
)]
pub async fn create_certificate(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<CreateCertificateRequest>,
) -> Result<(StatusCode, Json<IssuanceOutcome>), CertificateError> {
    tracing::debug!("Issuing single certificate of type {}", request.cert_type);

    let (batch, certificate) = state
        .issuance
        .prepare_single(operator.user.id, request)
        .await?;
    let outcome = state.issuance.issue(batch, vec![certificate]).await?;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(outcome)))
}

/// Handler for POST /api/batches/{id}/email
/// Sends the download email of a batch again, immediately
#[utoipa::path(
    post,
    path = "/api/batches/{id}/email",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = ResendEmailRequest,
    responses(
        (status = 200, description = "Email sent", body = ResendEmailResponse),
        (status = 404, description = "Batch not found", body = String, example = json!({"error": "Certificate batch not found"})),
        (status = 502, description = "Mail relay failed", body = String, example = json!({"error": "The email could not be sent"}))
    ),
    security(("bearer" = [])),
    tag = "batches"
)]
pub async fn resend_batch_email(
    State(state): State<AppState>,
    _operator: Operator,
    Path(id): Path<i32>,
    Json(request): Json<ResendEmailRequest>,
) -> Result<Json<ResendEmailResponse>, CertificateError> {
    let options = DeliveryOptions {
        recipient_email: request
            .recipient_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()),
        skip_bcc: request.skip_bcc,
    };

    let emailed_to = state.issuance.resend_email(id, &options).await?;
    Ok(Json(ResendEmailResponse { emailed_to }))
}

/// Handler for DELETE /api/batches/empty
/// Removes batches left without certificates
#[utoipa::path(
    delete,
    path = "/api/batches/empty",
    responses(
        (status = 200, description = "Number of batches deleted", body = DeletedBatchesResponse)
    ),
    security(("bearer" = [])),
    tag = "batches"
)]
pub async fn delete_empty_batches(
    State(state): State<AppState>,
    _operator: Operator,
) -> Result<Json<DeletedBatchesResponse>, CertificateError> {
    let deleted = state.issuance.delete_empty_batches().await?;
    Ok(Json(DeletedBatchesResponse { deleted }))
}

/// Handler for GET /download/{reference}
/// Public download of a batch: one PDF, or a zip of all its certificates
#[utoipa::path(
    get,
    path = "/download/{reference}",
    params(("reference" = String, Path, description = "Download reference from the delivery email")),
    responses(
        (status = 200, description = "Certificate PDF or zip archive"),
        (status = 404, description = "No matching batch", body = String, example = json!({"error": "Certificate batch not found"}))
    ),
    tag = "download"
)]
pub async fn download_batch(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Response, CertificateError> {
    let Some((batch_id, email)) = decode_download_ref(&reference) else {
        tracing::debug!("Malformed download reference");
        return Err(CertificateError::BatchNotFound);
    };

    let batch = state
        .store
        .find_batch_for_download(batch_id, &email)
        .await?
        .ok_or_else(|| {
            tracing::debug!("No batch {} for the given recipient", batch_id);
            CertificateError::BatchNotFound
        })?;

    let files = state.documents.render_batch(&batch).await?;
    if files.is_empty() {
        return Err(CertificateError::BatchNotFound);
    }

    tracing::info!("Certificate batch {} downloaded ({} files)", batch.id, files.len());
    download_response(files)
}
