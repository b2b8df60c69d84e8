// Gift certificate issuance service
// Staff build a batch of certificates in a two-step wizard; the batch is registered with
// the inventory system, rendered to PDF and delivered by email

pub mod auth;
pub mod cache;
pub mod certificates;
pub mod config;
pub mod db;
pub mod delivery;
pub mod directory;
pub mod documents;
pub mod error;
pub mod inventory;
pub mod locale;
pub mod registration;
pub mod validation;
pub mod wizard;
pub mod xml;

use axum::{
    extract::State,
    http::Uri,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::TokenService;
use certificates::{CertificateStore, IssuanceService};
use config::AppConfig;
use directory::Directory;
use documents::DocumentService;
use error::ApiError;
use wizard::WizardService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        wizard::get_step1,
        wizard::save_step1,
        wizard::reset_step1,
        wizard::lookup_step1_member,
        wizard::get_step2,
        wizard::post_step2,
        wizard::get_confirmation,
        certificates::preview_certificate,
        certificates::create_certificate,
        certificates::resend_batch_email,
        certificates::delete_empty_batches,
        certificates::download_batch,
    ),
    components(
        schemas(
            wizard::RecipientInput,
            wizard::RecipientChoices,
            wizard::Step1View,
            wizard::Step1Saved,
            wizard::Step1LookupRequest,
            wizard::LookupRequest,
            wizard::LookupResponse,
            wizard::LineItem,
            wizard::LineDefaults,
            wizard::TypeChoice,
            wizard::Step2Action,
            wizard::Step2Request,
            wizard::Step2View,
            wizard::ConfirmationView,
            wizard::WizardState,
            certificates::CreateCertificateRequest,
            certificates::IssuanceOutcome,
            certificates::ResendEmailRequest,
            certificates::ResendEmailResponse,
            certificates::DeletedBatchesResponse,
            certificates::CertificateType,
            certificates::CertificateGroup,
            certificates::PowerCart,
            directory::User,
            directory::Department,
            directory::Club,
            directory::EmailSignature,
            locale::Locale,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "wizard", description = "Two-step certificate batch entry"),
        (name = "certificates", description = "Single certificates, batches and downloads"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Gift Certificate API",
        version = "1.0.0",
        description = "Issuance, registration and delivery of golf gift certificates"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Absent in tests that run on in-memory stores
    pub db: Option<PgPool>,
    pub directory: Arc<dyn Directory>,
    pub store: Arc<dyn CertificateStore>,
    pub documents: DocumentService,
    pub issuance: IssuanceService,
    pub wizard: WizardService,
    pub tokens: Arc<TokenService>,
}

/// Handler for GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = String, example = json!({"status": "ok"})),
        (status = 500, description = "Database unreachable", body = String)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Some(pool) = &state.db {
        db::ping(pool).await?;
    }
    Ok(Json(json!({ "status": "ok" })))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found("Route", uri.path())
}

/// Creates and configures the application router
///
/// The public download routes are rate limited per client address when a rate is
/// configured; that needs the server to provide connect info.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut downloads: Router<AppState> = Router::new()
        .route("/download/:reference", get(certificates::download_batch))
        .route("/download/:reference/", get(certificates::download_batch));

    if let Some(interval) = state.config.download_replenish_interval() {
        let governor = GovernorConfigBuilder::default()
            .per_millisecond(interval.as_millis() as u64)
            .burst_size(state.config.download_rate_burst.max(1))
            .finish();
        match governor {
            Some(governor) => {
                // The layer borrows its config for the life of the server
                downloads = downloads.layer(GovernorLayer {
                    config: Box::leak(Box::new(governor)),
                });
            }
            None => tracing::warn!("Invalid download rate limit, downloads are not rate limited"),
        }
    }

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route(
            "/api/wizard/step1",
            get(wizard::get_step1)
                .post(wizard::save_step1)
                .delete(wizard::reset_step1),
        )
        .route("/api/wizard/step1/lookup", post(wizard::lookup_step1_member))
        .route("/api/wizard/step2", get(wizard::get_step2).post(wizard::post_step2))
        .route("/api/wizard/confirmation", get(wizard::get_confirmation))
        .route("/api/certificates", post(certificates::create_certificate))
        .route("/api/certificates/:id/preview", get(certificates::preview_certificate))
        .route("/api/batches/:id/email", post(certificates::resend_batch_email))
        .route("/api/batches/empty", delete(certificates::delete_empty_batches))
        .merge(downloads)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
pub mod testing;
