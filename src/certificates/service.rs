use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::certificates::{
    CertificateBatch, CertificateError, CertificateStore, NewBatch, NewCertificate, PowerCart,
};
use crate::delivery::{DeliveryOptions, DeliveryService};
use crate::directory::Directory;
use crate::inventory::InventoryClient;
use crate::locale::Locale;
use crate::registration::{BatchRegistrationService, RegistrationOutcome};
use crate::validation::{sanitize_text, validate_account_number, validate_language, FieldErrors};

/// Signature every department may use
pub const GLOBAL_SIGNATURE_ID: i32 = 1;

/// Result of one issuance attempt, as shown on the confirmation page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IssuanceOutcome {
    pub success: bool,
    /// Set only when the batch was kept
    pub batch_id: Option<i32>,
    /// Address the download link was (or will be) sent to
    pub emailed_to: Option<String>,
    /// Rejection reasons, or notices returned with an acceptance
    pub errors: Vec<String>,
}

impl IssuanceOutcome {
    /// Messages in first-seen order without repeats
    pub fn unique_errors(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.errors.len());
        for error in &self.errors {
            if !unique.contains(error) {
                unique.push(error.clone());
            }
        }
        unique
    }
}

/// Body of `POST /api/certificates`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCertificateRequest {
    #[validate(custom = "validate_language")]
    pub language: String,
    #[validate(custom = "validate_account_number")]
    pub account_number: Option<String>,
    #[validate(length(min = 1, max = 60))]
    pub recipient_name: String,
    #[validate(email)]
    pub recipient_email: String,
    pub department_id: Uuid,
    pub email_signature: i32,
    pub cert_type: i32,
    pub primary_course: i32,
    pub secondary_course: Option<i32>,
    /// ISO date, not in the past
    pub expiry_date: Option<chrono::NaiveDate>,
    pub quantity: Option<Decimal>,
    pub power_cart: Option<PowerCart>,
    #[validate(length(max = 255))]
    pub note: Option<String>,
    #[validate(length(max = 250))]
    pub message: Option<String>,
}

/// Drives a batch from persistence through registration to delivery
#[derive(Clone)]
pub struct IssuanceService {
    store: Arc<dyn CertificateStore>,
    directory: Arc<dyn Directory>,
    inventory: Arc<dyn InventoryClient>,
    registration: BatchRegistrationService,
    delivery: DeliveryService,
    default_membership_number: String,
}

impl IssuanceService {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        directory: Arc<dyn Directory>,
        inventory: Arc<dyn InventoryClient>,
        registration: BatchRegistrationService,
        delivery: DeliveryService,
        default_membership_number: String,
    ) -> Self {
        Self {
            store,
            directory,
            inventory,
            registration,
            delivery,
            default_membership_number,
        }
    }

    /// Create, register and deliver a batch
    ///
    /// The batch and its certificates are created in one transaction. When the inventory
    /// system does not accept the ticket the batch is deleted again, so a failed outcome
    /// never leaves a batch behind. Database errors before registration are returned as
    /// errors; everything after is reported through the outcome.
    pub async fn issue(
        &self,
        batch: NewBatch,
        certificates: Vec<NewCertificate>,
    ) -> Result<IssuanceOutcome, CertificateError> {
        let (batch, created) = self.store.create_batch(batch, certificates).await?;
        tracing::info!(
            "Certificate batch {} created with {} certificates",
            batch.id,
            created.len()
        );

        // Reachability is logged only; registration reports its own transport failures
        match self.inventory.ping().await {
            Ok(true) => tracing::debug!("Inventory system reachable"),
            Ok(false) => tracing::warn!("Inventory system ping returned false"),
            Err(e) => tracing::warn!("Inventory system ping failed: {}", e),
        }

        match self.registration.register(&batch).await {
            RegistrationOutcome::Success { notices } => {
                let emailed_to = self.schedule_delivery(&batch).await;
                Ok(IssuanceOutcome {
                    success: true,
                    batch_id: Some(batch.id),
                    emailed_to,
                    errors: notices,
                })
            }
            RegistrationOutcome::Failure(errors) => {
                self.rollback(&batch).await;
                Ok(IssuanceOutcome {
                    success: false,
                    batch_id: None,
                    emailed_to: None,
                    errors,
                })
            }
        }
    }

    async fn schedule_delivery(&self, batch: &CertificateBatch) -> Option<String> {
        match self.delivery.schedule(batch, &DeliveryOptions::default()).await {
            Ok(to) => Some(to),
            Err(e) => {
                tracing::error!("Delivery email for certificate batch {} not scheduled: {}", batch.id, e);
                None
            }
        }
    }

    async fn rollback(&self, batch: &CertificateBatch) {
        match self.store.delete_batch(batch.id).await {
            Ok(_) => tracing::info!("Certificate batch {} deleted after failed registration", batch.id),
            Err(e) => tracing::error!(
                "Could not delete certificate batch {} after failed registration: {}",
                batch.id,
                e
            ),
        }
    }

    /// Send the batch email again, right away
    ///
    /// # Returns
    /// The address the email went to
    pub async fn resend_email(
        &self,
        batch_id: i32,
        options: &DeliveryOptions,
    ) -> Result<String, CertificateError> {
        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or(CertificateError::BatchNotFound)?;

        let to = self.delivery.send_now(&batch, options).await?;
        tracing::info!("Delivery email for certificate batch {} re-sent to {}", batch.id, to);
        Ok(to)
    }

    pub async fn delete_empty_batches(&self) -> Result<u64, CertificateError> {
        let deleted = self.store.delete_empty_batches().await?;
        tracing::info!("Deleted {} empty certificate batches", deleted);
        Ok(deleted)
    }

    /// Validate a single-certificate request into a batch of one
    ///
    /// Omitted quantity, expiry and power cart come from the certificate type.
    pub async fn prepare_single(
        &self,
        creator_id: i32,
        request: CreateCertificateRequest,
    ) -> Result<(NewBatch, NewCertificate), CertificateError> {
        request.validate().map_err(FieldErrors::from)?;
        let mut errors = FieldErrors::new();

        let account_number = match request.account_number.as_deref() {
            None => self.default_membership_number.clone(),
            Some(number) if number == self.default_membership_number => number.to_string(),
            Some(number) => {
                if !self.directory.member_exists(number).await? {
                    errors.add("account_number", "Account number does not exist");
                }
                number.to_string()
            }
        };

        let department = self.directory.find_department(request.department_id).await?;
        if department.is_none() {
            errors.add("department_id", "Invalid department.");
        }

        if request.email_signature != GLOBAL_SIGNATURE_ID {
            let allowed = match self.directory.find_signature(request.email_signature).await? {
                Some(signature) => signature.department_id == Some(request.department_id),
                None => false,
            };
            if !allowed {
                errors.add("email_signature", "Email signature invalid access");
            }
        }

        let certificate_type = self.store.find_type(request.cert_type).await?;
        if certificate_type.is_none() {
            errors.add("cert_type", "Certificate type does not exist");
        }

        let club = self.directory.find_club(request.primary_course).await?;
        if club.is_none() {
            errors.add("primary_course", "Invalid primary course");
        }

        if let Some(secondary) = request.secondary_course {
            if self.directory.find_club(secondary).await?.is_none() {
                errors.add("secondary_course", "Invalid secondary course");
            }
        }

        let (Some(certificate_type), Some(club), Some(_)) = (certificate_type, club, department) else {
            return Err(errors.into());
        };

        let today = Local::now().date_naive();

        let quantity = match request.quantity.or(certificate_type.quantity) {
            Some(quantity) if certificate_type.category.is_dollar_value() => Some(quantity),
            Some(quantity) => Some(quantity.trunc()),
            None => {
                errors.add("quantity", "quantity can not be empty.");
                None
            }
        };

        let expiry_date = match request.expiry_date {
            Some(date) if date < today => {
                errors.add("expiry_date", "expiry_date must be after today.");
                None
            }
            Some(date) => Some(date),
            None => {
                let date = certificate_type.expiry.resolve(today);
                if date.is_none() {
                    errors.add("expiry_date", "expiry_date can not be empty.");
                }
                date
            }
        };

        let power_cart = request.power_cart.or(certificate_type.power_cart);
        if power_cart.is_none() {
            errors.add("power_cart", "power_cart can not be empty.");
        }

        errors.into_result()?;

        let batch = NewBatch {
            creator_id,
            department_id: request.department_id,
            account_number: Some(account_number),
            account_name: None,
            language: Locale::from_code(&request.language),
            recipient_name: request.recipient_name.trim().to_string(),
            recipient_email: request.recipient_email.trim().to_string(),
            email_signature_id: Some(request.email_signature),
        };

        let certificate = NewCertificate {
            certificate_type_id: certificate_type.id,
            type_code: certificate_type.code.clone(),
            club_id: club.id,
            club_code: club.code.clone(),
            club_secondary_id: request.secondary_course,
            quantity: quantity.unwrap_or_default(),
            power_cart: power_cart.unwrap_or_default(),
            expiry_date,
            message: request.message.as_deref().map(sanitize_text).filter(|m| !m.is_empty()),
            note: request.note.as_deref().map(sanitize_text).filter(|n| !n.is_empty()),
        };

        Ok((batch, certificate))
    }
}
