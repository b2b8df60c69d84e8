use chrono::Local;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::TypedCache;
use crate::certificates::{
    CertificateBatch, CertificateCategory, CertificateStore, CertificateType, Jurisdiction,
    PriceCalculator,
};
use crate::config::InventoryEnvironment;
use crate::directory::{Club, Directory};
use crate::inventory::{CreateTicketResponse, InventoryClient, TenderMethod};
use crate::registration::{BatchDocument, BatchHeader, BatchItem, RegistrationError, TenderLedger};
use crate::xml;

/// Message shown for any failure other than an explicit rejection
pub const GENERIC_REGISTRATION_ERROR: &str =
    "An unknown error occured during certificate registration.";

pub const PRESTIGE_50_TENDER: &str = "Prestige $50 Activation";
pub const RAIN_CHECK_TENDER: &str = "Rain Credit Issued";
pub const RAIN_CHECK_QST_TENDER: &str = "Rain Credit Issued QST";
pub const RAIN_CHECK_HST_TENDER: &str = "Rain Credit Issued HST";
pub const US_ROUND_CERT_TENDER: &str = "Sale of US Round Certs";
pub const COMP_ROUND_TENDER: &str = "Comp Round Certificate Activation";
pub const MEMBER_PROCEDURE: &str = "Member";

/// Result of registering a batch with the inventory system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Accepted; `notices` carries any messages returned alongside the acceptance
    Success { notices: Vec<String> },
    Failure(Vec<String>),
}

impl RegistrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegistrationOutcome::Success { .. })
    }

    pub fn messages(&self) -> &[String] {
        match self {
            RegistrationOutcome::Success { notices } => notices,
            RegistrationOutcome::Failure(errors) => errors,
        }
    }
}

/// Tender GUIDs a certificate's amounts are allocated to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderSelection {
    pub principal: String,
    /// Separate tax tender, Rain Check only
    pub tax: Option<String>,
}

fn tender_named<'a>(methods: &'a [TenderMethod], name: &str) -> Result<&'a str, RegistrationError> {
    methods
        .iter()
        .find(|method| method.name == name)
        .map(|method| method.guid.as_str())
        .ok_or_else(|| RegistrationError::MissingTender(name.to_string()))
}

/// Pick the tender(s) for a certificate category
pub fn select_tenders(
    category: CertificateCategory,
    jurisdiction: Jurisdiction,
    methods: &[TenderMethod],
) -> Result<TenderSelection, RegistrationError> {
    let principal = match category {
        CertificateCategory::Prestige50 => tender_named(methods, PRESTIGE_50_TENDER)?,
        CertificateCategory::RainCheck => tender_named(methods, RAIN_CHECK_TENDER)?,
        CertificateCategory::UsRoundCert => tender_named(methods, US_ROUND_CERT_TENDER)?,
        category if category.is_dollar_value() => methods
            .iter()
            .find(|method| method.procedure == MEMBER_PROCEDURE)
            .map(|method| method.guid.as_str())
            .ok_or_else(|| {
                RegistrationError::MissingTender(format!("procedure {}", MEMBER_PROCEDURE))
            })?,
        _ => tender_named(methods, COMP_ROUND_TENDER)?,
    };

    let tax = match category {
        CertificateCategory::RainCheck => {
            let name = match jurisdiction {
                Jurisdiction::Quebec => RAIN_CHECK_QST_TENDER,
                Jurisdiction::Other => RAIN_CHECK_HST_TENDER,
            };
            Some(tender_named(methods, name)?.to_string())
        }
        _ => None,
    };

    Ok(TenderSelection {
        principal: principal.to_string(),
        tax,
    })
}

/// Error texts from an `a_sMessage` payload
///
/// An XML payload yields the `ErrorMessage` of every `Error` directly under the root;
/// anything that does not parse is returned as the only message.
pub fn parse_error_message(message: &str) -> Vec<String> {
    match xml::parse(message) {
        Ok(root) => root
            .children_named("Error")
            .filter_map(|error| error.child("ErrorMessage"))
            .map(|error_message| error_message.text.clone())
            .collect(),
        Err(_) => vec![message.to_string()],
    }
}

fn interpret(response: CreateTicketResponse) -> RegistrationOutcome {
    let messages = response
        .message
        .as_deref()
        .map(parse_error_message)
        .unwrap_or_default();

    if response.result {
        RegistrationOutcome::Success { notices: messages }
    } else {
        RegistrationOutcome::Failure(messages)
    }
}

/// Prices a batch, builds its transaction document and submits it
#[derive(Clone)]
pub struct BatchRegistrationService {
    store: Arc<dyn CertificateStore>,
    directory: Arc<dyn Directory>,
    inventory: Arc<dyn InventoryClient>,
    tender_cache: Option<TypedCache<Vec<TenderMethod>>>,
    environment: InventoryEnvironment,
    default_employee_number: String,
    debug: bool,
}

impl BatchRegistrationService {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        directory: Arc<dyn Directory>,
        inventory: Arc<dyn InventoryClient>,
        environment: InventoryEnvironment,
        default_employee_number: String,
    ) -> Self {
        Self {
            store,
            directory,
            inventory,
            tender_cache: None,
            environment,
            default_employee_number,
            debug: false,
        }
    }

    /// Cache tender methods per department in the given region
    pub fn with_tender_cache(mut self, cache: TypedCache<Vec<TenderMethod>>) -> Self {
        self.tender_cache = Some(cache);
        self
    }

    /// Append the underlying error to the generic failure message
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Register a persisted batch
    ///
    /// # Returns
    /// `Success` when the inventory system accepted the ticket. Rejections carry the
    /// parsed error list; every other failure becomes the generic message. Nothing is
    /// retried and nothing is rolled back here.
    pub async fn register(&self, batch: &CertificateBatch) -> RegistrationOutcome {
        match self.try_register(batch).await {
            Ok(outcome) => {
                match &outcome {
                    RegistrationOutcome::Success { .. } => {
                        tracing::info!("Certificate batch {} registered", batch.id)
                    }
                    RegistrationOutcome::Failure(errors) => tracing::error!(
                        "Certificate batch {} rejected by inventory system: {:?}",
                        batch.id,
                        errors
                    ),
                }
                outcome
            }
            Err(e) => {
                tracing::error!("Register certificate batch {} failed: {}", batch.id, e);
                let message = if self.debug {
                    format!("{} {}", GENERIC_REGISTRATION_ERROR, e)
                } else {
                    GENERIC_REGISTRATION_ERROR.to_string()
                };
                RegistrationOutcome::Failure(vec![message])
            }
        }
    }

    async fn try_register(&self, batch: &CertificateBatch) -> Result<RegistrationOutcome, RegistrationError> {
        let document = self.build_document(batch).await?;
        let batch_xml = document.to_xml()?;
        tracing::debug!("Certificate batch {} document: {}", batch.id, batch_xml);

        let response = self.inventory.create_ticket(&batch_xml).await?;
        Ok(interpret(response))
    }

    async fn tender_methods(&self, department_id: Uuid) -> Result<Vec<TenderMethod>, RegistrationError> {
        if let Some(cache) = &self.tender_cache {
            if let Some(methods) = cache.get(department_id).await {
                if !methods.is_empty() {
                    return Ok(methods);
                }
            }
        }

        let methods = self
            .inventory
            .get_tender_methods_for_department(department_id)
            .await?;

        if let Some(cache) = &self.tender_cache {
            cache.set(department_id, &methods).await;
        }

        Ok(methods)
    }

    /// Price every certificate in creation order and assemble the document
    ///
    /// Rain Check tax is written back to each certificate before the document is returned.
    pub async fn build_document(&self, batch: &CertificateBatch) -> Result<BatchDocument, RegistrationError> {
        let tender_methods = self.tender_methods(batch.department_id).await?;

        let department = self
            .directory
            .find_department(batch.department_id)
            .await?
            .ok_or(RegistrationError::DepartmentNotFound(batch.department_id))?;

        let employee_number = self
            .directory
            .find_user(batch.creator_id)
            .await?
            .and_then(|creator| creator.employee_number)
            .filter(|number| !number.trim().is_empty())
            .unwrap_or_else(|| self.default_employee_number.clone());

        let member_number = batch.account_number.clone().unwrap_or_default();

        let mut types: HashMap<i32, CertificateType> = HashMap::new();
        let mut clubs: HashMap<i32, Club> = HashMap::new();
        let mut inventory_items: HashMap<i32, String> = HashMap::new();

        let mut items = Vec::new();
        let mut tenders = TenderLedger::new();

        for certificate in self.store.certificates_for_batch(batch.id).await? {
            let type_id = certificate.certificate_type_id;
            if !types.contains_key(&type_id) {
                let certificate_type = self
                    .store
                    .find_type(type_id)
                    .await?
                    .ok_or(RegistrationError::TypeNotFound(type_id))?;
                types.insert(type_id, certificate_type);
            }
            if !clubs.contains_key(&certificate.club_id) {
                let club = self
                    .directory
                    .find_club(certificate.club_id)
                    .await?
                    .ok_or(RegistrationError::ClubNotFound(certificate.club_id))?;
                clubs.insert(certificate.club_id, club);
            }
            if !inventory_items.contains_key(&type_id) {
                let guid = self
                    .store
                    .department_certificate_type(batch.department_id, type_id)
                    .await?
                    .and_then(|dct| dct.guid_for(self.environment).map(str::to_string))
                    .ok_or(RegistrationError::MissingInventoryItem {
                        certificate_type_id: type_id,
                    })?;
                inventory_items.insert(type_id, guid);
            }

            let category = types[&type_id].category;
            let jurisdiction = Jurisdiction::from_state(clubs[&certificate.club_id].state.as_deref());
            let priced = PriceCalculator::price(category, certificate.quantity, jurisdiction);

            if category == CertificateCategory::RainCheck {
                self.store
                    .update_certificate_tax(certificate.id, priced.tax)
                    .await?;
            }

            items.push(BatchItem {
                inventory_item_id: inventory_items[&type_id].clone(),
                price: PriceCalculator::round(priced.price),
                purchaser: member_number.clone(),
                receiver: batch.recipient_name.clone(),
                certificate_number: certificate.code.clone(),
            });

            let selection = select_tenders(category, jurisdiction, &tender_methods)?;
            tenders.add(&selection.principal, priced.tender_amount);
            if let Some(tax_tender) = &selection.tax {
                tenders.add(tax_tender, priced.tax);
            }
        }

        Ok(BatchDocument {
            header: BatchHeader {
                batch_id: batch.id,
                batch_date: batch.created.with_timezone(&Local).date_naive(),
                department_number: department.number,
                employee_number,
                member_number,
            },
            items,
            tenders,
        })
    }
}
