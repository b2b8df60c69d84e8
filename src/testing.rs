// Test fixtures
// In-memory directory and certificate store seeded with one department, its clubs and
// a small catalog, plus builders for the services under test

use async_trait::async_trait;
use chrono::{Local, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::certificates::code::generate_unique_code;
use crate::certificates::{
    Certificate, CertificateAd, CertificateBatch, CertificateCategory, CertificateError,
    CertificateGroup, CertificateGroupTemplate, CertificateStore, CertificateTemplate,
    CertificateType, DepartmentCertificateType, ExpiryPolicy, IssuanceService, NewBatch,
    NewCertificate, PowerCart,
};
use crate::config::{AppConfig, InventoryEnvironment};
use crate::delivery::{
    lease_deadline, DeliveryEmail, DeliveryError, DeliveryService, EmailOutbox, LogMailer, Mailer,
    PendingEmail, MAX_ATTEMPTS,
};
use crate::directory::{Club, Department, Directory, DirectoryError, EmailSignature, User};
use crate::inventory::{InventoryClient, TenderMethod};
use crate::locale::{Locale, LocalizedText};
use crate::registration::BatchRegistrationService;

/// Signature offered to every department
pub const GLOBAL_SIGNATURE: i32 = 1;
pub const DEPARTMENT_SIGNATURE: i32 = 2;
/// Signature of a department the staff user does not administer
pub const OTHER_DEPARTMENT_SIGNATURE: i32 = 3;

pub const MEMBER_NUMBER: &str = "A12345";
pub const RECIPIENT_EMAIL: &str = "recipient@example.com";
pub const DIRECTOR_EMAIL: &str = "director@example.com";
pub const STAFF_EMAIL: &str = "staff@example.com";

/// Group of the fixture department expanding into two default lines
pub const TOURNAMENT_GROUP: i32 = 1;

const STAFF_ID: i32 = 1;
const MEMBER_ID: i32 = 2;

const DEFAULT_TYPE: i32 = 1;
const MERCHANDISE_TYPE: i32 = 2;
const RAIN_CHECK_TYPE: i32 = 3;
const UNMAPPED_TYPE: i32 = 4;

const ONTARIO_CLUB: i32 = 10;
const QUEBEC_CLUB: i32 = 20;

/// Tender methods as the inventory system lists them for a department
pub fn tender_methods() -> Vec<TenderMethod> {
    [
        ("Cash", "g-cash", "Cash"),
        ("Prestige $50 Activation", "g-prestige", "Voucher"),
        ("Sale of US Round Certs", "g-us-round", "Voucher"),
        ("Member Charge", "g-member", "Member"),
        ("Comp Round Certificate Activation", "g-comp", "Voucher"),
        ("Rain Credit Issued", "g-rain", "Voucher"),
        ("Rain Credit Issued HST", "g-rain-hst", "Voucher"),
        ("Rain Credit Issued QST", "g-rain-qst", "Voucher"),
    ]
    .into_iter()
    .map(|(name, guid, procedure)| TenderMethod {
        name: name.to_string(),
        guid: guid.to_string(),
        procedure: procedure.to_string(),
    })
    .collect()
}

/// Seeded stores and the records tests refer to
pub struct Fixture {
    pub directory: Arc<InMemoryDirectory>,
    pub store: Arc<InMemoryCertificateStore>,
    pub outbox: Arc<InMemoryEmailOutbox>,
    pub department: Department,
    pub staff: User,
}

pub fn fixture() -> Fixture {
    let department = Department {
        id: Uuid::from_u128(0x110),
        name: "Corporate Sales".to_string(),
        number: "110".to_string(),
        director_email: Some(DIRECTOR_EMAIL.to_string()),
        hidden: false,
    };
    let archive = Department {
        id: Uuid::from_u128(0x900),
        name: "Archive".to_string(),
        number: "900".to_string(),
        director_email: None,
        hidden: true,
    };
    let member_services = Department {
        id: Uuid::from_u128(0x220),
        name: "Member Services".to_string(),
        number: "220".to_string(),
        director_email: None,
        hidden: false,
    };

    let staff = User {
        id: STAFF_ID,
        email: STAFF_EMAIL.to_string(),
        first_name: "Sam".to_string(),
        last_name: "Staff".to_string(),
        membership_number: None,
        employee_number: Some("E100".to_string()),
        is_staff: true,
        is_superuser: false,
        can_login_off_premise: false,
    };
    let member = User {
        id: MEMBER_ID,
        email: "morgan@example.com".to_string(),
        first_name: "Morgan".to_string(),
        last_name: "Member".to_string(),
        membership_number: Some(MEMBER_NUMBER.to_string()),
        employee_number: None,
        is_staff: false,
        is_superuser: false,
        can_login_off_premise: false,
    };

    let clubs = vec![
        Club {
            id: ONTARIO_CLUB,
            name: "Glen Abbey".to_string(),
            code: "GA".to_string(),
            address: Some("1333 Dorval Dr".to_string()),
            city: Some("Oakville".to_string()),
            state: Some("ON".to_string()),
            logo: None,
            daily_fee_location: true,
        },
        Club {
            id: QUEBEC_CLUB,
            name: "Le Maitre".to_string(),
            code: "LM".to_string(),
            address: None,
            city: Some("Mont-Tremblant".to_string()),
            state: Some("QC".to_string()),
            logo: None,
            daily_fee_location: false,
        },
    ];

    let signature = |id: i32, name: &str, department_id: Option<Uuid>| EmailSignature {
        id,
        name: name.to_string(),
        text: LocalizedText::new(format!("<p>{}</p>", name), ""),
        plaintext: LocalizedText::new(name, ""),
        department_id,
    };
    let signatures = vec![
        signature(GLOBAL_SIGNATURE, "ClubLink", None),
        signature(DEPARTMENT_SIGNATURE, "Corporate Sales", Some(department.id)),
        signature(OTHER_DEPARTMENT_SIGNATURE, "Member Services", Some(member_services.id)),
    ];

    let directory = InMemoryDirectory {
        users: vec![staff.clone(), member],
        admins: vec![(STAFF_ID, department.id), (STAFF_ID, archive.id)],
        department_clubs: vec![(department.id, ONTARIO_CLUB)],
        departments: vec![department.clone(), archive, member_services],
        clubs,
        signatures,
    };

    Fixture {
        directory: Arc::new(directory),
        store: Arc::new(InMemoryCertificateStore::seeded(department.id)),
        outbox: Arc::new(InMemoryEmailOutbox::default()),
        department,
        staff,
    }
}

fn certificate_type(id: i32, name: &str, code: &str, category: CertificateCategory) -> CertificateType {
    CertificateType {
        id,
        name: LocalizedText::new(name, ""),
        code: code.to_string(),
        category,
        template: CertificateTemplate::Default,
        message: LocalizedText::new("Enjoy your round", "Bonne partie"),
        restrictions: LocalizedText::new("Not valid on holidays", ""),
        redemption_location: "Golf Shop".to_string(),
        redemption_details: LocalizedText::new("Call ahead to book", ""),
        quantity: None,
        power_cart: None,
        expiry: ExpiryPolicy::None,
        header: None,
        double_header: None,
        advertisement_id: None,
        club_id: None,
        hide_recipient_name: false,
        players_club_daily_fee_listing: false,
    }
}

impl Fixture {
    fn certificate_type(&self, id: i32) -> &CertificateType {
        self.store
            .types
            .iter()
            .find(|t| t.id == id)
            .expect("fixture type is seeded")
    }

    /// Two rounds with a power cart, valid for a year
    pub fn default_type(&self) -> &CertificateType {
        self.certificate_type(DEFAULT_TYPE)
    }

    pub fn merchandise_type(&self) -> &CertificateType {
        self.certificate_type(MERCHANDISE_TYPE)
    }

    pub fn rain_check_type(&self) -> &CertificateType {
        self.certificate_type(RAIN_CHECK_TYPE)
    }

    /// Type the department is not set up to sell
    pub fn unmapped_type(&self) -> &CertificateType {
        self.certificate_type(UNMAPPED_TYPE)
    }

    fn club(&self, id: i32) -> &Club {
        self.directory
            .clubs
            .iter()
            .find(|c| c.id == id)
            .expect("fixture club is seeded")
    }

    /// The department's only club
    pub fn ontario_club(&self) -> &Club {
        self.club(ONTARIO_CLUB)
    }

    pub fn quebec_club(&self) -> &Club {
        self.club(QUEBEC_CLUB)
    }

    pub fn new_certificate(
        &self,
        certificate_type: &CertificateType,
        club: &Club,
        quantity: Decimal,
    ) -> NewCertificate {
        let expiry_date = if certificate_type.category.is_dollar_value() {
            None
        } else {
            certificate_type.expiry.resolve(Local::now().date_naive())
        };

        NewCertificate {
            certificate_type_id: certificate_type.id,
            type_code: certificate_type.code.clone(),
            club_id: club.id,
            club_code: club.code.clone(),
            club_secondary_id: None,
            quantity,
            power_cart: certificate_type.power_cart.unwrap_or_default(),
            expiry_date,
            message: None,
            note: None,
        }
    }

    pub fn new_batch(&self) -> NewBatch {
        NewBatch {
            creator_id: self.staff.id,
            department_id: self.department.id,
            account_number: Some(MEMBER_NUMBER.to_string()),
            account_name: Some("Morgan Member".to_string()),
            language: Locale::En,
            recipient_name: "Morgan".to_string(),
            recipient_email: RECIPIENT_EMAIL.to_string(),
            email_signature_id: Some(GLOBAL_SIGNATURE),
        }
    }

    pub async fn create_batch(&self, certificates: Vec<NewCertificate>) -> CertificateBatch {
        let (batch, _) = self
            .store
            .create_batch(self.new_batch(), certificates)
            .await
            .expect("in-memory batch creation");
        batch
    }

    pub fn registration(&self, inventory: Arc<dyn InventoryClient>) -> BatchRegistrationService {
        BatchRegistrationService::new(
            self.store.clone(),
            self.directory.clone(),
            inventory,
            InventoryEnvironment::Production,
            "9999".to_string(),
        )
    }

    pub fn delivery(&self, mailer: Arc<dyn Mailer>) -> DeliveryService {
        DeliveryService::new(
            self.directory.clone(),
            self.outbox.clone(),
            mailer,
            Arc::new(AppConfig::for_tests()),
        )
    }

    /// Issuance wired to the fixture stores; delivery emails land in the fixture outbox
    pub fn issuance(&self, inventory: Arc<dyn InventoryClient>) -> IssuanceService {
        IssuanceService::new(
            self.store.clone(),
            self.directory.clone(),
            inventory.clone(),
            self.registration(inventory),
            self.delivery(Arc::new(LogMailer)),
            AppConfig::for_tests().default_membership_number,
        )
    }
}

/// Directory backed by fixed vectors
pub struct InMemoryDirectory {
    users: Vec<User>,
    departments: Vec<Department>,
    /// (user, department) pairs
    admins: Vec<(i32, Uuid)>,
    clubs: Vec<Club>,
    department_clubs: Vec<(Uuid, i32)>,
    signatures: Vec<EmailSignature>,
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_user(&self, id: i32) -> Result<Option<User>, DirectoryError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn departments_for_user(&self, user_id: i32) -> Result<Vec<Department>, DirectoryError> {
        let mut departments: Vec<Department> = self
            .departments
            .iter()
            .filter(|d| !d.hidden)
            .filter(|d| self.admins.contains(&(user_id, d.id)))
            .cloned()
            .collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>, DirectoryError> {
        Ok(self.departments.iter().find(|d| d.id == id).cloned())
    }

    async fn clubs_for_department(&self, department_id: Uuid) -> Result<Vec<Club>, DirectoryError> {
        let mut clubs: Vec<Club> = self
            .clubs
            .iter()
            .filter(|c| self.department_clubs.contains(&(department_id, c.id)))
            .cloned()
            .collect();
        clubs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clubs)
    }

    async fn find_club(&self, id: i32) -> Result<Option<Club>, DirectoryError> {
        Ok(self.clubs.iter().find(|c| c.id == id).cloned())
    }

    async fn member_exists(&self, membership_number: &str) -> Result<bool, DirectoryError> {
        Ok(self
            .users
            .iter()
            .any(|u| u.membership_number.as_deref() == Some(membership_number)))
    }

    async fn search_members(
        &self,
        membership_number: Option<String>,
        name: Option<String>,
    ) -> Result<Vec<User>, DirectoryError> {
        let name = name.map(|name| name.trim().to_lowercase());
        Ok(self
            .users
            .iter()
            .filter(|u| {
                let by_number = membership_number.is_some()
                    && u.membership_number.as_deref() == membership_number.as_deref();
                let by_name = name
                    .as_deref()
                    .is_some_and(|name| u.full_name().to_lowercase().contains(name));
                by_number || by_name
            })
            .cloned()
            .collect())
    }

    async fn signatures_for_department(
        &self,
        department_id: Option<Uuid>,
    ) -> Result<Vec<EmailSignature>, DirectoryError> {
        let own = self
            .signatures
            .iter()
            .filter(|s| s.department_id.is_some() && s.department_id == department_id);
        let global = self.signatures.iter().filter(|s| s.department_id.is_none());
        Ok(own.chain(global).cloned().collect())
    }

    async fn find_signature(&self, id: i32) -> Result<Option<EmailSignature>, DirectoryError> {
        Ok(self.signatures.iter().find(|s| s.id == id).cloned())
    }
}

#[derive(Default)]
struct Issued {
    batches: Vec<CertificateBatch>,
    certificates: Vec<Certificate>,
    next_batch_id: i32,
    next_certificate_id: i32,
}

/// Certificate store with a fixed catalog; issued batches live behind a mutex
pub struct InMemoryCertificateStore {
    types: Vec<CertificateType>,
    department_types: Vec<DepartmentCertificateType>,
    groups: Vec<CertificateGroup>,
    templates: Vec<CertificateGroupTemplate>,
    issued: Mutex<Issued>,
}

impl InMemoryCertificateStore {
    fn seeded(department_id: Uuid) -> Self {
        let mut default = certificate_type(DEFAULT_TYPE, "18 Holes of Golf", "GC", CertificateCategory::Default);
        default.quantity = Some(dec!(2));
        default.power_cart = Some(PowerCart::Included);
        default.expiry = ExpiryPolicy::Dynamic { days: 366 };

        let merchandise = certificate_type(
            MERCHANDISE_TYPE,
            "Merchandise Certificate",
            "MD",
            CertificateCategory::Merchandise,
        );
        let rain_check = certificate_type(RAIN_CHECK_TYPE, "Rain Check", "RC", CertificateCategory::RainCheck);
        let unmapped = certificate_type(UNMAPPED_TYPE, "Unlisted Round", "UR", CertificateCategory::Default);

        let mapping = |id: i32, certificate_type_id: i32, guid: &str| DepartmentCertificateType {
            id,
            department_id,
            certificate_type_id,
            guid: Some(guid.to_string()),
            staging_guid: Some(format!("staging-{}", guid)),
        };

        Self {
            types: vec![default, merchandise, rain_check, unmapped],
            department_types: vec![
                mapping(1, DEFAULT_TYPE, "inv-default"),
                mapping(2, MERCHANDISE_TYPE, "inv-merchandise"),
                mapping(3, RAIN_CHECK_TYPE, "inv-rain-check"),
            ],
            groups: vec![CertificateGroup {
                id: TOURNAMENT_GROUP,
                name: "Tournament".to_string(),
                department_id,
            }],
            templates: vec![CertificateGroupTemplate {
                id: 1,
                group_id: TOURNAMENT_GROUP,
                certificate_type_id: DEFAULT_TYPE,
                count: 2,
                club_id: Some(ONTARIO_CLUB),
                club_secondary_id: None,
                note: Some("Tournament prize".to_string()),
                quantity: None,
                power_cart: None,
                message: None,
                expiry_date: None,
            }],
            issued: Mutex::new(Issued::default()),
        }
    }

    /// Ids of every batch still stored
    pub async fn batch_ids(&self) -> Vec<i32> {
        let issued = self.issued.lock().unwrap();
        issued.batches.iter().map(|b| b.id).collect()
    }
}

#[async_trait]
impl CertificateStore for InMemoryCertificateStore {
    async fn types_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<CertificateType>, CertificateError> {
        let mut types: Vec<CertificateType> = self
            .types
            .iter()
            .filter(|t| {
                self.department_types
                    .iter()
                    .any(|d| d.department_id == department_id && d.certificate_type_id == t.id)
            })
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.en.cmp(&b.name.en));
        Ok(types)
    }

    async fn find_type(&self, id: i32) -> Result<Option<CertificateType>, CertificateError> {
        Ok(self.types.iter().find(|t| t.id == id).cloned())
    }

    async fn department_certificate_type(
        &self,
        department_id: Uuid,
        certificate_type_id: i32,
    ) -> Result<Option<DepartmentCertificateType>, CertificateError> {
        Ok(self
            .department_types
            .iter()
            .find(|d| d.department_id == department_id && d.certificate_type_id == certificate_type_id)
            .cloned())
    }

    async fn players_club_clubs(&self, _certificate_type_id: i32) -> Result<Vec<Club>, CertificateError> {
        Ok(Vec::new())
    }

    async fn find_advertisement(&self, _id: i32) -> Result<Option<CertificateAd>, CertificateError> {
        Ok(None)
    }

    async fn groups_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<CertificateGroup>, CertificateError> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.department_id == department_id)
            .cloned()
            .collect())
    }

    async fn find_group(&self, id: i32) -> Result<Option<CertificateGroup>, CertificateError> {
        Ok(self.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn group_templates(
        &self,
        group_id: i32,
    ) -> Result<Vec<CertificateGroupTemplate>, CertificateError> {
        Ok(self
            .templates
            .iter()
            .filter(|t| t.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create_batch(
        &self,
        batch: NewBatch,
        certificates: Vec<NewCertificate>,
    ) -> Result<(CertificateBatch, Vec<Certificate>), CertificateError> {
        // Draw codes against a snapshot so no lock is held across the lookups
        let mut taken: HashSet<String> = {
            let issued = self.issued.lock().unwrap();
            issued.certificates.iter().map(|c| c.code.clone()).collect()
        };
        let mut rng = StdRng::from_entropy();
        let mut codes = Vec::with_capacity(certificates.len());
        for certificate in &certificates {
            let code =
                generate_unique_code(&mut rng, &certificate.type_code, &certificate.club_code, &mut taken)
                    .await?;
            taken.insert(code.clone());
            codes.push(code);
        }

        let mut issued = self.issued.lock().unwrap();
        let created = Utc::now();

        issued.next_batch_id += 1;
        let created_batch = CertificateBatch {
            id: issued.next_batch_id,
            created,
            creator_id: batch.creator_id,
            department_id: batch.department_id,
            account_number: batch.account_number,
            account_name: batch.account_name,
            language: batch.language.as_str().to_string(),
            recipient_name: batch.recipient_name,
            recipient_email: batch.recipient_email,
            email_signature_id: batch.email_signature_id,
        };

        let mut created_certificates = Vec::with_capacity(certificates.len());
        for (certificate, code) in certificates.into_iter().zip(codes) {
            issued.next_certificate_id += 1;
            created_certificates.push(Certificate {
                id: issued.next_certificate_id,
                created,
                batch_id: Some(created_batch.id),
                certificate_type_id: certificate.certificate_type_id,
                club_id: certificate.club_id,
                club_secondary_id: certificate.club_secondary_id,
                quantity: certificate.quantity,
                tax: Decimal::ZERO,
                power_cart: certificate.power_cart,
                expiry_date: certificate.expiry_date,
                message: certificate.message,
                note: certificate.note,
                code,
            });
        }

        issued.batches.push(created_batch.clone());
        issued.certificates.extend(created_certificates.iter().cloned());
        Ok((created_batch, created_certificates))
    }

    async fn find_batch(&self, id: i32) -> Result<Option<CertificateBatch>, CertificateError> {
        let issued = self.issued.lock().unwrap();
        Ok(issued.batches.iter().find(|b| b.id == id).cloned())
    }

    async fn find_batch_for_download(
        &self,
        id: i32,
        recipient_email: &str,
    ) -> Result<Option<CertificateBatch>, CertificateError> {
        let issued = self.issued.lock().unwrap();
        Ok(issued
            .batches
            .iter()
            .find(|b| b.id == id && b.recipient_email == recipient_email)
            .cloned())
    }

    async fn certificates_for_batch(&self, batch_id: i32) -> Result<Vec<Certificate>, CertificateError> {
        let issued = self.issued.lock().unwrap();
        Ok(issued
            .certificates
            .iter()
            .filter(|c| c.batch_id == Some(batch_id))
            .cloned()
            .collect())
    }

    async fn update_certificate_tax(&self, certificate_id: i32, tax: Decimal) -> Result<(), CertificateError> {
        let mut issued = self.issued.lock().unwrap();
        if let Some(certificate) = issued.certificates.iter_mut().find(|c| c.id == certificate_id) {
            certificate.tax = tax;
        }
        Ok(())
    }

    async fn delete_batch(&self, id: i32) -> Result<bool, CertificateError> {
        let mut issued = self.issued.lock().unwrap();
        let before = issued.batches.len();
        issued.batches.retain(|b| b.id != id);
        issued.certificates.retain(|c| c.batch_id != Some(id));
        Ok(issued.batches.len() < before)
    }

    async fn delete_empty_batches(&self) -> Result<u64, CertificateError> {
        let mut issued = self.issued.lock().unwrap();
        let Issued {
            batches,
            certificates,
            ..
        } = &mut *issued;
        let before = batches.len();
        batches.retain(|b| certificates.iter().any(|c| c.batch_id == Some(b.id)));
        Ok((before - batches.len()) as u64)
    }

    async fn find_certificate(&self, id: i32) -> Result<Option<Certificate>, CertificateError> {
        let issued = self.issued.lock().unwrap();
        Ok(issued.certificates.iter().find(|c| c.id == id).cloned())
    }

    async fn find_certificate_by_code(&self, code: &str) -> Result<Option<Certificate>, CertificateError> {
        let issued = self.issued.lock().unwrap();
        Ok(issued.certificates.iter().find(|c| c.code == code).cloned())
    }
}

/// One row of the in-memory outbox
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub batch_id: Option<i32>,
    pub email: DeliveryEmail,
    pub due_at: chrono::DateTime<Utc>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

/// Email outbox held in a vector
#[derive(Default)]
pub struct InMemoryEmailOutbox {
    entries: Mutex<Vec<OutboxEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryEmailOutbox {
    /// Make every later call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn pending(&self) -> Vec<OutboxEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), DeliveryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DeliveryError::Outbox(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl EmailOutbox for InMemoryEmailOutbox {
    async fn enqueue(
        &self,
        batch_id: Option<i32>,
        email: &DeliveryEmail,
        due_at: chrono::DateTime<Utc>,
    ) -> Result<Uuid, DeliveryError> {
        self.check()?;
        let id = Uuid::new_v4();
        self.entries.lock().unwrap().push(OutboxEntry {
            id,
            batch_id,
            email: email.clone(),
            due_at,
            attempts: 0,
            last_error: None,
        });
        Ok(id)
    }

    async fn claim_due(
        &self,
        now: chrono::DateTime<Utc>,
        lease: Duration,
        limit: i64,
    ) -> Result<Vec<PendingEmail>, DeliveryError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let mut due: Vec<&mut OutboxEntry> = entries
            .iter_mut()
            .filter(|e| e.due_at <= now && e.attempts < MAX_ATTEMPTS)
            .collect();
        due.sort_by_key(|e| e.due_at);

        Ok(due
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|entry| {
                entry.due_at = lease_deadline(now, lease);
                entry.attempts += 1;
                PendingEmail {
                    id: entry.id,
                    batch_id: entry.batch_id,
                    email: entry.email.clone(),
                    attempts: entry.attempts,
                }
            })
            .collect())
    }

    async fn complete(&self, id: Uuid) -> Result<(), DeliveryError> {
        self.check()?;
        self.entries.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }

    async fn retry_at(
        &self,
        id: Uuid,
        due_at: chrono::DateTime<Utc>,
        error: &str,
    ) -> Result<(), DeliveryError> {
        self.check()?;
        if let Some(entry) = self.entries.lock().unwrap().iter_mut().find(|e| e.id == id) {
            entry.due_at = due_at;
            entry.last_error = Some(error.to_string());
        }
        Ok(())
    }
}
