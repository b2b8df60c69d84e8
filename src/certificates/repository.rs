use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::certificates::code::{generate_unique_code, CodeRegistry};
use crate::certificates::{
    Certificate, CertificateAd, CertificateBatch, CertificateError, CertificateGroup,
    CertificateGroupTemplate, CertificateType, CertificateTypeRow, DepartmentCertificateType,
    NewBatch, NewCertificate,
};
use crate::directory::Club;

/// Persistence for the certificate catalog and issued batches
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Types the department may issue, by name
    async fn types_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<CertificateType>, CertificateError>;

    async fn find_type(&self, id: i32) -> Result<Option<CertificateType>, CertificateError>;

    async fn department_certificate_type(
        &self,
        department_id: Uuid,
        certificate_type_id: i32,
    ) -> Result<Option<DepartmentCertificateType>, CertificateError>;

    /// Clubs listed on Player's Club certificates of this type
    async fn players_club_clubs(&self, certificate_type_id: i32) -> Result<Vec<Club>, CertificateError>;

    async fn find_advertisement(&self, id: i32) -> Result<Option<CertificateAd>, CertificateError>;

    async fn groups_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<CertificateGroup>, CertificateError>;

    async fn find_group(&self, id: i32) -> Result<Option<CertificateGroup>, CertificateError>;

    async fn group_templates(
        &self,
        group_id: i32,
    ) -> Result<Vec<CertificateGroupTemplate>, CertificateError>;

    /// Create the batch and its certificates atomically, generating unique codes
    async fn create_batch(
        &self,
        batch: NewBatch,
        certificates: Vec<NewCertificate>,
    ) -> Result<(CertificateBatch, Vec<Certificate>), CertificateError>;

    async fn find_batch(&self, id: i32) -> Result<Option<CertificateBatch>, CertificateError>;

    /// Batch whose id and recipient email both match
    async fn find_batch_for_download(
        &self,
        id: i32,
        recipient_email: &str,
    ) -> Result<Option<CertificateBatch>, CertificateError>;

    /// Certificates of the batch in creation order
    async fn certificates_for_batch(&self, batch_id: i32) -> Result<Vec<Certificate>, CertificateError>;

    async fn update_certificate_tax(&self, certificate_id: i32, tax: Decimal) -> Result<(), CertificateError>;

    /// Delete the batch and, by cascade, its certificates; returns whether it existed
    async fn delete_batch(&self, id: i32) -> Result<bool, CertificateError>;

    /// Delete batches that own no certificates; returns how many were removed
    async fn delete_empty_batches(&self) -> Result<u64, CertificateError>;

    async fn find_certificate(&self, id: i32) -> Result<Option<Certificate>, CertificateError>;

    async fn find_certificate_by_code(&self, code: &str) -> Result<Option<Certificate>, CertificateError>;
}

const TYPE_COLUMNS: &str = "t.id, t.name, t.name_fr, t.code, t.category, t.template, t.message, \
    t.message_fr, t.restrictions, t.restrictions_fr, t.redemption_location, t.redemption_details, \
    t.redemption_details_fr, t.quantity, t.power_cart, t.expiry_date, t.dynamic_expiry_days, \
    t.header, t.double_header, t.advertisement_id, t.club_id, t.hide_recipient_name, \
    t.players_club_daily_fee_listing";

const BATCH_COLUMNS: &str = "id, created, creator_id, department_id, account_number, account_name, \
    language, recipient_name, recipient_email, email_signature_id";

const CERTIFICATE_COLUMNS: &str = "id, created, batch_id, certificate_type_id, club_id, \
    club_secondary_id, quantity, tax, power_cart, expiry_date, message, note, code";

/// Code lookups inside the batch transaction, so codes drawn earlier in the same
/// batch count as taken
struct TransactionCodes<'t> {
    tx: &'t mut Transaction<'static, Postgres>,
}

#[async_trait]
impl CodeRegistry for TransactionCodes<'_> {
    async fn is_taken(&mut self, code: &str) -> Result<bool, CertificateError> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM certificates WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut **self.tx)
            .await?;
        Ok(taken)
    }
}

/// Postgres-backed certificate store
#[derive(Clone)]
pub struct PgCertificateStore {
    pool: PgPool,
}

impl PgCertificateStore {
    /// Create a new PgCertificateStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CertificateStore for PgCertificateStore {
    async fn types_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<CertificateType>, CertificateError> {
        let rows = sqlx::query_as::<_, CertificateTypeRow>(&format!(
            r#"
            SELECT {}
            FROM certificate_types t
            JOIN department_certificate_types d ON d.certificate_type_id = t.id
            WHERE d.department_id = $1
            ORDER BY t.name
            "#,
            TYPE_COLUMNS
        ))
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CertificateType::from).collect())
    }

    async fn find_type(&self, id: i32) -> Result<Option<CertificateType>, CertificateError> {
        let row = sqlx::query_as::<_, CertificateTypeRow>(&format!(
            "SELECT {} FROM certificate_types t WHERE t.id = $1",
            TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CertificateType::from))
    }

    async fn department_certificate_type(
        &self,
        department_id: Uuid,
        certificate_type_id: i32,
    ) -> Result<Option<DepartmentCertificateType>, CertificateError> {
        let dct = sqlx::query_as::<_, DepartmentCertificateType>(
            r#"
            SELECT id, department_id, certificate_type_id, guid, staging_guid
            FROM department_certificate_types
            WHERE department_id = $1 AND certificate_type_id = $2
            "#,
        )
        .bind(department_id)
        .bind(certificate_type_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(dct)
    }

    async fn players_club_clubs(&self, certificate_type_id: i32) -> Result<Vec<Club>, CertificateError> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT c.id, c.name, c.code, c.address, c.city, c.state, c.logo, c.daily_fee_location
            FROM clubs c
            JOIN certificate_type_players_clubs p ON p.club_id = c.id
            WHERE p.certificate_type_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(certificate_type_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clubs)
    }

    async fn find_advertisement(&self, id: i32) -> Result<Option<CertificateAd>, CertificateError> {
        let ad = sqlx::query_as::<_, CertificateAd>(
            "SELECT id, name, image, image_fr FROM certificate_ads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ad)
    }

    async fn groups_for_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<CertificateGroup>, CertificateError> {
        let groups = sqlx::query_as::<_, CertificateGroup>(
            "SELECT id, name, department_id FROM certificate_groups WHERE department_id = $1 ORDER BY name",
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn find_group(&self, id: i32) -> Result<Option<CertificateGroup>, CertificateError> {
        let group = sqlx::query_as::<_, CertificateGroup>(
            "SELECT id, name, department_id FROM certificate_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn group_templates(
        &self,
        group_id: i32,
    ) -> Result<Vec<CertificateGroupTemplate>, CertificateError> {
        let templates = sqlx::query_as::<_, CertificateGroupTemplate>(
            r#"
            SELECT id, group_id, certificate_type_id, count, club_id, club_secondary_id,
                   note, quantity, power_cart, message, expiry_date
            FROM certificate_group_templates
            WHERE group_id = $1
            ORDER BY id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }

    async fn create_batch(
        &self,
        batch: NewBatch,
        certificates: Vec<NewCertificate>,
    ) -> Result<(CertificateBatch, Vec<Certificate>), CertificateError> {
        let mut tx = self.pool.begin().await?;
        let mut rng = StdRng::from_entropy();

        let created_batch = sqlx::query_as::<_, CertificateBatch>(&format!(
            r#"
            INSERT INTO certificate_batches (creator_id, department_id, account_number, account_name,
                language, recipient_name, recipient_email, email_signature_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(batch.creator_id)
        .bind(batch.department_id)
        .bind(&batch.account_number)
        .bind(&batch.account_name)
        .bind(batch.language.as_str())
        .bind(&batch.recipient_name)
        .bind(&batch.recipient_email)
        .bind(batch.email_signature_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut created_certificates = Vec::with_capacity(certificates.len());
        for certificate in certificates {
            // The unique index catches the residual race between generators
            let code = generate_unique_code(
                &mut rng,
                &certificate.type_code,
                &certificate.club_code,
                &mut TransactionCodes { tx: &mut tx },
            )
            .await?;

            let created = sqlx::query_as::<_, Certificate>(&format!(
                r#"
                INSERT INTO certificates (created, batch_id, certificate_type_id, club_id,
                    club_secondary_id, quantity, power_cart, expiry_date, message, note, code)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING {}
                "#,
                CERTIFICATE_COLUMNS
            ))
            .bind(Utc::now())
            .bind(created_batch.id)
            .bind(certificate.certificate_type_id)
            .bind(certificate.club_id)
            .bind(certificate.club_secondary_id)
            .bind(certificate.quantity)
            .bind(certificate.power_cart)
            .bind(certificate.expiry_date)
            .bind(&certificate.message)
            .bind(&certificate.note)
            .bind(&code)
            .fetch_one(&mut *tx)
            .await?;

            created_certificates.push(created);
        }

        tx.commit().await?;

        tracing::info!(
            "Created certificate batch {} with {} certificates",
            created_batch.id,
            created_certificates.len()
        );
        Ok((created_batch, created_certificates))
    }

    async fn find_batch(&self, id: i32) -> Result<Option<CertificateBatch>, CertificateError> {
        let batch = sqlx::query_as::<_, CertificateBatch>(&format!(
            "SELECT {} FROM certificate_batches WHERE id = $1",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    async fn find_batch_for_download(
        &self,
        id: i32,
        recipient_email: &str,
    ) -> Result<Option<CertificateBatch>, CertificateError> {
        let batch = sqlx::query_as::<_, CertificateBatch>(&format!(
            "SELECT {} FROM certificate_batches WHERE id = $1 AND recipient_email = $2",
            BATCH_COLUMNS
        ))
        .bind(id)
        .bind(recipient_email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    async fn certificates_for_batch(&self, batch_id: i32) -> Result<Vec<Certificate>, CertificateError> {
        let certificates = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {} FROM certificates WHERE batch_id = $1 ORDER BY created, id",
            CERTIFICATE_COLUMNS
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(certificates)
    }

    async fn update_certificate_tax(&self, certificate_id: i32, tax: Decimal) -> Result<(), CertificateError> {
        let result = sqlx::query("UPDATE certificates SET tax = $1 WHERE id = $2")
            .bind(tax)
            .bind(certificate_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CertificateError::NotFound);
        }

        Ok(())
    }

    async fn delete_batch(&self, id: i32) -> Result<bool, CertificateError> {
        let result = sqlx::query("DELETE FROM certificate_batches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_empty_batches(&self) -> Result<u64, CertificateError> {
        let result = sqlx::query(
            r#"
            DELETE FROM certificate_batches b
            WHERE NOT EXISTS (SELECT 1 FROM certificates c WHERE c.batch_id = b.id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_certificate(&self, id: i32) -> Result<Option<Certificate>, CertificateError> {
        let certificate = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {} FROM certificates WHERE id = $1",
            CERTIFICATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(certificate)
    }

    async fn find_certificate_by_code(&self, code: &str) -> Result<Option<Certificate>, CertificateError> {
        let certificate = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {} FROM certificates WHERE code = $1",
            CERTIFICATE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(certificate)
    }
}
