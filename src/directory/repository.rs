use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::TypedCache;
use crate::directory::{Club, Department, DirectoryError, EmailSignature, EmailSignatureRow, User};

/// Read-only lookup of the people, departments and clubs the workflow refers to
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user(&self, id: i32) -> Result<Option<User>, DirectoryError>;

    /// Visible departments the user administers, by name
    async fn departments_for_user(&self, user_id: i32) -> Result<Vec<Department>, DirectoryError>;

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>, DirectoryError>;

    async fn clubs_for_department(&self, department_id: Uuid) -> Result<Vec<Club>, DirectoryError>;

    async fn find_club(&self, id: i32) -> Result<Option<Club>, DirectoryError>;

    /// Whether a member with this membership number exists
    async fn member_exists(&self, membership_number: &str) -> Result<bool, DirectoryError>;

    /// Members matching the membership number and/or a case-insensitive full-name fragment
    async fn search_members(
        &self,
        membership_number: Option<String>,
        name: Option<String>,
    ) -> Result<Vec<User>, DirectoryError>;

    /// Signatures offered for the department: its own first, then the global ones
    async fn signatures_for_department(
        &self,
        department_id: Option<Uuid>,
    ) -> Result<Vec<EmailSignature>, DirectoryError>;

    async fn find_signature(&self, id: i32) -> Result<Option<EmailSignature>, DirectoryError>;
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, membership_number, employee_number, \
                            is_staff, is_superuser, can_login_off_premise";

/// Postgres-backed directory
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
    linked_accounts: Option<TypedCache<bool>>,
}

impl PgDirectory {
    /// Create a new PgDirectory
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            linked_accounts: None,
        }
    }

    /// Cache membership-number checks in the linked-account region
    pub fn with_cache(mut self, linked_accounts: TypedCache<bool>) -> Self {
        self.linked_accounts = Some(linked_accounts);
        self
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_user(&self, id: i32) -> Result<Option<User>, DirectoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn departments_for_user(&self, user_id: i32) -> Result<Vec<Department>, DirectoryError> {
        let departments = sqlx::query_as::<_, Department>(
            r#"
            SELECT d.id, d.name, d.number, d.director_email, d.hidden
            FROM departments d
            JOIN department_admins a ON a.department_id = d.id
            WHERE a.user_id = $1 AND d.hidden = FALSE
            ORDER BY d.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    async fn find_department(&self, id: Uuid) -> Result<Option<Department>, DirectoryError> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, number, director_email, hidden FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(department)
    }

    async fn clubs_for_department(&self, department_id: Uuid) -> Result<Vec<Club>, DirectoryError> {
        let clubs = sqlx::query_as::<_, Club>(
            r#"
            SELECT c.id, c.name, c.code, c.address, c.city, c.state, c.logo, c.daily_fee_location
            FROM clubs c
            JOIN department_clubs dc ON dc.club_id = c.id
            WHERE dc.department_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clubs)
    }

    async fn find_club(&self, id: i32) -> Result<Option<Club>, DirectoryError> {
        let club = sqlx::query_as::<_, Club>(
            r#"
            SELECT id, name, code, address, city, state, logo, daily_fee_location
            FROM clubs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(club)
    }

    async fn member_exists(&self, membership_number: &str) -> Result<bool, DirectoryError> {
        if let Some(cache) = &self.linked_accounts {
            if let Some(exists) = cache.get(membership_number).await {
                return Ok(exists);
            }
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE membership_number = $1)",
        )
        .bind(membership_number)
        .fetch_one(&self.pool)
        .await?;

        if let Some(cache) = &self.linked_accounts {
            cache.set(membership_number, &exists).await;
        }

        Ok(exists)
    }

    async fn search_members(
        &self,
        membership_number: Option<String>,
        name: Option<String>,
    ) -> Result<Vec<User>, DirectoryError> {
        let name_pattern = name.map(|name| format!("%{}%", name.trim().to_lowercase()));

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE ($1::TEXT IS NOT NULL AND membership_number = $1)
               OR ($2::TEXT IS NOT NULL AND LOWER(first_name || ' ' || last_name) LIKE $2)
            ORDER BY last_name, first_name
            LIMIT 50
            "#,
            USER_COLUMNS
        ))
        .bind(membership_number)
        .bind(name_pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn signatures_for_department(
        &self,
        department_id: Option<Uuid>,
    ) -> Result<Vec<EmailSignature>, DirectoryError> {
        let rows = sqlx::query_as::<_, EmailSignatureRow>(
            r#"
            SELECT id, name, text, text_fr, plaintext, plaintext_fr, department_id
            FROM email_signatures
            WHERE department_id IS NULL OR department_id = $1
            ORDER BY department_id IS NULL, name
            "#,
        )
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EmailSignature::from).collect())
    }

    async fn find_signature(&self, id: i32) -> Result<Option<EmailSignature>, DirectoryError> {
        let row = sqlx::query_as::<_, EmailSignatureRow>(
            r#"
            SELECT id, name, text, text_fr, plaintext, plaintext_fr, department_id
            FROM email_signatures
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailSignature::from))
    }
}
