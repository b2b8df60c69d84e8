use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::locale::LocalizedText;

/// A person known to the directory; staff issue certificates, members receive them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub membership_number: Option<String>,
    pub employee_number: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub can_login_off_premise: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    /// Department number sent to the inventory system
    pub number: String,
    pub director_email: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Club {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Province or state code, drives the tax jurisdiction
    pub state: Option<String>,
    pub logo: Option<String>,
    pub daily_fee_location: bool,
}

/// Signature appended to delivery emails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmailSignature {
    pub id: i32,
    pub name: String,
    pub text: LocalizedText,
    pub plaintext: LocalizedText,
    /// `None` for signatures available to every department
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct EmailSignatureRow {
    pub id: i32,
    pub name: String,
    pub text: String,
    pub text_fr: String,
    pub plaintext: String,
    pub plaintext_fr: String,
    pub department_id: Option<Uuid>,
}

impl From<EmailSignatureRow> for EmailSignature {
    fn from(row: EmailSignatureRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            text: LocalizedText::new(row.text, row.text_fr),
            plaintext: LocalizedText::new(row.plaintext, row.plaintext_fr),
            department_id: row.department_id,
        }
    }
}
