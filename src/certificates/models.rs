use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::InventoryEnvironment;
use crate::locale::{Locale, LocalizedText};

/// Certificate category; decides whether `quantity` is money or a unit count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum CertificateCategory {
    Default = 0,
    PlayersClub = 1,
    Merchandise = 2,
    ResortStay = 3,
    RainCheck = 4,
    Prestige50 = 5,
    LeftSideCustom = 6,
    UsRoundCert = 7,
}

impl CertificateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateCategory::Default => "default",
            CertificateCategory::PlayersClub => "players_club",
            CertificateCategory::Merchandise => "merchandise",
            CertificateCategory::ResortStay => "resort_stay",
            CertificateCategory::RainCheck => "rain_check",
            CertificateCategory::Prestige50 => "prestige_50",
            CertificateCategory::LeftSideCustom => "left_side_custom",
            CertificateCategory::UsRoundCert => "us_round_cert",
        }
    }

    /// Categories whose quantity is a currency amount
    pub fn is_dollar_value(&self) -> bool {
        matches!(
            self,
            CertificateCategory::Merchandise
                | CertificateCategory::ResortStay
                | CertificateCategory::RainCheck
                | CertificateCategory::Prestige50
                | CertificateCategory::UsRoundCert
        )
    }
}

impl Default for CertificateCategory {
    fn default() -> Self {
        CertificateCategory::Default
    }
}

impl std::fmt::Display for CertificateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Printed layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum CertificateTemplate {
    Default = 0,
    Ag30 = 1,
    Prestige50 = 2,
    GolfForLife = 3,
}

impl Default for CertificateTemplate {
    fn default() -> Self {
        CertificateTemplate::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum PowerCart {
    NotIncluded = 0,
    MandatoryNotIncluded = 1,
    Included = 2,
}

impl PowerCart {
    /// Numeric form value used by the wizard forms
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn from_code(code: &str) -> Result<Self, String> {
        match code.trim() {
            "0" => Ok(PowerCart::NotIncluded),
            "1" => Ok(PowerCart::MandatoryNotIncluded),
            "2" => Ok(PowerCart::Included),
            _ => Err(format!("Invalid power cart option: {}", code)),
        }
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (PowerCart::NotIncluded, Locale::En) => "Power cart not included",
            (PowerCart::MandatoryNotIncluded, Locale::En) => "Mandatory power cart not included",
            (PowerCart::Included, Locale::En) => "Power cart included",
            (PowerCart::NotIncluded, Locale::Fr) => "Voiturette non incluse",
            (PowerCart::MandatoryNotIncluded, Locale::Fr) => "Voiturette obligatoire non incluse",
            (PowerCart::Included, Locale::Fr) => "Voiturette incluse",
        }
    }
}

impl Default for PowerCart {
    fn default() -> Self {
        PowerCart::NotIncluded
    }
}

/// How a type fills in the expiry date of a new certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpiryPolicy {
    None,
    Fixed { date: NaiveDate },
    Dynamic { days: i32 },
}

impl ExpiryPolicy {
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            ExpiryPolicy::None => None,
            ExpiryPolicy::Fixed { date } => Some(*date),
            ExpiryPolicy::Dynamic { days } => Some(today + Duration::days(i64::from(*days))),
        }
    }
}

/// Catalog entry for a kind of certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CertificateType {
    pub id: i32,
    pub name: LocalizedText,
    /// Leading characters of every certificate code of this type
    pub code: String,
    pub category: CertificateCategory,
    pub template: CertificateTemplate,
    pub message: LocalizedText,
    pub restrictions: LocalizedText,
    pub redemption_location: String,
    pub redemption_details: LocalizedText,
    pub quantity: Option<Decimal>,
    pub power_cart: Option<PowerCart>,
    pub expiry: ExpiryPolicy,
    pub header: Option<String>,
    pub double_header: Option<String>,
    pub advertisement_id: Option<i32>,
    pub club_id: Option<i32>,
    pub hide_recipient_name: bool,
    pub players_club_daily_fee_listing: bool,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CertificateTypeRow {
    pub id: i32,
    pub name: String,
    pub name_fr: String,
    pub code: String,
    pub category: CertificateCategory,
    pub template: CertificateTemplate,
    pub message: String,
    pub message_fr: String,
    pub restrictions: String,
    pub restrictions_fr: String,
    pub redemption_location: String,
    pub redemption_details: String,
    pub redemption_details_fr: String,
    pub quantity: Option<Decimal>,
    pub power_cart: Option<PowerCart>,
    pub expiry_date: Option<NaiveDate>,
    pub dynamic_expiry_days: Option<i32>,
    pub header: Option<String>,
    pub double_header: Option<String>,
    pub advertisement_id: Option<i32>,
    pub club_id: Option<i32>,
    pub hide_recipient_name: bool,
    pub players_club_daily_fee_listing: bool,
}

impl From<CertificateTypeRow> for CertificateType {
    fn from(row: CertificateTypeRow) -> Self {
        let expiry = match (row.expiry_date, row.dynamic_expiry_days) {
            (Some(date), _) => ExpiryPolicy::Fixed { date },
            (None, Some(days)) => ExpiryPolicy::Dynamic { days },
            (None, None) => ExpiryPolicy::None,
        };

        Self {
            id: row.id,
            name: LocalizedText::new(row.name, row.name_fr),
            code: row.code,
            category: row.category,
            template: row.template,
            message: LocalizedText::new(row.message, row.message_fr),
            restrictions: LocalizedText::new(row.restrictions, row.restrictions_fr),
            redemption_location: row.redemption_location,
            redemption_details: LocalizedText::new(row.redemption_details, row.redemption_details_fr),
            quantity: row.quantity,
            power_cart: row.power_cart,
            expiry,
            header: row.header,
            double_header: row.double_header,
            advertisement_id: row.advertisement_id,
            club_id: row.club_id,
            hide_recipient_name: row.hide_recipient_name,
            players_club_daily_fee_listing: row.players_club_daily_fee_listing,
        }
    }
}

/// Inventory item GUIDs for a type as sold by one department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DepartmentCertificateType {
    pub id: i32,
    pub department_id: Uuid,
    pub certificate_type_id: i32,
    pub guid: Option<String>,
    pub staging_guid: Option<String>,
}

impl DepartmentCertificateType {
    pub fn guid_for(&self, environment: InventoryEnvironment) -> Option<&str> {
        let guid = match environment {
            InventoryEnvironment::Production => self.guid.as_deref(),
            InventoryEnvironment::Staging => self.staging_guid.as_deref(),
        };
        guid.filter(|guid| !guid.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CertificateBatch {
    pub id: i32,
    pub created: DateTime<Utc>,
    pub creator_id: i32,
    pub department_id: Uuid,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub language: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub email_signature_id: Option<i32>,
}

impl CertificateBatch {
    pub fn locale(&self) -> Locale {
        Locale::from_code(&self.language)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Certificate {
    pub id: i32,
    pub created: DateTime<Utc>,
    pub batch_id: Option<i32>,
    pub certificate_type_id: i32,
    pub club_id: i32,
    pub club_secondary_id: Option<i32>,
    pub quantity: Decimal,
    pub tax: Decimal,
    pub power_cart: PowerCart,
    pub expiry_date: Option<NaiveDate>,
    pub message: Option<String>,
    pub note: Option<String>,
    pub code: String,
}

/// Batch header as collected by the wizard or the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBatch {
    pub creator_id: i32,
    pub department_id: Uuid,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub language: Locale,
    pub recipient_name: String,
    pub recipient_email: String,
    pub email_signature_id: Option<i32>,
}

/// Certificate to insert; the type and club codes seed the generated code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCertificate {
    pub certificate_type_id: i32,
    pub type_code: String,
    pub club_id: i32,
    pub club_code: String,
    pub club_secondary_id: Option<i32>,
    pub quantity: Decimal,
    pub power_cart: PowerCart,
    pub expiry_date: Option<NaiveDate>,
    pub message: Option<String>,
    pub note: Option<String>,
}

/// Named set of pre-filled line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CertificateGroup {
    pub id: i32,
    pub name: String,
    pub department_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CertificateGroupTemplate {
    pub id: i32,
    pub group_id: i32,
    pub certificate_type_id: i32,
    /// Number of line items this row expands into
    pub count: i32,
    pub club_id: Option<i32>,
    pub club_secondary_id: Option<i32>,
    pub note: Option<String>,
    pub quantity: Option<Decimal>,
    pub power_cart: Option<PowerCart>,
    pub message: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CertificateAd {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub image_fr: Option<String>,
}

impl CertificateAd {
    pub fn image_for(&self, locale: Locale) -> &str {
        match locale {
            Locale::Fr => self
                .image_fr
                .as_deref()
                .filter(|image| !image.is_empty())
                .unwrap_or(&self.image),
            Locale::En => &self.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_value_categories() {
        let dollar: Vec<_> = [
            CertificateCategory::Default,
            CertificateCategory::PlayersClub,
            CertificateCategory::Merchandise,
            CertificateCategory::ResortStay,
            CertificateCategory::RainCheck,
            CertificateCategory::Prestige50,
            CertificateCategory::LeftSideCustom,
            CertificateCategory::UsRoundCert,
        ]
        .into_iter()
        .filter(CertificateCategory::is_dollar_value)
        .collect();

        assert_eq!(
            dollar,
            vec![
                CertificateCategory::Merchandise,
                CertificateCategory::ResortStay,
                CertificateCategory::RainCheck,
                CertificateCategory::Prestige50,
                CertificateCategory::UsRoundCert,
            ]
        );
    }

    #[test]
    fn test_power_cart_codes() {
        assert_eq!(PowerCart::from_code("2").unwrap(), PowerCart::Included);
        assert_eq!(PowerCart::MandatoryNotIncluded.code(), 1);
        assert!(PowerCart::from_code("3").is_err());
        assert_eq!(PowerCart::Included.label(Locale::Fr), "Voiturette incluse");
    }

    #[test]
    fn test_expiry_policy_resolution() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(ExpiryPolicy::None.resolve(today), None);
        assert_eq!(
            ExpiryPolicy::Dynamic { days: 366 }.resolve(today),
            NaiveDate::from_ymd_opt(2025, 3, 2)
        );
        let fixed = NaiveDate::from_ymd_opt(2024, 10, 31).unwrap();
        assert_eq!(ExpiryPolicy::Fixed { date: fixed }.resolve(today), Some(fixed));
    }

    #[test]
    fn test_guid_for_environment() {
        let dct = DepartmentCertificateType {
            id: 1,
            department_id: Uuid::nil(),
            certificate_type_id: 1,
            guid: Some("prod-guid".into()),
            staging_guid: Some("  ".into()),
        };
        assert_eq!(dct.guid_for(InventoryEnvironment::Production), Some("prod-guid"));
        assert_eq!(dct.guid_for(InventoryEnvironment::Staging), None);
    }

    #[test]
    fn test_ad_image_falls_back_to_english() {
        let ad = CertificateAd {
            id: 1,
            name: "Spring".into(),
            image: "ads/spring.jpg".into(),
            image_fr: None,
        };
        assert_eq!(ad.image_for(Locale::Fr), "ads/spring.jpg");
    }
}
