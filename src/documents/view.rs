// Everything a layout needs to draw one certificate, resolved ahead of rendering

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::certificates::{CertificateCategory, CertificateTemplate, PowerCart, PriceCalculator};
use crate::directory::Club;
use crate::locale::Locale;

/// Name and address lines of a club
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubBlock {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl From<&Club> for ClubBlock {
    fn from(club: &Club) -> Self {
        Self {
            name: club.name.clone(),
            address: club.address.clone(),
            city: club.city.clone(),
            state: club.state.clone(),
        }
    }
}

impl ClubBlock {
    /// Name, street address and "city, state", one per line
    pub fn details(&self) -> String {
        let mut details = self.name.clone();
        if let Some(address) = self.address.as_deref().filter(|a| !a.trim().is_empty()) {
            details.push_str(",\n");
            details.push_str(address);
        }
        if let (Some(city), Some(state)) = (
            self.city.as_deref().filter(|c| !c.trim().is_empty()),
            self.state.as_deref().filter(|s| !s.trim().is_empty()),
        ) {
            details.push_str(&format!(",\n{}, {}", city, state));
        }
        details
    }
}

/// What the club section of the Default layout lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClubListing {
    /// Player's club names, already suffixed for daily fee locations
    PlayersClub(Vec<String>),
    /// Merchandise is redeemable everywhere
    ClubLinkWide,
    Clubs {
        primary: ClubBlock,
        secondary: Option<ClubBlock>,
    },
}

/// Encoded images; every one of them is optional
#[derive(Debug, Clone, Default)]
pub struct Artwork {
    pub header: Option<Vec<u8>>,
    pub primary_logo: Option<Vec<u8>>,
    pub secondary_logo: Option<Vec<u8>>,
    pub brand_logo: Option<Vec<u8>>,
    pub advertisement: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct CertificateView {
    pub locale: Locale,
    pub code: String,
    pub category: CertificateCategory,
    pub template: CertificateTemplate,
    /// Certificate type name, drawn as the headline
    pub headline: String,
    /// `None` when the type hides the recipient
    pub recipient_name: Option<String>,
    pub message: String,
    /// `None` for left-side custom certificates
    pub restrictions: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub club_name: String,
    pub clubs: ClubListing,
    pub num_players: Option<i64>,
    pub num_nights: Option<i64>,
    pub dollar_amount: Option<Decimal>,
    /// Printed location heading and details
    pub redemption: Option<(String, String)>,
    pub artwork: Artwork,
}

/// Quantity as it reads in catalog text
pub fn display_quantity(category: CertificateCategory, quantity: Decimal, tax: Decimal) -> String {
    match category {
        CertificateCategory::Merchandise => format!("{:.2}", quantity),
        CertificateCategory::RainCheck => format!("{:.2}", PriceCalculator::round(quantity + tax)),
        _ => quantity.trunc().to_i64().unwrap_or_default().to_string(),
    }
}

/// Fill `{quantity}` and `{power_cart}` placeholders of catalog text
pub fn format_message(
    text: &str,
    category: CertificateCategory,
    quantity: Decimal,
    tax: Decimal,
    power_cart: PowerCart,
    locale: Locale,
) -> String {
    text.replace("{quantity}", &display_quantity(category, quantity, tax))
        .replace("{power_cart}", power_cart.label(locale))
}

/// Unit count for categories that count players
pub fn num_players(category: CertificateCategory, quantity: Decimal) -> Option<i64> {
    if category.is_dollar_value() {
        return None;
    }
    quantity.trunc().to_i64().filter(|players| *players != 0)
}

pub fn num_nights(category: CertificateCategory, quantity: Decimal) -> Option<i64> {
    match category {
        CertificateCategory::ResortStay => quantity.trunc().to_i64().filter(|nights| *nights != 0),
        _ => None,
    }
}

/// Face value including tax, for merchandise and rain checks
pub fn dollar_amount(category: CertificateCategory, quantity: Decimal, tax: Decimal) -> Option<Decimal> {
    match category {
        CertificateCategory::Merchandise | CertificateCategory::RainCheck => {
            Some(PriceCalculator::round(quantity + tax)).filter(|amount| !amount.is_zero())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_message_by_category() {
        let text = "Good for {quantity} ({power_cart})";
        assert_eq!(
            format_message(text, CertificateCategory::Default, dec!(2), dec!(0), PowerCart::Included, Locale::En),
            "Good for 2 (Power cart included)"
        );
        assert_eq!(
            format_message(text, CertificateCategory::Merchandise, dec!(50), dec!(0), PowerCart::NotIncluded, Locale::En),
            "Good for 50.00 (Power cart not included)"
        );
        assert_eq!(
            format_message(text, CertificateCategory::RainCheck, dec!(40.00), dec!(5.99), PowerCart::Included, Locale::Fr),
            "Good for 45.99 (Voiturette incluse)"
        );
    }

    #[test]
    fn test_numeric_fields() {
        assert_eq!(num_players(CertificateCategory::Default, dec!(4)), Some(4));
        assert_eq!(num_players(CertificateCategory::Merchandise, dec!(4)), None);
        assert_eq!(num_nights(CertificateCategory::ResortStay, dec!(2)), Some(2));
        assert_eq!(num_nights(CertificateCategory::Default, dec!(2)), None);
        assert_eq!(
            dollar_amount(CertificateCategory::RainCheck, dec!(20), dec!(2.60)),
            Some(dec!(22.60))
        );
        assert_eq!(dollar_amount(CertificateCategory::ResortStay, dec!(20), dec!(0)), None);
    }

    #[test]
    fn test_club_details() {
        let block = ClubBlock {
            name: "Glen Abbey".into(),
            address: Some("1333 Dorval Dr".into()),
            city: Some("Oakville".into()),
            state: Some("ON".into()),
        };
        assert_eq!(block.details(), "Glen Abbey,\n1333 Dorval Dr,\nOakville, ON");

        let bare = ClubBlock {
            name: "Le Maitre".into(),
            address: None,
            city: Some("Mirabel".into()),
            state: None,
        };
        assert_eq!(bare.details(), "Le Maitre");
    }
}
