use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::certificates::CertificateCategory;

/// Tax jurisdiction of the club a certificate is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Jurisdiction {
    /// QST + GST
    Quebec,
    /// HST everywhere else
    Other,
}

impl Jurisdiction {
    /// Resolve from a club's province/state code
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some(state) if state.trim().eq_ignore_ascii_case("QC") => Jurisdiction::Quebec,
            _ => Jurisdiction::Other,
        }
    }

    pub fn tax_rate(&self) -> Decimal {
        match self {
            Jurisdiction::Quebec => Decimal::new(14975, 5),
            Jurisdiction::Other => Decimal::new(13, 2),
        }
    }
}

/// Amounts for one certificate line of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedCertificate {
    pub price: Decimal,
    pub tax: Decimal,
    /// Portion of the price allocated to the principal tender
    pub tender_amount: Decimal,
}

/// Pricing for certificate transactions
pub struct PriceCalculator;

impl PriceCalculator {
    /// Price a certificate
    ///
    /// # Arguments
    /// * `category` - Category of the certificate type
    /// * `quantity` - Stored quantity (dollars or unit count depending on the category)
    /// * `jurisdiction` - Tax jurisdiction of the certificate's club
    ///
    /// # Returns
    /// Price, tax and principal tender amount. Tax is derived from `quantity` alone,
    /// so pricing the same certificate twice gives the same result.
    pub fn price(
        category: CertificateCategory,
        quantity: Decimal,
        jurisdiction: Jurisdiction,
    ) -> PricedCertificate {
        if !category.is_dollar_value() {
            let price = Decimal::new(1, 2) * quantity.trunc();
            return PricedCertificate {
                price,
                tax: Decimal::ZERO,
                tender_amount: price,
            };
        }

        if category == CertificateCategory::RainCheck {
            let tax = Self::calculate_tax(quantity, jurisdiction);
            let price = quantity + tax;
            return PricedCertificate {
                price,
                tax,
                tender_amount: price - tax,
            };
        }

        PricedCertificate {
            price: quantity,
            tax: Decimal::ZERO,
            tender_amount: quantity,
        }
    }

    /// Tax on an amount, rounded to cents
    pub fn calculate_tax(amount: Decimal, jurisdiction: Jurisdiction) -> Decimal {
        (amount * jurisdiction.tax_rate()).round_dp(2)
    }

    /// Amount as sent to the inventory system
    pub fn round(amount: Decimal) -> Decimal {
        amount.round_dp(2)
    }
}
