// Certificate code generation
// Codes are `{type code}{club code}{6 random digits}`; uniqueness is checked against
// the store and a unique index backs up the small race between concurrent generators

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;

use crate::certificates::CertificateError;

/// Attempts before giving up on finding an unused code
pub const MAX_CODE_ATTEMPTS: usize = 25;

/// Length of the numeric barcode payload
pub const BARCODE_LENGTH: usize = 13;

/// Random candidate code for a type and club
pub fn candidate_code<R: Rng>(rng: &mut R, type_code: &str, club_code: &str) -> String {
    let suffix: u32 = rng.gen_range(100_000..=999_999);
    format!("{}{}{}", type_code, club_code, suffix)
}

/// Answers whether a code is already in use
#[async_trait]
pub trait CodeRegistry: Send {
    async fn is_taken(&mut self, code: &str) -> Result<bool, CertificateError>;
}

#[async_trait]
impl CodeRegistry for HashSet<String> {
    async fn is_taken(&mut self, code: &str) -> Result<bool, CertificateError> {
        Ok(self.contains(code))
    }
}

/// Draw candidates until the registry reports one as free
///
/// # Returns
/// The first free code, or `CodeSpaceExhausted` after `MAX_CODE_ATTEMPTS` collisions
pub async fn generate_unique_code<R, C>(
    rng: &mut R,
    type_code: &str,
    club_code: &str,
    registry: &mut C,
) -> Result<String, CertificateError>
where
    R: Rng + Send,
    C: CodeRegistry + ?Sized,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = candidate_code(rng, type_code, club_code);
        if !registry.is_taken(&code).await? {
            return Ok(code);
        }
        tracing::debug!("Certificate code collision on {}, regenerating", code);
    }

    Err(CertificateError::CodeSpaceExhausted(format!(
        "{}{}",
        type_code, club_code
    )))
}

/// Digits of the code, left-padded with zeros to the barcode length
pub fn barcode_value(code: &str) -> String {
    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    format!("{:0>width$}", digits, width = BARCODE_LENGTH)
}

/// Last six characters of the code, used in download file names
pub fn short_code(code: &str) -> &str {
    let start = code
        .char_indices()
        .rev()
        .nth(5)
        .map(|(index, _)| index)
        .unwrap_or(0);
    &code[start..]
}
