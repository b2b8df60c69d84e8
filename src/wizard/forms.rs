// Wizard forms
// Validation of the recipient (step 1) and of each certificate line (step 2)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::certificates::{CertificateCategory, CertificateType, NewBatch, NewCertificate, PowerCart};
use crate::directory::{Club, Department, Directory, EmailSignature, User};
use crate::locale::Locale;
use crate::validation::{sanitize_text, validate_language, FieldErrors, REQUIRED};
use crate::wizard::{LineItem, WizardError};

pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub const INVALID_ACCOUNT_NUMBER: &str = "Invalid account number.";
pub const INVALID_DEPARTMENT: &str = "Invalid department.";
pub const INVALID_SIGNATURE: &str = "Invalid email signature.";
pub const INVALID_TYPE: &str = "Invalid gift certificate type.";
pub const INVALID_COURSE: &str = "Invalid course.";

/// Step-1 data as entered
///
/// The derived rules cover the fields that need no lookup; account, department and
/// signature choices are checked against the directory in `validate_recipient`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct RecipientInput {
    #[validate(custom = "validate_language_choice")]
    pub language: String,
    pub account_number: String,
    pub account_name: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub recipient_name: String,
    #[validate(custom = "validate_recipient_email")]
    pub recipient_email: String,
    #[validate(required(message = "This field is required."))]
    pub department: Option<Uuid>,
    #[validate(required(message = "This field is required."))]
    pub email_signature: Option<i32>,
}

impl RecipientInput {
    fn trimmed(&self) -> Self {
        Self {
            language: self.language.trim().to_string(),
            account_number: self.account_number.trim().to_string(),
            recipient_name: self.recipient_name.trim().to_string(),
            recipient_email: self.recipient_email.trim().to_string(),
            ..self.clone()
        }
    }
}

fn field_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn validate_language_choice(language: &str) -> Result<(), ValidationError> {
    if language.is_empty() {
        return Err(field_error("required", REQUIRED.to_string()));
    }
    validate_language(language).map_err(|_| {
        field_error(
            "invalid_language",
            format!("Select a valid choice. {} is not one of the available choices.", language),
        )
    })
}

fn validate_recipient_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        Err(field_error("required", REQUIRED.to_string()))
    } else if !validator::validate_email(email) {
        Err(field_error("email", "Enter a valid email address.".to_string()))
    } else {
        Ok(())
    }
}

/// Departments and signatures the recipient form offers
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipientChoices {
    pub departments: Vec<Department>,
    /// Department the signature list was computed for
    pub department: Option<Uuid>,
    /// The department's own signatures first, then the global ones
    pub signatures: Vec<EmailSignature>,
}

/// Offer the user's visible departments and the signatures of `department`
///
/// Unknown or missing departments fall back to the first one offered.
pub async fn recipient_choices(
    directory: &dyn Directory,
    user_id: i32,
    department: Option<Uuid>,
) -> Result<RecipientChoices, WizardError> {
    let departments: Vec<Department> = directory
        .departments_for_user(user_id)
        .await?
        .into_iter()
        .filter(|d| !d.hidden)
        .collect();

    let selected = department
        .and_then(|id| departments.iter().find(|d| d.id == id))
        .or_else(|| departments.first())
        .map(|d| d.id);

    let all = directory.signatures_for_department(selected).await?;
    let (mut signatures, global): (Vec<_>, Vec<_>) =
        all.into_iter().partition(|s| s.department_id.is_some());
    signatures.extend(global);

    Ok(RecipientChoices {
        departments,
        department: selected,
        signatures,
    })
}

/// A recipient that passed validation
#[derive(Debug, Clone)]
pub struct ValidRecipient {
    pub batch: NewBatch,
    pub department: Department,
    /// Non-blocking messages, such as the default account being used
    pub warnings: Vec<String>,
}

/// Validate step 1 for `user`
///
/// # Returns
/// `WizardError::Fields` when any field is invalid; lookups that fail surface as errors
pub async fn validate_recipient(
    directory: &dyn Directory,
    user: &User,
    input: &RecipientInput,
    default_membership_number: &str,
) -> Result<ValidRecipient, WizardError> {
    let input = &input.trimmed();
    let mut errors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    };
    let mut warnings = Vec::new();

    let account_number = input.account_number.as_str();
    let account_number = if account_number.is_empty() {
        warnings.push(format!(
            "Default account number ({}) was selected.",
            default_membership_number
        ));
        default_membership_number.to_string()
    } else {
        if account_number != default_membership_number
            && !directory.member_exists(account_number).await?
        {
            errors.add("account_number", INVALID_ACCOUNT_NUMBER);
        }
        account_number.to_string()
    };

    let choices = recipient_choices(directory, user.id, input.department).await?;
    let department = match input.department {
        None => None,
        Some(id) => {
            let found = choices.departments.iter().find(|d| d.id == id).cloned();
            if found.is_none() {
                errors.add("department", INVALID_DEPARTMENT);
            }
            found
        }
    };

    if let Some(id) = input.email_signature {
        if department.is_some() && !choices.signatures.iter().any(|s| s.id == id) {
            errors.add("email_signature", INVALID_SIGNATURE);
        }
    }

    errors.into_result()?;
    let Some(department) = department else {
        return Err(WizardError::Fields(FieldErrors::new()));
    };

    let account_name = sanitize_text(&input.account_name);
    let batch = NewBatch {
        creator_id: user.id,
        department_id: department.id,
        account_number: Some(account_number),
        account_name: (!account_name.is_empty()).then_some(account_name),
        language: Locale::from_code(&input.language),
        recipient_name: input.recipient_name.clone(),
        recipient_email: input.recipient_email.clone(),
        email_signature_id: input.email_signature,
    };

    Ok(ValidRecipient {
        batch,
        department,
        warnings,
    })
}

/// Member lookup on step 1
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LookupRequest {
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    /// Pick this user directly instead of searching
    pub select_user: Option<i32>,
}

/// Search members, prefilling `input` when exactly one matches
///
/// # Returns
/// The matching members; `input` is only changed on a single match
pub async fn lookup_member(
    directory: &dyn Directory,
    request: &LookupRequest,
    input: &mut RecipientInput,
) -> Result<Vec<User>, WizardError> {
    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let users = match request.select_user {
        Some(id) => directory.find_user(id).await?.into_iter().collect(),
        None => {
            let number = non_blank(&request.account_number);
            let name = non_blank(&request.account_name);
            if number.is_none() && name.is_none() {
                Vec::new()
            } else {
                directory.search_members(number, name).await?
            }
        }
    };

    if let [user] = users.as_slice() {
        input.account_number = user.membership_number.clone().unwrap_or_default();
        input.account_name = user.full_name();
        input.recipient_email = user.email.clone();
        input.recipient_name = user.first_name.clone();
    }

    Ok(users)
}

/// Types and clubs a department's lines may use
#[derive(Debug, Clone, Default)]
pub struct LineContext {
    pub types: Vec<CertificateType>,
    pub clubs: Vec<Club>,
}

impl LineContext {
    fn certificate_type(&self, raw: Option<&str>) -> Option<&CertificateType> {
        let id: i32 = raw?.trim().parse().ok()?;
        self.types.iter().find(|t| t.id == id)
    }

    fn club(&self, raw: &str) -> Option<&Club> {
        let id: i32 = raw.trim().parse().ok()?;
        self.clubs.iter().find(|c| c.id == id)
    }
}

/// Pre-filled values of a line for a chosen type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LineDefaults {
    pub quantity: Option<String>,
    pub power_cart: Option<i32>,
    pub expiry_date: Option<String>,
    pub club: Option<i32>,
}

pub fn line_defaults(certificate_type: &CertificateType, clubs: &[Club], today: NaiveDate) -> LineDefaults {
    let quantity = certificate_type.quantity.map(|quantity| {
        if certificate_type.category.is_dollar_value() {
            quantity.to_string()
        } else {
            quantity.trunc().to_string()
        }
    });

    let club = match clubs {
        [only] => Some(only.id),
        _ => certificate_type.club_id,
    };

    LineDefaults {
        quantity,
        power_cart: Some(certificate_type.power_cart.unwrap_or_default().code()),
        expiry_date: certificate_type
            .expiry
            .resolve(today)
            .map(|date| date.format(DATE_FORMAT).to_string()),
        club,
    }
}

fn message_limit(category: Option<CertificateCategory>) -> usize {
    match category {
        Some(category) if category != CertificateCategory::Default => 1000,
        _ => 250,
    }
}

fn too_long(limit: usize, length: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        limit, length
    )
}

/// Validate one line into a certificate to insert
///
/// Errors are keyed by the unprefixed field name.
pub fn validate_line(context: &LineContext, line: &LineItem) -> Result<NewCertificate, FieldErrors> {
    let mut errors = FieldErrors::new();

    let certificate_type = match line.field("type") {
        None => {
            errors.add("type", REQUIRED);
            None
        }
        Some(raw) => {
            let found = context.certificate_type(Some(raw));
            if found.is_none() {
                errors.add("type", INVALID_TYPE);
            }
            found
        }
    };
    let dollar_value = certificate_type
        .map(|t| t.category.is_dollar_value())
        .unwrap_or(false);

    let club = match line.field("club") {
        None => {
            errors.add("club", REQUIRED);
            None
        }
        Some(raw) => {
            let found = context.club(raw);
            if found.is_none() {
                errors.add("club", INVALID_COURSE);
            }
            found
        }
    };

    let club_secondary = match line.field("club_secondary") {
        None => None,
        Some(raw) => {
            let found = context.club(raw);
            if found.is_none() {
                errors.add("club_secondary", INVALID_COURSE);
            }
            found
        }
    };

    let quantity = match line.field("quantity").map(str::trim) {
        None => {
            errors.add("quantity", REQUIRED);
            None
        }
        Some(raw) if dollar_value => match Decimal::from_str(raw) {
            Ok(amount) if amount > Decimal::from(500) => {
                errors.add("quantity", "Ensure this value is less than or equal to 500.");
                None
            }
            Ok(amount) if amount.is_sign_negative() => {
                errors.add("quantity", "Ensure this value is greater than or equal to 0.");
                None
            }
            Ok(amount) => Some(amount),
            Err(_) => {
                errors.add("quantity", "Enter a number.");
                None
            }
        },
        Some(raw) => match raw.parse::<i64>() {
            Ok(count @ 1..=4) => Some(Decimal::from(count)),
            _ => {
                errors.add(
                    "quantity",
                    format!("Select a valid choice. {} is not one of the available choices.", raw),
                );
                None
            }
        },
    };

    let expiry_date = match line.field("expiry_date").map(str::trim) {
        None => {
            if !dollar_value {
                errors.add("expiry_date", REQUIRED);
            }
            None
        }
        Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("expiry_date", "Enter a valid date.");
                None
            }
        },
    };

    let power_cart = match line.field("power_cart") {
        None => {
            errors.add("power_cart", REQUIRED);
            None
        }
        Some(raw) => match PowerCart::from_code(raw) {
            Ok(power_cart) => Some(power_cart),
            Err(_) => {
                errors.add(
                    "power_cart",
                    format!("Select a valid choice. {} is not one of the available choices.", raw),
                );
                None
            }
        },
    };

    let message = line.field("message").map(sanitize_text).filter(|m| !m.is_empty());
    if let Some(message) = &message {
        let limit = message_limit(certificate_type.map(|t| t.category));
        let length = message.chars().count();
        if length > limit {
            errors.add("message", too_long(limit, length));
        }
    }

    let note = line.field("note").map(sanitize_text).filter(|n| !n.is_empty());
    if let Some(note) = &note {
        let length = note.chars().count();
        if length > 255 {
            errors.add("note", too_long(255, length));
        }
    }

    errors.into_result()?;

    match (certificate_type, club, quantity, power_cart) {
        (Some(certificate_type), Some(club), Some(quantity), Some(power_cart)) => Ok(NewCertificate {
            certificate_type_id: certificate_type.id,
            type_code: certificate_type.code.clone(),
            club_id: club.id,
            club_code: club.code.clone(),
            club_secondary_id: club_secondary.map(|c| c.id),
            quantity,
            power_cart,
            expiry_date,
            message,
            note,
        }),
        _ => Err(FieldErrors::new()),
    }
}

/// Validate every line, prefixing error fields with the line's `gc{key}-`
pub fn validate_lines(context: &LineContext, lines: &[LineItem]) -> Result<Vec<NewCertificate>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut certificates = Vec::with_capacity(lines.len());

    for line in lines {
        match validate_line(context, line) {
            Ok(certificate) => certificates.push(certificate),
            Err(line_errors) => {
                let prefix = crate::wizard::line_prefix(&line.key);
                let mut prefixed = FieldErrors::new();
                for (field, messages) in line_errors.iter() {
                    for message in messages {
                        prefixed.add(&format!("{}{}", prefix, field), message.clone());
                    }
                }
                errors.merge(prefixed);
            }
        }
    }

    errors.into_result()?;
    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use rust_decimal_macros::dec;

    fn context() -> (testing::Fixture, LineContext) {
        let fixture = testing::fixture();
        let context = LineContext {
            types: vec![
                fixture.default_type().clone(),
                fixture.merchandise_type().clone(),
            ],
            clubs: vec![fixture.ontario_club().clone()],
        };
        (fixture, context)
    }

    fn line(pairs: &[(&str, String)]) -> LineItem {
        LineItem::new(
            "k1",
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        )
    }

    #[test]
    fn test_valid_default_line() {
        let (fixture, context) = context();
        let certificate = validate_line(
            &context,
            &line(&[
                ("type", fixture.default_type().id.to_string()),
                ("club", fixture.ontario_club().id.to_string()),
                ("quantity", "2".into()),
                ("power_cart", "2".into()),
                ("expiry_date", "31/10/2030".into()),
                ("message", "  Enjoy!\r\n ".into()),
            ]),
        )
        .unwrap();

        assert_eq!(certificate.quantity, dec!(2));
        assert_eq!(certificate.power_cart, PowerCart::Included);
        assert_eq!(certificate.expiry_date, NaiveDate::from_ymd_opt(2030, 10, 31));
        assert_eq!(certificate.message.as_deref(), Some("Enjoy!"));
        assert_eq!(certificate.type_code, fixture.default_type().code);
    }

    #[test]
    fn test_dollar_line_needs_no_expiry() {
        let (fixture, context) = context();
        let certificate = validate_line(
            &context,
            &line(&[
                ("type", fixture.merchandise_type().id.to_string()),
                ("club", fixture.ontario_club().id.to_string()),
                ("quantity", "50.00".into()),
                ("power_cart", "0".into()),
            ]),
        )
        .unwrap();
        assert_eq!(certificate.quantity, dec!(50.00));
        assert_eq!(certificate.expiry_date, None);
    }

    #[test]
    fn test_line_errors() {
        let (fixture, context) = context();

        let errors = validate_line(&context, &line(&[])).unwrap_err();
        for field in ["type", "club", "quantity", "expiry_date", "power_cart"] {
            assert_eq!(errors.get(field), Some(&vec![REQUIRED.to_string()]), "{}", field);
        }

        let errors = validate_line(
            &context,
            &line(&[
                ("type", fixture.unmapped_type().id.to_string()),
                ("club", fixture.quebec_club().id.to_string()),
                ("quantity", "5".into()),
                ("power_cart", "3".into()),
                ("expiry_date", "2030-10-31".into()),
                ("note", "n".repeat(256)),
            ]),
        )
        .unwrap_err();
        assert_eq!(errors.get("type"), Some(&vec![INVALID_TYPE.to_string()]));
        assert_eq!(errors.get("club"), Some(&vec![INVALID_COURSE.to_string()]));
        assert!(errors.contains("quantity"));
        assert!(errors.contains("power_cart"));
        assert_eq!(errors.get("expiry_date"), Some(&vec!["Enter a valid date.".to_string()]));
        assert!(errors.contains("note"));
    }

    #[test]
    fn test_dollar_amount_bounds() {
        let (fixture, context) = context();
        let with_amount = |amount: &str| {
            line(&[
                ("type", fixture.merchandise_type().id.to_string()),
                ("club", fixture.ontario_club().id.to_string()),
                ("quantity", amount.to_string()),
                ("power_cart", "0".into()),
            ])
        };

        assert!(validate_line(&context, &with_amount("500")).is_ok());
        assert!(validate_line(&context, &with_amount("0")).is_ok());
        assert!(validate_line(&context, &with_amount("500.01")).is_err());
        assert!(validate_line(&context, &with_amount("-1")).is_err());
        assert!(validate_line(&context, &with_amount("fifty")).is_err());
    }

    #[test]
    fn test_message_limit_depends_on_category() {
        let (fixture, context) = context();
        let message = "m".repeat(300);

        let default_line = line(&[
            ("type", fixture.default_type().id.to_string()),
            ("club", fixture.ontario_club().id.to_string()),
            ("quantity", "1".into()),
            ("power_cart", "0".into()),
            ("expiry_date", "01/01/2031".into()),
            ("message", message.clone()),
        ]);
        let errors = validate_line(&context, &default_line).unwrap_err();
        assert_eq!(
            errors.get("message"),
            Some(&vec!["Ensure this value has at most 250 characters (it has 300).".to_string()])
        );

        let merchandise_line = line(&[
            ("type", fixture.merchandise_type().id.to_string()),
            ("club", fixture.ontario_club().id.to_string()),
            ("quantity", "10".into()),
            ("power_cart", "0".into()),
            ("message", message),
        ]);
        assert!(validate_line(&context, &merchandise_line).is_ok());
    }

    #[test]
    fn test_validate_lines_prefixes_fields() {
        let (_, context) = context();
        let errors = validate_lines(&context, &[line(&[])]).unwrap_err();
        assert!(errors.contains("gck1-type"));
    }

    #[test]
    fn test_line_defaults() {
        let (fixture, _) = context();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let clubs = vec![fixture.ontario_club().clone(), fixture.quebec_club().clone()];

        let defaults = line_defaults(fixture.default_type(), &clubs, today);
        assert_eq!(defaults.quantity.as_deref(), Some("2"));
        assert_eq!(defaults.power_cart, Some(PowerCart::Included.code()));
        assert_eq!(defaults.expiry_date.as_deref(), Some("02/03/2025"));

        let defaults = line_defaults(fixture.merchandise_type(), &clubs[..1], today);
        assert_eq!(defaults.club, Some(fixture.ontario_club().id));
        assert_eq!(defaults.quantity, None);
    }

    #[tokio::test]
    async fn test_recipient_validation() {
        let fixture = testing::fixture();
        let input = RecipientInput {
            language: "fr".into(),
            account_number: String::new(),
            account_name: String::new(),
            recipient_name: "Jane".into(),
            recipient_email: "jane@example.com".into(),
            department: Some(fixture.department.id),
            email_signature: Some(testing::GLOBAL_SIGNATURE),
        };

        let valid = validate_recipient(fixture.directory.as_ref(), &fixture.staff, &input, "0000000")
            .await
            .unwrap();
        assert_eq!(valid.batch.account_number.as_deref(), Some("0000000"));
        assert_eq!(valid.batch.language, Locale::Fr);
        assert_eq!(valid.warnings, vec!["Default account number (0000000) was selected.".to_string()]);
    }

    #[tokio::test]
    async fn test_recipient_errors() {
        let fixture = testing::fixture();
        let input = RecipientInput {
            language: "en".into(),
            account_number: "NOBODY".into(),
            recipient_email: "not-an-email".into(),
            department: Some(Uuid::new_v4()),
            email_signature: Some(999),
            ..Default::default()
        };

        let Err(WizardError::Fields(errors)) =
            validate_recipient(fixture.directory.as_ref(), &fixture.staff, &input, "0000000").await
        else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("account_number"), Some(&vec![INVALID_ACCOUNT_NUMBER.to_string()]));
        assert_eq!(errors.get("recipient_name"), Some(&vec![REQUIRED.to_string()]));
        assert!(errors.contains("recipient_email"));
        assert_eq!(errors.get("department"), Some(&vec![INVALID_DEPARTMENT.to_string()]));
        // Signature choices are only checked against a valid department
        assert!(!errors.contains("email_signature"));
    }

    #[tokio::test]
    async fn test_blank_recipient_reports_each_required_field_once() {
        let fixture = testing::fixture();
        let input = RecipientInput {
            recipient_name: "   ".into(),
            ..Default::default()
        };

        let Err(WizardError::Fields(errors)) =
            validate_recipient(fixture.directory.as_ref(), &fixture.staff, &input, "0000000").await
        else {
            panic!("expected field errors");
        };
        for field in ["language", "recipient_name", "recipient_email", "department", "email_signature"] {
            assert_eq!(errors.get(field), Some(&vec![REQUIRED.to_string()]), "{}", field);
        }
        assert!(!errors.contains("account_number"));
    }

    #[tokio::test]
    async fn test_recipient_choice_and_email_messages() {
        let fixture = testing::fixture();
        let input = RecipientInput {
            language: "de".into(),
            recipient_name: "Jane".into(),
            recipient_email: " jane@ ".into(),
            department: Some(fixture.department.id),
            email_signature: Some(testing::GLOBAL_SIGNATURE),
            ..Default::default()
        };

        let Err(WizardError::Fields(errors)) =
            validate_recipient(fixture.directory.as_ref(), &fixture.staff, &input, "0000000").await
        else {
            panic!("expected field errors");
        };
        assert_eq!(
            errors.get("language"),
            Some(&vec!["Select a valid choice. de is not one of the available choices.".to_string()])
        );
        assert_eq!(
            errors.get("recipient_email"),
            Some(&vec!["Enter a valid email address.".to_string()])
        );
    }

    #[tokio::test]
    async fn test_signature_must_belong_to_department() {
        let fixture = testing::fixture();
        let choices = recipient_choices(fixture.directory.as_ref(), fixture.staff.id, None)
            .await
            .unwrap();
        assert_eq!(choices.department, Some(fixture.department.id));
        // Department signature listed before the global one
        assert_eq!(
            choices.signatures.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![testing::DEPARTMENT_SIGNATURE, testing::GLOBAL_SIGNATURE]
        );

        let input = RecipientInput {
            language: "en".into(),
            recipient_name: "Jane".into(),
            recipient_email: "jane@example.com".into(),
            department: Some(fixture.department.id),
            email_signature: Some(testing::OTHER_DEPARTMENT_SIGNATURE),
            ..Default::default()
        };
        let Err(WizardError::Fields(errors)) =
            validate_recipient(fixture.directory.as_ref(), &fixture.staff, &input, "0000000").await
        else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("email_signature"), Some(&vec![INVALID_SIGNATURE.to_string()]));
    }

    #[tokio::test]
    async fn test_lookup_prefills_single_match() {
        let fixture = testing::fixture();
        let mut input = RecipientInput::default();

        let request = LookupRequest {
            account_number: Some(testing::MEMBER_NUMBER.into()),
            ..Default::default()
        };
        let users = lookup_member(fixture.directory.as_ref(), &request, &mut input)
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(input.account_number, testing::MEMBER_NUMBER);
        assert_eq!(input.account_name, "Morgan Member");
        assert_eq!(input.recipient_name, "Morgan");
        assert_eq!(input.recipient_email, "morgan@example.com");
    }

    #[tokio::test]
    async fn test_lookup_without_criteria_finds_nothing() {
        let fixture = testing::fixture();
        let mut input = RecipientInput::default();
        let users = lookup_member(fixture.directory.as_ref(), &LookupRequest::default(), &mut input)
            .await
            .unwrap();
        assert!(users.is_empty());
        assert_eq!(input, RecipientInput::default());
    }
}
