// Delivery email for a certificate batch, in the batch language

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use crate::directory::EmailSignature;
use crate::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEmail {
    pub from: String,
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn subject(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "ClubLink Certificate",
        Locale::Fr => "Certificat ClubLink",
    }
}

pub fn from_header(address: &str) -> String {
    format!("ClubLink <{}>", address)
}

/// Inputs of one delivery email
pub struct EmailContext<'a> {
    pub locale: Locale,
    pub recipient_name: &'a str,
    pub recipient_email: &'a str,
    pub download_url: &'a str,
    pub signature: Option<&'a EmailSignature>,
    pub from_address: &'a str,
    pub bcc: Vec<String>,
}

fn greeting(locale: Locale, name: &str) -> String {
    match locale {
        Locale::En => format!("Hello {},", name),
        Locale::Fr => format!("Bonjour {},", name),
    }
}

fn body(locale: Locale) -> (&'static str, &'static str) {
    match locale {
        Locale::En => (
            "Your ClubLink certificate is ready.",
            "Download your certificate:",
        ),
        Locale::Fr => (
            "Votre certificat ClubLink est prêt.",
            "Téléchargez votre certificat :",
        ),
    }
}

pub fn compose(context: EmailContext<'_>) -> DeliveryEmail {
    let locale = context.locale;
    let (ready, download) = body(locale);
    let greeting = greeting(locale, context.recipient_name);

    let mut text = format!(
        "{}\n\n{}\n\n{}\n{}\n",
        greeting, ready, download, context.download_url
    );
    let mut html = format!(
        "<p>{}</p>\n<p>{}</p>\n<p>{} <a href=\"{}\">{}</a></p>\n",
        escape(&greeting),
        escape(ready),
        escape(download),
        escape(context.download_url),
        escape(context.download_url),
    );

    if let Some(signature) = context.signature {
        let plaintext = signature.plaintext.resolve(locale);
        if !plaintext.trim().is_empty() {
            text.push('\n');
            text.push_str(plaintext);
            text.push('\n');
        }
        // Signatures are authored as HTML
        let signature_html = signature.text.resolve(locale);
        if !signature_html.trim().is_empty() {
            html.push_str(signature_html);
            html.push('\n');
        }
    }

    DeliveryEmail {
        from: from_header(context.from_address),
        to: vec![context.recipient_email.to_string()],
        bcc: context.bcc,
        subject: subject(locale).to_string(),
        text,
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocalizedText;

    fn signature() -> EmailSignature {
        EmailSignature {
            id: 1,
            name: "Sales".into(),
            text: LocalizedText::new("<p>The <b>Sales</b> team</p>", ""),
            plaintext: LocalizedText::new("The Sales team", "L'équipe des ventes"),
            department_id: None,
        }
    }

    fn context<'a>(locale: Locale, signature: Option<&'a EmailSignature>) -> EmailContext<'a> {
        EmailContext {
            locale,
            recipient_name: "Jane & Co",
            recipient_email: "jane@example.com",
            download_url: "https://gc.example.com/download/MTpq/",
            signature,
            from_address: "certificates@example.com",
            bcc: vec!["director@example.com".into()],
        }
    }

    #[test]
    fn test_english_email() {
        let signature = signature();
        let email = compose(context(Locale::En, Some(&signature)));

        assert_eq!(email.subject, "ClubLink Certificate");
        assert_eq!(email.from, "ClubLink <certificates@example.com>");
        assert_eq!(email.to, vec!["jane@example.com".to_string()]);
        assert!(email.text.starts_with("Hello Jane & Co,"));
        assert!(email.text.contains("https://gc.example.com/download/MTpq/"));
        assert!(email.text.ends_with("The Sales team\n"));
        assert!(email.html.contains("Hello Jane &amp; Co,"));
        assert!(email.html.contains("<b>Sales</b>"));
    }

    #[test]
    fn test_french_email_falls_back_to_english_signature_html() {
        let signature = signature();
        let email = compose(context(Locale::Fr, Some(&signature)));

        assert_eq!(email.subject, "Certificat ClubLink");
        assert!(email.text.starts_with("Bonjour Jane & Co,"));
        assert!(email.text.contains("L'équipe des ventes"));
        assert!(email.html.contains("<b>Sales</b>"));
    }

    #[test]
    fn test_without_signature() {
        let email = compose(context(Locale::En, None));
        assert!(email.text.ends_with("/download/MTpq/\n"));
        assert_eq!(email.bcc, vec!["director@example.com".to_string()]);
    }
}
