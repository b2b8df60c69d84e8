// Printed text of the certificate layouts in both languages

use chrono::{Datelike, NaiveDate};

use crate::locale::Locale;

/// Fixed strings drawn on a certificate
#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub name: &'static str,
    pub certificate_expires: &'static str,
    pub clubs: &'static str,
    pub resort: &'static str,
    pub club: &'static str,
    pub clublink_wide: &'static str,
    pub number_of_players: &'static str,
    pub number_of_nights: &'static str,
    pub dollar_amount: &'static str,
    pub golf_shop: &'static str,
    pub front_desk: &'static str,
    pub single_use: &'static str,
    pub not_responsible: &'static str,
    pub ag30_headline: &'static str,
    pub ag30_intro: &'static str,
    pub ag30_benefits: &'static [&'static str],
    pub ag30_surcharge: &'static str,
    pub ag30_certificate: &'static str,
    pub ag30_activate_by: &'static str,
    pub prestige_headline: &'static str,
    pub expires: &'static str,
    months: [&'static str; 12],
}

static ENGLISH: Labels = Labels {
    title: "ClubLink Gift Certificate",
    name: "NAME: {name}",
    certificate_expires: "CERTIFICATE EXPIRES:",
    clubs: "CLUBS:",
    resort: "RESORT:",
    club: "CLUB:",
    clublink_wide: "ClubLink Wide\nAll Canadian locations",
    number_of_players: "NUMBER OF PLAYERS:",
    number_of_nights: "NUMBER OF NIGHTS:",
    dollar_amount: "DOLLAR AMOUNT:",
    golf_shop: "Golf Shop",
    front_desk: "Front Desk",
    single_use: "This certificate is valid for one time use only and must be presented at the \
                 time of redemption.",
    not_responsible: "ClubLink is not responsible for lost, stolen, or duplicate certificates.",
    ag30_headline: "YOUR 30-DAY CLUBLINK MEMBERSHIP EXPERIENCE AWAITS.",
    ag30_intro: "With access to over 40* courses in Ontario and Quebec along with the many \
                 other benefits of a ClubLink membership including:",
    ag30_benefits: &[
        "Tee time booking privileges up to seven days in advance",
        "Account privileges",
        "ClubLink Advantage Pricing on golf merchandise",
        "Preferred access and discounts at ClubLink resorts in Muskoka",
        "Complimentary use of practice facilities (excluding Glen Abbey)",
        "Access to dining at all locations",
    ],
    ag30_surcharge: "* An additional fee applies to play golf at Glen Abbey, RattleSnake Point, \
                     Greystone and King Valley.",
    ag30_certificate: "Certificate:\n{code}",
    ag30_activate_by: "Membership must be activated by:\n{date}",
    prestige_headline: "Welcome back for another great season!",
    expires: "Expires: {date}",
    months: [
        "January", "February", "March", "April", "May", "June", "July", "August",
        "September", "October", "November", "December",
    ],
};

static FRENCH: Labels = Labels {
    title: "Certificat-cadeau ClubLink",
    name: "NOM : {name}",
    certificate_expires: "LE CERTIFICAT EXPIRE LE :",
    clubs: "CLUBS :",
    resort: "CENTRE DE VILLÉGIATURE :",
    club: "CLUB :",
    clublink_wide: "Tout le réseau ClubLink\nTous les emplacements au Canada",
    number_of_players: "NOMBRE DE JOUEURS :",
    number_of_nights: "NOMBRE DE NUITS :",
    dollar_amount: "MONTANT :",
    golf_shop: "Boutique du golf",
    front_desk: "Réception",
    single_use: "Ce certificat n'est valide qu'une seule fois et doit être présenté au moment \
                 de l'échange.",
    not_responsible: "ClubLink n'est pas responsable des certificats perdus, volés ou en double.",
    ag30_headline: "VOTRE EXPÉRIENCE DE MEMBRE CLUBLINK DE 30 JOURS VOUS ATTEND.",
    ag30_intro: "Avec l'accès à plus de 40* parcours en Ontario et au Québec ainsi qu'aux \
                 nombreux autres avantages d'une adhésion ClubLink, notamment :",
    ag30_benefits: &[
        "Réservation des départs jusqu'à sept jours à l'avance",
        "Privilèges de compte",
        "Prix Avantage ClubLink sur la marchandise de golf",
        "Accès privilégié et rabais dans les centres de villégiature ClubLink de Muskoka",
        "Utilisation gratuite des installations d'entraînement (sauf Glen Abbey)",
        "Accès à la restauration à tous les emplacements",
    ],
    ag30_surcharge: "* Des frais supplémentaires s'appliquent pour jouer à Glen Abbey, \
                     RattleSnake Point, Greystone et King Valley.",
    ag30_certificate: "Certificat :\n{code}",
    ag30_activate_by: "L'adhésion doit être activée avant le :\n{date}",
    prestige_headline: "Bienvenue pour une autre excellente saison!",
    expires: "Expire le : {date}",
    months: [
        "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
        "octobre", "novembre", "décembre",
    ],
};

pub fn labels(locale: Locale) -> &'static Labels {
    match locale {
        Locale::En => &ENGLISH,
        Locale::Fr => &FRENCH,
    }
}

impl Labels {
    pub fn month(&self, date: NaiveDate) -> &'static str {
        self.months[date.month0() as usize]
    }

    /// Long date, e.g. "October 31, 2024"
    pub fn long_date(&self, date: NaiveDate) -> String {
        format!("{} {}, {}", self.month(date), date.day(), date.year())
    }

    /// Redemption location as printed, for the stored location value
    pub fn redemption_location(&self, location: &str) -> &'static str {
        if location.eq_ignore_ascii_case("Front Desk") {
            self.front_desk
        } else {
            self.golf_shop
        }
    }
}

/// Day/month/year without padding, e.g. "5/10/2024"
pub fn short_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}
