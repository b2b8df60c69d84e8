// Default certificate layout
// Header band with club logos and headline, message on the left, certificate details on
// the right, barcode above the footer and an optional advertisement at the bottom

use crate::certificates::CertificateCategory;
use crate::documents::{
    draw_artwork, fit_font_size, labels, Barcode, Canvas, CertificateView, ClubListing,
    DocumentError, Face, Labels, RgbColor, TextStyle, PAGE_HEIGHT, PAGE_WIDTH,
};

const HEADER_HEIGHT: f32 = 1.883;
const LOGO_SIZE: f32 = 1.107;
const LOGO_MAX_PIXELS: u32 = 300;

const LEFT_X: f32 = 0.35;
const LEFT_WIDTH: f32 = 3.747;
const RIGHT_X: f32 = 4.81;
const RIGHT_WIDTH: f32 = 3.357;
const COLUMN_TOP: f32 = 2.25;

const SECTION_GAP: f32 = 0.25;
const VALUE_GAP: f32 = 0.1;

const BODY: TextStyle = TextStyle::new(Face::Light, 10.0, 13.0);
const HEADING: TextStyle = TextStyle::new(Face::Medium, 10.0, 13.0);

fn right_section(canvas: &Canvas, heading: &str, values: &[String], offset: f32) -> f32 {
    let mut offset = canvas.paragraphs(heading, offset + SECTION_GAP, RIGHT_X, RIGHT_WIDTH, HEADING);
    for value in values {
        offset = canvas.paragraphs(value, offset - VALUE_GAP, RIGHT_X, RIGHT_WIDTH, BODY);
    }
    offset
}

fn club_heading(labels: &'static Labels, category: CertificateCategory) -> &'static str {
    match category {
        CertificateCategory::PlayersClub | CertificateCategory::Merchandise => labels.clubs,
        CertificateCategory::ResortStay => labels.resort,
        _ => labels.club,
    }
}

pub fn draw(canvas: &Canvas, view: &CertificateView) -> Result<(), DocumentError> {
    let labels = labels(view.locale);
    let artwork = &view.artwork;

    if let Some(header) = &artwork.header {
        draw_artwork(
            canvas,
            "header",
            header,
            (0.0, PAGE_HEIGHT - HEADER_HEIGHT, PAGE_WIDTH, HEADER_HEIGHT),
            None,
            false,
        );
    }
    if let Some(logo) = &artwork.primary_logo {
        draw_artwork(canvas, "club logo", logo, (0.487, 9.753, LOGO_SIZE, LOGO_SIZE), Some(LOGO_MAX_PIXELS), true);
    }
    if let Some(logo) = &artwork.secondary_logo {
        draw_artwork(canvas, "secondary club logo", logo, (6.906, 9.753, LOGO_SIZE, LOGO_SIZE), Some(LOGO_MAX_PIXELS), true);
    }

    let headline_size = fit_font_size(&view.headline, Face::Serif, 26.0, 4.25);
    canvas.centered_text(&view.headline, Face::Serif, headline_size, RgbColor::WHITE, 4.25, 9.78);

    // Left column
    let mut offset = COLUMN_TOP;
    if let Some(name) = &view.recipient_name {
        let line = labels.name.replace("{name}", name);
        offset = canvas.paragraphs(&line, offset + SECTION_GAP, LEFT_X, LEFT_WIDTH, BODY);
    }
    if !view.message.is_empty() {
        offset = canvas.paragraphs(&view.message, offset + SECTION_GAP, LEFT_X, LEFT_WIDTH, BODY);
    }
    if let Some(restrictions) = &view.restrictions {
        canvas.paragraphs(restrictions, offset + SECTION_GAP, LEFT_X, LEFT_WIDTH, BODY);
    }

    canvas.line((4.443, 8.475), (4.443, 5.79), 0.0035);

    // Right column
    let mut offset = COLUMN_TOP;
    if let Some(expiry) = view.expiry_date {
        offset = right_section(
            canvas,
            labels.certificate_expires,
            &[labels.long_date(expiry).to_uppercase()],
            offset,
        );
    }

    let heading = club_heading(labels, view.category);
    offset = match &view.clubs {
        ClubListing::PlayersClub(names) => right_section(canvas, heading, names, offset),
        ClubListing::ClubLinkWide => {
            right_section(canvas, heading, &[labels.clublink_wide.to_string()], offset)
        }
        ClubListing::Clubs { primary, secondary } => {
            let offset = right_section(canvas, heading, &[primary.details()], offset);
            match secondary {
                Some(secondary) => right_section(canvas, heading, &[secondary.details()], offset),
                None => offset,
            }
        }
    };

    if let Some(players) = view.num_players {
        offset = right_section(canvas, labels.number_of_players, &[players.to_string()], offset);
    }
    if let Some(nights) = view.num_nights {
        offset = right_section(canvas, labels.number_of_nights, &[nights.to_string()], offset);
    }
    if let Some(amount) = view.dollar_amount {
        offset = right_section(canvas, labels.dollar_amount, &[format!("{:.2}", amount)], offset);
    }
    if let Some((location, details)) = &view.redemption {
        right_section(canvas, &format!("{}:", location.to_uppercase()), &[details.clone()], offset);
    }

    if let Some(logo) = &artwork.brand_logo {
        draw_artwork(canvas, "ClubLink logo", logo, (4.793, 3.517, 1.2, 0.35), None, true);
    }

    Barcode::for_code(&view.code)?.draw_labelled(canvas, 8.15, 3.65, 0.4, 3.517);

    canvas.centered_text(labels.single_use, Face::Medium, 9.0, RgbColor::BLACK, 4.25, 2.953);
    canvas.centered_text(labels.not_responsible, Face::Medium, 9.0, RgbColor::BLACK, 4.25, 2.783);
    canvas.line((0.35, 2.565), (8.15, 2.565), 0.005);

    if let Some(advertisement) = &artwork.advertisement {
        draw_artwork(canvas, "advertisement", advertisement, (0.35, 0.35, 7.8, 2.1), None, true);
    }

    Ok(())
}
