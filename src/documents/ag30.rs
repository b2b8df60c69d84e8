// AG30 layout: a 30-day membership trial with a benefits list and a sidebar

use crate::documents::{
    draw_artwork, labels, short_date, Barcode, Canvas, CertificateView, DocumentError, Face,
    RgbColor, TextStyle, PAGE_HEIGHT, PAGE_WIDTH,
};

pub(crate) const HEADER_TOP: f32 = 0.35;
pub(crate) const HEADER_HEIGHT: f32 = 3.187;
pub(crate) const CONTENT_TOP: f32 = 3.787;

const MAIN_X: f32 = 0.35;
const MAIN_WIDTH: f32 = 5.36;
const SIDEBAR_X: f32 = 6.06;
const SIDEBAR_WIDTH: f32 = 2.09;

const GOLD: u32 = 0xC2940B;

const BODY: TextStyle = TextStyle::new(Face::Light, 12.0, 15.0);
const BODY_BOLD: TextStyle = TextStyle::new(Face::Medium, 12.0, 18.0);
const BODY_ITALIC: TextStyle = TextStyle::new(Face::Italic, 9.0, 15.0);
const FINEPRINT: TextStyle = TextStyle::new(Face::Italic, 8.0, 12.0);
const FEATURED: TextStyle = TextStyle::new(Face::Medium, 14.0, 20.0);

/// Header image box shared with the Prestige layout
pub(crate) fn draw_wide_header(canvas: &Canvas, header: &[u8]) {
    draw_artwork(
        canvas,
        "header",
        header,
        (
            HEADER_TOP,
            PAGE_HEIGHT - HEADER_TOP - HEADER_HEIGHT,
            PAGE_WIDTH - 2.0 * HEADER_TOP,
            HEADER_HEIGHT,
        ),
        None,
        true,
    );
}

pub fn draw(canvas: &Canvas, view: &CertificateView) -> Result<(), DocumentError> {
    let labels = labels(view.locale);
    let headline = TextStyle::new(Face::Medium, 20.0, 23.0).with_color(RgbColor::from_hex(GOLD));

    if let Some(header) = &view.artwork.header {
        draw_wide_header(canvas, header);
    }

    let mut offset = canvas.paragraphs(labels.ag30_headline, CONTENT_TOP, MAIN_X, MAIN_WIDTH, headline);
    offset = canvas.paragraphs(labels.ag30_intro, offset, MAIN_X, MAIN_WIDTH, BODY_BOLD);

    let benefits = labels
        .ag30_benefits
        .iter()
        .map(|benefit| format!("\u{2022} {}", benefit))
        .collect::<Vec<_>>()
        .join("\n\n");
    offset = canvas.paragraphs(&benefits, offset - 0.2, MAIN_X, MAIN_WIDTH, BODY);
    offset = canvas.paragraphs(labels.ag30_surcharge, offset + 0.15, MAIN_X, MAIN_WIDTH, BODY_ITALIC);

    if !view.message.is_empty() {
        canvas.paragraphs(&view.message, offset, MAIN_X, MAIN_WIDTH, BODY_BOLD);
    }

    // Sidebar
    let certificate = labels.ag30_certificate.replace("{code}", &view.code);
    let mut offset = canvas.paragraphs(&certificate, CONTENT_TOP, SIDEBAR_X, SIDEBAR_WIDTH, FEATURED);

    if let Some(expiry) = view.expiry_date {
        let activate_by = labels.ag30_activate_by.replace("{date}", &short_date(expiry));
        offset = canvas.paragraphs(&activate_by, offset + 0.15, SIDEBAR_X, SIDEBAR_WIDTH, FEATURED);
    }
    if let Some(restrictions) = &view.restrictions {
        canvas.paragraphs(restrictions, offset + 0.15, SIDEBAR_X, SIDEBAR_WIDTH, FINEPRINT);
    }

    Barcode::for_code(&view.code)?.draw_labelled(canvas, 8.15, 2.85, 0.4, 2.717);
    canvas.line((0.35, 2.565), (8.15, 2.565), 0.005);

    if let Some(advertisement) = &view.artwork.advertisement {
        draw_artwork(canvas, "advertisement", advertisement, (0.35, 0.35, 7.8, 2.1), None, true);
    }

    Ok(())
}
