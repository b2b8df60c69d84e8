// Prestige 50 layout, also used for Golf For Life without its headline

use crate::certificates::CertificateTemplate;
use crate::documents::ag30::{draw_wide_header, CONTENT_TOP};
use crate::documents::{
    draw_artwork, labels, Barcode, Canvas, CertificateView, DocumentError, Face, TextStyle,
};

const MAIN_X: f32 = 0.35;
const MAIN_WIDTH: f32 = 5.2;
const SIDEBAR_X: f32 = 6.06;
const SIDEBAR_WIDTH: f32 = 2.09;

const BARCODE_HEIGHT: f32 = 1.0;

const BODY: TextStyle = TextStyle::new(Face::Light, 12.0, 18.0);
const HEADLINE: TextStyle = TextStyle::new(Face::Medium, 20.0, 23.0);
const SIDEBAR: TextStyle = TextStyle::new(Face::Light, 11.0, 15.0);
const SIDEBAR_BOLD: TextStyle = TextStyle::new(Face::Medium, 12.0, 18.0);

pub fn draw(canvas: &Canvas, view: &CertificateView) -> Result<(), DocumentError> {
    let labels = labels(view.locale);

    if let Some(header) = &view.artwork.header {
        draw_wide_header(canvas, header);
    }

    let headline = match view.template {
        CertificateTemplate::GolfForLife => "",
        _ => labels.prestige_headline,
    };
    let mut offset = canvas.paragraphs(headline, CONTENT_TOP, MAIN_X, MAIN_WIDTH, HEADLINE);

    if !view.message.is_empty() {
        canvas.paragraphs(&view.message, offset + 0.05, MAIN_X, MAIN_WIDTH, BODY);
    }

    // Sidebar; the barcode hangs below whatever was drawn last
    if let Some(expiry) = view.expiry_date {
        let expires = labels.expires.replace("{date}", &labels.long_date(expiry));
        offset = canvas.paragraphs(&expires, CONTENT_TOP + 0.125, SIDEBAR_X, SIDEBAR_WIDTH, SIDEBAR_BOLD);
    }
    if let Some(restrictions) = &view.restrictions {
        offset = canvas.paragraphs(restrictions, offset + 0.15, SIDEBAR_X, SIDEBAR_WIDTH, SIDEBAR);
    }

    Barcode::for_code(&view.code)?.draw_labelled(
        canvas,
        7.95,
        10.75 - offset - BARCODE_HEIGHT,
        BARCODE_HEIGHT,
        10.6 - offset - BARCODE_HEIGHT,
    );

    if let Some(advertisement) = &view.artwork.advertisement {
        draw_artwork(canvas, "advertisement", advertisement, (0.35, 0.35, 7.8, 2.1), None, true);
    }

    Ok(())
}
