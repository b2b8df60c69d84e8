// Drawing surface for one letter-size certificate page
// Coordinates are inches from the bottom-left corner, font sizes are points

use printpdf::image_crate::{self, GenericImageView};
use printpdf::{
    path::PaintMode, BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};

use crate::documents::DocumentError;

pub const PAGE_WIDTH: f32 = 8.5;
pub const PAGE_HEIGHT: f32 = 11.0;

/// Space left between paragraphs
pub const PARAGRAPH_SPACING: f32 = 0.1;

const POINTS_PER_INCH: f32 = 72.0;
const IMAGE_DPI: f32 = 300.0;

pub fn inch(value: f32) -> Mm {
    Mm(value * 25.4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Light,
    Medium,
    Italic,
    Serif,
    Mono,
}

/// Widths of ASCII 32..=126 in thousandths of an em (Helvetica)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
    722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
    556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    500, 334, 260, 334, 584,
];

/// Widths of ASCII 32..=126 in thousandths of an em (Helvetica-Bold)
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
    722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
    611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
    500, 389, 280, 389, 584,
];

impl Face {
    fn builtin(&self) -> BuiltinFont {
        match self {
            Face::Light => BuiltinFont::Helvetica,
            Face::Medium => BuiltinFont::HelveticaBold,
            Face::Italic => BuiltinFont::HelveticaOblique,
            Face::Serif => BuiltinFont::TimesRoman,
            Face::Mono => BuiltinFont::Courier,
        }
    }

    fn char_width(&self, c: char) -> f32 {
        let index = (c as u32).wrapping_sub(32) as usize;
        let helvetica = |table: &[u16; 95]| f32::from(table.get(index).copied().unwrap_or(556));
        match self {
            Face::Light | Face::Italic => helvetica(&HELVETICA_WIDTHS),
            Face::Medium => helvetica(&HELVETICA_BOLD_WIDTHS),
            // Times runs about a tenth narrower than Helvetica
            Face::Serif => helvetica(&HELVETICA_WIDTHS) * 0.9,
            Face::Mono => 600.0,
        }
    }

    /// Width of `text` in inches at `size` points
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let em: f32 = text.chars().map(|c| self.char_width(c)).sum();
        em / 1000.0 * size / POINTS_PER_INCH
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: RgbColor = RgbColor { r: 1.0, g: 1.0, b: 1.0 };

    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }

    fn color(&self) -> Color {
        Color::Rgb(Rgb::new(self.r, self.g, self.b, None))
    }
}

/// Font, size, line height and colour of a run of paragraphs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: Face,
    pub size: f32,
    pub leading: f32,
    pub color: RgbColor,
}

impl TextStyle {
    pub const fn new(face: Face, size: f32, leading: f32) -> Self {
        Self {
            face,
            size,
            leading,
            color: RgbColor::BLACK,
        }
    }

    pub const fn with_color(mut self, color: RgbColor) -> Self {
        self.color = color;
        self
    }
}

/// Greedy word wrap of one line of text into `width` inches
pub fn wrap(text: &str, face: Face, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if current.is_empty() || face.text_width(&candidate, size) <= width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Largest size no bigger than `start` at which `text` fits in `width` inches
pub fn fit_font_size(text: &str, face: Face, start: f32, width: f32) -> f32 {
    let mut size = start;
    while size > 1.0 && face.text_width(text, size) > width {
        size -= 0.1;
    }
    size
}

pub struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    light: IndirectFontRef,
    medium: IndirectFontRef,
    italic: IndirectFontRef,
    serif: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Canvas {
    pub fn new(title: &str) -> Result<Self, DocumentError> {
        let (doc, page, layer) =
            PdfDocument::new(title, inch(PAGE_WIDTH), inch(PAGE_HEIGHT), "Certificate");
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            light: doc.add_builtin_font(Face::Light.builtin())?,
            medium: doc.add_builtin_font(Face::Medium.builtin())?,
            italic: doc.add_builtin_font(Face::Italic.builtin())?,
            serif: doc.add_builtin_font(Face::Serif.builtin())?,
            mono: doc.add_builtin_font(Face::Mono.builtin())?,
            doc,
            layer,
        })
    }

    fn font(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Light => &self.light,
            Face::Medium => &self.medium,
            Face::Italic => &self.italic,
            Face::Serif => &self.serif,
            Face::Mono => &self.mono,
        }
    }

    pub fn text(&self, text: &str, face: Face, size: f32, color: RgbColor, x: f32, y: f32) {
        self.layer.set_fill_color(color.color());
        self.layer
            .use_text(text, size, inch(x), inch(y), self.font(face));
    }

    pub fn centered_text(&self, text: &str, face: Face, size: f32, color: RgbColor, center_x: f32, y: f32) {
        let x = center_x - face.text_width(text, size) / 2.0;
        self.text(text, face, size, color, x, y);
    }

    /// Draw blank-line separated paragraphs top-down in a column
    ///
    /// # Arguments
    /// * `offset` - distance from the top of the page to the top of the first paragraph
    ///
    /// # Returns
    /// The offset just below the last paragraph, including paragraph spacing
    pub fn paragraphs(&self, text: &str, offset: f32, x: f32, width: f32, style: TextStyle) -> f32 {
        let mut offset = offset;

        for paragraph in text.split("\n\n") {
            let lines: Vec<String> = paragraph
                .lines()
                .flat_map(|line| wrap(line, style.face, style.size, width))
                .collect();

            let line_height = style.leading / POINTS_PER_INCH;
            let mut baseline = PAGE_HEIGHT - offset - style.size / POINTS_PER_INCH;
            for line in &lines {
                self.text(line, style.face, style.size, style.color, x, baseline);
                baseline -= line_height;
            }

            offset += lines.len() as f32 * line_height + PARAGRAPH_SPACING;
        }

        offset
    }

    /// Straight stroke, thickness in inches
    pub fn line(&self, from: (f32, f32), to: (f32, f32), thickness: f32) {
        self.layer.set_outline_color(RgbColor::BLACK.color());
        self.layer.set_outline_thickness(thickness * POINTS_PER_INCH);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(inch(from.0), inch(from.1)), false),
                (Point::new(inch(to.0), inch(to.1)), false),
            ],
            is_closed: false,
        });
    }

    /// Filled black rectangle from its lower-left corner
    pub fn filled_rect(&self, x: f32, y: f32, width: f32, height: f32) {
        self.layer.set_fill_color(RgbColor::BLACK.color());
        self.layer.add_rect(
            Rect::new(inch(x), inch(y), inch(x + width), inch(y + height)).with_mode(PaintMode::Fill),
        );
    }

    /// Place an encoded image inside a box
    ///
    /// # Arguments
    /// * `bytes` - any format the `image` crate decodes
    /// * `max_pixels` - downscale larger images before embedding
    /// * `preserve_aspect` - fit and center inside the box instead of stretching
    pub fn image(
        &self,
        bytes: &[u8],
        (x, y, width, height): (f32, f32, f32, f32),
        max_pixels: Option<u32>,
        preserve_aspect: bool,
    ) -> Result<(), DocumentError> {
        let mut decoded =
            image_crate::load_from_memory(bytes).map_err(|e| DocumentError::Image(e.to_string()))?;
        if let Some(max) = max_pixels {
            if decoded.width() > max || decoded.height() > max {
                decoded = decoded.thumbnail(max, max);
            }
        }

        let (pixels_x, pixels_y) = decoded.dimensions();
        if pixels_x == 0 || pixels_y == 0 {
            return Err(DocumentError::Image("empty image".to_string()));
        }

        let natural_width = pixels_x as f32 / IMAGE_DPI;
        let natural_height = pixels_y as f32 / IMAGE_DPI;
        let (mut scale_x, mut scale_y) = (width / natural_width, height / natural_height);
        let (mut left, mut bottom) = (x, y);

        if preserve_aspect {
            let scale = scale_x.min(scale_y);
            scale_x = scale;
            scale_y = scale;
            left += (width - natural_width * scale) / 2.0;
            bottom += (height - natural_height * scale) / 2.0;
        }

        Image::from_dynamic_image(&decoded).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(inch(left)),
                translate_y: Some(inch(bottom)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }

    pub fn finish(self) -> Result<Vec<u8>, DocumentError> {
        Ok(self.doc.save_to_bytes()?)
    }
}
