use barcoders::sym::code128::Code128;

use crate::certificates::code::barcode_value;
use crate::documents::{Canvas, DocumentError, Face, RgbColor};

/// Width of one bar module in inches
pub const MODULE_WIDTH: f32 = 0.01;

/// Blank modules on each side of the symbol
pub const QUIET_ZONE: usize = 10;

/// Code 128 symbol for a certificate code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    value: String,
    modules: Vec<u8>,
}

impl Barcode {
    pub fn for_code(code: &str) -> Result<Self, DocumentError> {
        let value = barcode_value(code);
        // Character set B handles the odd digit count
        let modules = Code128::new(format!("Ɓ{}", value))
            .map_err(|e| DocumentError::Barcode(format!("{:?}", e)))?
            .encode();

        Ok(Self { value, modules })
    }

    /// The 13 digit payload printed under the bars
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Total width in inches including the quiet zones
    pub fn width(&self) -> f32 {
        (self.modules.len() + 2 * QUIET_ZONE) as f32 * MODULE_WIDTH
    }

    /// Runs of dark modules as (start module, length)
    pub fn bars(&self) -> Vec<(usize, usize)> {
        let mut bars = Vec::new();
        let mut start = None;

        for (index, module) in self.modules.iter().enumerate() {
            match (*module, start) {
                (1, None) => start = Some(index),
                (0, Some(begin)) => {
                    bars.push((begin, index - begin));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(begin) = start {
            bars.push((begin, self.modules.len() - begin));
        }
        bars
    }

    /// Draw the bars with the lower-left corner of the quiet zone at `(x, y)`
    pub fn draw(&self, canvas: &Canvas, x: f32, y: f32, height: f32) {
        let origin = x + QUIET_ZONE as f32 * MODULE_WIDTH;
        for (start, length) in self.bars() {
            canvas.filled_rect(
                origin + start as f32 * MODULE_WIDTH,
                y,
                length as f32 * MODULE_WIDTH,
                height,
            );
        }
    }

    /// Draw the bars right-aligned at `right` with the payload centered under them
    pub fn draw_labelled(&self, canvas: &Canvas, right: f32, y: f32, height: f32, label_y: f32) {
        let left = right - self.width();
        self.draw(canvas, left, y, height);
        canvas.centered_text(
            &self.value,
            Face::Mono,
            10.0,
            RgbColor::BLACK,
            right - self.width() / 2.0,
            label_y,
        );
    }
}
