// Documents module
// Renders certificates as single-page PDFs with a layout per template

pub mod ag30;
pub mod assets;
pub mod barcode;
pub mod canvas;
pub mod default_layout;
pub mod error;
pub mod generator;
pub mod labels;
pub mod prestige;
pub mod view;

pub use assets::*;
pub use barcode::*;
pub use canvas::*;
pub use error::*;
pub use generator::*;
pub use labels::*;
pub use view::*;
