// Certificates module
// Certificate catalog, batches, pricing, issuance and downloads

pub mod code;
pub mod download;
pub mod error;
pub mod handlers;
pub mod models;
pub mod price_calculator;
pub mod repository;
pub mod service;

pub use download::*;
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use price_calculator::*;
pub use repository::*;
pub use service::*;
