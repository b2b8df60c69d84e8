// Registration module
// Prices a batch and registers it as a ticket with the inventory system

pub mod document;
pub mod error;
pub mod service;

pub use document::*;
pub use error::*;
pub use service::*;
