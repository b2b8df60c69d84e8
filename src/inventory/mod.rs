// Inventory module
// Client for the external point-of-sale inventory system

pub mod client;
pub mod error;
pub mod models;

pub use client::*;
pub use error::*;
pub use models::*;
