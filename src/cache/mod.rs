// Cache module
// Shared key/value cache with named regions, backed by Redis or process memory

pub mod backend;
pub mod error;
pub mod typed;

pub use backend::*;
pub use error::*;
pub use typed::*;
