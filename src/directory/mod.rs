// Directory module
// Read-only lookup of staff, members, departments, clubs and email signatures

pub mod error;
pub mod models;
pub mod repository;

pub use error::*;
pub use models::*;
pub use repository::*;
