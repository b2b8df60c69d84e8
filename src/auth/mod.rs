// Authentication module
// JWT-authenticated staff identity and the office IP fence

pub mod error;
pub mod middleware;
pub mod token;

pub use error::AuthError;
pub use middleware::{fence_allows, Operator, StaffIdentity};
pub use token::{Claims, TokenService};
