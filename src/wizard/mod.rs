// Wizard module
// Two-step batch entry kept in a per-staff session, then submitted for issuance

pub mod error;
pub mod forms;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod service;
pub mod session;
pub mod state_machine;
pub mod step2;

pub use error::*;
pub use forms::*;
pub use guard::*;
pub use handlers::*;
pub use models::*;
pub use service::*;
pub use session::*;
pub use state_machine::*;
pub use step2::*;
