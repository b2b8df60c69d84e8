// Delivery module
// Emails the download link of an issued batch to its recipient

pub mod email;
pub mod error;
pub mod mailer;
pub mod outbox;
pub mod service;
pub mod worker;

pub use email::*;
pub use error::*;
pub use mailer::*;
pub use outbox::*;
pub use service::*;
pub use worker::*;
