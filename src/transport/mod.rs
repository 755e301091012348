//! Mail delivery.
//!
//! # Transport Architecture
//!
//! - `SmtpTransport`: delivery through an SMTP relay (lettre)
//! - `RecordingTransport`: captures messages in memory, for tests
//!
//! Use `create_transport()` to build the SMTP transport from configuration.

mod backend;
mod recording;
mod smtp;

use std::sync::Arc;

use crate::config::SmtpConfig;

pub use backend::{MailTransport, OutgoingMessage, TransportError};
pub use recording::RecordingTransport;
pub use smtp::SmtpTransport;

/// Create the default transport from SMTP settings.
///
/// # Example
///
/// ```rust,ignore
/// let transport = create_transport(&settings.smtp)?;
/// ```
pub fn create_transport(config: &SmtpConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
    Ok(Arc::new(SmtpTransport::new(config)?))
}
