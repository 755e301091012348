//! Send result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::template::Arguments;

/// Record of a completed send.
///
/// Returned to the caller and handed to the storage and event collaborators;
/// the mailer keeps no copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    /// Identifier of the recipient, when it was addressed as a principal
    pub recipient_id: Option<String>,

    pub recipient_name: String,

    pub recipient_email: String,

    /// Compiled subject as sent
    pub subject: String,

    pub template_id: String,

    /// Arguments after global and default values were merged in
    pub arguments: Arguments,

    /// Identifier assigned by the transport
    pub message_id: String,

    pub sent_at: DateTime<Utc>,
}
