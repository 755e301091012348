//! Backend trait for sent-email persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::mailer::SendResult;

/// Errors that can occur while recording a sent email.
#[derive(Debug, Error)]
pub enum StorageError {
    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Arguments could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One row of the `emails` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub template_id: String,
    /// JSON object of the merged arguments
    pub arguments: String,
    pub message_id: String,
    pub created_at: DateTime<Utc>,
}

impl EmailRecord {
    /// Build a new row from a send result.
    pub fn from_result(result: &SendResult) -> Result<Self, StorageError> {
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: result.recipient_id.clone(),
            to_name: result.recipient_name.clone(),
            to_email: result.recipient_email.clone(),
            subject: result.subject.clone(),
            template_id: result.template_id.clone(),
            arguments: serde_json::to_string(&result.arguments)?,
            message_id: result.message_id.clone(),
            created_at: result.sent_at,
        })
    }
}

/// Storage for records of sent emails.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Persist `result`, returning the id of the new record.
    async fn record(&self, result: &SendResult) -> Result<Uuid, StorageError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
