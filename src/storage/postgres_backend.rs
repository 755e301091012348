//! PostgreSQL-backed sent-email store.
//!
//! Table structure:
//! - `emails` - one row per sent email, arguments stored as JSON text

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::mailer::SendResult;

use super::backend::{EmailRecord, EmailStore, StorageError};

const CREATE_EMAILS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS emails (
    id UUID PRIMARY KEY,
    user_id TEXT NULL,
    to_name TEXT NOT NULL,
    to_email TEXT NOT NULL,
    subject TEXT NOT NULL,
    template_id TEXT NOT NULL,
    arguments TEXT NOT NULL,
    message_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_EMAILS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_emails_user_id ON emails (user_id)";

/// Records sent emails in the `emails` table.
pub struct PostgresEmailStore {
    pool: PgPool,
}

impl PostgresEmailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `emails` table and its index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_EMAILS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_EMAILS_USER_INDEX)
            .execute(&self.pool)
            .await?;

        tracing::info!("Ensured emails table exists");
        Ok(())
    }
}

#[async_trait]
impl EmailStore for PostgresEmailStore {
    async fn record(&self, result: &SendResult) -> Result<Uuid, StorageError> {
        let record = EmailRecord::from_result(result)?;

        sqlx::query(
            r#"
            INSERT INTO emails (id, user_id, to_name, to_email, subject, template_id, arguments, message_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.to_name)
        .bind(&record.to_email)
        .bind(&record.subject)
        .bind(&record.template_id)
        .bind(&record.arguments)
        .bind(&record.message_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            record_id = %record.id,
            message_id = %record.message_id,
            "Recorded sent email in PostgreSQL"
        );

        Ok(record.id)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
