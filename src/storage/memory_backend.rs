//! In-memory sent-email store.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::mailer::SendResult;

use super::backend::{EmailRecord, EmailStore, StorageError};

/// Keeps records in a `DashMap`; contents are lost on restart.
#[derive(Default)]
pub struct MemoryEmailStore {
    records: DashMap<Uuid, EmailRecord>,
}

impl MemoryEmailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<EmailRecord> {
        let mut records: Vec<EmailRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.created_at);
        records
    }

    pub fn get(&self, id: &Uuid) -> Option<EmailRecord> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl EmailStore for MemoryEmailStore {
    async fn record(&self, result: &SendResult) -> Result<Uuid, StorageError> {
        let record = EmailRecord::from_result(result)?;
        let id = record.id;
        self.records.insert(id, record);
        Ok(id)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result() -> SendResult {
        SendResult {
            recipient_id: Some("42".to_string()),
            recipient_name: "Al".to_string(),
            recipient_email: "a@b.com".to_string(),
            subject: "Hello".to_string(),
            template_id: "welcome".to_string(),
            arguments: [("name".to_string(), "Al".to_string())].into_iter().collect(),
            message_id: "<1@example.com>".to_string(),
            sent_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let store = MemoryEmailStore::new();
        assert!(store.is_empty());

        let id = store.record(&result()).await.unwrap();
        let record = store.get(&id).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(record.user_id.as_deref(), Some("42"));
        assert_eq!(record.to_email, "a@b.com");
        assert_eq!(record.template_id, "welcome");

        let arguments: serde_json::Value = serde_json::from_str(&record.arguments).unwrap();
        assert_eq!(arguments["name"], "Al");
    }

    #[tokio::test]
    async fn test_records_are_distinct() {
        let store = MemoryEmailStore::new();
        store.record(&result()).await.unwrap();
        store.record(&result()).await.unwrap();

        assert_eq!(store.records().len(), 2);
    }
}
