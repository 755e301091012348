//! Send orchestration.
//!
//! A [`Mailer`] resolves the recipient, merges global and default arguments,
//! compiles the template, hands the message to a transport and then notifies
//! the optional storage and event collaborators, in that order.

mod arguments;
mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::Settings;
use crate::error::{MailerError, Result};
use crate::events::{EmailSentEvent, EventPublisher};
use crate::metrics::SendMetrics;
use crate::recipient::{self, Recipient, ResolvedRecipient};
use crate::storage::EmailStore;
use crate::template::{Arguments, CompiledMessage, TemplateCompiler, TemplateStore};
use crate::transport::{create_transport, MailTransport, OutgoingMessage};

pub use arguments::{ArgumentProvider, ArgumentProviders};
pub use types::SendResult;

/// Argument filled with the recipient's address when the caller gave none
const EMAIL_KEY: &str = "email";
/// Argument filled with the recipient's display name when the caller gave none
const NAME_KEY: &str = "name";

/// Counters for the lifetime of a mailer
#[derive(Debug, Default)]
pub struct MailerStats {
    pub total_sent: AtomicU64,
    pub total_failed: AtomicU64,
    pub sent_to_test_transport: AtomicU64,
}

impl MailerStats {
    pub fn snapshot(&self) -> MailerStatsSnapshot {
        MailerStatsSnapshot {
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            sent_to_test_transport: self.sent_to_test_transport.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of mailer statistics
#[derive(Debug, Clone, Serialize)]
pub struct MailerStatsSnapshot {
    pub total_sent: u64,
    pub total_failed: u64,
    pub sent_to_test_transport: u64,
}

/// Sends templated email.
pub struct Mailer {
    compiler: TemplateCompiler,
    transport: Arc<dyn MailTransport>,
    test_transport: RwLock<Option<Arc<dyn MailTransport>>>,
    providers: ArgumentProviders,
    store: Option<Arc<dyn EmailStore>>,
    events: Option<Arc<dyn EventPublisher>>,
    stats: MailerStats,
}

impl Mailer {
    /// Create a mailer without storage or event collaborators
    pub fn new(compiler: TemplateCompiler, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            compiler,
            transport,
            test_transport: RwLock::new(None),
            providers: ArgumentProviders::new(),
            store: None,
            events: None,
            stats: MailerStats::default(),
        }
    }

    /// Build the template compiler and SMTP transport from settings.
    ///
    /// Storage and events need async setup and are attached separately with
    /// [`Mailer::with_store`] and [`Mailer::with_events`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = TemplateStore::new(settings.templates.dir.clone())
            .with_additional_css(settings.templates.additional_css.clone());
        let compiler = TemplateCompiler::new(store, settings.templates.subject_precedence);
        let transport = create_transport(&settings.smtp)?;

        tracing::info!(
            template_dir = %settings.templates.dir.display(),
            smtp_host = %settings.smtp.host,
            smtp_port = settings.smtp.port,
            "Mailer configured"
        );

        Ok(Self::new(compiler, transport))
    }

    pub fn with_store(mut self, store: Arc<dyn EmailStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Set the store (for deferred initialization)
    pub fn set_store(&mut self, store: Option<Arc<dyn EmailStore>>) {
        self.store = store;
    }

    /// Set the event publisher (for deferred initialization)
    pub fn set_events(&mut self, events: Option<Arc<dyn EventPublisher>>) {
        self.events = events;
    }

    pub fn compiler(&self) -> &TemplateCompiler {
        &self.compiler
    }

    pub fn providers(&self) -> &ArgumentProviders {
        &self.providers
    }

    pub fn stats(&self) -> MailerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Make `key` available to every template sent by this mailer.
    ///
    /// `provider` receives the caller's arguments and runs only when the
    /// caller did not pass `key` itself.
    pub fn register_global_argument<F>(&self, key: impl Into<String>, provider: F)
    where
        F: Fn(&Arguments) -> String + Send + Sync + 'static,
    {
        self.providers.register(key, provider);
    }

    /// Route every following send through `transport` instead of the default.
    pub async fn install_test_transport(&self, transport: Arc<dyn MailTransport>) {
        tracing::debug!(transport = transport.name(), "Installed test transport");
        *self.test_transport.write().await = Some(transport);
    }

    /// Restore the default transport. Returns the transport that was installed.
    pub async fn uninstall_test_transport(&self) -> Option<Arc<dyn MailTransport>> {
        let previous = self.test_transport.write().await.take();
        if previous.is_some() {
            tracing::debug!("Uninstalled test transport");
        }
        previous
    }

    pub async fn has_test_transport(&self) -> bool {
        self.test_transport.read().await.is_some()
    }

    /// Render `template_id` for `recipient` without sending anything.
    pub async fn compile(
        &self,
        recipient: impl Into<Recipient>,
        template_id: &str,
        arguments: Arguments,
    ) -> Result<CompiledMessage> {
        let recipient = recipient::resolve(&recipient.into())?;
        let arguments = self.prepare_arguments(&recipient, &arguments);
        Ok(self.compiler.compile(template_id, &arguments).await?)
    }

    /// Compile `template_id` and deliver it to `recipient`.
    ///
    /// On success the send is recorded in the store and published as an
    /// `email_sent` event when those are configured. The first failing step
    /// ends the send; nothing after it runs.
    #[tracing::instrument(name = "mailer.send", skip_all, fields(template_id = %template_id))]
    pub async fn send(
        &self,
        recipient: impl Into<Recipient>,
        template_id: &str,
        arguments: Arguments,
    ) -> Result<SendResult> {
        let recipient = recipient.into();

        match self.deliver(&recipient, template_id, arguments).await {
            Ok(result) => Ok(result),
            Err(err) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                SendMetrics::record_failed(err.stage());
                tracing::error!(
                    template_id = %template_id,
                    stage = err.stage(),
                    error = %err,
                    "Email send failed"
                );
                Err(err)
            }
        }
    }

    async fn deliver(
        &self,
        recipient: &Recipient,
        template_id: &str,
        arguments: Arguments,
    ) -> Result<SendResult> {
        let recipient = recipient::resolve(recipient)?;
        let arguments = self.prepare_arguments(&recipient, &arguments);

        let compiled = self.compiler.compile(template_id, &arguments).await?;
        tracing::debug!(
            subject = %compiled.subject,
            has_text = compiled.text.is_some(),
            has_html = compiled.html.is_some(),
            "Compiled email template"
        );

        let message = OutgoingMessage {
            to_email: recipient.email.clone(),
            to_name: recipient.name.clone(),
            subject: compiled.subject,
            text: compiled.text.unwrap_or_default(),
            html: compiled.html,
        };

        let (transport, is_test) = self.active_transport().await;
        let message_id = transport.send(&message).await?;

        self.stats.total_sent.fetch_add(1, Ordering::Relaxed);
        if is_test {
            self.stats
                .sent_to_test_transport
                .fetch_add(1, Ordering::Relaxed);
        }
        SendMetrics::record_sent(template_id);

        tracing::info!(
            to = %message.to_email,
            template_id = %template_id,
            message_id = %message_id,
            transport = transport.name(),
            "Email sent"
        );

        let result = SendResult {
            recipient_id: recipient.id,
            recipient_name: recipient.name,
            recipient_email: recipient.email,
            subject: message.subject,
            template_id: template_id.to_string(),
            arguments,
            message_id,
            sent_at: Utc::now(),
        };

        if let Some(ref store) = self.store {
            let record_id = store.record(&result).await.map_err(|e| {
                SendMetrics::record_collaborator_error("storage");
                MailerError::from(e)
            })?;
            tracing::debug!(record_id = %record_id, backend = store.name(), "Recorded sent email");
        }

        if let Some(ref events) = self.events {
            events
                .publish(&EmailSentEvent::new(result.clone()))
                .await
                .map_err(|e| {
                    SendMetrics::record_collaborator_error("event");
                    MailerError::from(e)
                })?;
        }

        Ok(result)
    }

    /// Caller arguments, then global providers, then recipient defaults.
    fn prepare_arguments(&self, recipient: &ResolvedRecipient, arguments: &Arguments) -> Arguments {
        let mut merged = self.providers.merge(arguments);
        merged
            .entry(EMAIL_KEY.to_string())
            .or_insert_with(|| recipient.email.clone());
        merged
            .entry(NAME_KEY.to_string())
            .or_insert_with(|| recipient.name.clone());
        merged
    }

    async fn active_transport(&self) -> (Arc<dyn MailTransport>, bool) {
        match self.test_transport.read().await.as_ref() {
            Some(transport) => (transport.clone(), true),
            None => (self.transport.clone(), false),
        }
    }
}
