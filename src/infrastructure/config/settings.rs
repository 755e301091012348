use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::template::SubjectPrecedence;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub templates: TemplateConfig,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding `<id>.txt`, `<id>.html`, `layout.html` and `layout.css`
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,
    /// Extra stylesheet appended after `layout.css` before inlining
    #[serde(default)]
    pub additional_css: Option<PathBuf>,
    /// Which source wins when both the text and HTML templates carry a subject
    #[serde(default)]
    pub subject_precedence: SubjectPrecedence,
}

/// Connection security used when talking to the SMTP relay.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS
    #[default]
    Starttls,
    /// Implicit TLS (SMTPS, usually port 465)
    Tls,
    /// No encryption (local relays such as Mailpit)
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub tls: SmtpTls,
    /// Authentication is skipped when empty
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from_email: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub bcc: Option<String>,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// "none", "memory" or "redis"
    #[serde(default = "default_events_backend")]
    pub backend: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_events_channel")]
    pub channel: String,
    /// Buffer size of the in-process broadcast bus
    #[serde(default = "default_events_capacity")]
    pub capacity: usize,
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("emails")
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u32 {
    10
}

fn default_idle_timeout() -> u32 {
    600 // 10 minutes
}

fn default_events_backend() -> String {
    "none".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_events_channel() -> String {
    "email_sent".to_string()
}

fn default_events_capacity() -> usize {
    256
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("templates.dir", "emails")?
            .set_default("smtp.host", "localhost")?
            .set_default("smtp.port", 587)?
            .set_default("events.backend", "none")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // MAILER_SMTP__HOST, MAILER_SMTP__FROM_EMAIL, MAILER_DATABASE__URL, etc.
            .add_source(
                Environment::with_prefix("MAILER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            additional_css: None,
            subject_precedence: SubjectPrecedence::default(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            backend: default_events_backend(),
            redis_url: default_redis_url(),
            channel: default_events_channel(),
            capacity: default_events_capacity(),
        }
    }
}

impl SmtpConfig {
    /// Minimal configuration pointing at `host` with the given sender.
    pub fn new(host: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_smtp_port(),
            tls: SmtpTls::default(),
            username: String::new(),
            password: String::new(),
            from_email: from_email.into(),
            from_name: None,
            reply_to: None,
            bcc: None,
            timeout_seconds: default_smtp_timeout(),
        }
    }
}
