mod settings;

pub use settings::{
    DatabaseConfig, EventsConfig, Settings, SmtpConfig, SmtpTls, TemplateConfig,
};
