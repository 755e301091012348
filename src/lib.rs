// Infrastructure layer (shared components)
pub mod infrastructure;

// Re-export infrastructure modules at the crate root
pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Core
pub mod recipient;
pub mod template;
pub mod transport;

// Collaborators notified after a send
pub mod events;
pub mod storage;

// Orchestration
pub mod mailer;

pub use error::{MailerError, Result};
pub use mailer::{Mailer, SendResult};
pub use recipient::{Addressee, Contact, Recipient};
pub use template::Arguments;
