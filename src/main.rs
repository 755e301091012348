use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ara_mailer::config::Settings;
use ara_mailer::events::create_event_publisher;
use ara_mailer::postgres::PostgresPool;
use ara_mailer::storage::create_email_store;
use ara_mailer::{Arguments, Mailer};

const USAGE: &str = "usage: mailer-send <recipient> <template_id> [key=value ...]";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let (recipient, template_id, arguments) = parse_args(std::env::args().skip(1))?;

    // Load configuration
    let settings = Settings::new()?;
    tracing::info!("Configuration loaded");

    let mut mailer = Mailer::from_settings(&settings)?;

    // Optional sent-email storage
    let pool = match settings.database {
        Some(ref database) => {
            let pool = PostgresPool::new(database).await?;
            pool.ping().await?;
            Some(pool)
        }
        None => None,
    };
    mailer.set_store(create_email_store(pool.as_ref()).await?);
    mailer.set_events(create_event_publisher(&settings.events)?);

    let result = mailer
        .send(recipient.as_str(), &template_id, arguments)
        .await
        .with_context(|| format!("sending '{}' to {}", template_id, recipient))?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(pool) = pool {
        pool.close().await;
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(String, String, Arguments)> {
    let (Some(recipient), Some(template_id)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };

    let mut arguments = Arguments::new();
    for pair in args {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid argument '{}', expected key=value\n{}", pair, USAGE);
        };
        arguments.insert(key.to_string(), value.to_string());
    }

    Ok((recipient, template_id, arguments))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout carries only the send result
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_args() {
        let (recipient, template_id, arguments) =
            parse_args(strings(&["a@b.com", "welcome", "code=4=2", "name=Al"])).unwrap();
        assert_eq!(recipient, "a@b.com");
        assert_eq!(template_id, "welcome");
        assert_eq!(arguments.get("code").map(String::as_str), Some("4=2"));
        assert_eq!(arguments.get("name").map(String::as_str), Some("Al"));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(strings(&["a@b.com"])).is_err());
        assert!(parse_args(strings(&["a@b.com", "welcome", "novalue"])).is_err());
    }
}
