//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    COLLABORATOR_ERRORS_TOTAL, EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL, TEMPLATE_COMPILE_SECONDS,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording send pipeline metrics
pub struct SendMetrics;

impl SendMetrics {
    /// Record a message accepted by the transport
    pub fn record_sent(template_id: &str) {
        EMAILS_SENT_TOTAL.with_label_values(&[template_id]).inc();
    }

    /// Record a send that stopped at `stage`
    pub fn record_failed(stage: &str) {
        EMAILS_FAILED_TOTAL.with_label_values(&[stage]).inc();
    }

    /// Record how long template compilation took
    pub fn record_compile(elapsed: Duration) {
        TEMPLATE_COMPILE_SECONDS.observe(elapsed.as_secs_f64());
    }

    /// Record a storage or event collaborator error
    pub fn record_collaborator_error(collaborator: &str) {
        COLLABORATOR_ERRORS_TOTAL
            .with_label_values(&[collaborator])
            .inc();
    }
}
