//! Prometheus metrics for the mailer.
//!
//! - Sent emails by template
//! - Failed sends by pipeline stage
//! - Template compilation latency
//! - Collaborator (storage / event) errors

mod helpers;

pub use helpers::{encode_metrics, SendMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "mailer";

lazy_static! {
    /// Total emails handed to the transport successfully, by template
    pub static ref EMAILS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_emails_sent_total", METRIC_PREFIX),
        "Total emails sent",
        &["template"]
    ).unwrap();

    /// Total failed sends, by the stage that failed
    pub static ref EMAILS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_emails_failed_total", METRIC_PREFIX),
        "Total email sends that failed",
        &["stage"]
    ).unwrap();

    /// Time spent loading and compiling a template
    pub static ref TEMPLATE_COMPILE_SECONDS: Histogram = register_histogram!(
        format!("{}_template_compile_seconds", METRIC_PREFIX),
        "Template compilation latency in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]
    ).unwrap();

    /// Errors raised by downstream collaborators
    pub static ref COLLABORATOR_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_collaborator_errors_total", METRIC_PREFIX),
        "Errors from storage and event collaborators",
        &["collaborator"]
    ).unwrap();
}
