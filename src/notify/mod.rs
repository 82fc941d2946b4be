// src/notify/mod.rs
pub mod email;

use async_trait::async_trait;

pub use email::EmailSender;

/// Sends a finished report somewhere. Failures are logged by the implementation
/// and reported as `false`; the caller decides what a failed delivery means.
#[async_trait]
pub trait ReportDelivery: Send + Sync {
    async fn deliver(&self, report: &str) -> bool;
    fn name(&self) -> &'static str;
}

/// Log-only delivery for dry runs and disabled email.
#[derive(Debug, Default, Clone)]
pub struct LogDelivery;

#[async_trait]
impl ReportDelivery for LogDelivery {
    async fn deliver(&self, report: &str) -> bool {
        tracing::info!(
            target: "notify",
            chars = report.chars().count(),
            lines = report.lines().count(),
            "report delivery skipped (log only)"
        );
        true
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
