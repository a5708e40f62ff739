//! Notifier adapters

use agora_application::ports::notifier::{Notifier, Severity};
use tracing::{error, info, warn};

/// Routes user-facing notifications into the diagnostic log.
///
/// Used for headless runs where nobody watches a console.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(target: "agora::notice", "{}", message),
            Severity::Warning => warn!(target: "agora::notice", "{}", message),
            Severity::Error => error!(target: "agora::notice", "{}", message),
        }
    }
}
