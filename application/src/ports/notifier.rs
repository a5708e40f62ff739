//! Notification port
//!
//! A fire-and-forget sink for user-visible announcements: generation
//! failures, safety valve pauses, phase changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How prominent a notice is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Port for user-visible notifications. No acknowledgment is expected.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// No-op notifier for tests and headless runs
pub struct NoNotifier;

impl Notifier for NoNotifier {
    fn notify(&self, _message: &str, _severity: Severity) {}
}
