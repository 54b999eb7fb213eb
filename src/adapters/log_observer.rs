//! Session observer that only logs.

use crate::traits::{SessionObserver, SignInTarget};

/// [`SessionObserver`] writing notices and redirects to the log.
///
/// Used when no interactive surface is attached, e.g. by the command-line
/// driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn notify_error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn sign_in_required(&self, target: SignInTarget) {
        match target {
            SignInTarget::Console => tracing::warn!("Sign-in required"),
            SignInTarget::WebApp { message, status } => tracing::warn!(
                "Web app sign-in required{}{}",
                status.map(|s| format!(" ({})", s)).unwrap_or_default(),
                message.map(|m| format!(": {}", m)).unwrap_or_default()
            ),
            SignInTarget::Reload => tracing::warn!("Session was logged out, reload required"),
            SignInTarget::Init => tracing::warn!("Instance is not initialised"),
            SignInTarget::Install => tracing::warn!("Instance is not installed"),
        }
    }
}
