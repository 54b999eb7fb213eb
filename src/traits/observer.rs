//! Session-level side effects of request failures.
//!
//! The request layer never renders anything itself. User-facing notices and
//! sign-in redirects are forwarded to a [`SessionObserver`] supplied by the
//! embedding application.

/// Where the session has to go after an authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInTarget {
    /// Console sign-in page
    Console,
    /// Sign-in for a shared/public surface
    WebApp {
        message: Option<String>,
        status: Option<u16>,
    },
    /// Credentials were wiped server-side; reload the whole session
    Reload,
    /// Instance initialisation page
    Init,
    /// Instance installation page
    Install,
}

/// Receives user-facing consequences of request failures.
pub trait SessionObserver: Send + Sync {
    /// Show an error notice to the user.
    fn notify_error(&self, message: &str);

    /// Force the session to a sign-in (or setup) surface.
    fn sign_in_required(&self, target: SignInTarget);
}
