//! Recording session observer for testing.

use std::sync::{Arc, Mutex};

use crate::traits::{SessionObserver, SignInTarget};

/// [`SessionObserver`] that records every notice and redirect.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    errors: Arc<Mutex<Vec<String>>>,
    sign_ins: Arc<Mutex<Vec<SignInTarget>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error notices shown so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    /// Sign-in redirects requested so far.
    pub fn sign_ins(&self) -> Vec<SignInTarget> {
        self.sign_ins.lock().unwrap().clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn notify_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn sign_in_required(&self, target: SignInTarget) {
        self.sign_ins.lock().unwrap().push(target);
    }
}
