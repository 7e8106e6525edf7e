//! Mock credential verifier for tests and demo data.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use examdesk_core::traits::CredentialVerifier;

const MOCK_PREFIX: &str = "$mock$";

/// A reversible, insecure verifier: `hash_password("pw")` is `"$mock$pw"`.
///
/// Seed files written for this verifier can store readable credentials.
/// Never use it outside tests and demos.
#[derive(Debug, Default)]
pub struct MockVerifier {
    /// Number of `verify_password` calls made.
    verify_count: AtomicU32,
    /// Plaintext of the last verification attempt.
    last_attempt: Mutex<Option<String>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of verification calls made.
    pub fn verify_count(&self) -> u32 {
        self.verify_count.load(Ordering::Relaxed)
    }

    /// Get the plaintext of the last verification attempt.
    pub fn last_attempt(&self) -> Option<String> {
        self.last_attempt
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl CredentialVerifier for MockVerifier {
    fn hash_password(&self, plain: &str) -> String {
        format!("{MOCK_PREFIX}{plain}")
    }

    fn verify_password(&self, plain: &str, stored: &str) -> bool {
        self.verify_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_attempt
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(plain.to_string());

        stored
            .strip_prefix(MOCK_PREFIX)
            .is_some_and(|expected| expected == plain)
    }
}
