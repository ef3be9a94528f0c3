//! The capability-provider seam.

use std::fmt;

use super::permissions::{EncryptionLevel, ProtectionRequest};

/// Why a provider gave up.
///
/// Only [`FailureSignal::AuthFailure`] stops the chain; the other two let the
/// next provider try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureSignal {
    /// The password was checked and rejected.
    AuthFailure(String),
    /// The provider cannot perform this operation on this input.
    Unsupported(String),
    /// Anything else: malformed input, a tool that crashed, an I/O error.
    Other(String),
}

impl FailureSignal {
    pub fn message(&self) -> &str {
        match self {
            FailureSignal::AuthFailure(m) | FailureSignal::Unsupported(m) | FailureSignal::Other(m) => m,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, FailureSignal::AuthFailure(_))
    }
}

impl fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureSignal::AuthFailure(m) => write!(f, "authentication failed: {}", m),
            FailureSignal::Unsupported(m) => write!(f, "unsupported: {}", m),
            FailureSignal::Other(m) => f.write_str(m),
        }
    }
}

/// Result of one provider attempt.
pub type Attempt = std::result::Result<Vec<u8>, FailureSignal>;

/// A backend that can encrypt and/or decrypt PDF bytes.
pub trait ProtectionProvider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether the provider can encrypt at this level at all.
    fn supports_encryption(&self, level: EncryptionLevel) -> bool;

    /// Encrypt `input`, which is known to be an unencrypted PDF.
    fn encrypt(&self, input: &[u8], request: &ProtectionRequest, owner_password: &str) -> Attempt;

    /// Remove encryption from `input` using `password`.
    ///
    /// Must return [`FailureSignal::AuthFailure`] only when the password was
    /// actually checked and rejected.
    fn decrypt(&self, input: &[u8], password: &str) -> Attempt;
}
