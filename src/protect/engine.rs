//! The ordered provider chain.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::lopdf_provider::LopdfProvider;
use super::permissions::{EncryptionLevel, Permissions, ProtectionRequest};
use super::provider::{FailureSignal, ProtectionProvider};
use super::qpdf_provider::QpdfProvider;

/// Output of a successful encryption.
#[derive(Debug, Clone)]
pub struct EncryptOutcome {
    pub data: Vec<u8>,
    /// Name of the provider that did the work
    pub provider: String,
    pub owner_password: String,
    pub level: EncryptionLevel,
    pub permissions: Permissions,
}

/// What decryption did to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecryptStatus {
    Decrypted,
    /// The input was not encrypted and is returned unchanged
    NotEncrypted,
}

/// Output of a successful decryption.
#[derive(Debug, Clone)]
pub struct DecryptOutcome {
    pub data: Vec<u8>,
    pub status: DecryptStatus,
    pub provider: Option<String>,
}

/// Encrypts and decrypts through an ordered list of providers.
///
/// The first success wins. An authentication failure stops the chain and is
/// reported as [`Error::Password`]; any other failure moves on to the next
/// provider.
pub struct ProtectionEngine {
    providers: Vec<Box<dyn ProtectionProvider>>,
}

impl Default for ProtectionEngine {
    /// `lopdf` first, then `qpdf`.
    fn default() -> Self {
        Self::with_providers(vec![
            Box::new(LopdfProvider::new()),
            Box::new(QpdfProvider::default()),
        ])
    }
}

impl ProtectionEngine {
    pub fn with_providers(providers: Vec<Box<dyn ProtectionProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Encrypt a PDF with the first provider able to do it.
    pub fn encrypt(&self, input: &[u8], request: &ProtectionRequest) -> Result<EncryptOutcome> {
        check_pdf(input)?;
        if super::is_encrypted(input) {
            return Err(Error::Input(
                "document is already encrypted; decrypt it first".to_string(),
            ));
        }

        let level = request.encryption_level;
        let owner_password = request.owner_password();
        let mut failures = Vec::new();

        for provider in self.providers.iter().filter(|p| p.supports_encryption(level)) {
            log::debug!("encrypting with {} ({})", provider.name(), level);
            match provider.encrypt(input, request, &owner_password) {
                Ok(data) => {
                    log::info!("encrypted with {} at {}", provider.name(), level);
                    return Ok(EncryptOutcome {
                        data,
                        provider: provider.name().to_string(),
                        owner_password,
                        level,
                        permissions: request.permissions,
                    });
                }
                Err(FailureSignal::AuthFailure(message)) => {
                    return Err(Error::Password(format!("{}: {}", provider.name(), message)));
                }
                Err(signal) => {
                    log::warn!("{} could not encrypt: {}", provider.name(), signal);
                    failures.push(format!("{}: {}", provider.name(), signal));
                }
            }
        }

        if failures.is_empty() {
            return Err(Error::LibraryLimitation(format!(
                "no provider supports {} encryption",
                level
            )));
        }
        Err(Error::LibraryLimitation(format!(
            "no provider could encrypt at {} ({})",
            level,
            failures.join("; ")
        )))
    }

    /// Remove encryption from a PDF.
    ///
    /// Plain documents come back unchanged.
    pub fn decrypt(&self, input: &[u8], password: &str) -> Result<DecryptOutcome> {
        check_pdf(input)?;
        if !super::is_encrypted(input) {
            log::debug!("document is not encrypted; returning it unchanged");
            return Ok(DecryptOutcome {
                data: input.to_vec(),
                status: DecryptStatus::NotEncrypted,
                provider: None,
            });
        }

        let mut failures = Vec::new();
        for provider in &self.providers {
            log::debug!("decrypting with {}", provider.name());
            match provider.decrypt(input, password) {
                Ok(data) => {
                    log::info!("decrypted with {}", provider.name());
                    return Ok(DecryptOutcome {
                        data,
                        status: DecryptStatus::Decrypted,
                        provider: Some(provider.name().to_string()),
                    });
                }
                Err(FailureSignal::AuthFailure(message)) => {
                    return Err(Error::Password(format!("{}: {}", provider.name(), message)));
                }
                Err(signal) => {
                    log::warn!("{} could not decrypt: {}", provider.name(), signal);
                    failures.push(format!("{}: {}", provider.name(), signal));
                }
            }
        }

        Err(Error::LibraryLimitation(if failures.is_empty() {
            "document is encrypted and no decryption provider is configured".to_string()
        } else {
            format!(
                "document is encrypted and no provider could decrypt it ({})",
                failures.join("; ")
            )
        }))
    }
}

fn check_pdf(input: &[u8]) -> Result<()> {
    crate::detect::detect_format_from_bytes(input).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::testing::sample_pdf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A provider that replays a fixed answer and counts calls.
    struct Scripted {
        name: &'static str,
        answer: std::result::Result<Vec<u8>, FailureSignal>,
        encrypts: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn boxed(
            name: &'static str,
            answer: std::result::Result<Vec<u8>, FailureSignal>,
        ) -> (Box<dyn ProtectionProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Scripted {
                name,
                answer,
                encrypts: true,
                calls: calls.clone(),
            };
            (Box::new(provider), calls)
        }
    }

    impl ProtectionProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn supports_encryption(&self, _level: EncryptionLevel) -> bool {
            self.encrypts
        }

        fn encrypt(&self, _: &[u8], _: &ProtectionRequest, _: &str) -> super::super::provider::Attempt {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }

        fn decrypt(&self, _: &[u8], _: &str) -> super::super::provider::Attempt {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    /// A PDF with a real security handler in its trailer.
    fn encrypted_looking() -> Vec<u8> {
        let request = ProtectionRequest::new("pw").with_level(EncryptionLevel::Rc4_128);
        LopdfProvider::new()
            .encrypt(&sample_pdf(1, "locked"), &request, &request.owner_password())
            .unwrap()
    }

    #[test]
    fn test_first_success_wins() {
        let (first, first_calls) = Scripted::boxed("first", Err(FailureSignal::Unsupported("no".into())));
        let (second, second_calls) = Scripted::boxed("second", Ok(b"%PDF-plain".to_vec()));
        let (third, third_calls) = Scripted::boxed("third", Ok(b"unused".to_vec()));
        let engine = ProtectionEngine::with_providers(vec![first, second, third]);

        let outcome = engine.decrypt(&encrypted_looking(), "pw").unwrap();
        assert_eq!(outcome.data, b"%PDF-plain");
        assert_eq!(outcome.provider.as_deref(), Some("second"));
        assert_eq!(outcome.status, DecryptStatus::Decrypted);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_auth_failure_stops_chain() {
        let (first, _) = Scripted::boxed("first", Err(FailureSignal::AuthFailure("wrong".into())));
        let (second, second_calls) = Scripted::boxed("second", Ok(b"x".to_vec()));
        let engine = ProtectionEngine::with_providers(vec![first, second]);

        let err = engine.decrypt(&encrypted_looking(), "bad").unwrap_err();
        assert!(matches!(err, Error::Password(_)));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsupported_never_becomes_password_error() {
        let (first, _) = Scripted::boxed("first", Err(FailureSignal::Unsupported("no".into())));
        let (second, _) = Scripted::boxed("second", Err(FailureSignal::Other("crashed".into())));
        let engine = ProtectionEngine::with_providers(vec![first, second]);

        let err = engine.decrypt(&encrypted_looking(), "pw").unwrap_err();
        assert!(matches!(err, Error::LibraryLimitation(_)));
        assert!(err.message().contains("crashed"));
    }

    #[test]
    fn test_plain_document_passes_through() {
        let (first, calls) = Scripted::boxed("first", Err(FailureSignal::AuthFailure("x".into())));
        let engine = ProtectionEngine::with_providers(vec![first]);
        let plain = sample_pdf(2, "plain");

        let outcome = engine.decrypt(&plain, "whatever").unwrap();
        assert_eq!(outcome.status, DecryptStatus::NotEncrypted);
        assert_eq!(outcome.data, plain);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_encrypt_without_capable_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let incapable = Scripted {
            name: "incapable",
            answer: Ok(Vec::new()),
            encrypts: false,
            calls: calls.clone(),
        };
        let engine = ProtectionEngine::with_providers(vec![Box::new(incapable)]);

        let err = engine
            .encrypt(&sample_pdf(1, "x"), &ProtectionRequest::new("pw"))
            .unwrap_err();
        assert!(matches!(err, Error::LibraryLimitation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_encrypt_reports_provider_and_owner_password() {
        let (provider, _) = Scripted::boxed("native", Ok(b"%PDF-locked".to_vec()));
        let engine = ProtectionEngine::with_providers(vec![provider]);
        let request = ProtectionRequest::new("pw").with_level(EncryptionLevel::Rc4_128);

        let outcome = engine.encrypt(&sample_pdf(1, "x"), &request).unwrap();
        assert_eq!(outcome.provider, "native");
        assert_eq!(outcome.level, EncryptionLevel::Rc4_128);
        assert_ne!(outcome.owner_password, "pw");
    }

    #[test]
    fn test_rejects_non_pdf_input() {
        let engine = ProtectionEngine::with_providers(Vec::new());
        assert!(matches!(engine.decrypt(b"hello", "pw"), Err(Error::Input(_))));
        assert!(matches!(
            engine.encrypt(b"hello", &ProtectionRequest::new("pw")),
            Err(Error::Input(_))
        ));
    }

    #[test]
    fn test_default_order() {
        assert_eq!(ProtectionEngine::default().provider_names(), vec!["lopdf", "qpdf"]);
    }
}
