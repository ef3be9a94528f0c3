//! Integration tests for the protection chain.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pagesmith::protect::{
    is_encrypted, Attempt, DecryptStatus, FailureSignal, LopdfProvider, ProtectionProvider,
};
use pagesmith::{
    EncryptionLevel, ErrorKind, Pagesmith, Permissions, ProtectionEngine, ProtectionRequest,
};

/// Provider that replays a fixed answer and counts calls.
struct Fixed {
    name: &'static str,
    answer: Attempt,
    calls: Arc<AtomicUsize>,
}

impl Fixed {
    fn new(name: &'static str, answer: Attempt) -> (Box<dyn ProtectionProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Fixed {
            name,
            answer,
            calls: Arc::clone(&calls),
        };
        (Box::new(provider), calls)
    }
}

impl ProtectionProvider for Fixed {
    fn name(&self) -> &str {
        self.name
    }

    fn supports_encryption(&self, _level: EncryptionLevel) -> bool {
        true
    }

    fn encrypt(&self, _input: &[u8], _request: &ProtectionRequest, _owner: &str) -> Attempt {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }

    fn decrypt(&self, _input: &[u8], _password: &str) -> Attempt {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

fn lopdf_only() -> ProtectionEngine {
    ProtectionEngine::with_providers(vec![Box::new(LopdfProvider)])
}

fn protected() -> Vec<u8> {
    let request = ProtectionRequest::new("s3cret");
    lopdf_only()
        .encrypt(&common::pdf(2, "vault", &[]), &request)
        .unwrap()
        .data
}

#[test]
fn test_encrypt_decrypt_round_trip() {
    let source = common::pdf(2, "vault", &[]);
    let outcome = lopdf_only()
        .encrypt(&source, &ProtectionRequest::new(""))
        .unwrap();
    assert_eq!(outcome.provider, "lopdf");
    assert_eq!(outcome.level, EncryptionLevel::Aes128);
    assert!(is_encrypted(&outcome.data));

    let plain = lopdf_only().decrypt(&outcome.data, "").unwrap();
    assert_eq!(plain.status, DecryptStatus::Decrypted);
    assert!(!is_encrypted(&plain.data));
    assert_eq!(common::page_count(&plain.data), 2);

    let texts = common::page_texts(&plain.data);
    assert!(texts[0].contains("vault page 1"));
    assert!(texts[1].contains("vault page 2"));
}

#[test]
fn test_rc4_round_trip_keeps_text() {
    let request = ProtectionRequest::new("").with_level(EncryptionLevel::Rc4_128);
    let locked = lopdf_only()
        .encrypt(&common::pdf(3, "ledger", &[]), &request)
        .unwrap();

    let plain = lopdf_only().decrypt(&locked.data, "").unwrap();
    let texts = common::page_texts(&plain.data);
    assert_eq!(texts.len(), 3);
    assert!(texts[2].contains("ledger page 3"));
}

#[test]
fn test_user_password_needs_fallback_provider() {
    let outcome = lopdf_only()
        .encrypt(&common::pdf(2, "vault", &[]), &ProtectionRequest::new("s3cret"))
        .unwrap();
    assert!(outcome.owner_password.starts_with("s3cret_"));

    let err = lopdf_only().decrypt(&outcome.data, "s3cret").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LibraryLimitation);
    assert!(err.message().contains("lopdf"));
}

#[test]
fn test_wrong_password_is_password_error() {
    let err = lopdf_only().decrypt(&protected(), "guess").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PasswordError);
}

#[test]
fn test_encrypting_twice_is_rejected() {
    let err = lopdf_only()
        .encrypt(&protected(), &ProtectionRequest::new("again"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputError);
}

#[test]
fn test_unsupported_level_without_fallback() {
    let request = ProtectionRequest::new("pw").with_level(EncryptionLevel::Aes256);
    let err = lopdf_only()
        .encrypt(&common::pdf(1, "x", &[]), &request)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LibraryLimitation);
}

#[test]
fn test_chain_falls_through_to_next_provider() {
    let (first, first_calls) = Fixed::new("first", Err(FailureSignal::Unsupported("no".into())));
    let (second, second_calls) = Fixed::new("second", Ok(b"%PDF-1.7 done".to_vec()));
    let (third, third_calls) = Fixed::new("third", Ok(b"%PDF-1.7 unused".to_vec()));
    let engine = ProtectionEngine::with_providers(vec![first, second, third]);

    let outcome = engine.decrypt(&protected(), "pw").unwrap();
    assert_eq!(outcome.provider.as_deref(), Some("second"));
    assert_eq!(outcome.data, b"%PDF-1.7 done");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_auth_failure_stops_the_chain() {
    let (first, _) = Fixed::new("first", Err(FailureSignal::AuthFailure("bad".into())));
    let (second, second_calls) = Fixed::new("second", Ok(b"%PDF-1.7".to_vec()));
    let engine = ProtectionEngine::with_providers(vec![first, second]);

    let err = engine.decrypt(&protected(), "pw").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PasswordError);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_all_providers_failing_is_library_limitation() {
    let (first, _) = Fixed::new("first", Err(FailureSignal::Other("crashed".into())));
    let (second, _) = Fixed::new("second", Err(FailureSignal::Unsupported("no".into())));
    let engine = ProtectionEngine::with_providers(vec![first, second]);

    let err = engine.decrypt(&protected(), "pw").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LibraryLimitation);
    assert!(err.message().contains("crashed"));
}

#[test]
fn test_plain_document_skips_providers() {
    let (only, calls) = Fixed::new("only", Err(FailureSignal::Other("unreachable".into())));
    let engine = ProtectionEngine::with_providers(vec![only]);

    let source = common::pdf(1, "open", &[]);
    let outcome = engine.decrypt(&source, "pw").unwrap();
    assert_eq!(outcome.status, DecryptStatus::NotEncrypted);
    assert_eq!(outcome.data, source);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_facade_reports_granted_permissions() {
    let permissions = Permissions {
        copying: false,
        modifying: false,
        ..Permissions::all()
    };
    let request = ProtectionRequest::new("pw")
        .with_level(EncryptionLevel::Rc4_128)
        .with_permissions(permissions);
    let ops = Pagesmith::new().with_protection(lopdf_only());
    let produced = ops
        .encrypt(&common::pdf(1, "perm", &[]), &request, "perm.pdf")
        .unwrap();

    assert_eq!(produced.output.encrypted, Some(true));
    assert_eq!(produced.output.encryption_level, Some(EncryptionLevel::Rc4_128));
    let granted = produced.output.permissions.unwrap();
    assert!(!granted.iter().any(|p| p == "copying"));
    assert!(granted.iter().any(|p| p == "printing"));
}
