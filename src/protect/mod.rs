//! Encryption and decryption through pluggable providers.

mod engine;
mod lopdf_provider;
mod permissions;
mod provider;
mod qpdf_provider;

pub use engine::{DecryptOutcome, DecryptStatus, EncryptOutcome, ProtectionEngine};
pub use lopdf_provider::LopdfProvider;
pub use permissions::{EncryptionLevel, Permissions, PrintTier, ProtectionRequest};
pub use provider::{Attempt, FailureSignal, ProtectionProvider};
pub use qpdf_provider::QpdfProvider;

use lopdf::Document as LopdfDocument;

/// Whether a PDF carries a security handler.
///
/// Decided by the parsed trailer. Files `lopdf` opened with the empty user
/// password still count as encrypted; unreadable input does not.
pub fn is_encrypted(data: &[u8]) -> bool {
    match LopdfDocument::load_mem(data) {
        Ok(doc) => doc.trailer.get(b"Encrypt").is_ok(),
        Err(lopdf::Error::Decryption(_)) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::testing::{sample_pdf, sample_pdf_uncompressed};

    #[test]
    fn test_is_encrypted() {
        let plain = sample_pdf(1, "plain");
        assert!(!is_encrypted(&plain));

        let request = ProtectionRequest::new("").with_level(EncryptionLevel::Rc4_40);
        let locked = LopdfProvider::new().encrypt(&plain, &request, "owner").unwrap();
        assert!(is_encrypted(&locked));
    }

    #[test]
    fn test_encrypt_key_in_content_is_not_a_handler() {
        let plain = sample_pdf_uncompressed(2, "see /Encrypt in the trailer");
        assert!(plain.windows(8).any(|w| w == b"/Encrypt"));
        assert!(!is_encrypted(&plain));

        let request = ProtectionRequest::new("pw").with_level(EncryptionLevel::Rc4_128);
        let locked = LopdfProvider::new()
            .encrypt(&plain, &request, &request.owner_password())
            .unwrap();
        assert!(is_encrypted(&locked));
    }

    #[test]
    fn test_unreadable_input_is_not_encrypted() {
        assert!(!is_encrypted(b"not a pdf"));
        assert!(!is_encrypted(b"trailer << /Encrypt 5 0 R >>"));
    }
}
