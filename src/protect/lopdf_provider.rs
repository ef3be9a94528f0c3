//! Native provider backed by `lopdf`'s security handler.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lopdf::encryption::crypt_filters::{Aes128CryptFilter, CryptFilter};
use lopdf::encryption::{DecryptionError, EncryptionState, EncryptionVersion, Permissions as PdfPermissions};
use lopdf::{Document as LopdfDocument, Object, StringFormat};

use super::permissions::{EncryptionLevel, Permissions, PrintTier, ProtectionRequest};
use super::provider::{Attempt, FailureSignal, ProtectionProvider};

/// Encrypts with RC4 (40/128-bit) and AES-128, decrypts what `lopdf` can open.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfProvider;

impl LopdfProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ProtectionProvider for LopdfProvider {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn supports_encryption(&self, level: EncryptionLevel) -> bool {
        !matches!(level, EncryptionLevel::Aes256)
    }

    fn encrypt(&self, input: &[u8], request: &ProtectionRequest, owner_password: &str) -> Attempt {
        let mut doc = LopdfDocument::load_mem(input).map_err(|e| FailureSignal::Other(e.to_string()))?;
        ensure_file_id(&mut doc, input);

        let permissions = pdf_permissions(&request.permissions);
        let user_password = request.password.as_str();
        let version = match request.encryption_level {
            EncryptionLevel::Rc4_40 => EncryptionVersion::V1 {
                document: &doc,
                owner_password,
                user_password,
                permissions,
            },
            EncryptionLevel::Rc4_128 => EncryptionVersion::V2 {
                document: &doc,
                owner_password,
                user_password,
                key_length: 128,
                permissions,
            },
            EncryptionLevel::Aes128 => {
                let filter: Arc<dyn CryptFilter> = Arc::new(Aes128CryptFilter);
                let mut crypt_filters = BTreeMap::new();
                crypt_filters.insert(b"StdCF".to_vec(), filter);
                EncryptionVersion::V4 {
                    document: &doc,
                    encrypt_metadata: true,
                    crypt_filters,
                    stream_filter: b"StdCF".to_vec(),
                    string_filter: b"StdCF".to_vec(),
                    owner_password,
                    user_password,
                    permissions,
                }
            }
            EncryptionLevel::Aes256 => {
                return Err(FailureSignal::Unsupported(
                    "AES-256 is not available in the native provider".to_string(),
                ))
            }
        };

        let state = EncryptionState::try_from(version)
            .map_err(|e| FailureSignal::Other(format!("cannot set up encryption: {}", e)))?;
        doc.encrypt(&state)
            .map_err(|e| FailureSignal::Other(format!("encryption failed: {}", e)))?;

        save(&mut doc)
    }

    fn decrypt(&self, input: &[u8], password: &str) -> Attempt {
        let doc = match LopdfDocument::load_mem(input) {
            Ok(doc) => doc,
            Err(lopdf::Error::Decryption(e)) => {
                return Err(FailureSignal::Unsupported(format!(
                    "cannot open the encrypted file: {}",
                    e
                )))
            }
            Err(e) => return Err(FailureSignal::Other(e.to_string())),
        };

        if !doc.is_encrypted() {
            return Err(FailureSignal::Unsupported("document is not encrypted".to_string()));
        }

        // The loader only decrypts files that open with the empty user
        // password; anything else arrives without its object graph.
        if doc.encryption_state.is_none() {
            return match doc.authenticate_password(password) {
                Err(lopdf::Error::Decryption(DecryptionError::IncorrectPassword)) => {
                    Err(FailureSignal::AuthFailure("incorrect password".to_string()))
                }
                Err(e) => Err(FailureSignal::Unsupported(e.to_string())),
                Ok(()) => Err(FailureSignal::Unsupported(
                    "password accepted but objects of a user-password file cannot be loaded"
                        .to_string(),
                )),
            };
        }

        let expected = declared_page_count(&doc)
            .ok_or_else(|| FailureSignal::Unsupported("page tree is missing after decryption".to_string()))?;

        let mut plain = without_security_handler(doc);
        let output = save(&mut plain)?;

        let written = LopdfDocument::load_mem(&output)
            .map(|doc| doc.get_pages().len())
            .map_err(|e| FailureSignal::Other(format!("decrypted output does not load: {}", e)))?;
        if written != expected {
            return Err(FailureSignal::Unsupported(format!(
                "decrypted output has {} of {} pages",
                written, expected
            )));
        }
        Ok(output)
    }
}

/// `/Count` of the root page tree node.
fn declared_page_count(doc: &LopdfDocument) -> Option<usize> {
    let pages_id = doc.catalog().ok()?.get(b"Pages").ok()?.as_reference().ok()?;
    let count = doc.get_dictionary(pages_id).ok()?.get(b"Count").ok()?.as_i64().ok()?;
    usize::try_from(count).ok()
}

/// Copy the object graph into a fresh document with no `/Encrypt` entry.
fn without_security_handler(mut doc: LopdfDocument) -> LopdfDocument {
    let mut plain = LopdfDocument::with_version(doc.version.clone());
    plain.objects = std::mem::take(&mut doc.objects);
    plain.trailer = doc.trailer.clone();
    plain.trailer.remove(b"Encrypt");
    plain.max_id = doc.max_id;
    plain.prune_objects();
    plain
}

fn save(doc: &mut LopdfDocument) -> Attempt {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| FailureSignal::Other(format!("cannot write PDF: {}", e)))?;
    Ok(output)
}

/// Key derivation needs the first element of the trailer `/ID`.
fn ensure_file_id(doc: &mut LopdfDocument, input: &[u8]) {
    if doc.trailer.get(b"ID").is_ok() {
        return;
    }
    let mut id = Vec::with_capacity(16);
    for salt in [0u64, 1] {
        let mut hasher = DefaultHasher::new();
        salt.hash(&mut hasher);
        input.hash(&mut hasher);
        chrono::Utc::now().timestamp_nanos_opt().hash(&mut hasher);
        id.extend_from_slice(&hasher.finish().to_be_bytes());
    }
    let id = Object::String(id, StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![id.clone(), id]);
}

fn pdf_permissions(permissions: &Permissions) -> PdfPermissions {
    let mut flags = PdfPermissions::empty();
    match permissions.print_tier() {
        PrintTier::None => {}
        PrintTier::Restricted => flags |= PdfPermissions::PRINTABLE,
        PrintTier::Full => {
            flags |= PdfPermissions::PRINTABLE | PdfPermissions::PRINTABLE_IN_HIGH_QUALITY
        }
    }
    let mapping = [
        (permissions.copying, PdfPermissions::COPYABLE),
        (permissions.modifying, PdfPermissions::MODIFIABLE),
        (permissions.annotating, PdfPermissions::ANNOTABLE),
        (permissions.filling_forms, PdfPermissions::FILLABLE),
        (permissions.content_extraction, PdfPermissions::COPYABLE_FOR_ACCESSIBILITY),
        (permissions.document_assembly, PdfPermissions::ASSEMBLABLE),
    ];
    for (granted, flag) in mapping {
        if granted {
            flags |= flag;
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::testing::sample_pdf;

    #[test]
    fn test_permission_mapping() {
        let flags = pdf_permissions(&Permissions::all());
        assert!(flags.contains(PdfPermissions::PRINTABLE_IN_HIGH_QUALITY));
        assert!(flags.contains(PdfPermissions::ASSEMBLABLE));

        let mut restricted = Permissions::none();
        restricted.printing = true;
        let flags = pdf_permissions(&restricted);
        assert!(flags.contains(PdfPermissions::PRINTABLE));
        assert!(!flags.contains(PdfPermissions::PRINTABLE_IN_HIGH_QUALITY));
        assert!(!flags.contains(PdfPermissions::COPYABLE));

        assert!(pdf_permissions(&Permissions::none()).is_empty());
    }

    #[test]
    fn test_encrypt_marks_document() {
        let provider = LopdfProvider::new();
        let request = ProtectionRequest::new("open-sesame").with_level(EncryptionLevel::Rc4_128);
        let encrypted = provider
            .encrypt(&sample_pdf(2, "vault"), &request, &request.owner_password())
            .unwrap();
        assert!(super::super::is_encrypted(&encrypted));
    }

    #[test]
    fn test_aes256_is_unsupported() {
        let provider = LopdfProvider::new();
        assert!(!provider.supports_encryption(EncryptionLevel::Aes256));
        let request = ProtectionRequest::new("pw").with_level(EncryptionLevel::Aes256);
        let result = provider.encrypt(&sample_pdf(1, "x"), &request, "owner");
        assert!(matches!(result, Err(FailureSignal::Unsupported(_))));
    }

    #[test]
    fn test_decrypt_plain_document_is_unsupported() {
        let result = LopdfProvider::new().decrypt(&sample_pdf(1, "plain"), "pw");
        assert!(matches!(result, Err(FailureSignal::Unsupported(_))));
    }

    #[test]
    fn test_decrypt_garbage_is_other() {
        let result = LopdfProvider::new().decrypt(b"garbage", "pw");
        assert!(matches!(result, Err(FailureSignal::Other(_))));
    }

    #[test]
    fn test_owner_only_round_trip() {
        let provider = LopdfProvider::new();
        let request = ProtectionRequest::new("").with_level(EncryptionLevel::Aes128);
        let encrypted = provider
            .encrypt(&sample_pdf(3, "owner-only"), &request, "owner-secret")
            .unwrap();

        let decrypted = provider.decrypt(&encrypted, "").unwrap();
        assert!(!super::super::is_encrypted(&decrypted));
        let doc = LopdfDocument::load_mem(&decrypted).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        let pages = pdf_extract::extract_text_from_mem_by_pages(&decrypted).unwrap();
        assert!(pages[2].contains("owner-only page 3"));
    }

    #[test]
    fn test_owner_only_rc4_text_survives() {
        let provider = LopdfProvider::new();
        let request = ProtectionRequest::new("").with_level(EncryptionLevel::Rc4_128);
        let encrypted = provider
            .encrypt(&sample_pdf(2, "stream"), &request, "owner-secret")
            .unwrap();

        let decrypted = provider.decrypt(&encrypted, "").unwrap();
        let pages = pdf_extract::extract_text_from_mem_by_pages(&decrypted).unwrap();
        assert!(pages[0].contains("stream page 1"));
        assert!(pages[1].contains("stream page 2"));
    }

    #[test]
    fn test_user_password_checked_then_escalated() {
        let provider = LopdfProvider::new();
        for level in [EncryptionLevel::Rc4_40, EncryptionLevel::Rc4_128, EncryptionLevel::Aes128] {
            let request = ProtectionRequest::new("s3cret").with_level(level);
            let encrypted = provider
                .encrypt(&sample_pdf(2, "locked"), &request, &request.owner_password())
                .unwrap();

            let wrong = provider.decrypt(&encrypted, "guess");
            assert!(matches!(wrong, Err(FailureSignal::AuthFailure(_))), "{:?}", level);

            let right = provider.decrypt(&encrypted, "s3cret");
            assert!(matches!(right, Err(FailureSignal::Unsupported(_))), "{:?}", level);
        }
    }
}
