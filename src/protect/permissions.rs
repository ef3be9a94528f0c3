//! Encryption requests and permission flags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Cipher and key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncryptionLevel {
    /// RC4, 40-bit key (PDF 1.1)
    Rc4_40,
    /// RC4, 128-bit key (PDF 1.4)
    Rc4_128,
    /// AES, 128-bit key (PDF 1.6)
    #[default]
    Aes128,
    /// AES, 256-bit key (PDF 2.0)
    Aes256,
}

impl EncryptionLevel {
    pub const ALL: [EncryptionLevel; 4] = [
        EncryptionLevel::Rc4_40,
        EncryptionLevel::Rc4_128,
        EncryptionLevel::Aes128,
        EncryptionLevel::Aes256,
    ];

    pub fn key_bits(&self) -> u16 {
        match self {
            EncryptionLevel::Rc4_40 => 40,
            EncryptionLevel::Rc4_128 | EncryptionLevel::Aes128 => 128,
            EncryptionLevel::Aes256 => 256,
        }
    }

    pub fn is_aes(&self) -> bool {
        matches!(self, EncryptionLevel::Aes128 | EncryptionLevel::Aes256)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionLevel::Rc4_40 => "rc4-40",
            EncryptionLevel::Rc4_128 => "rc4-128",
            EncryptionLevel::Aes128 => "aes-128",
            EncryptionLevel::Aes256 => "aes-256",
        }
    }
}

impl FromStr for EncryptionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match tag.as_str() {
            "rc440" | "40" => Ok(EncryptionLevel::Rc4_40),
            "rc4128" | "rc4" => Ok(EncryptionLevel::Rc4_128),
            "aes128" | "128" | "aes" => Ok(EncryptionLevel::Aes128),
            "aes256" | "256" => Ok(EncryptionLevel::Aes256),
            _ => Err(Error::Input(format!("unknown encryption level: {}", s))),
        }
    }
}

impl fmt::Display for EncryptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far printing is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintTier {
    None,
    /// Low resolution only
    Restricted,
    Full,
}

/// What a user opening the document with the user password may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub printing: bool,
    pub high_res_printing: bool,
    pub copying: bool,
    pub modifying: bool,
    pub annotating: bool,
    pub filling_forms: bool,
    pub content_extraction: bool,
    pub document_assembly: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            printing: true,
            high_res_printing: true,
            copying: true,
            modifying: true,
            annotating: true,
            filling_forms: true,
            content_extraction: true,
            document_assembly: true,
        }
    }

    pub fn none() -> Self {
        Self {
            printing: false,
            high_res_printing: false,
            copying: false,
            modifying: false,
            annotating: false,
            filling_forms: false,
            content_extraction: false,
            document_assembly: false,
        }
    }

    pub fn print_tier(&self) -> PrintTier {
        match (self.printing, self.high_res_printing) {
            (false, _) => PrintTier::None,
            (true, false) => PrintTier::Restricted,
            (true, true) => PrintTier::Full,
        }
    }

    /// Names of the granted permissions, for reporting.
    pub fn granted(&self) -> Vec<&'static str> {
        let flags = [
            (self.printing, "printing"),
            (self.printing && self.high_res_printing, "highResPrinting"),
            (self.copying, "copying"),
            (self.modifying, "modifying"),
            (self.annotating, "annotating"),
            (self.filling_forms, "fillingForms"),
            (self.content_extraction, "contentExtraction"),
            (self.document_assembly, "documentAssembly"),
        ];
        flags
            .into_iter()
            .filter(|(granted, _)| *granted)
            .map(|(_, name)| name)
            .collect()
    }
}

/// An encryption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionRequest {
    /// User (open) password
    pub password: String,
    pub permissions: Permissions,
    pub encryption_level: EncryptionLevel,
}

impl ProtectionRequest {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            permissions: Permissions::default(),
            encryption_level: EncryptionLevel::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_level(mut self, level: EncryptionLevel) -> Self {
        self.encryption_level = level;
        self
    }

    /// Owner password: the user password suffixed with a timestamp, so the
    /// two never coincide.
    pub fn owner_password(&self) -> String {
        let stamp = chrono::Utc::now().timestamp_millis();
        format!("{}_{}", self.password, stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_tiers() {
        let mut permissions = Permissions::all();
        assert_eq!(permissions.print_tier(), PrintTier::Full);
        permissions.high_res_printing = false;
        assert_eq!(permissions.print_tier(), PrintTier::Restricted);
        permissions.printing = false;
        permissions.high_res_printing = true;
        assert_eq!(permissions.print_tier(), PrintTier::None);
    }

    #[test]
    fn test_owner_password_differs() {
        let request = ProtectionRequest::new("s3cret");
        let owner = request.owner_password();
        assert_ne!(owner, request.password);
        assert!(owner.starts_with("s3cret_"));

        let empty = ProtectionRequest::new("");
        assert!(!empty.owner_password().is_empty());
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!("AES-256".parse::<EncryptionLevel>().unwrap(), EncryptionLevel::Aes256);
        assert_eq!("rc4_40".parse::<EncryptionLevel>().unwrap(), EncryptionLevel::Rc4_40);
        assert_eq!("128".parse::<EncryptionLevel>().unwrap(), EncryptionLevel::Aes128);
        assert!("des".parse::<EncryptionLevel>().is_err());
        for level in EncryptionLevel::ALL {
            assert_eq!(level.to_string().parse::<EncryptionLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_granted_names() {
        let mut permissions = Permissions::none();
        permissions.printing = true;
        permissions.copying = true;
        assert_eq!(permissions.granted(), vec!["printing", "copying"]);
        assert_eq!(Permissions::all().granted().len(), 8);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let json = serde_json::to_string(&ProtectionRequest::new("pw")).unwrap();
        assert!(json.contains("\"encryptionLevel\":\"Aes128\""));
        assert!(json.contains("\"highResPrinting\":true"));
    }
}
