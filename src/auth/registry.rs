//! User registry: the names and RSA public keys allowed to connect.
//!
//! File format, one user per line:
//! ```text
//! alice MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQ...
//! ```
//! The key is a base64 X.509 `SubjectPublicKeyInfo` DER blob. The registry
//! is loaded once before the listener opens and never changes afterwards, so
//! handlers read it without locking.

use crate::error::{ProtocolError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::RsaPublicKey;
use std::path::Path;
use tracing::{info, warn};

/// Maximum length of a username
pub const NAME_MAX: usize = 10;

/// A registered user
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub name: String,
    pub public_key: RsaPublicKey,
}

impl UserRecord {
    pub fn new(name: impl Into<String>, public_key: RsaPublicKey) -> Self {
        Self {
            name: name.into(),
            public_key,
        }
    }

    /// Registry file line for this user
    pub fn to_line(&self) -> Result<String> {
        let der = self
            .public_key
            .to_public_key_der()
            .map_err(|e| ProtocolError::KeyMaterial(e.to_string()))?;
        Ok(format!("{} {}", self.name, STANDARD.encode(der.as_bytes())))
    }
}

/// Append-only list of users, immutable once loaded
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: Vec<UserRecord>,
}

impl UserRegistry {
    pub fn from_records(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    /// Parse registry text. Blank lines are ignored; over-long names are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut users = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (name, encoded) = line.split_once(char::is_whitespace).ok_or_else(|| {
                ProtocolError::ConfigError(format!("Line {}: missing public key", idx + 1))
            })?;

            if name.chars().count() > NAME_MAX {
                warn!(line = idx + 1, name, "Skipping user with over-long name");
                continue;
            }

            let der = STANDARD.decode(encoded.trim()).map_err(|e| {
                ProtocolError::KeyMaterial(format!("Line {}: bad base64: {e}", idx + 1))
            })?;
            let public_key = RsaPublicKey::from_public_key_der(&der).map_err(|e| {
                ProtocolError::KeyMaterial(format!("Line {}: bad RSA public key: {e}", idx + 1))
            })?;

            users.push(UserRecord::new(name, public_key));
        }

        Ok(Self { users })
    }

    /// Load the registry file; any failure is fatal to startup
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::ConfigError(format!("Failed to read users file {}: {e}", path.display()))
        })?;
        let registry = Self::parse(&content)?;
        info!(path = %path.display(), users = registry.len(), "Loaded user registry");
        Ok(registry)
    }

    /// First record whose name matches exactly
    pub fn find(&self, name: &str) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.name == name)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.iter()
    }
}
