//! Key records as stored in a keyring file.
//!
//! A keyring file is a JSON array of records, optionally wrapped in an
//! object under `keys`:
//!
//! ```json
//! {
//!   "keys": [
//!     {
//!       "id": "2025-05-a",
//!       "creation_date": "2025-05-01T00:00:00Z",
//!       "activation_date": "2025-05-03T00:00:00Z",
//!       "expiration_date": "2025-08-01T00:00:00Z",
//!       "revoked": false,
//!       "descriptor": { "algorithm": "xchacha20poly1305", "key_material": "<64 hex chars>" }
//!     }
//!   ]
//! }
//! ```
//!
//! A record without a descriptor has no key material and cannot build an
//! encryptor, so the resolver disqualifies it.

use std::{collections::BTreeSet, fmt, path::Path};

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use chrono::{DateTime, Utc};
use keyspan_core::{EncryptorError, Key};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::InspectError;

/// The only algorithm key records may name.
pub const XCHACHA20_POLY1305: &str = "xchacha20poly1305";

/// Key size for `XChaCha20-Poly1305` (32 bytes).
pub const KEY_SIZE: usize = 32;

/// Nonce size for `XChaCha20-Poly1305` (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Algorithm and secret material of a key.
///
/// The hex-encoded material is wiped when the descriptor is dropped and is
/// never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// Algorithm name, compared case-insensitively
    pub algorithm: String,
    /// Hex-encoded key bytes
    pub key_material: String,
}

impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("algorithm", &self.algorithm)
            .field("key_material", &"<redacted>")
            .finish()
    }
}

impl Drop for KeyDescriptor {
    fn drop(&mut self) {
        self.key_material.zeroize();
    }
}

/// One key of a keyring file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Unique key id
    pub id: String,
    /// When the key was created
    pub creation_date: DateTime<Utc>,
    /// When the key may start protecting data
    pub activation_date: DateTime<Utc>,
    /// When the key stops protecting data
    pub expiration_date: DateTime<Utc>,
    /// Whether the key was explicitly revoked
    #[serde(default)]
    pub revoked: bool,
    /// Algorithm and material, absent for keys whose material is unavailable
    #[serde(default)]
    pub descriptor: Option<KeyDescriptor>,
}

/// Encryptor built from a key record.
pub struct RecordEncryptor {
    cipher: XChaCha20Poly1305,
}

impl fmt::Debug for RecordEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordEncryptor").finish_non_exhaustive()
    }
}

impl RecordEncryptor {
    /// Encrypt `plaintext` under `nonce`.
    ///
    /// Nonces must never repeat for the same key; the caller supplies them.
    ///
    /// # Errors
    ///
    /// - `Backend` if the AEAD rejects the input
    pub fn encrypt(
        &self,
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, EncryptorError> {
        self.cipher.encrypt(XNonce::from_slice(nonce), plaintext).map_err(|_| {
            EncryptorError::Backend { reason: "encryption failed".to_string() }
        })
    }

    /// Decrypt `ciphertext` produced by [`RecordEncryptor::encrypt`].
    ///
    /// # Errors
    ///
    /// - `Backend` if authentication fails
    pub fn decrypt(
        &self,
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, EncryptorError> {
        self.cipher.decrypt(XNonce::from_slice(nonce), ciphertext).map_err(|_| {
            EncryptorError::Backend { reason: "authentication failed".to_string() }
        })
    }
}

impl Key for KeyRecord {
    type Id = String;
    type Encryptor = RecordEncryptor;

    fn id(&self) -> &String {
        &self.id
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    fn activation_date(&self) -> DateTime<Utc> {
        self.activation_date
    }

    fn expiration_date(&self) -> DateTime<Utc> {
        self.expiration_date
    }

    fn is_revoked(&self) -> bool {
        self.revoked
    }

    fn create_encryptor(&self) -> Result<RecordEncryptor, EncryptorError> {
        let descriptor = self.descriptor.as_ref().ok_or(EncryptorError::MissingKeyMaterial)?;

        if !descriptor.algorithm.eq_ignore_ascii_case(XCHACHA20_POLY1305) {
            return Err(EncryptorError::UnsupportedAlgorithm {
                algorithm: descriptor.algorithm.clone(),
            });
        }

        let bytes = Zeroizing::new(hex::decode(descriptor.key_material.trim()).map_err(|e| {
            EncryptorError::InvalidKeyMaterial { reason: format!("not hex: {e}") }
        })?);

        if bytes.len() != KEY_SIZE {
            return Err(EncryptorError::InvalidKeyMaterial {
                reason: format!("expected {KEY_SIZE} bytes, got {}", bytes.len()),
            });
        }

        let cipher = XChaCha20Poly1305::new_from_slice(&bytes).map_err(|_| {
            EncryptorError::InvalidKeyMaterial { reason: "invalid key length".to_string() }
        })?;

        Ok(RecordEncryptor { cipher })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyringDocument {
    Bare(Vec<KeyRecord>),
    Wrapped { keys: Vec<KeyRecord> },
}

impl KeyringDocument {
    fn into_keys(self) -> Vec<KeyRecord> {
        match self {
            Self::Bare(keys) | Self::Wrapped { keys } => keys,
        }
    }
}

/// Parse a keyring document. Key ids must be unique.
///
/// # Errors
///
/// - `Keyring` if the text is not a keyring document
/// - `DuplicateKeyId` if two records share an id
pub fn parse_keyring(text: &str, origin: &Path) -> Result<Vec<KeyRecord>, InspectError> {
    let keys = serde_json::from_str::<KeyringDocument>(text)
        .map_err(|source| InspectError::Keyring { path: origin.to_path_buf(), source })?
        .into_keys();

    let mut seen = BTreeSet::new();
    for record in &keys {
        if !seen.insert(record.id.as_str()) {
            return Err(InspectError::DuplicateKeyId { id: record.id.clone() });
        }
    }

    Ok(keys)
}

/// Read and parse a keyring file.
///
/// # Errors
///
/// - `Io` if the file cannot be read
/// - Everything [`parse_keyring`] returns
pub fn load_keyring(path: &Path) -> Result<Vec<KeyRecord>, InspectError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| InspectError::Io { path: path.to_path_buf(), source })?;
    let keys = parse_keyring(&text, path)?;

    tracing::debug!(path = %path.display(), keys = keys.len(), "Loaded keyring");
    Ok(keys)
}
