use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use zeroize::ZeroizeOnDrop;

use crate::errors::{DatastoreError, Result};

const NONCE_LEN: usize = 12;
const AAD_VERSION: &str = "v1";

/// AES-256 key (32 bytes)
#[derive(Clone, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl EncryptionKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    /// Derive a key from a passphrase with Argon2id
    pub fn derive(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Result<Self> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, Some(32))
            .map_err(|e| DatastoreError::Crypto(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; 32];
        argon2
            .hash_password_into(passphrase, salt, &mut key)
            .map_err(|e| DatastoreError::Crypto(format!("Key derivation failed: {}", e)))?;

        Ok(Self { key })
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Argon2id cost parameters, stored next to the salt so a key can be re-derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    // m=64MiB, t=3, p=1
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// Encrypted payload as stored in the inner settings store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Base64url-encoded nonce (12 bytes)
    pub nonce: String,
    /// Base64url-encoded ciphertext + tag
    pub ciphertext: String,
    pub aad_version: String,
}

fn aad(version: &str, context: &str) -> String {
    format!("sd-datastore|{}|{}", version, context)
}

/// Fill `buf` from the OS random source
pub fn random_bytes(buf: &mut [u8]) -> Result<()> {
    getrandom::fill(buf).map_err(|e| DatastoreError::Crypto(format!("OS randomness unavailable: {}", e)))
}

/// Encrypt `plaintext` with AES-256-GCM, binding it to `context`
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8], context: &str) -> Result<EncryptedBlob> {
    let cipher = Aes256Gcm::new((&key.key).into());

    let mut nonce_bytes = [0u8; NONCE_LEN];
    random_bytes(&mut nonce_bytes)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let aad = aad(AAD_VERSION, context);
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|e| DatastoreError::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedBlob {
        nonce: URL_SAFE_NO_PAD.encode(nonce_bytes),
        ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        aad_version: AAD_VERSION.to_string(),
    })
}

/// Decrypt a blob produced by [`encrypt`] for the same `context`
///
/// Any mismatch (key, context, tampering) is reported as [`DatastoreError::Corrupted`].
pub fn decrypt(key: &EncryptionKey, blob: &EncryptedBlob, context: &str) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new((&key.key).into());

    let nonce_bytes = URL_SAFE_NO_PAD
        .decode(&blob.nonce)
        .map_err(|_| DatastoreError::Corrupted)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(DatastoreError::Corrupted);
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = URL_SAFE_NO_PAD
        .decode(&blob.ciphertext)
        .map_err(|_| DatastoreError::Corrupted)?;

    let aad = aad(&blob.aad_version, context);
    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &ciphertext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| DatastoreError::Corrupted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(seed: u8) -> EncryptionKey {
        EncryptionKey::from_bytes([seed; 32])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key(7);
        let blob = encrypt(&key, b"cached headers", "store/headers").unwrap();
        let plaintext = decrypt(&key, &blob, "store/headers").unwrap();
        assert_eq!(plaintext, b"cached headers");
    }

    #[test]
    fn test_wrong_key_is_corrupted() {
        let blob = encrypt(&test_key(1), b"data", "store/headers").unwrap();
        let result = decrypt(&test_key(2), &blob, "store/headers");
        assert!(matches!(result, Err(DatastoreError::Corrupted)));
    }

    #[test]
    fn test_blob_moved_to_other_key_is_corrupted() {
        let key = test_key(3);
        let blob = encrypt(&key, b"data", "store/headers").unwrap();
        let result = decrypt(&key, &blob, "store/other");
        assert!(matches!(result, Err(DatastoreError::Corrupted)));
    }

    #[test]
    fn test_tampered_ciphertext_is_corrupted() {
        let key = test_key(4);
        let mut blob = encrypt(&key, b"data", "ctx").unwrap();

        let mut bytes = URL_SAFE_NO_PAD.decode(&blob.ciphertext).unwrap();
        bytes[0] ^= 0xFF;
        blob.ciphertext = URL_SAFE_NO_PAD.encode(bytes);

        assert!(matches!(decrypt(&key, &blob, "ctx"), Err(DatastoreError::Corrupted)));
    }

    #[test]
    fn test_derive_is_deterministic_per_salt() {
        let params = KdfParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        };
        let a = EncryptionKey::derive(b"passphrase", b"0123456789abcdef", &params).unwrap();
        let b = EncryptionKey::derive(b"passphrase", b"0123456789abcdef", &params).unwrap();
        let c = EncryptionKey::derive(b"passphrase", b"fedcba9876543210", &params).unwrap();

        assert_eq!(a.key, b.key);
        assert_ne!(a.key, c.key);
    }

    #[test]
    fn test_debug_is_redacted() {
        assert_eq!(format!("{:?}", test_key(9)), "EncryptionKey([REDACTED])");
    }
}
