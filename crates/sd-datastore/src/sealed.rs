use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::crypto::{self, EncryptedBlob, EncryptionKey, KdfParams};
use crate::errors::{DatastoreError, Result};
use crate::secret::SecretProvider;
use crate::store::{Datastore, SettingsRecord};

/// Namespace reserved for the sealing metadata in the inner store
pub const META_NAMESPACE: &str = "sealed";
const META_KEY: &str = "meta";
const META_VERSION: u32 = 1;
const SALT_LEN: usize = 32;
const CHECK_CONTEXT: &str = "sealed/check";
const CHECK_PLAINTEXT: &[u8] = b"sd-datastore";

/// Key derivation metadata kept in the inner store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealMeta {
    version: u32,
    /// Base64-encoded Argon2id salt
    salt: String,
    kdf: KdfParams,
    /// Known plaintext sealed with the derived key, detects a wrong passphrase
    check: EncryptedBlob,
}

/// Settings store wrapper that encrypts every payload at rest
///
/// Payloads are sealed with AES-256-GCM, bound to their namespace/key, under a
/// key derived from a passphrase. Timestamps stay readable in the inner store.
pub struct SealedDatastore<D> {
    inner: D,
    key: EncryptionKey,
}

impl<D: Datastore> SealedDatastore<D> {
    /// Unlock (or initialise) sealing on top of `inner` with default KDF costs
    pub async fn open(inner: D, secret_provider: Arc<dyn SecretProvider>) -> Result<Self> {
        Self::open_with_params(inner, secret_provider, KdfParams::default()).await
    }

    /// Like [`SealedDatastore::open`]; `params` only apply when the store is new
    #[instrument(skip_all)]
    pub async fn open_with_params(
        inner: D,
        secret_provider: Arc<dyn SecretProvider>,
        params: KdfParams,
    ) -> Result<Self> {
        let passphrase = secret_provider
            .passphrase("snap-downloader settings")
            .await
            .ok_or(DatastoreError::PassphraseUnavailable)?;

        let key = match inner.settings_get(META_NAMESPACE, META_KEY).await {
            Ok(record) => {
                let meta: SealMeta = serde_json::from_str(&record.data)?;
                let salt = STANDARD
                    .decode(&meta.salt)
                    .map_err(|_| DatastoreError::Corrupted)?;
                let key = EncryptionKey::derive(passphrase.as_bytes(), &salt, &meta.kdf)?;

                crypto::decrypt(&key, &meta.check, CHECK_CONTEXT)
                    .map_err(|_| DatastoreError::WrongPassphrase)?;
                debug!("Unlocked sealed settings store");
                key
            }
            Err(e) if e.is_not_found() => {
                let mut salt = [0u8; SALT_LEN];
                crypto::random_bytes(&mut salt)?;
                let key = EncryptionKey::derive(passphrase.as_bytes(), &salt, &params)?;

                let meta = SealMeta {
                    version: META_VERSION,
                    salt: STANDARD.encode(salt),
                    kdf: params,
                    check: crypto::encrypt(&key, CHECK_PLAINTEXT, CHECK_CONTEXT)?,
                };
                inner
                    .settings_put(META_NAMESPACE, META_KEY, &serde_json::to_string(&meta)?)
                    .await?;
                debug!("Initialised sealed settings store");
                key
            }
            Err(e) => return Err(e),
        };

        Ok(Self { inner, key })
    }

    /// Access the wrapped store
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

fn reject_reserved(namespace: &str) -> Result<()> {
    if namespace == META_NAMESPACE {
        return Err(DatastoreError::InvalidKey(namespace.to_string()));
    }
    Ok(())
}

fn context(namespace: &str, key: &str) -> String {
    format!("{}/{}", namespace, key)
}

#[async_trait::async_trait]
impl<D: Datastore> Datastore for SealedDatastore<D> {
    async fn settings_get(&self, namespace: &str, key: &str) -> Result<SettingsRecord> {
        reject_reserved(namespace)?;

        let mut record = self.inner.settings_get(namespace, key).await?;
        let blob: EncryptedBlob =
            serde_json::from_str(&record.data).map_err(|_| DatastoreError::Corrupted)?;
        let plaintext = crypto::decrypt(&self.key, &blob, &context(namespace, key))?;

        record.data = String::from_utf8(plaintext).map_err(|_| DatastoreError::Corrupted)?;
        Ok(record)
    }

    async fn settings_put(&self, namespace: &str, key: &str, data: &str) -> Result<SettingsRecord> {
        reject_reserved(namespace)?;

        let blob = crypto::encrypt(&self.key, data.as_bytes(), &context(namespace, key))?;
        let mut record = self
            .inner
            .settings_put(namespace, key, &serde_json::to_string(&blob)?)
            .await?;

        record.data = data.to_string();
        Ok(record)
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for SealedDatastore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedDatastore")
            .field("inner", &self.inner)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
