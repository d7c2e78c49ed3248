use zeroize::Zeroizing;

/// Environment variable read by [`EnvSecretProvider::default`]
pub const PASSPHRASE_ENV: &str = "SD_DATASTORE_PASSPHRASE";

/// Source of the passphrase that unlocks a sealed settings store
#[async_trait::async_trait]
pub trait SecretProvider: Send + Sync {
    /// Get the passphrase for the store described by `purpose`
    ///
    /// Returns None if no passphrase is available. The value is zeroized on drop.
    async fn passphrase(&self, purpose: &str) -> Option<Zeroizing<String>>;
}

/// Provider that never has a passphrase
#[derive(Debug, Clone, Default)]
pub struct NoSecretProvider;

#[async_trait::async_trait]
impl SecretProvider for NoSecretProvider {
    async fn passphrase(&self, _purpose: &str) -> Option<Zeroizing<String>> {
        None
    }
}

/// Fixed passphrase, mostly for tests
#[derive(Clone)]
pub struct StaticSecretProvider {
    secret: Zeroizing<String>,
}

impl StaticSecretProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }
}

impl std::fmt::Debug for StaticSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticSecretProvider([REDACTED])")
    }
}

#[async_trait::async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn passphrase(&self, _purpose: &str) -> Option<Zeroizing<String>> {
        Some(self.secret.clone())
    }
}

/// Reads the passphrase from an environment variable; empty values count as absent
#[derive(Debug, Clone)]
pub struct EnvSecretProvider {
    variable: String,
}

impl EnvSecretProvider {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new(PASSPHRASE_ENV)
    }
}

#[async_trait::async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn passphrase(&self, purpose: &str) -> Option<Zeroizing<String>> {
        match std::env::var(&self.variable) {
            Ok(value) if !value.is_empty() => Some(Zeroizing::new(value)),
            _ => {
                tracing::debug!("{} is not set, no passphrase for {}", self.variable, purpose);
                None
            }
        }
    }
}
