//! Settings storage for snap-downloader
//!
//! A small key-value store addressed by `(namespace, key)`. Every record keeps
//! the time it was first created and last modified, and a write always
//! replaces the previous value.
//!
//! # Backends
//!
//! - [`MemoryDatastore`] keeps records in memory (tests, short-lived tools)
//! - [`FileDatastore`] keeps one JSON file per record, written atomically
//! - [`SealedDatastore`] wraps either of them and encrypts payloads with
//!   AES-256-GCM under a passphrase-derived key
//!
//! ```
//! use sd_datastore::{Datastore, MemoryDatastore};
//!
//! # async fn example() -> sd_datastore::Result<()> {
//! let store = MemoryDatastore::new();
//! store.settings_put("store", "headers", "{}").await?;
//!
//! let record = store.settings_get("store", "headers").await?;
//! println!("cached since {}", record.created);
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod errors;
pub mod file_store;
pub mod sealed;
pub mod secret;
pub mod store;

pub use crypto::KdfParams;
pub use errors::{DatastoreError, Result};
pub use file_store::FileDatastore;
pub use sealed::SealedDatastore;
pub use secret::{EnvSecretProvider, NoSecretProvider, SecretProvider, StaticSecretProvider};
pub use store::{Datastore, MemoryDatastore, SettingsRecord};
