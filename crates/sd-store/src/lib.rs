//! Snap store session management for snap-downloader
//!
//! This crate logs a user in to a (brand) Snap store, caches the resulting
//! request headers so later runs need no login, and queries the store
//! catalog with them.
//!
//! # Login Flow
//!
//! 1. The store ACL endpoint issues a root macaroon for the requested permissions
//! 2. Ubuntu One discharges its login caveat with email, password and one-time code
//! 3. Root macaroon and discharge are composed into one `Authorization` header,
//!    together with the store id, series and channel headers
//! 4. The header set is cached as the single `store/headers` setting
//!
//! On start-up [`SnapStore`] picks the cached headers up again; without a
//! usable cache it starts unauthenticated.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sd_datastore::FileDatastore;
//! use sd_store::{SnapStore, StoreConfig, StoreService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let datastore = FileDatastore::new(FileDatastore::default_storage_dir()?).await?;
//!     let store = SnapStore::new(Arc::new(datastore), StoreConfig::default()).await?;
//!
//!     if !store.is_authenticated().await {
//!         store.login("user@example.com", "password", "123456", "brand-store-id", "16").await?;
//!     }
//!
//!     let info = store.catalog_info("hello-brand").await?;
//!     println!("{} has {} releases", info.name, info.channel_map.len());
//!
//!     // Safe to display: no Authorization value in here
//!     println!("{:?}", store.session_summary().await?);
//!     Ok(())
//! }
//! ```
//!
//! # Session Summary
//!
//! ```
//! use std::sync::Arc;
//! use sd_datastore::{Datastore, MemoryDatastore};
//! use sd_store::{SnapStore, StoreConfig, StoreService};
//!
//! # async fn example() -> sd_store::Result<()> {
//! let datastore = MemoryDatastore::new();
//! # datastore.settings_put("store", "headers", r#"{"Snap-Device-Series":"16","Authorization":"Macaroon root=\"m\""}"#).await.unwrap();
//! let store = SnapStore::new(Arc::new(datastore), StoreConfig::default()).await?;
//!
//! let summary = store.session_summary().await?;
//! assert_eq!(summary.get("Snap-Device-Series"), Some("16"));
//! assert!(summary.get("Authorization").is_none());
//! assert!(summary.get("Created").is_some());
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```
//!
//! # Important Notes
//!
//! - Tokens are never logged and `Debug` output redacts them
//! - A session summary never contains the `Authorization` header
//! - Tokens are not refreshed; log in again when the store rejects them

pub mod cache;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod exchanger;
pub mod headers;
pub mod macaroon;
pub mod models;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export main types
pub use cache::SessionCache;
pub use catalog::CatalogClient;
pub use config::{HttpTimeouts, StoreConfig};
pub use credentials::{Credentials, TokenPair};
pub use errors::{AuthError, QueryError, Result, StoreError};
pub use exchanger::{CredentialExchanger, SsoExchanger};
pub use models::SnapInfo;
pub use session::{HeaderSet, SessionSummary};
pub use store::{SnapStore, StoreService};
