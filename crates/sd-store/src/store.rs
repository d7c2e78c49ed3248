use std::sync::Arc;

use reqwest::Client;
use sd_datastore::Datastore;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::cache::SessionCache;
use crate::catalog::CatalogClient;
use crate::config::StoreConfig;
use crate::credentials::Credentials;
use crate::errors::{Result, StoreError};
use crate::exchanger::{CredentialExchanger, SsoExchanger};
use crate::headers::assemble;
use crate::models::SnapInfo;
use crate::session::{HeaderSet, SessionSummary};

/// Operations offered to the layer driving the store (web handlers, CLI, ...)
#[async_trait::async_trait]
pub trait StoreService: Send + Sync {
    /// Log in to a brand store and cache the resulting headers
    async fn login(&self, email: &str, password: &str, otp: &str, store_id: &str, series: &str) -> Result<()>;

    /// Redacted view of the cached session
    async fn session_summary(&self) -> Result<SessionSummary>;

    /// Catalog details for a snap, using the current session
    async fn catalog_info(&self, name: &str) -> Result<SnapInfo>;
}

/// A store session: the current header set plus everything needed to replace it
///
/// The header set is the only mutable state. Readers always see either the
/// set from before a login or the one it produced, never a mix.
pub struct SnapStore {
    cache: SessionCache,
    exchanger: Arc<dyn CredentialExchanger>,
    catalog: CatalogClient,
    config: StoreConfig,
    headers: RwLock<HeaderSet>,
    login_lock: Mutex<()>,
}

impl SnapStore {
    /// Session against the configured store, logging in through Ubuntu One
    pub async fn new(datastore: Arc<dyn Datastore>, config: StoreConfig) -> Result<Self> {
        let http = config.http_client()?;
        let exchanger = Arc::new(SsoExchanger::with_client(http.clone(), &config));
        Ok(Self::bootstrap(datastore, exchanger, http, config).await)
    }

    /// Session with a custom credential exchanger
    pub async fn with_exchanger(
        datastore: Arc<dyn Datastore>,
        exchanger: Arc<dyn CredentialExchanger>,
        config: StoreConfig,
    ) -> Result<Self> {
        let http = config.http_client()?;
        Ok(Self::bootstrap(datastore, exchanger, http, config).await)
    }

    /// Start from the cached session if there is a usable one
    ///
    /// A missing or unusable cache is the normal cold start: the session
    /// begins unauthenticated and a login is needed for private data.
    #[instrument(skip_all)]
    async fn bootstrap(
        datastore: Arc<dyn Datastore>,
        exchanger: Arc<dyn CredentialExchanger>,
        http: Client,
        config: StoreConfig,
    ) -> Self {
        let cache = SessionCache::new(datastore);

        let headers = match cache.load_live().await {
            Ok(headers) => {
                debug!("Using cached store session");
                headers
            }
            Err(StoreError::NoSession) => {
                debug!("No cached store session");
                HeaderSet::new()
            }
            Err(e) => {
                warn!("Ignoring cached store session: {}", e);
                HeaderSet::new()
            }
        };

        Self {
            cache,
            exchanger,
            catalog: CatalogClient::new(http, config.api_base.clone()),
            config,
            headers: RwLock::new(headers),
            login_lock: Mutex::new(()),
        }
    }

    /// Whether the current header set carries an authorization value
    pub async fn is_authenticated(&self) -> bool {
        self.headers.read().await.is_authenticated()
    }

    /// Snapshot of the current header set
    pub async fn headers(&self) -> HeaderSet {
        self.headers.read().await.clone()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl StoreService for SnapStore {
    #[instrument(skip(self, email, password, otp))]
    async fn login(&self, email: &str, password: &str, otp: &str, store_id: &str, series: &str) -> Result<()> {
        let credentials = Credentials::new(email, password, otp, self.config.permissions.clone())?;

        // One login at a time so the cache and the in-memory set cannot diverge
        let _guard = self.login_lock.lock().await;

        let tokens = self.exchanger.exchange(&credentials).await?;
        drop(credentials);

        let headers = assemble(&tokens, store_id, series, &self.config.channel)?;
        self.cache.persist(&headers).await?;

        *self.headers.write().await = headers;
        info!("Logged in to store {}", store_id);
        Ok(())
    }

    async fn session_summary(&self) -> Result<SessionSummary> {
        self.cache.load_summary().await
    }

    async fn catalog_info(&self, name: &str) -> Result<SnapInfo> {
        let headers = self.headers().await;
        self.catalog.query(&headers, name).await
    }
}

impl std::fmt::Debug for SnapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapStore")
            .field("cache", &self.cache)
            .field("catalog", &self.catalog)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
