use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::{QueryError, Result, StoreError, body_snippet};
use crate::models::SnapInfo;
use crate::session::HeaderSet;

/// Read-only client for the store catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    api_base: Url,
}

impl CatalogClient {
    pub fn new(http: Client, api_base: Url) -> Self {
        Self { http, api_base }
    }

    fn info_url(&self, name: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("API base '{}' cannot be a base URL", self.api_base)))?
            .pop_if_empty()
            .extend(["snaps", "info", name]);
        Ok(url)
    }

    /// Fetch catalog details for the snap `name`
    ///
    /// `headers` are sent as they are; an empty set makes an anonymous
    /// request and the store decides what to do with it.
    #[instrument(skip(self, headers), fields(authenticated = headers.is_authenticated()))]
    pub async fn query(&self, headers: &HeaderSet, name: &str) -> Result<SnapInfo> {
        let url = self.info_url(name)?;

        let mut request = self.http.get(url);
        for (key, value) in headers.iter() {
            request = request.header(key, value);
        }

        debug!("Fetching snap info");
        let response = request.send().await.map_err(|e| {
            warn!("Error fetching snap info: {}", e);
            QueryError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Store rejected snap info request");
            return Err(QueryError::Http {
                status,
                body_snippet: body_snippet(&body),
            }
            .into());
        }

        let body = response.bytes().await.map_err(QueryError::Network)?;
        serde_json::from_slice(&body).map_err(StoreError::Decode)
    }
}
