use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::errors::{Result, StoreError};

/// Snap store and Ubuntu One endpoints
pub mod endpoints {
    pub const API_BASE: &str = "https://api.snapcraft.io/v2";
    pub const ACL: &str = "https://dashboard.snapcraft.io/dev/api/acl/";
    pub const DISCHARGE: &str = "https://login.ubuntu.com/api/v2/tokens/discharge";
}

/// Location of the third-party caveat discharged by Ubuntu One
pub const SSO_LOCATION: &str = "login.ubuntu.com";

/// Capability requested for brand store downloads
pub const PACKAGE_ACCESS: &str = "package_access";

/// Channel sent with every store request unless configured otherwise
pub const DEFAULT_CHANNEL: &str = "stable";

const DEFAULT_USER_AGENT: &str = "snap-downloader";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for [`SnapStore`](crate::SnapStore)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base of the store API, `snaps/info/{name}` is resolved against it
    pub api_base: Url,

    /// Endpoint issuing the root macaroon
    pub acl_url: Url,

    /// Ubuntu One endpoint discharging the login caveat
    pub discharge_url: Url,

    /// Caveat location that the discharge endpoint is responsible for
    pub sso_location: String,

    /// Capabilities requested at login
    pub permissions: Vec<String>,

    /// Value of the `Snap-Device-Channel` header
    pub channel: String,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,
}

impl StoreConfig {
    /// Public Snap store and Ubuntu One
    pub fn production() -> Self {
        Self::with_endpoints(
            Url::parse(endpoints::API_BASE).expect("valid API base URL"),
            Url::parse(endpoints::ACL).expect("valid ACL URL"),
            Url::parse(endpoints::DISCHARGE).expect("valid discharge URL"),
        )
    }

    /// Custom endpoints with every other setting at its default
    pub fn with_endpoints(api_base: Url, acl_url: Url, discharge_url: Url) -> Self {
        Self {
            api_base,
            acl_url,
            discharge_url,
            sso_location: SSO_LOCATION.to_string(),
            permissions: vec![PACKAGE_ACCESS.to_string()],
            channel: DEFAULT_CHANNEL.to_string(),
            http_timeouts: HttpTimeouts::default(),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Point all three endpoints at one server, as a test double would serve them
    pub fn for_server(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| StoreError::Config(format!("{}: {}", base, e)))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| StoreError::Config(format!("{}: {}", path, e)))
        };

        Ok(Self::with_endpoints(
            join("v2")?,
            join("dev/api/acl/")?,
            join("api/v2/tokens/discharge")?,
        ))
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Build the HTTP client shared by the login exchange and catalog queries
    pub fn http_client(&self) -> Result<Client> {
        if self.api_base.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "API base '{}' cannot be a base URL",
                self.api_base
            )));
        }

        Client::builder()
            .connect_timeout(self.http_timeouts.connect)
            .timeout(self.http_timeouts.request)
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build HTTP client: {}", e)))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::production()
    }
}
