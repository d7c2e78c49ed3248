use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::StoreConfig;
use crate::credentials::{Credentials, TokenPair};
use crate::errors::{AuthError, Result, StoreError, body_snippet};
use crate::macaroon;
use crate::models::{AclRequest, AclResponse, DischargeRequest, DischargeResponse, SsoErrorResponse};

/// Exchanges login credentials for a root macaroon and its discharges
///
/// One call is one login round trip; implementations do not retry.
#[async_trait::async_trait]
pub trait CredentialExchanger: Send + Sync {
    async fn exchange(&self, credentials: &Credentials) -> Result<TokenPair>;
}

/// Snap store + Ubuntu One login
///
/// 1. the store ACL endpoint issues a root macaroon for the requested permissions
/// 2. Ubuntu One discharges the macaroon's `login.ubuntu.com` caveat with the
///    user's email, password and optional one-time code
#[derive(Debug, Clone)]
pub struct SsoExchanger {
    http: Client,
    acl_url: Url,
    discharge_url: Url,
    sso_location: String,
}

impl SsoExchanger {
    /// Create an exchanger with its own HTTP client
    pub fn new(config: &StoreConfig) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, config))
    }

    /// Create an exchanger sharing an existing HTTP client
    pub fn with_client(http: Client, config: &StoreConfig) -> Self {
        Self {
            http,
            acl_url: config.acl_url.clone(),
            discharge_url: config.discharge_url.clone(),
            sso_location: config.sso_location.clone(),
        }
    }

    /// Request a root macaroon carrying `permissions`
    #[instrument(skip(self))]
    pub async fn request_root_macaroon(&self, permissions: &[String]) -> Result<String> {
        debug!("Requesting root macaroon");
        let response = self
            .http
            .post(self.acl_url.clone())
            .header("Accept", "application/json")
            .json(&AclRequest { permissions })
            .send()
            .await
            .map_err(AuthError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Http {
                status,
                body_snippet: body_snippet(&body),
            }
            .into());
        }

        let acl: AclResponse = read_token_response(response, "ACL").await?;
        Ok(acl.macaroon)
    }

    /// Discharge the login caveat `caveat_id` with the user's credentials
    #[instrument(skip_all)]
    pub async fn discharge(&self, caveat_id: &str, credentials: &Credentials) -> Result<String> {
        let request = DischargeRequest {
            email: credentials.email(),
            password: credentials.password(),
            caveat_id,
            otp: credentials.otp(),
        };

        debug!(otp = request.otp.is_some(), "Discharging login caveat");
        let response = self
            .http
            .post(self.discharge_url.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(AuthError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<SsoErrorResponse>(&body) {
                Ok(error) => {
                    warn!(code = %error.code, "Login was refused");
                    AuthError::from_code(&error.code, error.message.as_deref())
                }
                Err(_) => AuthError::Http {
                    status,
                    body_snippet: body_snippet(&body),
                },
            }
            .into());
        }

        let discharge: DischargeResponse = read_token_response(response, "discharge").await?;
        Ok(discharge.discharge_macaroon)
    }
}

/// Decode a successful token response; a body without the token is a protocol fault
async fn read_token_response<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    let body = response.bytes().await.map_err(AuthError::Network)?;
    serde_json::from_slice(&body).map_err(|e| {
        StoreError::InvalidToken(format!(
            "{} response is missing its token ({:?} error)",
            endpoint,
            e.classify()
        ))
    })
}

#[async_trait::async_trait]
impl CredentialExchanger for SsoExchanger {
    #[instrument(skip_all)]
    async fn exchange(&self, credentials: &Credentials) -> Result<TokenPair> {
        let root = self.request_root_macaroon(credentials.scopes()).await?;
        let caveat_id = macaroon::third_party_caveat_id(&root, &self.sso_location)?;
        let discharge = self.discharge(&caveat_id, credentials).await?;

        debug!("Login exchange complete");
        Ok(TokenPair::new(root, vec![discharge]))
    }
}
