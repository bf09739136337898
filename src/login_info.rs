use log::debug;
use serde::Deserialize;

use crate::error::AuthError;

/// The pool metadata needed to open an authentication flow, as served by the
/// vendor's login-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginInfo {
    /// The user pool ID (`<region>_<pool name>`).
    #[serde(rename = "UPID")]
    pool_id: String,

    /// The app client ID registered with the pool.
    #[serde(rename = "CLIID")]
    client_id: String,

    /// The pool region. Some deployments serve this in the same
    /// `<region>_<suffix>` form as the pool ID; only the prefix is the
    /// region.
    #[serde(rename = "REGION")]
    region: String,
}

impl LoginInfo {
    #[must_use]
    pub fn new(pool_id: &str, client_id: &str, region: &str) -> Self {
        Self {
            pool_id: pool_id.into(),
            client_id: client_id.into(),
            region: region.into(),
        }
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn region(&self) -> &str {
        self.region.split('_').next().unwrap_or(&self.region)
    }
}

/// Resolver for the pool metadata, consumed once at authenticator
/// construction.
#[derive(Debug, Clone)]
pub struct LoginInfoClient {
    http: reqwest::Client,
    url: String,
}

impl LoginInfoClient {
    /// Create a resolver against the deployment's login-info endpoint.
    ///
    /// ## Errors
    ///
    /// Returns [`AuthError::ApiUnavailable`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(url: &str) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|err| AuthError::ApiUnavailable(err.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Fetch the pool ID, client ID and region for the deployment.
    pub async fn get_login_info(&self) -> Result<LoginInfo, AuthError> {
        debug!(url = self.url.as_str(); "Resolving login info");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|err| AuthError::ApiUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ApiUnavailable(format!(
                "Login info endpoint answered with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|err| AuthError::UnexpectedResponse(format!("Malformed login info: {err}")))
    }
}
