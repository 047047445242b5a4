use async_trait::async_trait;
use oauth2::AccessToken;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;

use crate::{AuthError, IdentityProvider, UserEmail, UserProfile};

const GITHUB_API_ENDPOINT: &str = "https://api.github.com";

const USER_AGENT: &str = "cluster-registry";

const PROVIDER: &str = "github";

#[derive(Clone)]
pub struct GithubProvider {
    base_url: String,
    client: Client,
}

impl Default for GithubProvider {
    fn default() -> Self {
        GithubProvider::new()
    }
}

impl GithubProvider {
    pub fn new() -> Self {
        Self::with_base_url(GITHUB_API_ENDPOINT)
    }

    /// Talks to a GitHub Enterprise instance, or anything else speaking the
    /// same REST API.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    async fn request<T>(&self, path: &str, auth: &AccessToken) -> Result<T, AuthError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("github request {url}");

        self.client
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::AUTHORIZATION, format!("token {}", auth.secret()))
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| AuthError::provider(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| AuthError::provider(PROVIDER, e))
    }
}

#[async_trait]
impl IdentityProvider for GithubProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn user_profile(&self, token: &AccessToken) -> Result<UserProfile, AuthError> {
        self.request("/user", token).await
    }

    async fn user_emails(&self, token: &AccessToken) -> Result<Vec<UserEmail>, AuthError> {
        self.request("/user/emails", token).await
    }
}
