use async_trait::async_trait;
use oauth2::AccessToken;
use serde::Deserialize;

use crate::AuthError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserEmail {
    pub email: String,
    pub verified: bool,
    pub primary: bool,
    pub visibility: Option<String>,
}

/// Somewhere that can tell us who owns an access token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn user_profile(&self, token: &AccessToken) -> Result<UserProfile, AuthError>;

    async fn user_emails(&self, token: &AccessToken) -> Result<Vec<UserEmail>, AuthError>;
}
