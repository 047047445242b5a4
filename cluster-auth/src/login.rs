use oauth2::AccessToken;
use tracing::info;

use crate::{AuthError, IdentityProvider, UserEmail};

/// Who a token belongs to, as far as the registry cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginIdentity {
    pub provider: &'static str,
    pub provider_user_id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Resolves access tokens into identities. Construct one per provider and
/// share it; there's no process wide instance.
pub struct LoginService<P> {
    provider: P,
}

impl<P: IdentityProvider> LoginService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn authenticate(&self, token: &AccessToken) -> Result<LoginIdentity, AuthError> {
        let profile = self.provider.user_profile(token).await?;
        let emails = self.provider.user_emails(token).await?;
        let email = pick_email(&emails)
            .ok_or_else(|| AuthError::NoVerifiedEmail {
                login: profile.login.clone(),
            })?
            .to_string();

        info!(
            "{} user {} authenticated as {email}",
            self.provider.name(),
            profile.login
        );
        Ok(LoginIdentity {
            provider: self.provider.name(),
            provider_user_id: profile.id,
            login: profile.login,
            name: profile.name,
            email,
            avatar_url: profile.avatar_url,
        })
    }
}

/// The primary address if it's verified, otherwise the first verified one.
fn pick_email(emails: &[UserEmail]) -> Option<&str> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.as_str())
}
