mod error;
mod github;
mod login;
mod provider;

pub use error::AuthError;
pub use github::GithubProvider;
pub use login::{LoginIdentity, LoginService};
pub use oauth2::AccessToken;
pub use provider::{IdentityProvider, UserEmail, UserProfile};
