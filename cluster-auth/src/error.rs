pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("{provider} request failed: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("user {login} has no verified email address")]
    NoVerifiedEmail { login: String },
}

impl AuthError {
    pub fn provider(provider: &'static str, source: impl Into<BoxError>) -> Self {
        AuthError::Provider {
            provider,
            source: source.into(),
        }
    }
}
