use std::time::Duration;

use reqwest::Url;

use super::{AuthorizationGrant, OpenIdProvider};
use crate::auth::token_manager::TokenManager;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_EXPIRE_THRESHOLD: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Assembles a [`TokenManager`] backed by an [`OpenIdProvider`].
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use oidc_token_manager::oidc::TokenManagerBuilder;
///
/// let manager = TokenManagerBuilder::new("https://idp.example.com/token".parse()?, "client_id")
///     .client_secret("client_secret")
///     .build()?;
/// let token = manager.access_token().await?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
pub struct TokenManagerBuilder {
    token_endpoint: Url,
    client_id: String,
    client_secret: Option<String>,
    grant: AuthorizationGrant,
    scopes: Vec<String>,
    connect_timeout: Duration,
    read_timeout: Duration,
    expire_threshold: Duration,
    client: Option<reqwest::Client>,
}

impl TokenManagerBuilder {
    pub fn new(token_endpoint: Url, client_id: impl Into<String>) -> Self {
        Self {
            token_endpoint,
            client_id: client_id.into(),
            client_secret: None,
            grant: AuthorizationGrant::default(),
            scopes: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            expire_threshold: DEFAULT_EXPIRE_THRESHOLD,
            client: None,
        }
    }

    /// Required unless the client is public.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Default: client credentials.
    pub fn authorization_grant(mut self, grant: AuthorizationGrant) -> Self {
        self.grant = grant;
        self
    }

    /// Use the resource owner password credentials grant.
    pub fn authentication(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.authorization_grant(AuthorizationGrant::password(username, password))
    }

    pub fn scope<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Zero waits forever.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Applied to the whole request. Zero waits forever.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Margin subtracted from a token's lifetime before it is considered stale.
    pub fn expire_threshold(mut self, threshold: Duration) -> Self {
        self.expire_threshold = threshold;
        self
    }

    /// Use an existing client. The configured timeouts are not applied to it.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<TokenManager<OpenIdProvider>, BuildError> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let builder = reqwest::Client::builder();
                let builder = if self.connect_timeout.is_zero() {
                    builder
                } else {
                    builder.connect_timeout(self.connect_timeout)
                };
                let builder = if self.read_timeout.is_zero() {
                    builder
                } else {
                    builder.timeout(self.read_timeout)
                };
                builder.build()?
            }
        };

        let provider = OpenIdProvider {
            client,
            token_endpoint: self.token_endpoint,
            client_id: self.client_id,
            client_secret: self.client_secret,
            grant: self.grant,
            scopes: self.scopes,
        };

        Ok(TokenManager::new(provider, self.expire_threshold))
    }
}
