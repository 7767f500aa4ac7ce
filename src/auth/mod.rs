//! Authorization logic.

use std::time::Duration;

pub mod token_manager;

/// Performs the actual token exchange with an authorization server.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    type AccessToken: Clone + Send + Sync;
    type RefreshToken: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Obtain a new bundle using whatever credentials the provider was configured with.
    async fn grant(
        &self,
    ) -> Result<TokenBundle<Self::AccessToken, Self::RefreshToken>, Self::Error>;

    /// Exchange a refresh token for a new bundle.
    async fn refresh(
        &self,
        refresh_token: &Self::RefreshToken,
    ) -> Result<TokenBundle<Self::AccessToken, Self::RefreshToken>, Self::Error>;
}

/// Something that can hand out a currently valid access token.
#[async_trait::async_trait]
pub trait AccessTokenSource: Send + Sync {
    type AccessToken;
    type Error;

    async fn access_token(&self) -> Result<Self::AccessToken, Self::Error>;
}

/// One granted credential set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBundle<T, R> {
    access_token: T,
    refresh_token: Option<R>,
    expires_in_millis: i64,
}

impl<T, R> TokenBundle<T, R> {
    /// A negative `expires_in_millis` means the access token never expires.
    pub fn new(access_token: T, refresh_token: Option<R>, expires_in_millis: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in_millis,
        }
    }

    pub fn never_expiring(access_token: T, refresh_token: Option<R>) -> Self {
        Self::new(access_token, refresh_token, -1)
    }

    pub fn without_refresh(access_token: T, expires_in_millis: i64) -> Self {
        Self::new(access_token, None, expires_in_millis)
    }

    /// An access token with no refresh token that never expires.
    pub fn bearer_only(access_token: T) -> Self {
        Self::new(access_token, None, -1)
    }

    pub fn access_token(&self) -> &T {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&R> {
        self.refresh_token.as_ref()
    }

    pub fn expires_in_millis(&self) -> i64 {
        self.expires_in_millis
    }

    /// How long the access token is valid from issuance, `None` if it never expires.
    pub fn lifetime(&self) -> Option<Duration> {
        u64::try_from(self.expires_in_millis)
            .ok()
            .map(Duration::from_millis)
    }
}
