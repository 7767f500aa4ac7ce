use std::{fmt, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::{debug, info};

use super::{AccessTokenSource, TokenBundle, TokenProvider};

type RefreshFailureHook<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Caches the bundle handed out by a [`TokenProvider`] and renews it when it goes stale.
///
/// Readers only take a short read lock on the cached record. Fetches are
/// serialized through `fetch_guard`, so at most one grant or refresh is in
/// flight per manager.
pub struct TokenManager<Provider>
where
    Provider: TokenProvider,
{
    provider: Provider,
    expire_threshold: Duration,
    cached_token: RwLock<Option<Arc<Record<Provider::AccessToken, Provider::RefreshToken>>>>,
    fetch_guard: Mutex<()>,
    on_refresh_failure: Option<RefreshFailureHook<Provider::Error>>,
}

/// Instant after which a cached bundle is considered stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validity {
    Until(Instant),
    Forever,
}

impl Validity {
    fn compute(lifetime: Option<Duration>, expire_threshold: Duration, now: Instant) -> Self {
        match lifetime {
            // A lifetime shorter than the threshold is stale right away.
            Some(lifetime) => now
                .checked_add(lifetime.saturating_sub(expire_threshold))
                .map_or(Self::Forever, Self::Until),
            None => Self::Forever,
        }
    }

    fn is_stale_at(&self, now: Instant) -> bool {
        match self {
            Self::Until(valid_until) => *valid_until <= now,
            Self::Forever => false,
        }
    }
}

#[derive(Debug)]
struct Record<T, R> {
    bundle: TokenBundle<T, R>,
    valid_until: Validity,
}

impl<T, R> Record<T, R> {
    fn new(bundle: TokenBundle<T, R>, expire_threshold: Duration) -> Self {
        let valid_until = Validity::compute(bundle.lifetime(), expire_threshold, Instant::now());
        Self {
            bundle,
            valid_until,
        }
    }

    fn is_stale(&self) -> bool {
        self.valid_until.is_stale_at(Instant::now())
    }
}

enum RefreshAttempt<B, E> {
    Refreshed(B),
    NoRefreshToken,
    Failed(E),
}

impl<Provider> TokenManager<Provider>
where
    Provider: TokenProvider,
{
    pub fn new(provider: Provider, expire_threshold: Duration) -> Self {
        Self {
            provider,
            expire_threshold,
            cached_token: RwLock::new(None),
            fetch_guard: Mutex::new(()),
            on_refresh_failure: None,
        }
    }

    /// Observe refresh errors that are discarded in favor of a new grant.
    pub fn on_refresh_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Provider::Error) + Send + Sync + 'static,
    {
        self.on_refresh_failure = Some(Arc::new(hook));
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn expire_threshold(&self) -> Duration {
        self.expire_threshold
    }

    /// Return the cached access token, fetching a new bundle first if there is
    /// none or it has gone stale.
    ///
    /// Only a failed grant is reported to the caller. A failed fetch leaves the
    /// previous record in place, so the next call starts over.
    pub async fn access_token(&self) -> Result<Provider::AccessToken, Provider::Error> {
        if let Some(record) = self.current_record().await {
            if !record.is_stale() {
                debug!(message = "Using preexisting token", token_expires_at = ?record.valid_until);
                return Ok(record.bundle.access_token().clone());
            }
        }

        let _fetching = self.fetch_guard.lock().await;

        // Someone else may have finished a fetch while we waited for the guard.
        let current = self.current_record().await;
        if let Some(record) = &current {
            if !record.is_stale() {
                debug!(
                    message = "Token renewed by a concurrent caller",
                    token_expires_at = ?record.valid_until,
                );
                return Ok(record.bundle.access_token().clone());
            }
            debug!(
                message = "Existing token expired, renewing",
                token_expires_at = ?record.valid_until,
            );
        }

        info!(
            message = "No active token found, about to get a new one",
            token_is_stale = current.is_some(),
            refresh_available = current
                .as_ref()
                .is_some_and(|record| record.bundle.refresh_token().is_some()),
        );

        let record = self.fetch_new_token(current.as_deref()).await?;
        let access_token = record.bundle.access_token().clone();

        debug!(message = "Got new token", token_expires_at = ?record.valid_until);
        *self.cached_token.write().await = Some(Arc::new(record));

        Ok(access_token)
    }

    async fn current_record(
        &self,
    ) -> Option<Arc<Record<Provider::AccessToken, Provider::RefreshToken>>> {
        self.cached_token.read().await.clone()
    }

    async fn fetch_new_token(
        &self,
        current: Option<&Record<Provider::AccessToken, Provider::RefreshToken>>,
    ) -> Result<Record<Provider::AccessToken, Provider::RefreshToken>, Provider::Error> {
        let refresh_token = current.and_then(|record| record.bundle.refresh_token());

        let bundle = match self.try_refresh(refresh_token).await {
            RefreshAttempt::Refreshed(bundle) => bundle,
            RefreshAttempt::NoRefreshToken => self.provider.grant().await?,
            RefreshAttempt::Failed(err) => {
                // The refresh error is dropped here; only a grant error reaches the caller.
                debug!(message = "Refresh failed, falling back to grant", error = %err);
                if let Some(hook) = &self.on_refresh_failure {
                    hook(&err);
                }
                self.provider.grant().await?
            }
        };

        Ok(Record::new(bundle, self.expire_threshold))
    }

    async fn try_refresh(
        &self,
        refresh_token: Option<&Provider::RefreshToken>,
    ) -> RefreshAttempt<TokenBundle<Provider::AccessToken, Provider::RefreshToken>, Provider::Error>
    {
        let refresh_token = match refresh_token {
            Some(refresh_token) => refresh_token,
            None => return RefreshAttempt::NoRefreshToken,
        };
        match self.provider.refresh(refresh_token).await {
            Ok(bundle) => RefreshAttempt::Refreshed(bundle),
            Err(err) => RefreshAttempt::Failed(err),
        }
    }
}

impl<Provider> fmt::Debug for TokenManager<Provider>
where
    Provider: TokenProvider + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("provider", &self.provider)
            .field("expire_threshold", &self.expire_threshold)
            .field("on_refresh_failure", &self.on_refresh_failure.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<Provider> AccessTokenSource for TokenManager<Provider>
where
    Provider: TokenProvider,
{
    type AccessToken = Provider::AccessToken;
    type Error = Provider::Error;

    async fn access_token(&self) -> Result<Self::AccessToken, Self::Error> {
        TokenManager::access_token(self).await
    }
}
