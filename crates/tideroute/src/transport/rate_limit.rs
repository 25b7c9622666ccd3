//! Token-bucket rate limiting in front of any transport

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use solana_sdk::pubkey::Pubkey;

use super::{AccountTransport, KeyedAccount, SearchFilter};
use crate::error::{RouterError, RouterResult, TransportError};

/// Waits for a permit before every call to the wrapped transport.
/// One call costs one permit regardless of batch size.
#[derive(Clone)]
pub struct RateLimitedTransport<T> {
    inner: T,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<T> RateLimitedTransport<T> {
    pub fn new(inner: T, requests_per_second: u32, burst: u32) -> RouterResult<Self> {
        let rate = NonZeroU32::new(requests_per_second).ok_or_else(|| {
            RouterError::Config("requests_per_second must be greater than 0".to_string())
        })?;
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| RouterError::Config("burst must be greater than 0".to_string()))?;

        let quota = Quota::per_second(rate).allow_burst(burst);
        Ok(Self {
            inner,
            limiter: Arc::new(DefaultDirectRateLimiter::direct(quota)),
        })
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Whether a call could go out right now without waiting
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[async_trait]
impl<T: AccountTransport> AccountTransport for RateLimitedTransport<T> {
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError> {
        self.limiter.until_ready().await;
        self.inner.get_account(address).await
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
        self.limiter.until_ready().await;
        self.inner.get_multiple_accounts(addresses).await
    }

    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError> {
        self.limiter.until_ready().await;
        self.inner.search_accounts(program_id, filter).await
    }
}
