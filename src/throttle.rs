use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::utils::now_secs;

pub type Limiter = Arc<DefaultDirectRateLimiter>;

pub fn make_limiter(rpm: u32) -> Limiter {
    let q = Quota::per_minute(NonZeroU32::new(rpm.max(1)).unwrap());
    Arc::new(RateLimiter::direct(q))
}

/// Server-asked cooldown layered on top of the steady request rate. A 429
/// extends it; every request gates on it before taking a limiter slot.
#[derive(Debug, Default)]
pub struct Cooldown {
    until: AtomicU64,
}

impl Cooldown {
    pub async fn gate(&self, limiter: &Limiter) {
        let now = now_secs().max(0) as u64;
        let until = self.until.load(Ordering::Relaxed);
        if until > now {
            tokio::time::sleep(Duration::from_secs(until - now)).await;
        }
        limiter.until_ready().await;
    }

    pub fn extend_secs(&self, secs: u64) {
        let until = now_secs().max(0) as u64 + secs;
        let prev = self.until.load(Ordering::Relaxed);
        if until > prev {
            self.until.store(until, Ordering::Relaxed);
        }
    }
}
