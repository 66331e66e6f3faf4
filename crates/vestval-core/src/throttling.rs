use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side rate limiter for one provider's quota.
///
/// Requests over budget are refused with the wait until the next slot
/// rather than queued, so the router can fall back to another source.
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
    blocked_until: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
            clock: DefaultClock::default(),
            blocked_until: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Takes one slot of budget, or returns how long until one frees up.
    pub fn acquire(&self) -> Result<(), Duration> {
        match self.limiter.check() {
            Ok(()) => {
                *self.blocked_until.lock().unwrap_or_else(PoisonError::into_inner) = None;
                Ok(())
            }
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                *self.blocked_until.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(Instant::now() + wait);
                Err(wait)
            }
        }
    }

    /// False while the last refusal's wait has not yet elapsed.
    pub fn has_budget(&self) -> bool {
        self.blocked_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(true, |until| Instant::now() >= until)
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);
    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
