use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::ProviderId;

/// Per-provider request budget and failure handling.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub circuit: CircuitBreakerConfig,
}

impl ProviderPolicy {
    /// Free tier: 5 calls per minute.
    pub fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::Alphavantage,
            quota_window: Duration::from_secs(60),
            quota_limit: 5,
            circuit: CircuitBreakerConfig {
                failure_threshold: 2,
                open_timeout: Duration::from_secs(60),
            },
        }
    }

    /// Unofficial endpoint with no published quota; stay polite.
    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            circuit: CircuitBreakerConfig::default(),
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Alphavantage => Self::alphavantage_default(),
            ProviderId::Yahoo => Self::yahoo_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphavantage_policy_matches_free_tier() {
        let policy = ProviderPolicy::default_for(ProviderId::Alphavantage);

        assert_eq!(policy.provider_id, ProviderId::Alphavantage);
        assert_eq!(policy.quota_window, Duration::from_secs(60));
        assert_eq!(policy.quota_limit, 5);
    }

    #[test]
    fn yahoo_policy_is_more_generous() {
        let yahoo = ProviderPolicy::yahoo_default();
        assert!(yahoo.quota_limit > ProviderPolicy::alphavantage_default().quota_limit);
    }
}
