//! Lifecycle and combined governance configuration.

use crate::domain::errors::{LifecycleError, LifecycleResult};
use fx_02_proposal_queue::QueueConfig;
use serde::{Deserialize, Serialize};

/// Stage timing and winner selection parameters.
///
/// Snapshotted into each proposal at creation, so later changes only affect
/// new proposals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Time between market creation and the start of trading
    pub review_period_ms: u64,
    /// Length of the trading window
    pub trading_period_ms: u64,
    /// Margin over the baseline TWAP a challenger must clear (100_000 = 100%).
    /// Any value is accepted; above 100% a challenger must more than double
    /// the baseline.
    pub twap_threshold_bps: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            review_period_ms: 86_400_000,
            trading_period_ms: 259_200_000,
            twap_threshold_bps: 1_000,
        }
    }
}

impl LifecycleConfig {
    /// Short periods for tests.
    pub fn for_testing() -> Self {
        Self {
            review_period_ms: 1_000,
            trading_period_ms: 10_000,
            twap_threshold_bps: 20_000,
        }
    }

    /// This config with `update` applied. Fails without side effects if the
    /// result would not validate.
    pub fn updated(&self, update: &LifecycleConfigUpdate) -> LifecycleResult<Self> {
        let next = Self {
            review_period_ms: update.review_period_ms.unwrap_or(self.review_period_ms),
            trading_period_ms: update.trading_period_ms.unwrap_or(self.trading_period_ms),
            twap_threshold_bps: update.twap_threshold_bps.unwrap_or(self.twap_threshold_bps),
        };
        next.validate()?;
        Ok(next)
    }

    pub fn validate(&self) -> LifecycleResult<()> {
        if self.trading_period_ms == 0 {
            return Err(LifecycleError::InvalidConfig(
                "trading_period_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Partial change to a [`LifecycleConfig`]. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfigUpdate {
    pub review_period_ms: Option<u64>,
    pub trading_period_ms: Option<u64>,
    pub twap_threshold_bps: Option<u64>,
}

/// Everything a DAO configures for its governance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    pub queue: QueueConfig,
    pub lifecycle: LifecycleConfig,
}

impl GovernanceConfig {
    pub fn for_testing() -> Self {
        Self {
            queue: QueueConfig::for_testing(),
            lifecycle: LifecycleConfig::for_testing(),
        }
    }

    pub fn validate(&self) -> LifecycleResult<()> {
        self.queue.validate()?;
        self.lifecycle.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GovernanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lifecycle.twap_threshold_bps, 1_000);
        assert!(GovernanceConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_invalid_lifecycle() {
        let config = LifecycleConfig {
            trading_period_ms: 0,
            ..LifecycleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LifecycleError::InvalidConfig(_))
        ));

    }

    #[test]
    fn test_threshold_uncapped() {
        let config = LifecycleConfig {
            twap_threshold_bps: 250_000,
            ..LifecycleConfig::default()
        };
        assert!(config.validate().is_ok());

        let config = LifecycleConfig {
            twap_threshold_bps: u64::MAX,
            ..LifecycleConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_update() {
        let base = LifecycleConfig::for_testing();
        let update = LifecycleConfigUpdate {
            twap_threshold_bps: Some(1_500),
            ..LifecycleConfigUpdate::default()
        };
        let next = base.updated(&update).unwrap();
        assert_eq!(next.twap_threshold_bps, 1_500);
        assert_eq!(next.review_period_ms, base.review_period_ms);
        assert_eq!(next.trading_period_ms, base.trading_period_ms);

        let bad = LifecycleConfigUpdate {
            trading_period_ms: Some(0),
            ..LifecycleConfigUpdate::default()
        };
        assert!(matches!(base.updated(&bad), Err(LifecycleError::InvalidConfig(_))));

        let json = r#"{"review_period_ms": 42}"#;
        let update: LifecycleConfigUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(base.updated(&update).unwrap().review_period_ms, 42);
    }

    #[test]
    fn test_invalid_queue_surfaces() {
        let mut config = GovernanceConfig::default();
        config.queue.max_queue_size = 5;
        assert!(matches!(config.validate(), Err(LifecycleError::Queue(_))));
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{
            "queue": {"max_proposer_funded": 4, "max_concurrent_proposals": 2, "max_queue_size": 25},
            "lifecycle": {"review_period_ms": 500, "trading_period_ms": 5000, "twap_threshold_bps": 20000}
        }"#;
        let config: GovernanceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.queue.max_queue_size, 25);
        assert_eq!(config.lifecycle.twap_threshold_bps, 20_000);
        assert!(config.validate().is_ok());

        let round_trip: GovernanceConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }
}
