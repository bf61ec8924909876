//! Club Core Configuration
//!
//! Tunables for the voting / funding / profit pipeline. The defaults mirror
//! the club's charter: ₹100 per share, a 3-day voting window, and a 10%
//! proposer bonus on recorded profit.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Club configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubConfig {
    /// Price of a single share (base or additional), in rupees
    pub share_unit_price: Decimal,
    /// Voting window length in days, from plan creation to deadline
    pub voting_window_days: i64,
    /// Proposer bonus taken off the top of recorded profit, in percent
    pub proposer_bonus_percent: Decimal,
    /// Interval between resolution sweeps, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            share_unit_price: Decimal::from(100u64),
            voting_window_days: 3,
            proposer_bonus_percent: Decimal::from(10u64),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl ClubConfig {
    /// Voting window as a chrono duration
    pub fn voting_window(&self) -> Duration {
        Duration::days(self.voting_window_days)
    }

    /// Create a test configuration with a fast sweep interval
    pub fn test() -> Self {
        Self {
            sweep_interval_secs: 1,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClubConfig::default();
        assert_eq!(config.share_unit_price, Decimal::from(100u64));
        assert_eq!(config.voting_window_days, 3);
        assert_eq!(config.proposer_bonus_percent, Decimal::from(10u64));
    }

    #[test]
    fn test_voting_window() {
        let config = ClubConfig::default();
        assert_eq!(config.voting_window(), Duration::days(3));
    }
}
