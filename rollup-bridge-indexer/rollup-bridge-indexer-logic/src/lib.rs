use serde::Deserialize;
use serde_with::serde_as;
use std::time;

use crate::well_known::DEFAULT_CHALLENGE_PERIOD_SECS;

pub mod errors;
pub mod gaps;
pub mod repository;
pub mod types;
pub mod well_known;
pub mod withdrawal_status;

#[cfg(test)]
mod test_utils;

/// Policy constants consumed by the withdrawal status engine.
///
/// Values may change between calls, so they are passed to every status
/// computation instead of being read from ambient state.
#[serde_as]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StatusSettings {
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub challenge_period: time::Duration,

    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub fault_proof_finality_delay: Option<time::Duration>,

    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub proof_maturity_delay: Option<time::Duration>,

    /// Enables the dispute game based "ready to prove" check when set.
    pub respected_game_type: Option<u32>,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            challenge_period: time::Duration::from_secs(DEFAULT_CHALLENGE_PERIOD_SECS),
            fault_proof_finality_delay: None,
            proof_maturity_delay: None,
            respected_game_type: None,
        }
    }
}
