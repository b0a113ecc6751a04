//! Derivation of a withdrawal's lifecycle status from its L1 events, the
//! dispute game its proof refers to and the configured time windows.
//!
//! Nothing here touches the store; [`crate::repository::withdrawals`] loads
//! the [`WithdrawalFacts`] and the current time is always passed in.

use std::time;

use crate::{
    errors::ConfigError,
    types::{BlockNumber, DisputeGame, StatusReport, Timestamp, WithdrawalStatus},
    StatusSettings,
};

/// Source of truth for whether a state root covering a rollup block exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRootCoverage {
    /// Legacy rule: the highest rollup block covered by an indexed output root.
    OutputRoots { highest_l2_block: Option<BlockNumber> },
    /// Fault proof rule: the most recent games of the respected game type.
    DisputeGames { games: Vec<DisputeGame> },
}

impl StateRootCoverage {
    pub fn covers(&self, l2_block_number: BlockNumber) -> bool {
        match self {
            Self::OutputRoots { highest_l2_block } => {
                highest_l2_block.is_some_and(|highest| highest >= l2_block_number)
            }
            Self::DisputeGames { games } => games
                .iter()
                .filter_map(DisputeGame::l2_block_number)
                .any(|block| block >= l2_block_number),
        }
    }
}

/// What is known about a withdrawal, by how far it got on L1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalFacts {
    Finalized,
    Unproven {
        l2_block_number: BlockNumber,
        state_roots: StateRootCoverage,
    },
    Proven {
        proven_at: Timestamp,
        /// Game referenced by the proof, `None` when there is no reference
        /// or the referenced game is not indexed.
        game: Option<DisputeGame>,
    },
}

pub fn derive_status(
    facts: &WithdrawalFacts,
    settings: &StatusSettings,
    now: Timestamp,
) -> Result<StatusReport, ConfigError> {
    match facts {
        WithdrawalFacts::Finalized => Ok(StatusReport::new(WithdrawalStatus::Relayed)),
        WithdrawalFacts::Unproven {
            l2_block_number,
            state_roots,
        } => Ok(readiness_to_prove(*l2_block_number, state_roots)),
        WithdrawalFacts::Proven { proven_at, game } => match game {
            // A proof older than its game was made before games were tracked for it.
            Some(game) if *proven_at >= game.created_at => {
                fault_proof_status(*proven_at, game, settings, now)
            }
            _ => legacy_status(*proven_at, settings, now),
        },
    }
}

/// Pre-proof timing can't be predicted from chain data, so there is no estimate.
pub fn readiness_to_prove(
    l2_block_number: BlockNumber,
    state_roots: &StateRootCoverage,
) -> StatusReport {
    if state_roots.covers(l2_block_number) {
        StatusReport::new(WithdrawalStatus::ReadyToProve)
    } else {
        StatusReport::new(WithdrawalStatus::WaitingForStateRoot)
    }
}

pub fn legacy_status(
    proven_at: Timestamp,
    settings: &StatusSettings,
    now: Timestamp,
) -> Result<StatusReport, ConfigError> {
    let ready_at = shift(proven_at, settings.challenge_period, "challenge period")?;
    Ok(relay_window(ready_at, now))
}

pub fn fault_proof_status(
    proven_at: Timestamp,
    game: &DisputeGame,
    settings: &StatusSettings,
    now: Timestamp,
) -> Result<StatusReport, ConfigError> {
    let finality_delay = settings
        .fault_proof_finality_delay
        .ok_or(ConfigError::MissingFinalityDelay)?;
    let proof_maturity_delay = settings
        .proof_maturity_delay
        .ok_or(ConfigError::MissingProofMaturityDelay)?;

    let resolved_at = match game.resolved_at {
        Some(resolved_at) if game.defender_won() => resolved_at,
        _ => return Ok(StatusReport::new(WithdrawalStatus::WaitingForGameToResolve)),
    };

    let ready_at = std::cmp::max(
        shift(resolved_at, finality_delay, "fault proof finality delay")?,
        shift(proven_at, proof_maturity_delay, "proof maturity delay")?,
    );
    Ok(relay_window(ready_at, now))
}

/// Relay becomes possible at `ready_at` itself, under either rule.
fn relay_window(ready_at: Timestamp, now: Timestamp) -> StatusReport {
    if now < ready_at {
        StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ready_at)
    } else {
        StatusReport::new(WithdrawalStatus::ReadyForRelay)
    }
}

fn shift(
    at: Timestamp,
    by: time::Duration,
    name: &'static str,
) -> Result<Timestamp, ConfigError> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|by| at.checked_add_signed(by))
        .ok_or(ConfigError::DurationOutOfRange(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameStatus;
    use alloy_primitives::{Bytes, U256};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn fault_proof_settings() -> StatusSettings {
        StatusSettings {
            challenge_period: time::Duration::from_secs(600),
            fault_proof_finality_delay: Some(time::Duration::from_secs(300)),
            proof_maturity_delay: Some(time::Duration::from_secs(700)),
            respected_game_type: Some(1),
        }
    }

    fn game(created_at: i64, resolved_at: Option<i64>, status: GameStatus) -> DisputeGame {
        DisputeGame {
            index: 7,
            game_type: 1,
            created_at: ts(created_at),
            resolved_at: resolved_at.map(ts),
            status,
            extra_data: Bytes::new(),
        }
    }

    fn game_for_block(l2_block: u64) -> DisputeGame {
        let mut g = game(0, None, GameStatus::InProgress);
        g.extra_data = U256::from(l2_block).to_be_bytes::<32>().to_vec().into();
        g
    }

    #[test]
    fn finalized_is_always_relayed() {
        let report = derive_status(&WithdrawalFacts::Finalized, &StatusSettings::default(), ts(0))
            .unwrap();
        assert_eq!(report, StatusReport::new(WithdrawalStatus::Relayed));

        // Even without any fault proof configuration.
        let report = derive_status(
            &WithdrawalFacts::Finalized,
            &StatusSettings {
                fault_proof_finality_delay: None,
                proof_maturity_delay: None,
                ..fault_proof_settings()
            },
            ts(1_000_000),
        )
        .unwrap();
        assert_eq!(report.status, WithdrawalStatus::Relayed);
        assert_eq!(report.ready_at, None);
    }

    #[test]
    fn unproven_withdrawal_checks_output_roots() {
        let facts = |highest_l2_block| WithdrawalFacts::Unproven {
            l2_block_number: 100,
            state_roots: StateRootCoverage::OutputRoots { highest_l2_block },
        };
        let settings = StatusSettings::default();

        let status = |f| derive_status(&f, &settings, ts(0)).unwrap();
        assert_eq!(
            status(facts(None)),
            StatusReport::new(WithdrawalStatus::WaitingForStateRoot)
        );
        assert_eq!(
            status(facts(Some(99))),
            StatusReport::new(WithdrawalStatus::WaitingForStateRoot)
        );
        assert_eq!(
            status(facts(Some(100))),
            StatusReport::new(WithdrawalStatus::ReadyToProve)
        );
    }

    #[test]
    fn unproven_withdrawal_checks_dispute_games() {
        let coverage = StateRootCoverage::DisputeGames {
            games: vec![
                game_for_block(90),
                game(0, None, GameStatus::InProgress),
                game_for_block(120),
            ],
        };
        assert_eq!(
            readiness_to_prove(120, &coverage).status,
            WithdrawalStatus::ReadyToProve
        );
        assert_eq!(
            readiness_to_prove(121, &coverage).status,
            WithdrawalStatus::WaitingForStateRoot
        );
        assert_eq!(
            readiness_to_prove(1, &StateRootCoverage::DisputeGames { games: vec![] }).status,
            WithdrawalStatus::WaitingForStateRoot
        );
    }

    #[test]
    fn legacy_proof_waits_for_challenge_period() {
        let settings = StatusSettings::default();
        let proven_at = ts(1_000);
        let ready_at = proven_at + Duration::seconds(604_800);
        let facts = WithdrawalFacts::Proven {
            proven_at,
            game: None,
        };

        assert_eq!(
            derive_status(&facts, &settings, ts(2_000)).unwrap(),
            StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ready_at)
        );
        assert_eq!(
            derive_status(&facts, &settings, ready_at - Duration::seconds(1)).unwrap(),
            StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ready_at)
        );
        assert_eq!(
            derive_status(&facts, &settings, ready_at).unwrap(),
            StatusReport::new(WithdrawalStatus::ReadyForRelay)
        );
    }

    #[test]
    fn proof_older_than_game_uses_legacy_rule() {
        let facts = WithdrawalFacts::Proven {
            proven_at: ts(1_000),
            game: Some(game(5_000, Some(6_000), GameStatus::DefenderWins)),
        };
        // No fault proof constants needed on the legacy path.
        let settings = StatusSettings {
            challenge_period: time::Duration::from_secs(600),
            ..StatusSettings::default()
        };
        assert_eq!(
            derive_status(&facts, &settings, ts(1_100)).unwrap(),
            StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ts(1_600))
        );
    }

    #[test]
    fn unresolved_game_blocks_relay() {
        for g in [
            game(500, None, GameStatus::InProgress),
            game(500, Some(900), GameStatus::ChallengerWins),
            game(500, None, GameStatus::DefenderWins),
        ] {
            let facts = WithdrawalFacts::Proven {
                proven_at: ts(1_000),
                game: Some(g),
            };
            assert_eq!(
                derive_status(&facts, &fault_proof_settings(), ts(1_000_000)).unwrap(),
                StatusReport::new(WithdrawalStatus::WaitingForGameToResolve)
            );
        }
    }

    #[test]
    fn resolved_game_waits_for_later_of_both_delays() {
        let settings = fault_proof_settings();
        let proven_at = ts(1_000);

        // Finality delay dominates: 2_000 + 300 > 1_000 + 700.
        let facts = WithdrawalFacts::Proven {
            proven_at,
            game: Some(game(500, Some(2_000), GameStatus::DefenderWins)),
        };
        assert_eq!(
            derive_status(&facts, &settings, ts(2_299)).unwrap(),
            StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ts(2_300))
        );
        assert_eq!(
            derive_status(&facts, &settings, ts(2_300)).unwrap(),
            StatusReport::new(WithdrawalStatus::ReadyForRelay)
        );

        // Proof maturity dominates: 1_000 + 700 > 1_200 + 300.
        let facts = WithdrawalFacts::Proven {
            proven_at,
            game: Some(game(500, Some(1_200), GameStatus::DefenderWins)),
        };
        assert_eq!(
            derive_status(&facts, &settings, ts(1_699)).unwrap(),
            StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ts(1_700))
        );
        assert_eq!(
            derive_status(&facts, &settings, ts(1_700)).unwrap(),
            StatusReport::new(WithdrawalStatus::ReadyForRelay)
        );
    }

    #[test]
    fn proof_made_at_game_creation_uses_fault_proof_rule() {
        let facts = WithdrawalFacts::Proven {
            proven_at: ts(500),
            game: Some(game(500, None, GameStatus::InProgress)),
        };
        assert_eq!(
            derive_status(&facts, &fault_proof_settings(), ts(600))
                .unwrap()
                .status,
            WithdrawalStatus::WaitingForGameToResolve
        );
    }

    #[test]
    fn both_rules_open_relay_at_the_same_instant() {
        // Legacy: 1_000 + 600. Fault proof: max(1_300 + 300, 1_000 + 600).
        let settings = StatusSettings {
            proof_maturity_delay: Some(time::Duration::from_secs(600)),
            ..fault_proof_settings()
        };
        let legacy = WithdrawalFacts::Proven {
            proven_at: ts(1_000),
            game: None,
        };
        let fault_proof = WithdrawalFacts::Proven {
            proven_at: ts(1_000),
            game: Some(game(500, Some(1_300), GameStatus::DefenderWins)),
        };

        for facts in [&legacy, &fault_proof] {
            assert_eq!(
                derive_status(facts, &settings, ts(1_599)).unwrap(),
                StatusReport::ready_at(WithdrawalStatus::InChallengePeriod, ts(1_600))
            );
            assert_eq!(
                derive_status(facts, &settings, ts(1_600)).unwrap(),
                StatusReport::new(WithdrawalStatus::ReadyForRelay)
            );
        }
    }

    #[test]
    fn missing_fault_proof_constants_abort() {
        let facts = WithdrawalFacts::Proven {
            proven_at: ts(1_000),
            game: Some(game(500, Some(2_000), GameStatus::DefenderWins)),
        };

        let settings = StatusSettings {
            fault_proof_finality_delay: None,
            ..fault_proof_settings()
        };
        assert_eq!(
            derive_status(&facts, &settings, ts(0)),
            Err(ConfigError::MissingFinalityDelay)
        );

        let settings = StatusSettings {
            proof_maturity_delay: None,
            ..fault_proof_settings()
        };
        assert_eq!(
            derive_status(&facts, &settings, ts(0)),
            Err(ConfigError::MissingProofMaturityDelay)
        );
    }

    #[test]
    fn oversized_delay_is_a_config_error() {
        let settings = StatusSettings {
            challenge_period: time::Duration::MAX,
            ..StatusSettings::default()
        };
        assert_eq!(
            legacy_status(ts(0), &settings, ts(0)),
            Err(ConfigError::DurationOutOfRange("challenge period"))
        );
    }
}
