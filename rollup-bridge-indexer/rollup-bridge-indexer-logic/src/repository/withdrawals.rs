use alloy_primitives::U256;
use anyhow::{Context, Result};
use sea_orm::{prelude::*, DbBackend, FromQueryResult, Statement};
use std::str::FromStr;
use tracing::instrument;

use super::sql;
use crate::{
    types::{
        DisputeGame, L1EventType, OutputRoot, StatusReport, Timestamp,
        TransactionWithdrawalStatus, TxHash, Withdrawal, WithdrawalEvent, WithdrawalStatus, B256,
    },
    well_known::RECENT_DISPUTE_GAMES_LIMIT,
    withdrawal_status::{self, StateRootCoverage, WithdrawalFacts},
    StatusSettings,
};

#[derive(Debug, FromQueryResult)]
struct DbWithdrawal {
    pub msg_nonce: String,
    pub hash: Vec<u8>,
    pub l2_transaction_hash: Vec<u8>,
    pub l2_block_number: i64,
}

impl TryFrom<DbWithdrawal> for Withdrawal {
    type Error = anyhow::Error;

    fn try_from(value: DbWithdrawal) -> Result<Self> {
        Ok(Self {
            msg_nonce: U256::from_str(&value.msg_nonce)
                .with_context(|| format!("Invalid message nonce {}", value.msg_nonce))?,
            hash: value.hash.as_slice().try_into()?,
            l2_transaction_hash: value.l2_transaction_hash.as_slice().try_into()?,
            l2_block_number: value.l2_block_number.try_into()?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbRelayedWithdrawal {
    pub msg_nonce: String,
    pub hash: Vec<u8>,
    pub l2_transaction_hash: Vec<u8>,
    pub l2_block_number: i64,
    pub relay_transaction_hash: Option<Vec<u8>>,
}

impl TryFrom<DbRelayedWithdrawal> for (Withdrawal, Option<TxHash>) {
    type Error = anyhow::Error;

    fn try_from(value: DbRelayedWithdrawal) -> Result<Self> {
        let relay_transaction_hash = value
            .relay_transaction_hash
            .map(|v| v.as_slice().try_into())
            .transpose()?;
        let withdrawal = DbWithdrawal {
            msg_nonce: value.msg_nonce,
            hash: value.hash,
            l2_transaction_hash: value.l2_transaction_hash,
            l2_block_number: value.l2_block_number,
        }
        .try_into()?;
        Ok((withdrawal, relay_transaction_hash))
    }
}

#[derive(Debug, FromQueryResult)]
struct DbWithdrawalEvent {
    pub withdrawal_hash: Vec<u8>,
    pub l1_event_type: String,
    pub l1_timestamp: chrono::NaiveDateTime,
    pub l1_transaction_hash: Vec<u8>,
    pub l1_block_number: i64,
    pub game_index: Option<i64>,
}

impl TryFrom<DbWithdrawalEvent> for WithdrawalEvent {
    type Error = anyhow::Error;

    fn try_from(value: DbWithdrawalEvent) -> Result<Self> {
        Ok(Self {
            withdrawal_hash: value.withdrawal_hash.as_slice().try_into()?,
            l1_event_type: value.l1_event_type.parse()?,
            l1_timestamp: value.l1_timestamp.and_utc(),
            l1_transaction_hash: value.l1_transaction_hash.as_slice().try_into()?,
            l1_block_number: value.l1_block_number.try_into()?,
            game_index: value.game_index.map(|v| v.try_into()).transpose()?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbDisputeGame {
    pub index: i64,
    pub game_type: i32,
    pub created_at: chrono::NaiveDateTime,
    pub resolved_at: Option<chrono::NaiveDateTime>,
    pub status: i16,
    pub extra_data: Vec<u8>,
}

impl TryFrom<DbDisputeGame> for DisputeGame {
    type Error = anyhow::Error;

    fn try_from(value: DbDisputeGame) -> Result<Self> {
        Ok(Self {
            index: value.index.try_into()?,
            game_type: value.game_type.try_into()?,
            created_at: value.created_at.and_utc(),
            resolved_at: value.resolved_at.map(|v| v.and_utc()),
            status: value.status.try_into()?,
            extra_data: value.extra_data.into(),
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbOutputRoot {
    pub l2_output_index: i64,
    pub l2_block_number: i64,
    pub l1_timestamp: chrono::NaiveDateTime,
}

impl TryFrom<DbOutputRoot> for OutputRoot {
    type Error = anyhow::Error;

    fn try_from(value: DbOutputRoot) -> Result<Self> {
        Ok(Self {
            l2_output_index: value.l2_output_index.try_into()?,
            l2_block_number: value.l2_block_number.try_into()?,
            l1_timestamp: value.l1_timestamp.and_utc(),
        })
    }
}

#[instrument(skip(db))]
pub async fn get_withdrawal_by_hash<T: ConnectionTrait>(
    db: &T,
    hash: B256,
) -> Result<Option<Withdrawal>> {
    DbWithdrawal::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::GET_WITHDRAWAL_BY_HASH,
        [hash.to_vec().into()],
    ))
    .one(db)
    .await
    .with_context(|| format!("Failed to get withdrawal {hash}"))?
    .map(TryInto::try_into)
    .transpose()
}

/// Withdrawals initiated by a rollup transaction, by nonce, each with the
/// hash of the L1 transaction that relayed it, if any.
#[instrument(skip(db))]
pub async fn withdrawals_by_l2_transaction<T: ConnectionTrait>(
    db: &T,
    l2_transaction_hash: TxHash,
) -> Result<Vec<(Withdrawal, Option<TxHash>)>> {
    DbRelayedWithdrawal::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::WITHDRAWALS_BY_L2_TRANSACTION,
        [l2_transaction_hash.to_vec().into()],
    ))
    .all(db)
    .await
    .with_context(|| format!("Failed to get withdrawals of transaction {l2_transaction_hash}"))?
    .into_iter()
    .map(TryInto::try_into)
    .collect()
}

/// Latest L1 event of the given type for a withdrawal.
#[instrument(skip(db))]
pub async fn find_withdrawal_event<T: ConnectionTrait>(
    db: &T,
    withdrawal_hash: B256,
    l1_event_type: L1EventType,
) -> Result<Option<WithdrawalEvent>> {
    DbWithdrawalEvent::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::GET_WITHDRAWAL_EVENT,
        [withdrawal_hash.to_vec().into(), l1_event_type.as_str().into()],
    ))
    .one(db)
    .await
    .with_context(|| {
        format!(
            "Failed to get {} event of withdrawal {withdrawal_hash}",
            l1_event_type.as_str()
        )
    })?
    .map(TryInto::try_into)
    .transpose()
}

#[instrument(skip(db))]
pub async fn get_dispute_game<T: ConnectionTrait>(
    db: &T,
    index: u64,
) -> Result<Option<DisputeGame>> {
    let index: i64 = index.try_into()?;
    DbDisputeGame::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::GET_DISPUTE_GAME,
        [index.into()],
    ))
    .one(db)
    .await
    .with_context(|| format!("Failed to get dispute game {index}"))?
    .map(TryInto::try_into)
    .transpose()
}

/// Most recent games of the given type, newest first.
#[instrument(skip(db))]
pub async fn recent_dispute_games<T: ConnectionTrait>(
    db: &T,
    game_type: u32,
    limit: u64,
) -> Result<Vec<DisputeGame>> {
    let game_type: i32 = game_type.try_into()?;
    let limit: i64 = limit.try_into()?;
    DbDisputeGame::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::RECENT_DISPUTE_GAMES,
        [game_type.into(), limit.into()],
    ))
    .all(db)
    .await
    .context("Failed to get recent dispute games")?
    .into_iter()
    .map(TryInto::try_into)
    .collect()
}

#[instrument(skip(db))]
pub async fn latest_output_root<T: ConnectionTrait>(db: &T) -> Result<Option<OutputRoot>> {
    DbOutputRoot::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::LATEST_OUTPUT_ROOT,
    ))
    .one(db)
    .await
    .context("Failed to get latest output root")?
    .map(TryInto::try_into)
    .transpose()
}

/// Loads whatever decides if a state root covering a rollup block exists:
/// recent games of the respected type when one is configured, output roots otherwise.
#[instrument(skip(db))]
pub async fn state_root_coverage<T: ConnectionTrait>(
    db: &T,
    settings: &StatusSettings,
) -> Result<StateRootCoverage> {
    match settings.respected_game_type {
        Some(game_type) => Ok(StateRootCoverage::DisputeGames {
            games: recent_dispute_games(db, game_type, RECENT_DISPUTE_GAMES_LIMIT).await?,
        }),
        None => Ok(StateRootCoverage::OutputRoots {
            highest_l2_block: latest_output_root(db).await?.map(|r| r.l2_block_number),
        }),
    }
}

/// Loads only the facts the status derivation needs, stopping at the first
/// decisive one.
#[instrument(skip(db), fields(withdrawal_hash = %withdrawal.hash))]
pub async fn withdrawal_facts<T: ConnectionTrait>(
    db: &T,
    withdrawal: &Withdrawal,
    settings: &StatusSettings,
) -> Result<WithdrawalFacts> {
    if find_withdrawal_event(db, withdrawal.hash, L1EventType::Finalized)
        .await?
        .is_some()
    {
        return Ok(WithdrawalFacts::Finalized);
    }

    let Some(proven) = find_withdrawal_event(db, withdrawal.hash, L1EventType::Proven).await?
    else {
        return Ok(WithdrawalFacts::Unproven {
            l2_block_number: withdrawal.l2_block_number,
            state_roots: state_root_coverage(db, settings).await?,
        });
    };

    let game = match proven.game_index {
        Some(game_index) => {
            let game = get_dispute_game(db, game_index).await?;
            if game.is_none() {
                tracing::warn!(game_index, "Proven withdrawal references unknown dispute game");
            }
            game
        }
        None => None,
    };

    Ok(WithdrawalFacts::Proven {
        proven_at: proven.l1_timestamp,
        game,
    })
}

#[instrument(skip(db), fields(withdrawal_hash = %withdrawal.hash))]
pub async fn withdrawal_status<T: ConnectionTrait>(
    db: &T,
    withdrawal: &Withdrawal,
    settings: &StatusSettings,
    now: Timestamp,
) -> Result<StatusReport> {
    let facts = withdrawal_facts(db, withdrawal, settings).await?;
    let report = withdrawal_status::derive_status(&facts, settings, now)?;
    tracing::debug!(status = %report.status, ready_at = ?report.ready_at, "Derived withdrawal status");
    Ok(report)
}

/// Statuses of every withdrawal initiated by a rollup transaction.
///
/// Cheaper than [`withdrawal_status`] per withdrawal: proven withdrawals are
/// judged by the challenge period alone without looking up their dispute
/// games, and state root coverage is loaded at most once.
#[instrument(skip(db))]
pub async fn transaction_statuses<T: ConnectionTrait>(
    db: &T,
    l2_transaction_hash: TxHash,
    settings: &StatusSettings,
    now: Timestamp,
) -> Result<Vec<TransactionWithdrawalStatus>> {
    let withdrawals = withdrawals_by_l2_transaction(db, l2_transaction_hash).await?;

    let mut state_roots = None;
    let mut statuses = Vec::with_capacity(withdrawals.len());
    for (withdrawal, relay_transaction_hash) in withdrawals {
        let status = if relay_transaction_hash.is_some() {
            WithdrawalStatus::Relayed
        } else if let Some(proven) =
            find_withdrawal_event(db, withdrawal.hash, L1EventType::Proven).await?
        {
            withdrawal_status::legacy_status(proven.l1_timestamp, settings, now)?.status
        } else {
            let coverage = match state_roots.take() {
                Some(coverage) => coverage,
                None => state_root_coverage(db, settings).await?,
            };
            let status =
                withdrawal_status::readiness_to_prove(withdrawal.l2_block_number, &coverage).status;
            state_roots = Some(coverage);
            status
        };

        statuses.push(TransactionWithdrawalStatus {
            nonce: withdrawal.nonce(),
            status,
            relay_transaction_hash,
        });
    }
    Ok(statuses)
}
