use anyhow::{Context, Result};
use sea_orm::{prelude::*, DbBackend, FromQueryResult, Statement};
use tracing::instrument;

use super::{block_number_param, sql, DbBlockNumber};
use crate::types::{
    BlockNumber, BridgeMessage, Inconsistency, Lookup, MessageDirection, MessageStatus,
};

#[derive(Debug, FromQueryResult)]
struct DbBridgeMessage {
    pub direction: String,
    pub message_id: i64,
    pub originating_transaction_block_number: Option<i64>,
    pub originating_transaction_hash: Option<Vec<u8>>,
    pub completion_transaction_hash: Option<Vec<u8>>,
    pub status: String,
}

impl TryFrom<DbBridgeMessage> for BridgeMessage {
    type Error = anyhow::Error;

    fn try_from(value: DbBridgeMessage) -> Result<Self> {
        Ok(Self {
            direction: value.direction.parse()?,
            message_id: value.message_id.try_into()?,
            originating_transaction_block_number: value
                .originating_transaction_block_number
                .map(|v| v.try_into())
                .transpose()?,
            originating_transaction_hash: value
                .originating_transaction_hash
                .map(|v| v.as_slice().try_into())
                .transpose()?,
            completion_transaction_hash: value
                .completion_transaction_hash
                .map(|v| v.as_slice().try_into())
                .transpose()?,
            status: value.status.parse()?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbCompletedMessage {
    pub message_id: i64,
    pub completion_transaction_hash: Vec<u8>,
    pub block_number: Option<i64>,
}

async fn discovered_l1_block<T: ConnectionTrait>(
    db: &T,
    query: &str,
    direction: MessageDirection,
) -> Result<Option<BlockNumber>> {
    DbBlockNumber::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        query,
        [direction.as_str().into()],
    ))
    .one(db)
    .await
    .with_context(|| format!("Failed to get discovered block of {} messages", direction.as_str()))?
    .map(TryInto::try_into)
    .transpose()
}

/// Originating block of the most recently discovered message, by message id.
#[instrument(skip(db))]
pub async fn latest_discovered_l1_block<T: ConnectionTrait>(
    db: &T,
    direction: MessageDirection,
) -> Result<Option<BlockNumber>> {
    discovered_l1_block(db, sql::LATEST_DISCOVERED_MESSAGE_BLOCK, direction).await
}

/// Originating block of the first discovered message, by message id.
#[instrument(skip(db))]
pub async fn earliest_discovered_l1_block<T: ConnectionTrait>(
    db: &T,
    direction: MessageDirection,
) -> Result<Option<BlockNumber>> {
    discovered_l1_block(db, sql::EARLIEST_DISCOVERED_MESSAGE_BLOCK, direction).await
}

/// Lowest rollup block any rollup-originated message was sent in.
#[instrument(skip(db))]
pub async fn earliest_rollup_block_for_incoming_message<T: ConnectionTrait>(
    db: &T,
) -> Result<Option<BlockNumber>> {
    DbBlockNumber::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::EARLIEST_INCOMING_MESSAGE_ROLLUP_BLOCK,
    ))
    .one(db)
    .await
    .context("Failed to get earliest rollup block of incoming messages")?
    .map(TryInto::try_into)
    .transpose()
}

/// Rollup block of the completion transaction of the first completed L1 -> rollup message.
#[instrument(skip(db))]
pub async fn earliest_rollup_block_for_completed_outgoing_message<T: ConnectionTrait>(
    db: &T,
) -> Result<Lookup<BlockNumber>> {
    let Some(message) = DbCompletedMessage::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::EARLIEST_COMPLETED_OUTGOING_MESSAGE,
    ))
    .one(db)
    .await
    .context("Failed to get earliest completed outgoing message")?
    else {
        return Ok(Lookup::NotFound);
    };

    match message.block_number {
        Some(block_number) => Ok(Lookup::Found(block_number.try_into()?)),
        None => {
            let inconsistency = Inconsistency::UnresolvedCompletionTransaction {
                message_id: message.message_id.try_into()?,
                transaction_hash: message.completion_transaction_hash.as_slice().try_into()?,
            };
            tracing::warn!(?inconsistency, "Completion transaction is not indexed");
            Ok(Lookup::Inconsistent(inconsistency))
        }
    }
}

/// Rollup-originated messages with the given status sent at or before
/// `block_number`, newest discovered first.
#[instrument(skip(db))]
pub async fn outgoing_messages_up_to_block<T: ConnectionTrait>(
    db: &T,
    status: MessageStatus,
    block_number: BlockNumber,
) -> Result<Vec<BridgeMessage>> {
    let block_number = block_number_param(block_number)?;
    DbBridgeMessage::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::OUTGOING_MESSAGES_UP_TO_BLOCK,
        [status.as_str().into(), block_number.into()],
    ))
    .all(db)
    .await
    .context("Failed to list outgoing messages")?
    .into_iter()
    .map(BridgeMessage::try_from)
    .collect()
}
