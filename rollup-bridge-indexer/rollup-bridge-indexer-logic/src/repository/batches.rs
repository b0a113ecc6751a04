use anyhow::{Context, Result};
use sea_orm::{prelude::*, DbBackend, FromQueryResult, Statement};
use std::collections::BTreeSet;
use tracing::instrument;

use super::{block_number_param, sql, DbBlockNumber};
use crate::types::{
    Batch, BlockNumber, CommittedBatch, Edge, Inconsistency, LifecycleTransaction, Lookup,
};

#[derive(Debug, FromQueryResult)]
struct DbBatchCommitment {
    pub number: i64,
    pub commitment_id: i64,
    pub commitment_block_number: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct DbCommittedBatch {
    pub number: i64,
    pub start_block: i64,
    pub end_block: i64,
    pub commitment_id: i64,
    pub commitment_hash: Option<Vec<u8>>,
    pub commitment_block_number: Option<i64>,
    pub commitment_timestamp: Option<chrono::NaiveDateTime>,
    pub commitment_status: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct DbBatchNumber {
    pub number: i64,
}

impl TryFrom<DbCommittedBatch> for Lookup<CommittedBatch> {
    type Error = anyhow::Error;

    fn try_from(value: DbCommittedBatch) -> Result<Self> {
        let batch = Batch {
            number: value.number.try_into()?,
            start_block: value.start_block.try_into()?,
            end_block: value.end_block.try_into()?,
            commitment_id: value.commitment_id.try_into()?,
        };

        let (Some(hash), Some(block_number), Some(timestamp), Some(status)) = (
            value.commitment_hash,
            value.commitment_block_number,
            value.commitment_timestamp,
            value.commitment_status,
        ) else {
            return Ok(Self::Inconsistent(Inconsistency::BatchWithoutCommitment {
                batch_number: batch.number,
                commitment_id: batch.commitment_id,
            }));
        };

        let commitment = LifecycleTransaction {
            id: batch.commitment_id,
            hash: hash.as_slice().try_into()?,
            block_number: block_number.try_into()?,
            timestamp: timestamp.and_utc(),
            status: status.parse()?,
        };
        Ok(Self::Found(CommittedBatch { batch, commitment }))
    }
}

/// L1 block of the commit transaction of the first or last batch.
///
/// A batch whose commit transaction is not indexed is reported as an
/// inconsistency, never as a missing batch.
#[instrument(skip(db))]
pub async fn l1_block_of_committed_batch<T: ConnectionTrait>(
    db: &T,
    edge: Edge,
) -> Result<Lookup<BlockNumber>> {
    let query = match edge {
        Edge::Earliest => sql::EARLIEST_COMMITTED_BATCH,
        Edge::Latest => sql::LATEST_COMMITTED_BATCH,
    };
    let Some(batch) =
        DbBatchCommitment::find_by_statement(Statement::from_string(DbBackend::Postgres, query))
            .one(db)
            .await
            .context("Failed to get committed batch")?
    else {
        return Ok(Lookup::NotFound);
    };

    match batch.commitment_block_number {
        Some(block_number) => Ok(Lookup::Found(block_number.try_into()?)),
        None => {
            let inconsistency = Inconsistency::BatchWithoutCommitment {
                batch_number: batch.number.try_into()?,
                commitment_id: batch.commitment_id.try_into()?,
            };
            tracing::warn!(?inconsistency, "Batch commitment transaction not found");
            Ok(Lookup::Inconsistent(inconsistency))
        }
    }
}

#[instrument(skip(db))]
pub async fn highest_committed_rollup_block<T: ConnectionTrait>(
    db: &T,
) -> Result<Option<BlockNumber>> {
    DbBlockNumber::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::HIGHEST_COMMITTED_ROLLUP_BLOCK,
    ))
    .one(db)
    .await
    .context("Failed to get highest committed rollup block")?
    .map(TryInto::try_into)
    .transpose()
}

/// Subset of `candidates` that are stored batch numbers, ascending and deduplicated.
#[instrument(skip(db, candidates))]
pub async fn batch_numbers_present<T: ConnectionTrait>(
    db: &T,
    candidates: impl IntoIterator<Item = u64>,
) -> Result<Vec<u64>> {
    let candidates: Vec<i64> = candidates
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|v| v.try_into())
        .collect::<Result<_, _>>()?;
    if candidates.is_empty() {
        return Ok(vec![]);
    }

    let present: BTreeSet<u64> = DbBatchNumber::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::BATCH_NUMBERS_PRESENT,
        [candidates.into()],
    ))
    .all(db)
    .await
    .context("Failed to get present batch numbers")?
    .into_iter()
    .map(|v| v.number.try_into())
    .collect::<Result<_, _>>()?;

    Ok(present.into_iter().collect())
}

#[instrument(skip(db))]
pub async fn batch_containing_rollup_block<T: ConnectionTrait>(
    db: &T,
    block_number: BlockNumber,
) -> Result<Lookup<CommittedBatch>> {
    let block_number = block_number_param(block_number)?;
    let batch: Lookup<CommittedBatch> =
        match DbCommittedBatch::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql::BATCH_CONTAINING_ROLLUP_BLOCK,
            [block_number.into()],
        ))
        .one(db)
        .await
        .with_context(|| format!("Failed to get batch containing block {block_number}"))?
        {
            Some(batch) => batch.try_into()?,
            None => Lookup::NotFound,
        };

    if let Lookup::Inconsistent(inconsistency) = &batch {
        tracing::warn!(?inconsistency, "Batch commitment transaction not found");
    }
    Ok(batch)
}
