use anyhow::{Context, Result};
use sea_orm::{prelude::*, DbBackend, FromQueryResult, Statement};
use tracing::instrument;

use super::{block_number_param, sql};
use crate::{
    errors::InputError,
    gaps,
    types::{
        BatchBlock, BlockHash, BlockNumber, ConfirmationGap, ConfirmationGroup, Inconsistency,
        Lookup,
    },
};

#[derive(Debug, FromQueryResult)]
struct DbResolvedBlockHash {
    pub hash: Vec<u8>,
    pub block_number: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct DbConfirmedBlock {
    pub block_number: i64,
    pub confirmation_id: i64,
    pub l1_block_number: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct DbBatchBlock {
    pub hash: Vec<u8>,
    pub block_number: i64,
    pub batch_number: i64,
    pub confirmation_id: Option<i64>,
}

impl TryFrom<DbBatchBlock> for BatchBlock {
    type Error = anyhow::Error;

    fn try_from(value: DbBatchBlock) -> Result<Self> {
        Ok(Self {
            hash: value.hash.as_slice().try_into()?,
            number: value.block_number.try_into()?,
            batch_number: value.batch_number.try_into()?,
            confirmation_id: value.confirmation_id.map(|v| v.try_into()).transpose()?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbConfirmationGroup {
    pub confirmation_id: i64,
    pub min_block: i64,
    pub max_block: i64,
    pub l1_block_number: Option<i64>,
}

impl TryFrom<DbConfirmationGroup> for ConfirmationGroup {
    type Error = anyhow::Error;

    fn try_from(value: DbConfirmationGroup) -> Result<Self> {
        Ok(Self {
            confirmation_id: value.confirmation_id.try_into()?,
            min_block: value.min_block.try_into()?,
            max_block: value.max_block.try_into()?,
            l1_block_number: value.l1_block_number.map(|v| v.try_into()).transpose()?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbCount {
    pub count: i64,
}

/// Number of the rollup block with the given hash.
///
/// `NotFound` means the block is not associated with a batch yet, while an
/// association pointing to an unknown block record is an inconsistency.
#[instrument(skip(db))]
pub async fn resolve_rollup_block_hash<T: ConnectionTrait>(
    db: &T,
    hash: BlockHash,
) -> Result<Lookup<BlockNumber>> {
    let Some(resolved) = DbResolvedBlockHash::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::RESOLVE_ROLLUP_BLOCK_HASH,
        [hash.to_vec().into()],
    ))
    .one(db)
    .await
    .with_context(|| format!("Failed to resolve rollup block hash {hash}"))?
    else {
        return Ok(Lookup::NotFound);
    };

    match resolved.block_number {
        Some(block_number) => Ok(Lookup::Found(block_number.try_into()?)),
        None => {
            let inconsistency = Inconsistency::MissingBlockRecord {
                block_hash: resolved.hash.as_slice().try_into()?,
            };
            tracing::warn!(?inconsistency, "Batch block has no block record");
            Ok(Lookup::Inconsistent(inconsistency))
        }
    }
}

async fn latest_confirmed_block<T: ConnectionTrait>(db: &T) -> Result<Option<DbConfirmedBlock>> {
    DbConfirmedBlock::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::LATEST_CONFIRMED_ROLLUP_BLOCK,
    ))
    .one(db)
    .await
    .context("Failed to get latest confirmed rollup block")
}

/// L1 block of the transaction confirming the highest confirmed rollup block.
#[instrument(skip(db))]
pub async fn l1_block_of_latest_confirmed_rollup_block<T: ConnectionTrait>(
    db: &T,
) -> Result<Lookup<BlockNumber>> {
    let Some(block) = latest_confirmed_block(db).await? else {
        return Ok(Lookup::NotFound);
    };

    match block.l1_block_number {
        Some(l1_block_number) => Ok(Lookup::Found(l1_block_number.try_into()?)),
        None => {
            let inconsistency = Inconsistency::UnresolvedConfirmation {
                confirmation_id: block.confirmation_id.try_into()?,
            };
            tracing::warn!(?inconsistency, "Confirmation transaction not found");
            Ok(Lookup::Inconsistent(inconsistency))
        }
    }
}

#[instrument(skip(db))]
pub async fn highest_confirmed_rollup_block<T: ConnectionTrait>(
    db: &T,
) -> Result<Option<BlockNumber>> {
    Ok(latest_confirmed_block(db)
        .await?
        .map(|v| v.block_number.try_into())
        .transpose()?)
}

/// Unconfirmed rollup blocks numbered within `first..=last`, ascending.
///
/// Only blocks already known to the block indexer are returned; the caller
/// is responsible for keeping the range bounded.
#[instrument(skip(db))]
pub async fn unconfirmed_rollup_blocks_in_range<T: ConnectionTrait>(
    db: &T,
    first: BlockNumber,
    last: BlockNumber,
) -> Result<Vec<BatchBlock>> {
    if first > last {
        return Err(InputError::InvalidBlockRange { first, last }.into());
    }
    let first = block_number_param(first)?;
    let last = block_number_param(last)?;

    DbBatchBlock::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::UNCONFIRMED_ROLLUP_BLOCKS_IN_RANGE,
        [first.into(), last.into()],
    ))
    .all(db)
    .await
    .context("Failed to get unconfirmed rollup blocks")?
    .into_iter()
    .map(BatchBlock::try_from)
    .collect()
}

#[instrument(skip(db))]
pub async fn count_confirmed_rollup_blocks_in_batch<T: ConnectionTrait>(
    db: &T,
    batch_number: u64,
) -> Result<u64> {
    let batch_number: i64 = batch_number.try_into()?;
    let count = DbCount::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::COUNT_CONFIRMED_ROLLUP_BLOCKS_IN_BATCH,
        [batch_number.into()],
    ))
    .one(db)
    .await
    .context("Failed to count confirmed rollup blocks")?
    .map_or(0, |v| v.count);

    Ok(count.try_into()?)
}

/// Rollup block ranges grouped by confirmation transaction, by lowest block.
#[instrument(skip(db))]
pub async fn confirmation_groups<T: ConnectionTrait>(db: &T) -> Result<Vec<ConfirmationGroup>> {
    DbConfirmationGroup::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::CONFIRMATION_GROUPS,
    ))
    .all(db)
    .await
    .context("Failed to get confirmation groups")?
    .into_iter()
    .map(ConfirmationGroup::try_from)
    .collect()
}

/// L1 blocks of the confirmations bounding the most recent gap in confirmed
/// rollup blocks, so the missing confirmations can be looked for between them.
///
/// `NotFound` means confirmed blocks form one contiguous run.
#[instrument(skip(db))]
pub async fn find_first_confirmation_gap<T: ConnectionTrait>(
    db: &T,
) -> Result<Lookup<ConfirmationGap>> {
    let groups = confirmation_groups(db).await?;
    let gap = gaps::most_recent_gap(&groups);
    match &gap {
        Lookup::Found(gap) => tracing::debug!(?gap, "Found confirmation gap"),
        Lookup::Inconsistent(inconsistency) => {
            tracing::warn!(?inconsistency, "Confirmation gap bounded by unknown transaction")
        }
        Lookup::NotFound => {}
    }
    Ok(gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_db, none_i64, row, Row};
    use pretty_assertions::assert_eq;
    use sea_orm::{Transaction, Value};

    fn group(confirmation_id: i64, min: i64, max: i64, l1: Option<i64>) -> Row {
        row([
            ("confirmation_id", confirmation_id.into()),
            ("min_block", min.into()),
            ("max_block", max.into()),
            ("l1_block_number", Value::from(l1)),
        ])
    }

    #[tokio::test]
    async fn rollup_block_hash_three_way() {
        let hash = BlockHash::repeat_byte(0x01);
        let db = mock_db(vec![
            vec![row([
                ("hash", hash.to_vec().into()),
                ("block_number", Value::from(Some(77i64))),
            ])],
            vec![],
            vec![row([
                ("hash", hash.to_vec().into()),
                ("block_number", none_i64()),
            ])],
        ]);

        assert_eq!(
            resolve_rollup_block_hash(&db, hash).await.unwrap(),
            Lookup::Found(77)
        );
        assert_eq!(
            resolve_rollup_block_hash(&db, hash).await.unwrap(),
            Lookup::NotFound
        );
        assert_eq!(
            resolve_rollup_block_hash(&db, hash).await.unwrap(),
            Lookup::Inconsistent(Inconsistency::MissingBlockRecord { block_hash: hash })
        );
    }

    #[tokio::test]
    async fn latest_confirmed_block_and_its_l1_block() {
        let confirmed = |l1: Option<i64>| {
            row([
                ("block_number", 640i64.into()),
                ("confirmation_id", 8i64.into()),
                ("l1_block_number", Value::from(l1)),
            ])
        };
        let db = mock_db(vec![
            vec![confirmed(Some(19_000))],
            vec![confirmed(Some(19_000))],
            vec![confirmed(None)],
            vec![],
        ]);

        assert_eq!(highest_confirmed_rollup_block(&db).await.unwrap(), Some(640));
        assert_eq!(
            l1_block_of_latest_confirmed_rollup_block(&db).await.unwrap(),
            Lookup::Found(19_000)
        );
        assert_eq!(
            l1_block_of_latest_confirmed_rollup_block(&db).await.unwrap(),
            Lookup::Inconsistent(Inconsistency::UnresolvedConfirmation { confirmation_id: 8 })
        );
        assert_eq!(
            l1_block_of_latest_confirmed_rollup_block(&db).await.unwrap(),
            Lookup::NotFound
        );
    }

    #[tokio::test]
    async fn reversed_range_rejected_before_query() {
        let db = mock_db(vec![]);
        let err = unconfirmed_rollup_blocks_in_range(&db, 10, 5)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::InvalidBlockRange { first: 10, last: 5 })
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn range_beyond_bigint_rejected_before_query() {
        let db = mock_db(vec![]);
        let err = unconfirmed_rollup_blocks_in_range(&db, 0, u64::MAX)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::BlockNumberOutOfRange(u64::MAX))
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn unconfirmed_blocks_in_range() {
        let block = |n: i64| {
            row([
                ("hash", BlockHash::repeat_byte(n as u8).to_vec().into()),
                ("block_number", n.into()),
                ("batch_number", 2i64.into()),
                ("confirmation_id", none_i64()),
            ])
        };
        let db = mock_db(vec![vec![block(5), block(6)], vec![]]);

        let blocks = unconfirmed_rollup_blocks_in_range(&db, 5, 9).await.unwrap();
        assert_eq!(
            blocks,
            vec![
                BatchBlock {
                    hash: BlockHash::repeat_byte(5),
                    number: 5,
                    batch_number: 2,
                    confirmation_id: None,
                },
                BatchBlock {
                    hash: BlockHash::repeat_byte(6),
                    number: 6,
                    batch_number: 2,
                    confirmation_id: None,
                },
            ]
        );

        // A single block range is valid.
        assert!(unconfirmed_rollup_blocks_in_range(&db, 7, 7)
            .await
            .unwrap()
            .is_empty());

        assert_eq!(
            db.into_transaction_log()[0],
            Transaction::from_sql_and_values(
                DbBackend::Postgres,
                sql::UNCONFIRMED_ROLLUP_BLOCKS_IN_RANGE,
                [5i64.into(), 9i64.into()],
            )
        );
    }

    #[tokio::test]
    async fn confirmed_blocks_counted_per_batch() {
        let db = mock_db(vec![vec![row([("count", 12i64.into())])]]);
        assert_eq!(
            count_confirmed_rollup_blocks_in_batch(&db, 4).await.unwrap(),
            12
        );
    }

    #[tokio::test]
    async fn confirmation_gap_from_groups() {
        let db = mock_db(vec![
            vec![
                group(1, 0, 3, Some(100)),
                group(2, 7, 9, Some(200)),
                group(3, 12, 15, Some(300)),
            ],
            vec![
                group(1, 0, 3, Some(100)),
                group(2, 4, 9, Some(200)),
                group(3, 10, 15, Some(300)),
            ],
            vec![group(1, 0, 3, Some(100)), group(2, 7, 9, None)],
            vec![],
        ]);

        assert_eq!(
            find_first_confirmation_gap(&db).await.unwrap(),
            Lookup::Found(ConfirmationGap {
                previous_l1_block: 200,
                l1_block: 300,
            })
        );
        assert_eq!(
            find_first_confirmation_gap(&db).await.unwrap(),
            Lookup::NotFound
        );
        assert_eq!(
            find_first_confirmation_gap(&db).await.unwrap(),
            Lookup::Inconsistent(Inconsistency::UnresolvedConfirmation { confirmation_id: 2 })
        );
        assert_eq!(
            find_first_confirmation_gap(&db).await.unwrap(),
            Lookup::NotFound
        );
    }
}
