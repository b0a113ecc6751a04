use anyhow::{Context, Result};
use sea_orm::{prelude::*, DbBackend, FromQueryResult, Statement};
use std::collections::BTreeSet;
use tracing::instrument;

use super::{block_number_param, sql};
use crate::types::{BlockNumber, LifecycleStatus, LifecycleTransaction, TxHash};

#[derive(Debug, FromQueryResult)]
struct DbLifecycleTransaction {
    pub id: i64,
    pub hash: Vec<u8>,
    pub block_number: i64,
    pub timestamp: chrono::NaiveDateTime,
    pub status: String,
}

impl TryFrom<DbLifecycleTransaction> for LifecycleTransaction {
    type Error = anyhow::Error;

    fn try_from(value: DbLifecycleTransaction) -> Result<Self> {
        Ok(Self {
            id: value.id.try_into()?,
            hash: value.hash.as_slice().try_into()?,
            block_number: value.block_number.try_into()?,
            timestamp: value.timestamp.and_utc(),
            status: value.status.parse()?,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct DbNextId {
    pub id: i64,
}

#[instrument(skip(db))]
pub async fn get_lifecycle_transaction<T: ConnectionTrait>(
    db: &T,
    id: u64,
) -> Result<Option<LifecycleTransaction>> {
    let id: i64 = id.try_into()?;
    DbLifecycleTransaction::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::GET_LIFECYCLE_TRANSACTION,
        [id.into()],
    ))
    .one(db)
    .await
    .with_context(|| format!("Failed to get lifecycle transaction {id}"))?
    .map(TryInto::try_into)
    .transpose()
}

/// Indexed lifecycle transactions among `hashes`, by id.
#[instrument(skip(db, hashes))]
pub async fn lifecycle_transactions_by_hashes<T: ConnectionTrait>(
    db: &T,
    hashes: impl IntoIterator<Item = TxHash>,
) -> Result<Vec<LifecycleTransaction>> {
    let hashes: BTreeSet<TxHash> = hashes.into_iter().collect();
    if hashes.is_empty() {
        return Ok(vec![]);
    }

    let placeholders = (1..=hashes.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "{}({placeholders}){}",
        sql::LIFECYCLE_TRANSACTIONS_BY_HASHES_PREFIX,
        sql::LIFECYCLE_TRANSACTIONS_BY_HASHES_SUFFIX
    );

    DbLifecycleTransaction::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        query,
        hashes.iter().map(|hash| hash.to_vec().into()),
    ))
    .all(db)
    .await
    .context("Failed to get lifecycle transactions by hashes")?
    .into_iter()
    .map(LifecycleTransaction::try_from)
    .collect()
}

/// Unfinalized lifecycle transactions included at or below `block_number`,
/// i.e. the candidates for finalization once that L1 block is final.
#[instrument(skip(db))]
pub async fn unfinalized_lifecycle_transactions_up_to<T: ConnectionTrait>(
    db: &T,
    block_number: BlockNumber,
) -> Result<Vec<LifecycleTransaction>> {
    let block_number = block_number_param(block_number)?;
    DbLifecycleTransaction::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql::UNFINALIZED_LIFECYCLE_TRANSACTIONS_UP_TO,
        [
            LifecycleStatus::Unfinalized.as_str().into(),
            block_number.into(),
        ],
    ))
    .all(db)
    .await
    .context("Failed to get unfinalized lifecycle transactions")?
    .into_iter()
    .map(LifecycleTransaction::try_from)
    .collect()
}

/// Id to assign to the next lifecycle transaction, starting from 1.
#[instrument(skip(db))]
pub async fn next_lifecycle_transaction_id<T: ConnectionTrait>(db: &T) -> Result<u64> {
    let id = DbNextId::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        sql::NEXT_LIFECYCLE_TRANSACTION_ID,
    ))
    .one(db)
    .await
    .context("Failed to get next lifecycle transaction id")?
    .map_or(1, |v| v.id);

    Ok(id.try_into()?)
}
