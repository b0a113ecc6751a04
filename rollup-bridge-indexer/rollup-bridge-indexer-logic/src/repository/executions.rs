use anyhow::{Context, Result};
use sea_orm::{prelude::*, DbBackend, FromQueryResult, Statement};
use tracing::instrument;

use super::{sql, DbBlockNumber};
use crate::types::{BlockNumber, Edge};

/// L1 block of the lowest or highest indexed execution transaction.
#[instrument(skip(db))]
pub async fn l1_block_of_execution<T: ConnectionTrait>(
    db: &T,
    edge: Edge,
) -> Result<Option<BlockNumber>> {
    let query = match edge {
        Edge::Earliest => sql::EARLIEST_EXECUTION_BLOCK,
        Edge::Latest => sql::LATEST_EXECUTION_BLOCK,
    };
    DbBlockNumber::find_by_statement(Statement::from_string(DbBackend::Postgres, query))
        .one(db)
        .await
        .context("Failed to get execution block")?
        .map(TryInto::try_into)
        .transpose()
}
