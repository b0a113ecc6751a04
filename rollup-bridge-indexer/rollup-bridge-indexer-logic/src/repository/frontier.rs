use anyhow::Result;
use sea_orm::ConnectionTrait;
use tracing::instrument;

use super::{batch_blocks, batches, executions, messages};
use crate::types::{BlockNumber, Edge, IndexingProgress, Inconsistency, Lookup, MessageDirection};

fn collect(
    lookup: Lookup<BlockNumber>,
    inconsistencies: &mut Vec<Inconsistency>,
) -> Option<BlockNumber> {
    match lookup {
        Lookup::Found(v) => Some(v),
        Lookup::NotFound => None,
        Lookup::Inconsistent(inconsistency) => {
            inconsistencies.push(inconsistency);
            None
        }
    }
}

/// Reads every indexing frontier, recording inconsistencies found on the way
/// instead of failing on them.
///
/// Queries are issued one after another; run inside a transaction for a
/// consistent snapshot.
#[instrument(skip(db))]
pub async fn indexing_progress<T: ConnectionTrait>(db: &T) -> Result<IndexingProgress> {
    let mut inconsistencies = vec![];

    let earliest_to_l2_message_l1_block =
        messages::earliest_discovered_l1_block(db, MessageDirection::ToL2).await?;
    let latest_to_l2_message_l1_block =
        messages::latest_discovered_l1_block(db, MessageDirection::ToL2).await?;
    let earliest_from_l2_message_rollup_block =
        messages::earliest_rollup_block_for_incoming_message(db).await?;

    let earliest_committed_batch_l1_block = collect(
        batches::l1_block_of_committed_batch(db, Edge::Earliest).await?,
        &mut inconsistencies,
    );
    let latest_committed_batch_l1_block = collect(
        batches::l1_block_of_committed_batch(db, Edge::Latest).await?,
        &mut inconsistencies,
    );
    let highest_committed_rollup_block = batches::highest_committed_rollup_block(db).await?;

    let highest_confirmed_rollup_block = batch_blocks::highest_confirmed_rollup_block(db).await?;
    let latest_confirmation_l1_block = collect(
        batch_blocks::l1_block_of_latest_confirmed_rollup_block(db).await?,
        &mut inconsistencies,
    );

    let earliest_execution_l1_block = executions::l1_block_of_execution(db, Edge::Earliest).await?;
    let latest_execution_l1_block = executions::l1_block_of_execution(db, Edge::Latest).await?;

    Ok(IndexingProgress {
        earliest_to_l2_message_l1_block,
        latest_to_l2_message_l1_block,
        earliest_from_l2_message_rollup_block,
        earliest_committed_batch_l1_block,
        latest_committed_batch_l1_block,
        highest_committed_rollup_block,
        highest_confirmed_rollup_block,
        latest_confirmation_l1_block,
        earliest_execution_l1_block,
        latest_execution_l1_block,
        inconsistencies,
    })
}
