use anyhow::Result;
use sea_orm::FromQueryResult;

use crate::{errors::InputError, types::BlockNumber};

pub mod batch_blocks;
pub mod batches;
pub mod executions;
pub mod frontier;
pub mod lifecycle_transactions;
pub mod messages;
pub mod withdrawals;

mod sql;

/// Block numbers are stored as `bigint`.
fn block_number_param(block_number: BlockNumber) -> Result<i64, InputError> {
    i64::try_from(block_number).map_err(|_| InputError::BlockNumberOutOfRange(block_number))
}

#[derive(Debug, FromQueryResult)]
struct DbBlockNumber {
    pub block_number: i64,
}

impl TryFrom<DbBlockNumber> for BlockNumber {
    type Error = anyhow::Error;

    fn try_from(value: DbBlockNumber) -> Result<Self> {
        Ok(value.block_number.try_into()?)
    }
}
