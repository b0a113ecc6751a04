use crate::types::BlockNumber;

/// Malformed arguments, rejected before the store is queried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("invalid block range: first block {first} is after last block {last}")]
    InvalidBlockRange {
        first: BlockNumber,
        last: BlockNumber,
    },
    #[error("block number {0} is out of range")]
    BlockNumberOutOfRange(BlockNumber),
}

/// A policy constant needed by the requested computation is absent or unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("fault proof finality delay is not configured")]
    MissingFinalityDelay,
    #[error("proof maturity delay is not configured")]
    MissingProofMaturityDelay,
    #[error("{0} is out of range")]
    DurationOutOfRange(&'static str),
}
