use alloy_primitives::{Bytes, U256};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

pub use alloy_primitives::{BlockHash, BlockNumber, TxHash, B256};

use crate::well_known::WITHDRAWAL_NONCE_BITS;

pub type Timestamp = DateTime<Utc>;

/// Outcome of a lookup that follows a reference between stored records.
///
/// `NotFound` means ingestion has not produced the record yet, while
/// `Inconsistent` means a referencing record exists but its target does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Inconsistent(Inconsistency),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    BatchWithoutCommitment {
        batch_number: u64,
        commitment_id: u64,
    },
    MissingBlockRecord {
        block_hash: BlockHash,
    },
    UnresolvedConfirmation {
        confirmation_id: u64,
    },
    UnresolvedCompletionTransaction {
        message_id: u64,
        transaction_hash: TxHash,
    },
}

/// Which end of an ordered sequence a frontier query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Earliest,
    Latest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDirection {
    ToL2,
    FromL2,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToL2 => "to_l2",
            Self::FromL2 => "from_l2",
        }
    }
}

impl core::str::FromStr for MessageDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "to_l2" => Ok(Self::ToL2),
            "from_l2" => Ok(Self::FromL2),
            _ => Err(anyhow!("Unknown message direction: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    Initiated,
    Sent,
    Confirmed,
    Relayed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Sent => "sent",
            Self::Confirmed => "confirmed",
            Self::Relayed => "relayed",
        }
    }
}

impl core::str::FromStr for MessageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "initiated" => Ok(Self::Initiated),
            "sent" => Ok(Self::Sent),
            "confirmed" => Ok(Self::Confirmed),
            "relayed" => Ok(Self::Relayed),
            _ => Err(anyhow!("Unknown message status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMessage {
    pub direction: MessageDirection,
    pub message_id: u64,
    /// L1 block for `ToL2`, rollup block for `FromL2`.
    pub originating_transaction_block_number: Option<BlockNumber>,
    pub originating_transaction_hash: Option<TxHash>,
    pub completion_transaction_hash: Option<TxHash>,
    pub status: MessageStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    Unfinalized,
    Finalized,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unfinalized => "unfinalized",
            Self::Finalized => "finalized",
        }
    }
}

impl core::str::FromStr for LifecycleStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unfinalized" => Ok(Self::Unfinalized),
            "finalized" => Ok(Self::Finalized),
            _ => Err(anyhow!("Unknown lifecycle transaction status: {s}")),
        }
    }
}

/// L1 transaction committing a batch, confirming rollup blocks or executing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTransaction {
    pub id: u64,
    pub hash: TxHash,
    pub block_number: BlockNumber,
    pub timestamp: Timestamp,
    pub status: LifecycleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub number: u64,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub commitment_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedBatch {
    pub batch: Batch,
    pub commitment: LifecycleTransaction,
}

/// Rollup block associated with the batch containing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchBlock {
    pub hash: BlockHash,
    pub number: BlockNumber,
    pub batch_number: u64,
    pub confirmation_id: Option<u64>,
}

/// Rollup blocks confirmed by a single confirmation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationGroup {
    pub confirmation_id: u64,
    pub min_block: BlockNumber,
    pub max_block: BlockNumber,
    /// L1 block of the confirmation transaction, if it is indexed.
    pub l1_block_number: Option<BlockNumber>,
}

/// L1 blocks of the confirmation transactions on both sides of a
/// discontinuity in confirmed rollup blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationGap {
    pub previous_l1_block: BlockNumber,
    pub l1_block: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub msg_nonce: U256,
    pub hash: B256,
    pub l2_transaction_hash: TxHash,
    pub l2_block_number: BlockNumber,
}

impl Withdrawal {
    /// Nonce as exposed by the bridge contract, without the version in the upper bits.
    pub fn nonce(&self) -> U256 {
        mask_nonce(self.msg_nonce)
    }
}

pub fn mask_nonce(msg_nonce: U256) -> U256 {
    let mask = (U256::from(1) << WITHDRAWAL_NONCE_BITS) - U256::from(1);
    msg_nonce & mask
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L1EventType {
    Proven,
    Finalized,
}

impl L1EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proven => "WithdrawalProven",
            Self::Finalized => "WithdrawalFinalized",
        }
    }
}

impl core::str::FromStr for L1EventType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WithdrawalProven" => Ok(Self::Proven),
            "WithdrawalFinalized" => Ok(Self::Finalized),
            _ => Err(anyhow!("Unknown withdrawal event type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalEvent {
    pub withdrawal_hash: B256,
    pub l1_event_type: L1EventType,
    pub l1_timestamp: Timestamp,
    pub l1_transaction_hash: TxHash,
    pub l1_block_number: BlockNumber,
    pub game_index: Option<u64>,
}

/// `GameStatus` of the fault dispute game contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameStatus {
    InProgress = 0,
    ChallengerWins = 1,
    DefenderWins = 2,
}

impl TryFrom<i16> for GameStatus {
    type Error = anyhow::Error;

    fn try_from(value: i16) -> Result<Self> {
        match value {
            0 => Ok(Self::InProgress),
            1 => Ok(Self::ChallengerWins),
            2 => Ok(Self::DefenderWins),
            _ => Err(anyhow!("Unknown dispute game status: {value}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeGame {
    pub index: u64,
    pub game_type: u32,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub status: GameStatus,
    pub extra_data: Bytes,
}

impl DisputeGame {
    pub fn defender_won(&self) -> bool {
        self.status == GameStatus::DefenderWins
    }

    /// Rollup block the game's root claim is made for, encoded as the
    /// leading uint256 of the extra data.
    pub fn l2_block_number(&self) -> Option<BlockNumber> {
        let word = self.extra_data.get(0..32)?;
        U256::from_be_slice(word).try_into().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRoot {
    pub l2_output_index: u64,
    pub l2_block_number: BlockNumber,
    pub l1_timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WithdrawalStatus {
    WaitingForStateRoot,
    ReadyToProve,
    WaitingForGameToResolve,
    InChallengePeriod,
    ReadyForRelay,
    Relayed,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForStateRoot => "Waiting for state root",
            Self::ReadyToProve => "Ready to prove",
            Self::WaitingForGameToResolve => "Waiting a game to resolve",
            Self::InChallengePeriod => "In challenge period",
            Self::ReadyForRelay => "Ready for relay",
            Self::Relayed => "Relayed",
        }
    }
}

impl core::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub status: WithdrawalStatus,
    pub ready_at: Option<Timestamp>,
}

impl StatusReport {
    pub fn new(status: WithdrawalStatus) -> Self {
        Self {
            status,
            ready_at: None,
        }
    }

    pub fn ready_at(status: WithdrawalStatus, ready_at: Timestamp) -> Self {
        Self {
            status,
            ready_at: Some(ready_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithdrawalStatus {
    pub nonce: U256,
    pub status: WithdrawalStatus,
    pub relay_transaction_hash: Option<TxHash>,
}

/// Snapshot of every indexing frontier at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexingProgress {
    pub earliest_to_l2_message_l1_block: Option<BlockNumber>,
    pub latest_to_l2_message_l1_block: Option<BlockNumber>,
    pub earliest_from_l2_message_rollup_block: Option<BlockNumber>,
    pub earliest_committed_batch_l1_block: Option<BlockNumber>,
    pub latest_committed_batch_l1_block: Option<BlockNumber>,
    pub highest_committed_rollup_block: Option<BlockNumber>,
    pub highest_confirmed_rollup_block: Option<BlockNumber>,
    pub latest_confirmation_l1_block: Option<BlockNumber>,
    pub earliest_execution_l1_block: Option<BlockNumber>,
    pub latest_execution_l1_block: Option<BlockNumber>,
    pub inconsistencies: Vec<Inconsistency>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn nonce_drops_version_bits() {
        let withdrawal = Withdrawal {
            msg_nonce: (U256::from(1) << 240) + U256::from(42),
            hash: B256::ZERO,
            l2_transaction_hash: TxHash::ZERO,
            l2_block_number: 0,
        };
        assert_eq!(withdrawal.nonce(), U256::from(42));

        let max_nonce = (U256::from(1) << 240) - U256::from(1);
        assert_eq!(mask_nonce(max_nonce), max_nonce);
        assert_eq!(mask_nonce(U256::MAX), max_nonce);
    }

    #[test]
    fn game_block_number_decoded_from_extra_data() {
        let mut game = DisputeGame {
            index: 0,
            game_type: 0,
            created_at: Timestamp::default(),
            resolved_at: None,
            status: GameStatus::InProgress,
            extra_data: b256!("0x00000000000000000000000000000000000000000000000000000000000004d2")
                .to_vec()
                .into(),
        };
        assert_eq!(game.l2_block_number(), Some(1234));

        game.extra_data = Bytes::from(vec![0u8; 16]);
        assert_eq!(game.l2_block_number(), None);

        game.extra_data = B256::repeat_byte(0xff).to_vec().into();
        assert_eq!(game.l2_block_number(), None);
    }

    #[test]
    fn labels_parse_back() {
        for direction in [MessageDirection::ToL2, MessageDirection::FromL2] {
            assert_eq!(direction.as_str().parse::<MessageDirection>().unwrap(), direction);
        }
        for event in [L1EventType::Proven, L1EventType::Finalized] {
            assert_eq!(event.as_str().parse::<L1EventType>().unwrap(), event);
        }
        assert!("pending".parse::<MessageStatus>().is_err());
        for status in [LifecycleStatus::Unfinalized, LifecycleStatus::Finalized] {
            assert_eq!(status.as_str().parse::<LifecycleStatus>().unwrap(), status);
        }
    }

    #[test]
    fn game_status_from_stored_value() {
        assert_eq!(GameStatus::try_from(0).unwrap(), GameStatus::InProgress);
        assert_eq!(GameStatus::try_from(1).unwrap(), GameStatus::ChallengerWins);
        assert_eq!(GameStatus::try_from(2).unwrap(), GameStatus::DefenderWins);
        assert!(GameStatus::try_from(3).is_err());
        assert!(GameStatus::try_from(-1).is_err());
    }

    #[test]
    fn lookup_from_option() {
        assert_eq!(Lookup::from(Some(3)), Lookup::Found(3));
        assert_eq!(Lookup::<u64>::from(None), Lookup::NotFound);
        assert_eq!(Lookup::Found(3).found(), Some(3));
    }
}
