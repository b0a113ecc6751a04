pub const LATEST_DISCOVERED_MESSAGE_BLOCK: &str = r#"
select
    m.originating_transaction_block_number as block_number
from bridge_messages m
where
    m.direction = $1
    and m.originating_transaction_block_number is not null
order by m.message_id desc
limit 1
"#;

pub const EARLIEST_DISCOVERED_MESSAGE_BLOCK: &str = r#"
select
    m.originating_transaction_block_number as block_number
from bridge_messages m
where
    m.direction = $1
    and m.originating_transaction_block_number is not null
order by m.message_id asc
limit 1
"#;

pub const EARLIEST_INCOMING_MESSAGE_ROLLUP_BLOCK: &str = r#"
select
    m.originating_transaction_block_number as block_number
from bridge_messages m
where
    m.direction = 'from_l2'
    and m.originating_transaction_block_number is not null
order by m.originating_transaction_block_number asc
limit 1
"#;

pub const EARLIEST_COMPLETED_OUTGOING_MESSAGE: &str = r#"
select
    m.message_id,
    m.completion_transaction_hash,
    t.block_number::bigint as block_number
from bridge_messages m
    left join transactions t on t.hash = m.completion_transaction_hash
where
    m.direction = 'to_l2'
    and m.completion_transaction_hash is not null
order by m.message_id asc
limit 1
"#;

pub const OUTGOING_MESSAGES_UP_TO_BLOCK: &str = r#"
select
    m.direction,
    m.message_id,
    m.originating_transaction_block_number,
    m.originating_transaction_hash,
    m.completion_transaction_hash,
    m.status
from bridge_messages m
where
    m.direction = 'from_l2'
    and m.status = $1
    and m.originating_transaction_block_number <= $2
order by m.message_id desc
"#;

pub const EARLIEST_COMMITTED_BATCH: &str = r#"
select
    b.number,
    b.commitment_id,
    lt.block_number as commitment_block_number
from bridge_batches b
    left join bridge_lifecycle_transactions lt on lt.id = b.commitment_id
order by b.number asc
limit 1
"#;

pub const LATEST_COMMITTED_BATCH: &str = r#"
select
    b.number,
    b.commitment_id,
    lt.block_number as commitment_block_number
from bridge_batches b
    left join bridge_lifecycle_transactions lt on lt.id = b.commitment_id
order by b.number desc
limit 1
"#;

pub const HIGHEST_COMMITTED_ROLLUP_BLOCK: &str = r#"
select
    b.end_block as block_number
from bridge_batches b
order by b.number desc
limit 1
"#;

pub const BATCH_NUMBERS_PRESENT: &str = r#"
select
    b.number
from bridge_batches b
where
    b.number = any($1)
order by b.number asc
"#;

pub const BATCH_CONTAINING_ROLLUP_BLOCK: &str = r#"
select
    b.number,
    b.start_block,
    b.end_block,
    b.commitment_id,
    lt.hash as commitment_hash,
    lt.block_number as commitment_block_number,
    lt.timestamp as commitment_timestamp,
    lt.status as commitment_status
from bridge_batches b
    left join bridge_lifecycle_transactions lt on lt.id = b.commitment_id
where
    b.start_block <= $1
    and b.end_block >= $1
order by b.number asc
limit 1
"#;

pub const RESOLVE_ROLLUP_BLOCK_HASH: &str = r#"
select
    bb.hash,
    b.number as block_number
from bridge_batch_blocks bb
    left join blocks b on b.hash = bb.hash
where
    bb.hash = $1
"#;

pub const LATEST_CONFIRMED_ROLLUP_BLOCK: &str = r#"
select
    b.number as block_number,
    bb.confirmation_id,
    lt.block_number as l1_block_number
from bridge_batch_blocks bb
    inner join blocks b on b.hash = bb.hash
    left join bridge_lifecycle_transactions lt on lt.id = bb.confirmation_id
where
    bb.confirmation_id is not null
order by b.number desc
limit 1
"#;

pub const UNCONFIRMED_ROLLUP_BLOCKS_IN_RANGE: &str = r#"
select
    bb.hash,
    b.number as block_number,
    bb.batch_number,
    bb.confirmation_id
from bridge_batch_blocks bb
    inner join blocks b on b.hash = bb.hash
where
    b.number >= $1
    and b.number <= $2
    and bb.confirmation_id is null
order by b.number asc
"#;

pub const COUNT_CONFIRMED_ROLLUP_BLOCKS_IN_BATCH: &str = r#"
select
    count(*) as count
from bridge_batch_blocks bb
where
    bb.batch_number = $1
    and bb.confirmation_id is not null
"#;

pub const CONFIRMATION_GROUPS: &str = r#"
select
    bb.confirmation_id,
    min(b.number) as min_block,
    max(b.number) as max_block,
    lt.block_number as l1_block_number
from bridge_batch_blocks bb
    inner join blocks b on b.hash = bb.hash
    left join bridge_lifecycle_transactions lt on lt.id = bb.confirmation_id
where
    bb.confirmation_id is not null
group by
    bb.confirmation_id,
    lt.block_number
order by
    min_block asc,
    bb.confirmation_id asc
"#;

pub const EARLIEST_EXECUTION_BLOCK: &str = r#"
select
    lt.block_number
from bridge_executions e
    inner join bridge_lifecycle_transactions lt on lt.id = e.execution_id
order by lt.block_number asc
limit 1
"#;

pub const LATEST_EXECUTION_BLOCK: &str = r#"
select
    lt.block_number
from bridge_executions e
    inner join bridge_lifecycle_transactions lt on lt.id = e.execution_id
order by lt.block_number desc
limit 1
"#;

pub const GET_LIFECYCLE_TRANSACTION: &str = r#"
select
    lt.id,
    lt.hash,
    lt.block_number,
    lt.timestamp,
    lt.status
from bridge_lifecycle_transactions lt
where
    lt.id = $1
"#;

pub const LIFECYCLE_TRANSACTIONS_BY_HASHES_PREFIX: &str = r#"
select
    lt.id,
    lt.hash,
    lt.block_number,
    lt.timestamp,
    lt.status
from bridge_lifecycle_transactions lt
where
    lt.hash in
"#;

pub const LIFECYCLE_TRANSACTIONS_BY_HASHES_SUFFIX: &str = r#"
order by lt.id asc
"#;

pub const UNFINALIZED_LIFECYCLE_TRANSACTIONS_UP_TO: &str = r#"
select
    lt.id,
    lt.hash,
    lt.block_number,
    lt.timestamp,
    lt.status
from bridge_lifecycle_transactions lt
where
    lt.status = $1
    and lt.block_number <= $2
order by lt.block_number asc, lt.id asc
"#;

pub const NEXT_LIFECYCLE_TRANSACTION_ID: &str = r#"
select
    coalesce(max(lt.id), 0) + 1 as id
from bridge_lifecycle_transactions lt
"#;

pub const GET_WITHDRAWAL_BY_HASH: &str = r#"
select
    w.msg_nonce::text as msg_nonce,
    w.hash,
    w.l2_transaction_hash,
    w.l2_block_number
from bridge_withdrawals w
where
    w.hash = $1
"#;

pub const WITHDRAWALS_BY_L2_TRANSACTION: &str = r#"
select
    w.msg_nonce::text as msg_nonce,
    w.hash,
    w.l2_transaction_hash,
    w.l2_block_number,
    e.l1_transaction_hash as relay_transaction_hash
from bridge_withdrawals w
    left join bridge_withdrawal_events e
        on e.withdrawal_hash = w.hash and e.l1_event_type = 'WithdrawalFinalized'
where
    w.l2_transaction_hash = $1
order by w.msg_nonce asc
"#;

pub const GET_WITHDRAWAL_EVENT: &str = r#"
select
    e.withdrawal_hash,
    e.l1_event_type,
    e.l1_timestamp,
    e.l1_transaction_hash,
    e.l1_block_number,
    e.game_index
from bridge_withdrawal_events e
where
    e.withdrawal_hash = $1
    and e.l1_event_type = $2
order by e.l1_block_number desc
limit 1
"#;

pub const GET_DISPUTE_GAME: &str = r#"
select
    g.index,
    g.game_type,
    g.created_at,
    g.resolved_at,
    g.status,
    g.extra_data
from bridge_dispute_games g
where
    g.index = $1
"#;

pub const RECENT_DISPUTE_GAMES: &str = r#"
select
    g.index,
    g.game_type,
    g.created_at,
    g.resolved_at,
    g.status,
    g.extra_data
from bridge_dispute_games g
where
    g.game_type = $1
order by g.index desc
limit $2
"#;

pub const LATEST_OUTPUT_ROOT: &str = r#"
select
    o.l2_output_index,
    o.l2_block_number,
    o.l1_timestamp
from bridge_output_roots o
order by o.l2_output_index desc
limit 1
"#;
