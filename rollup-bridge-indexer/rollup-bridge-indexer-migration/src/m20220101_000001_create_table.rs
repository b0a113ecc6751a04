use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Rollup blocks and transactions come from the block indexer's schema.
        for table in ["blocks", "transactions"] {
            if !manager.has_table(table).await? {
                return Err(DbErr::Migration(format!(
                    "Table {table} does not exist in the database"
                )));
            }
        }

        let sql = r#"
create table bridge_lifecycle_transactions (
    id bigint primary key,
    hash bytea not null unique,
    block_number bigint not null,
    timestamp timestamp not null,
    status text not null check (status in ('unfinalized', 'finalized'))
);

create index bridge_lifecycle_transactions_status_block_number_idx
    on bridge_lifecycle_transactions (status, block_number);

create table bridge_messages (
    direction text not null check (direction in ('to_l2', 'from_l2')),
    message_id bigint not null,
    originating_transaction_block_number bigint,
    originating_transaction_hash bytea,
    completion_transaction_hash bytea,
    status text not null check (status in ('initiated', 'sent', 'confirmed', 'relayed')),
    primary key (direction, message_id)
);

create index bridge_messages_originating_block_idx
    on bridge_messages (direction, originating_transaction_block_number);

create table bridge_batches (
    number bigint primary key,
    start_block bigint not null,
    end_block bigint not null,
    commitment_id bigint not null,
    check (start_block <= end_block)
);

create index bridge_batches_block_range_idx on bridge_batches (start_block, end_block);

create table bridge_batch_blocks (
    hash bytea primary key,
    batch_number bigint not null,
    confirmation_id bigint
);

create index bridge_batch_blocks_batch_number_idx on bridge_batch_blocks (batch_number);
create index bridge_batch_blocks_confirmation_id_idx on bridge_batch_blocks (confirmation_id);

create table bridge_executions (
    message_id bigint primary key,
    execution_id bigint not null
);

create index bridge_executions_execution_id_idx on bridge_executions (execution_id)
"#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            drop table if exists bridge_executions;
            drop table if exists bridge_batch_blocks;
            drop table if exists bridge_batches;
            drop table if exists bridge_messages;
            drop table if exists bridge_lifecycle_transactions;
        "#;
        crate::from_sql(manager, sql).await
    }
}
