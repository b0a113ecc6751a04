use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
create table bridge_withdrawals (
    msg_nonce numeric(78, 0) primary key,
    hash bytea not null unique,
    l2_transaction_hash bytea not null,
    l2_block_number bigint not null
);

create index bridge_withdrawals_l2_transaction_hash_idx
    on bridge_withdrawals (l2_transaction_hash);

create table bridge_withdrawal_events (
    withdrawal_hash bytea not null,
    l1_event_type text not null
        check (l1_event_type in ('WithdrawalProven', 'WithdrawalFinalized')),
    l1_timestamp timestamp not null,
    l1_transaction_hash bytea not null,
    l1_block_number bigint not null,
    game_index bigint,
    primary key (withdrawal_hash, l1_event_type, l1_transaction_hash)
);

create unique index bridge_withdrawal_events_finalized_idx
    on bridge_withdrawal_events (withdrawal_hash)
    where l1_event_type = 'WithdrawalFinalized';

create table bridge_dispute_games (
    index bigint primary key,
    game_type int not null,
    address bytea not null,
    created_at timestamp not null,
    resolved_at timestamp,
    status smallint not null,
    extra_data bytea not null
);

create index bridge_dispute_games_game_type_idx on bridge_dispute_games (game_type, index desc);

create table bridge_output_roots (
    l2_output_index bigint primary key,
    l2_block_number bigint not null,
    output_root bytea not null,
    l1_transaction_hash bytea not null,
    l1_block_number bigint not null,
    l1_timestamp timestamp not null
)
"#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            drop table if exists bridge_output_roots;
            drop table if exists bridge_dispute_games;
            drop table if exists bridge_withdrawal_events;
            drop table if exists bridge_withdrawals;
        "#;
        crate::from_sql(manager, sql).await
    }
}
