use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use rollup_bridge_indexer_logic::{
    repository::{batch_blocks, frontier, withdrawals},
    types::{Lookup, TxHash, B256},
    well_known::DEFAULT_CHALLENGE_PERIOD_SECS,
    StatusSettings,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    db: String,

    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SettingsArgs {
    /// Seconds a proven withdrawal waits before relay under the legacy rule.
    #[arg(long, env = "BRIDGE_CHALLENGE_PERIOD", default_value_t = DEFAULT_CHALLENGE_PERIOD_SECS)]
    challenge_period: u64,

    #[arg(long, env = "BRIDGE_FAULT_PROOF_FINALITY_DELAY")]
    fault_proof_finality_delay: Option<u64>,

    #[arg(long, env = "BRIDGE_PROOF_MATURITY_DELAY")]
    proof_maturity_delay: Option<u64>,

    #[arg(long, env = "BRIDGE_RESPECTED_GAME_TYPE")]
    respected_game_type: Option<u32>,
}

impl From<SettingsArgs> for StatusSettings {
    fn from(value: SettingsArgs) -> Self {
        Self {
            challenge_period: Duration::from_secs(value.challenge_period),
            fault_proof_finality_delay: value.fault_proof_finality_delay.map(Duration::from_secs),
            proof_maturity_delay: value.proof_maturity_delay.map(Duration::from_secs),
            respected_game_type: value.respected_game_type,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations.
    Migrate,
    /// Print every indexing frontier.
    Progress,
    /// Print the L1 block range bounding the most recent confirmation gap.
    ConfirmationGap,
    UnconfirmedBlocks {
        first: u64,
        last: u64,
    },
    WithdrawalStatus {
        hash: B256,
    },
    TransactionStatuses {
        l2_transaction_hash: TxHash,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    let settings = StatusSettings::from(cli.settings);

    let db = sea_orm::Database::connect(cli.db)
        .await
        .context("Failed to connect to database")?;
    match cli.command {
        Commands::Migrate => {
            Migrator::up(&db, None).await?;
            tracing::info!("Migrations applied");
        }
        Commands::Progress => {
            let progress = frontier::indexing_progress(&db).await?;
            println!("{progress:#?}");
        }
        Commands::ConfirmationGap => match batch_blocks::find_first_confirmation_gap(&db).await? {
            Lookup::Found(gap) => println!("{}..{}", gap.previous_l1_block, gap.l1_block),
            Lookup::NotFound => println!("no gap"),
            Lookup::Inconsistent(inconsistency) => println!("inconsistent: {inconsistency:?}"),
        },
        Commands::UnconfirmedBlocks { first, last } => {
            for block in batch_blocks::unconfirmed_rollup_blocks_in_range(&db, first, last).await? {
                println!("{} {} batch={}", block.number, block.hash, block.batch_number);
            }
        }
        Commands::WithdrawalStatus { hash } => {
            let withdrawal = withdrawals::get_withdrawal_by_hash(&db, hash)
                .await?
                .with_context(|| format!("Withdrawal {hash} not found"))?;
            let report =
                withdrawals::withdrawal_status(&db, &withdrawal, &settings, chrono::Utc::now())
                    .await?;
            match report.ready_at {
                Some(ready_at) => println!("{} (ready at {ready_at})", report.status),
                None => println!("{}", report.status),
            }
        }
        Commands::TransactionStatuses {
            l2_transaction_hash,
        } => {
            let statuses = withdrawals::transaction_statuses(
                &db,
                l2_transaction_hash,
                &settings,
                chrono::Utc::now(),
            )
            .await?;
            for status in statuses {
                match status.relay_transaction_hash {
                    Some(relay) => println!("{} {} {relay}", status.nonce, status.status),
                    None => println!("{} {}", status.nonce, status.status),
                }
            }
        }
    };

    Ok(())
}
