//! Order Book CLI
//!
//! Command-line access to the order book API. Every response is printed as
//! pretty JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin orderbook -- --chain-id 100 order 0x1234...
//! ```
//!
//! Or set the config path via environment variable:
//!
//! ```bash
//! ORDERBOOK_CONFIG_PATH=orderbook.toml cargo run --bin orderbook -- version
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cow_api::config::file::CONFIG_PATH_ENV;
use cow_api::order_book::{Address, AppDataHash, OrderUid, SolverCompetitionId, TransactionHash};
use cow_api::{ClientConfig, Env, OrderBookApi, ServiceKind};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "orderbook")]
#[command(about = "Query the CoW Protocol order book API")]
struct Args {
    /// Path to configuration file (default: config/orderbook.toml or ORDERBOOK_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Environment ("prod" or "staging"), overrides the config file
    #[arg(long)]
    env: Option<Env>,

    /// EIP-155 chain ID, overrides the config file
    #[arg(long)]
    chain_id: Option<u64>,

    /// Explicit API base URL, overrides the resolved endpoint
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the order book service version
    Version,
    /// Fetch one order by UID
    Order { uid: String },
    /// List orders of an owner
    Orders {
        owner: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// List trades of an owner or an order
    Trades {
        #[arg(long, conflicts_with = "order_uid", required_unless_present = "order_uid")]
        owner: Option<String>,
        #[arg(long)]
        order_uid: Option<String>,
    },
    /// List orders settled in a transaction
    TxOrders { tx_hash: String },
    /// Fetch a token's price in the native token
    NativePrice { token: String },
    /// Fetch a user's total surplus
    Surplus { user: String },
    /// Fetch an app data document by hash
    AppData { hash: String },
    /// Fetch a solver competition (latest when no ID is given)
    Competition {
        /// Auction ID
        #[arg(long, conflicts_with = "tx_hash")]
        auction_id: Option<u64>,
        /// Settlement transaction hash
        #[arg(long)]
        tx_hash: Option<String>,
    },
    /// Print the API link of an order without fetching it
    Link { uid: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Priority: CLI arg > env var > default
    let mut config = if let Some(path) = &args.config {
        info!("Loading configuration from: {}", path);
        ClientConfig::load_from_path(Some(path))?
    } else {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            info!("Loading configuration from {}: {}", CONFIG_PATH_ENV, path);
        }
        ClientConfig::load()?
    };

    if let Some(env) = args.env {
        config.env = env;
    }
    if let Some(chain_id) = args.chain_id {
        config.chain_id = chain_id;
    }
    if let Some(base_url) = args.base_url {
        config.base_url = Some(base_url);
    }
    config.validate()?;

    let context = config
        .to_context(ServiceKind::OrderBook)
        .context("Failed to resolve order book endpoint")?;
    info!("Order book: {} ({}, {})", context.base_url, context.env, context.chain_id);

    let api = OrderBookApi::from_context(context)?;

    match args.command {
        Command::Version => print_json(&api.get_version(None).await?),
        Command::Order { uid } => print_json(&api.get_order_by_uid(&OrderUid::from(uid), None).await?),
        Command::Orders {
            owner,
            limit,
            offset,
        } => print_json(
            &api.get_orders_by_owner(&Address::from(owner), limit, offset, None)
                .await?,
        ),
        Command::Trades { owner, order_uid } => {
            let trades = match (owner, order_uid) {
                (Some(owner), _) => api.get_trades_by_owner(&Address::from(owner), None).await?,
                (None, Some(uid)) => {
                    api.get_trades_by_order_uid(&OrderUid::from(uid), None)
                        .await?
                }
                (None, None) => anyhow::bail!("Either --owner or --order-uid is required"),
            };
            print_json(&trades)
        }
        Command::TxOrders { tx_hash } => {
            print_json(&api.get_tx_orders(&TransactionHash::from(tx_hash), None).await?)
        }
        Command::NativePrice { token } => {
            print_json(&api.get_native_price(&Address::from(token), None).await?)
        }
        Command::Surplus { user } => {
            print_json(&api.get_total_surplus(&Address::from(user), None).await?)
        }
        Command::AppData { hash } => {
            print_json(&api.get_app_data(&AppDataHash::from(hash), None).await?)
        }
        Command::Competition { auction_id, tx_hash } => {
            let competition = match tx_hash {
                Some(tx_hash) => {
                    api.get_solver_competition_by_tx_hash(&TransactionHash::from(tx_hash), None)
                        .await?
                }
                None => {
                    let id = auction_id
                        .map(SolverCompetitionId::Auction)
                        .unwrap_or_default();
                    api.get_solver_competition(id, None).await?
                }
            };
            print_json(&competition)
        }
        Command::Link { uid } => {
            println!("{}", api.get_order_link(&OrderUid::from(uid), None)?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to format response")?;
    println!("{}", json);
    Ok(())
}
