//! Interactive terminal front end for the USDC panel
//!
//! Run with: cargo run --example panel
//!
//! Requires USDC_PANEL_RPC_URL. Optional:
//! - PRIVATE_KEY: sign locally instead of letting the RPC endpoint sign
//! - RELAY_PRIVATE_KEY: run the transfer backend in-process instead of over HTTP
//! - RELAY_PERIODIC=1: with the in-process relay, also transfer on a timer

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use usdc_panel::{
    ActionOutcome, BackendClient, HttpBackend, LocalWallet, NodeWallet, Panel, PanelConfig,
    RelayBackend, RelayConfig, WalletProvider,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = PanelConfig::from_env()?;
    let private_key = std::env::var("PRIVATE_KEY").ok();
    let relay_key = std::env::var("RELAY_PRIVATE_KEY").ok();

    match (private_key, relay_key) {
        (Some(key), Some(relay_key)) => {
            let wallet = LocalWallet::from_private_key(&key, &config.rpc_url)?;
            let relay = start_relay(&relay_key, &config)?;
            run(Panel::new(wallet, relay, config)).await
        }
        (Some(key), None) => {
            let wallet = LocalWallet::from_private_key(&key, &config.rpc_url)?;
            let backend = HttpBackend::new(&config.backend_url)?;
            run(Panel::new(wallet, backend, config)).await
        }
        (None, Some(relay_key)) => {
            let wallet = NodeWallet::connect(&config.rpc_url)?;
            let relay = start_relay(&relay_key, &config)?;
            run(Panel::new(wallet, relay, config)).await
        }
        (None, None) => {
            let wallet = NodeWallet::connect(&config.rpc_url)?;
            let backend = HttpBackend::new(&config.backend_url)?;
            run(Panel::new(wallet, backend, config)).await
        }
    }
}

/// Build the in-process relay, optionally transferring on a timer
fn start_relay(relay_key: &str, config: &PanelConfig) -> eyre::Result<Arc<RelayBackend>> {
    let relay_config = RelayConfig::for_panel(config);
    let interval = relay_config.interval;
    let relay = Arc::new(RelayBackend::from_private_key(
        relay_key,
        &config.rpc_url,
        relay_config,
    )?);
    println!("Relay account: {}", relay.address());

    if std::env::var("RELAY_PERIODIC").is_ok_and(|v| v == "1") {
        // Runs for the life of the process
        let _handle = relay.clone().spawn_periodic(interval);
        println!("Relay transferring every {}s", interval.as_secs());
    }

    Ok(relay)
}

async fn run<W, B>(panel: Panel<W, B>) -> eyre::Result<()>
where
    W: WalletProvider + 'static,
    B: BackendClient + 'static,
{
    let panel = Arc::new(panel);
    println!("\nLoading...");
    panel.mount().await;

    loop {
        println!("\n----------------------------------------");
        println!("{}", panel.view());
        println!("----------------------------------------");
        println!("  1. Approve Transfer");
        println!("  2. Transfer USDC");
        println!("  3. Retry loading addresses");
        println!("  q. Quit");

        print!("Enter choice: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        match input.trim() {
            "1" => {
                let task = tokio::spawn({
                    let panel = panel.clone();
                    async move { panel.approve_transfer().await }
                });
                match watch(&panel, task).await? {
                    ActionOutcome::Completed(confirmation) => {
                        println!("Transfer approved: {}", confirmation.tx_hash)
                    }
                    ActionOutcome::Failed(e) => println!("{}", e),
                    ActionOutcome::Rejected(activity) => println!("Busy: {}", activity),
                }
            }
            "2" => {
                let task = tokio::spawn({
                    let panel = panel.clone();
                    async move { panel.transfer_usdc().await }
                });
                match watch(&panel, task).await? {
                    ActionOutcome::Completed(reply) => println!("Transfer result: {:?}", reply),
                    ActionOutcome::Failed(e) => println!("{}", e),
                    ActionOutcome::Rejected(activity) => println!("Busy: {}", activity),
                }
            }
            "3" => panel.mount().await,
            "q" | "Q" => {
                println!("\nGoodbye!");
                break;
            }
            _ => println!("\nInvalid choice. Please try again."),
        }
    }

    Ok(())
}

/// Wait for an action, re-rendering the panel while it is in flight
async fn watch<W, B, T>(
    panel: &Panel<W, B>,
    mut task: JoinHandle<ActionOutcome<T>>,
) -> eyre::Result<ActionOutcome<T>>
where
    W: WalletProvider,
    B: BackendClient,
{
    let start = tokio::time::Instant::now() + Duration::from_millis(250);
    let mut ticker = tokio::time::interval_at(start, Duration::from_secs(1));

    loop {
        tokio::select! {
            outcome = &mut task => return Ok(outcome?),
            _ = ticker.tick() => println!("\n{}", panel.view()),
        }
    }
}
