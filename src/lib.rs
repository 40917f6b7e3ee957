//! USDC approval panel
//!
//! A headless rendition of a small wallet screen: it shows the address a
//! backend transacts from and the active wallet account, and offers two
//! buttons. "Approve Transfer" approves the backend for a fixed amount of
//! USDC through the wallet; "Transfer USDC" asks the backend to move funds.
//!
//! # Example
//!
//! ```rust,ignore
//! use usdc_panel::{HttpBackend, LocalWallet, Panel, PanelConfig};
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let config = PanelConfig::from_env()?;
//!     let wallet = LocalWallet::from_private_key("0x...", &config.rpc_url)?;
//!     let backend = HttpBackend::new(&config.backend_url)?;
//!     let panel = Panel::new(wallet, backend, config);
//!
//!     panel.mount().await;
//!     println!("{}", panel.view());
//!
//!     panel.approve_transfer().await;
//!     panel.transfer_usdc().await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod error;
pub mod panel;
pub mod wallet;

// Re-export main types for convenience
pub use backend::{BackendClient, BackendReply, HttpBackend, RelayBackend, RelayConfig};
pub use config::{ErrorPolicy, PanelConfig, SpenderSource};
pub use error::{eyre, Context, PanelError, Report, Result};
pub use panel::{ActionOutcome, Activity, Panel, PanelState, PanelView};
pub use wallet::{
    Confirmation, LocalSigner, LocalWallet, NodeSigner, NodeWallet, TransactionSigner, TxRequest,
    WalletProvider,
};
