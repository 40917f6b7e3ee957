//! The panel: two addresses, two buttons
//!
//! On [`Panel::mount`] the panel fetches the backend address and the wallet
//! account concurrently; each lands in its own slot whenever it resolves.
//! The two actions, [`Panel::approve_transfer`] and [`Panel::transfer_usdc`],
//! share one [`Activity`] slot. Starting either while anything is in flight
//! is rejected without touching the wallet or the backend.
//!
//! Failures are always logged with `tracing::error!`. Whether they are also
//! kept for the view is decided by [`ErrorPolicy`].

mod state;
#[cfg(test)]
pub(crate) mod testing;
mod view;

pub use state::{Activity, PanelState};
pub use view::PanelView;

use crate::backend::{BackendClient, BackendReply};
use crate::config::{ErrorPolicy, PanelConfig, SpenderSource};
use crate::contracts::IERC20;
use crate::error::PanelError;
use crate::wallet::{Confirmation, TransactionSigner, TxRequest, WalletProvider};
use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use eyre::{eyre, Context, Report, Result};
use state::StateCell;

/// How a button press ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    /// The action ran to completion
    Completed(T),
    /// The action failed; the error has been logged
    Failed(PanelError),
    /// Another action was in flight, nothing was started
    Rejected(Activity),
}

impl<T> ActionOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Display unit driving a wallet and a backend
pub struct Panel<W: WalletProvider, B: BackendClient> {
    wallet: W,
    backend: B,
    config: PanelConfig,
    state: StateCell,
}

impl<W: WalletProvider, B: BackendClient> Panel<W, B> {
    /// Create a panel; nothing is fetched until [`Panel::mount`]
    pub fn new(wallet: W, backend: B, config: PanelConfig) -> Self {
        Self {
            wallet,
            backend,
            config,
            state: StateCell::default(),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PanelState {
        self.state.lock().clone()
    }

    pub fn activity(&self) -> Activity {
        self.state.lock().activity
    }

    /// Render the current state
    pub fn view(&self) -> PanelView {
        PanelView::from(&*self.state.lock())
    }

    // ========== Mount ==========

    /// Fetch the backend address and the wallet account concurrently
    ///
    /// Neither fetch waits on or affects the other.
    pub async fn mount(&self) {
        futures::future::join(self.load_backend_address(), self.load_wallet_address()).await;
    }

    /// Fetch the backend's address into its slot
    ///
    /// A slot that already holds an address keeps it.
    pub async fn load_backend_address(&self) {
        let address = match self.backend.get_address().await {
            Ok(BackendReply::Ok(address)) if !address.trim().is_empty() => address,
            Ok(BackendReply::Ok(_)) => {
                self.record_failure("get address", &eyre!("Backend returned an empty address"));
                return;
            }
            Ok(BackendReply::Err(e)) => {
                self.record_failure("get address", &eyre!("Backend returned error: {}", e));
                return;
            }
            Err(e) => {
                self.record_failure("get address", &e);
                return;
            }
        };

        let mut state = self.state.lock();
        if state.backend_address.is_none() {
            tracing::info!("Backend address: {}", address);
            state.backend_address = Some(address);
        } else {
            tracing::debug!("Backend address already resolved, ignoring {}", address);
        }
    }

    /// Request the wallet's accounts and keep the first one
    ///
    /// A slot that already holds an account keeps it.
    pub async fn load_wallet_address(&self) {
        let result = self
            .wallet
            .request_accounts()
            .await
            .context("Failed to request accounts")
            .and_then(|accounts| {
                accounts
                    .first()
                    .copied()
                    .ok_or_else(|| eyre!("Wallet returned no accounts"))
            });

        match result {
            Ok(address) => {
                let mut state = self.state.lock();
                if state.wallet_address.is_none() {
                    tracing::info!("Wallet address: {}", address);
                    state.wallet_address = Some(address);
                } else {
                    tracing::debug!("Wallet address already resolved, ignoring {}", address);
                }
            }
            Err(e) => {
                self.record_failure("get wallet address", &e);
            }
        }
    }

    // ========== Actions ==========

    /// Approve the spender for the configured amount of the token
    ///
    /// Both the spender and the amount come from [`PanelConfig`], never from
    /// user input. Waits until the approval is mined.
    pub async fn approve_transfer(&self) -> ActionOutcome<Confirmation> {
        let _activity = match self.begin(Activity::Approving) {
            Ok(guard) => guard,
            Err(current) => return ActionOutcome::Rejected(current),
        };

        match self.submit_approval().await {
            Ok(confirmation) => {
                tracing::info!("Transfer approved in {}", confirmation.tx_hash);
                ActionOutcome::Completed(confirmation)
            }
            Err(e) => ActionOutcome::Failed(self.record_failure("approve transfer", &e)),
        }
    }

    /// Ask the backend to transfer USDC; the reply is logged, not inspected
    pub async fn transfer_usdc(&self) -> ActionOutcome<BackendReply<String>> {
        let _activity = match self.begin(Activity::Transferring) {
            Ok(guard) => guard,
            Err(current) => return ActionOutcome::Rejected(current),
        };

        match self
            .backend
            .transfer_usdc()
            .await
            .context("Failed to call transfer_usdc")
        {
            Ok(reply) => {
                tracing::info!("Transfer result: {:?}", reply);
                ActionOutcome::Completed(reply)
            }
            Err(e) => ActionOutcome::Failed(self.record_failure("transfer USDC", &e)),
        }
    }

    /// Spender of the approval under the configured strategy
    pub fn resolve_spender(&self) -> Result<Address> {
        match self.config.spender {
            SpenderSource::Fixed(address) => Ok(address),
            SpenderSource::BackendAddress => {
                let address = self
                    .state
                    .lock()
                    .backend_address
                    .clone()
                    .ok_or_else(|| eyre!("Backend address not loaded yet"))?;
                address
                    .parse()
                    .with_context(|| format!("Backend address {:?} is not an EVM address", address))
            }
        }
    }

    async fn submit_approval(&self) -> Result<Confirmation> {
        let spender = self.resolve_spender()?;
        let amount = self.config.approval_amount_units()?;

        let signer = self
            .wallet
            .get_signer()
            .await
            .context("Failed to obtain signer")?;

        let call = IERC20::approveCall { spender, amount };
        let tx = TxRequest::new(self.config.token, Bytes::from(call.abi_encode()));

        tracing::debug!(
            "Approving {} for {} base units of {} from {}",
            spender,
            amount,
            self.config.token,
            signer.address()
        );
        let tx_hash = signer
            .sign_and_send(tx)
            .await
            .context("Failed to submit approval")?;

        let confirmation = signer
            .wait_for_confirmation(tx_hash)
            .await
            .context("Failed to confirm approval")?;
        eyre::ensure!(
            confirmation.success,
            "Approval transaction {} reverted",
            tx_hash
        );

        Ok(confirmation)
    }

    fn begin(&self, activity: Activity) -> std::result::Result<state::ActivityGuard<'_>, Activity> {
        match self.state.begin(activity) {
            Ok(guard) => {
                if self.config.error_policy == ErrorPolicy::Surface {
                    self.state.lock().last_error = None;
                }
                Ok(guard)
            }
            Err(current) => {
                tracing::warn!("Ignoring {} request while {}", activity, current);
                Err(current)
            }
        }
    }

    fn record_failure(&self, operation: &'static str, report: &Report) -> PanelError {
        let error = PanelError::new(operation, report);
        tracing::error!("{}", error);

        if self.config.error_policy == ErrorPolicy::Surface {
            self.state.lock().last_error = Some(error.clone());
        }
        error
    }
}
