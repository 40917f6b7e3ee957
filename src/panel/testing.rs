//! Test doubles for the wallet and backend

use crate::backend::{BackendClient, BackendReply};
use crate::wallet::{Confirmation, TransactionSigner, TxRequest, WalletProvider};
use alloy::primitives::{keccak256, Address, TxHash};
use eyre::{eyre, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

/// Counts ERROR events
#[derive(Clone, Default)]
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` with a thread-local subscriber and return how many errors it logged
pub fn count_errors(f: impl FnOnce()) -> usize {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, f);
    counter.0.load(Ordering::SeqCst)
}

/// Holds a call until the test releases it
#[derive(Clone, Default)]
pub struct Gate {
    reached: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    async fn pass(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }

    /// Wait until a call is parked at the gate
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Step of the approval chain that fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    Signer,
    Submit,
    Confirm,
    Revert,
}

pub const ALL_OUTCOMES: [Failure; 5] = [
    Failure::None,
    Failure::Signer,
    Failure::Submit,
    Failure::Confirm,
    Failure::Revert,
];

#[derive(Clone)]
pub struct MockWallet {
    accounts: std::result::Result<Vec<Address>, String>,
    failure: Failure,
    gate: Option<Gate>,
    sent: Arc<Mutex<Vec<TxRequest>>>,
}

impl MockWallet {
    pub fn with_account(account: Address) -> Self {
        Self {
            accounts: Ok(vec![account]),
            failure: Failure::None,
            gate: None,
            sent: Arc::default(),
        }
    }

    /// Wallet whose account request is rejected by the user
    pub fn rejecting() -> Self {
        Self {
            accounts: Err("User rejected the request".to_string()),
            ..Self::with_account(Address::ZERO)
        }
    }

    pub fn failing_at(mut self, failure: Failure) -> Self {
        self.failure = failure;
        self
    }

    /// Park `get_signer` at the gate
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Transactions submitted so far
    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl WalletProvider for MockWallet {
    type Signer = MockSigner;

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.accounts.clone().map_err(|e| eyre!(e))
    }

    async fn get_signer(&self) -> Result<MockSigner> {
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        if self.failure == Failure::Signer {
            eyre::bail!("No wallet present");
        }
        Ok(MockSigner {
            wallet: self.clone(),
        })
    }
}

pub struct MockSigner {
    wallet: MockWallet,
}

impl TransactionSigner for MockSigner {
    fn address(&self) -> Address {
        match &self.wallet.accounts {
            Ok(accounts) => accounts.first().copied().unwrap_or_default(),
            Err(_) => Address::ZERO,
        }
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxHash> {
        let tx_hash = keccak256(&tx.data);
        if let Ok(mut sent) = self.wallet.sent.lock() {
            sent.push(tx);
        }
        if self.wallet.failure == Failure::Submit {
            eyre::bail!("User denied transaction signature");
        }
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        if self.wallet.failure == Failure::Confirm {
            eyre::bail!("Transaction receipt not found after timeout: {}", tx_hash);
        }
        Ok(Confirmation {
            tx_hash,
            block_number: Some(1),
            success: self.wallet.failure != Failure::Revert,
        })
    }
}

#[derive(Clone)]
pub struct MockBackend {
    address: std::result::Result<BackendReply<String>, String>,
    transfer: std::result::Result<BackendReply<String>, String>,
    gate: Option<Gate>,
    transfer_calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Ok(BackendReply::Ok(address.into())),
            transfer: Ok(BackendReply::Ok("transfer sent".to_string())),
            gate: None,
            transfer_calls: Arc::default(),
        }
    }

    /// Backend answering `get_address` with a tagged error
    pub fn failing_address() -> Self {
        Self {
            address: Ok(BackendReply::Err("signer unavailable".to_string())),
            ..Self::with_address("")
        }
    }

    /// Backend that cannot be reached at all
    pub fn unreachable() -> Self {
        Self {
            address: Err("connection refused".to_string()),
            transfer: Err("connection refused".to_string()),
            ..Self::with_address("")
        }
    }

    pub fn with_transfer(
        mut self,
        transfer: std::result::Result<BackendReply<String>, String>,
    ) -> Self {
        self.transfer = transfer;
        self
    }

    /// Park `transfer_usdc` at the gate
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn transfer_calls(&self) -> usize {
        self.transfer_calls.load(Ordering::SeqCst)
    }
}

impl BackendClient for MockBackend {
    async fn get_address(&self) -> Result<BackendReply<String>> {
        self.address.clone().map_err(|e| eyre!(e))
    }

    async fn transfer_usdc(&self) -> Result<BackendReply<String>> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        self.transfer.clone().map_err(|e| eyre!(e))
    }
}
