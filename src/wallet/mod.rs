//! Wallet capability for the panel
//!
//! The panel never reaches for an ambient wallet object. It is handed a
//! [`WalletProvider`], asks it for the account list on mount, and obtains a
//! fresh [`TransactionSigner`] for every approval it submits.
//!
//! - `LocalWallet`: signs locally with a raw EVM private key
//! - `NodeWallet`: the keys stay with the RPC endpoint (`eth_requestAccounts`
//!   and `eth_sendTransaction`), like a browser-injected provider

mod local;
mod node;

pub use local::{LocalSigner, LocalWallet};
pub use node::{NodeSigner, NodeWallet};

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionReceipt;
use eyre::{Context, Result};
use std::future::Future;
use std::time::Duration;

/// Receipt polling attempts before giving up (60 * 2s = 2 minutes)
const RECEIPT_MAX_ATTEMPTS: u32 = 60;

/// Delay between receipt polls
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Transaction request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Target contract address
    pub to: Address,
    /// Transaction value in wei
    pub value: U256,
    /// Encoded calldata
    pub data: Bytes,
}

impl TxRequest {
    /// Create a new transaction request
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    fn into_rpc_request(self) -> alloy::rpc::types::TransactionRequest {
        use alloy::network::TransactionBuilder;

        alloy::rpc::types::TransactionRequest::default()
            .with_to(self.to)
            .with_value(self.value)
            .with_input(self.data)
    }
}

/// A mined transaction, as reported back to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block the transaction was included in
    pub block_number: Option<u64>,
    /// False when the transaction reverted
    pub success: bool,
}

impl From<&TransactionReceipt> for Confirmation {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        }
    }
}

/// Trait for signing and sending EVM transactions for one account
pub trait TransactionSigner: Send + Sync {
    /// Returns the signer's EVM address
    fn address(&self) -> Address;

    /// Signs and sends a transaction, returning the transaction hash
    fn sign_and_send(&self, tx: TxRequest) -> impl Future<Output = Result<TxHash>> + Send;

    /// Waits until the transaction is mined
    fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<Confirmation>> + Send;
}

/// Source of accounts and signers
pub trait WalletProvider: Send + Sync {
    /// Signer handed out by this wallet
    type Signer: TransactionSigner;

    /// Requests the account list; the first entry is the active account
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Obtains a signer for the active account
    fn get_signer(&self) -> impl Future<Output = Result<Self::Signer>> + Send;
}

/// Poll for a receipt until it shows up or the attempts run out
async fn poll_receipt<P>(provider: &P, tx_hash: TxHash) -> Result<Confirmation>
where
    P: Provider<Ethereum> + ?Sized,
{
    for attempt in 0..RECEIPT_MAX_ATTEMPTS {
        let receipt: Option<TransactionReceipt> = provider
            .get_transaction_receipt(tx_hash)
            .await
            .context("Failed to get transaction receipt")?;

        if let Some(receipt) = receipt {
            return Ok(Confirmation::from(&receipt));
        }

        tracing::debug!(
            "Waiting for {} (attempt {}/{})",
            tx_hash,
            attempt + 1,
            RECEIPT_MAX_ATTEMPTS
        );
        tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
    }

    eyre::bail!("Transaction receipt not found after timeout: {}", tx_hash)
}
