//! Local private key wallet

use super::{poll_receipt, Confirmation, TransactionSigner, TxRequest, WalletProvider};
use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::Arc;

/// Wallet backed by a single raw EVM private key
///
/// Reports exactly one account and hands out a freshly built
/// [`LocalSigner`] for every request.
pub struct LocalWallet {
    key: PrivateKeySigner,
    rpc_url: Url,
}

impl LocalWallet {
    /// Create a new LocalWallet from a private key hex string
    ///
    /// # Arguments
    ///
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    /// * `rpc_url` - RPC endpoint URL
    pub fn from_private_key(
        private_key: impl AsRef<str>,
        rpc_url: impl AsRef<str>,
    ) -> Result<Self> {
        let key = private_key.as_ref().trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let key: PrivateKeySigner = key.parse().context("Failed to parse private key")?;
        let rpc_url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;

        Ok(Self { key, rpc_url })
    }
}

impl WalletProvider for LocalWallet {
    type Signer = LocalSigner;

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.key.address()])
    }

    async fn get_signer(&self) -> Result<LocalSigner> {
        Ok(LocalSigner::new(self.key.clone(), self.rpc_url.clone()))
    }
}

/// Signer using a local private key
pub struct LocalSigner {
    /// Provider with wallet filler - handles nonce, gas, chain_id, and signing
    provider: Arc<dyn Provider<Ethereum>>,
    address: Address,
}

impl LocalSigner {
    fn new(key: PrivateKeySigner, rpc_url: Url) -> Self {
        let address = key.address();
        let wallet = EthereumWallet::from(key);

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(rpc_url);

        Self {
            provider: Arc::new(provider),
            address,
        }
    }
}

impl TransactionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxHash> {
        // Provider fills nonce, gas, chain_id and signs
        let pending_tx = self
            .provider
            .send_transaction(tx.into_rpc_request())
            .await
            .context("Failed to send transaction")?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        poll_receipt(self.provider.as_ref(), tx_hash).await
    }
}
