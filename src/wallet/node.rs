//! Wallet whose keys are held by the RPC endpoint
//!
//! Accounts come from `eth_requestAccounts`; transactions go out through
//! `eth_sendTransaction` with `from` set, so the endpoint signs them. This is
//! how a browser-injected provider behaves, minus the browser.

use super::{poll_receipt, Confirmation, TransactionSigner, TxRequest, WalletProvider};
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::Arc;

/// Wallet backed by a JSON-RPC endpoint that manages its own accounts
pub struct NodeWallet {
    provider: Arc<dyn Provider<Ethereum>>,
}

impl NodeWallet {
    /// Connect to an endpoint exposing `eth_requestAccounts`
    pub fn connect(rpc_url: impl AsRef<str>) -> Result<Self> {
        let url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;

        // No wallet filler: transactions are signed by the endpoint
        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
        })
    }
}

impl WalletProvider for NodeWallet {
    type Signer = NodeSigner;

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts: Vec<Address> = self
            .provider
            .client()
            .request_noparams::<Vec<Address>>("eth_requestAccounts")
            .await
            .context("Failed to request accounts")?;

        Ok(accounts)
    }

    async fn get_signer(&self) -> Result<NodeSigner> {
        let accounts = self.request_accounts().await?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| eyre::eyre!("Wallet exposes no accounts"))?;

        Ok(NodeSigner {
            provider: self.provider.clone(),
            address,
        })
    }
}

/// Signer that delegates signing to the endpoint
pub struct NodeSigner {
    provider: Arc<dyn Provider<Ethereum>>,
    address: Address,
}

impl TransactionSigner for NodeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxHash> {
        let tx_request = tx.into_rpc_request().with_from(self.address);

        let pending_tx = self
            .provider
            .send_transaction(tx_request)
            .await
            .context("Failed to send transaction")?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation> {
        poll_receipt(self.provider.as_ref(), tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_validates_url() {
        assert!(NodeWallet::connect("http://127.0.0.1:8545").is_ok());
        assert!(NodeWallet::connect("::not a url::").is_err());
    }
}
