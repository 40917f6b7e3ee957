//! In-process transfer relay
//!
//! Implements the backend side of `transfer_usdc`: the relay key moves a
//! fixed amount of USDC with `transferFrom`, which only succeeds once the
//! `from` account has approved the relay (the panel's "Approve Transfer").
//!
//! Nonces are managed here instead of by a nonce filler. After the first
//! lookup the last used nonce is cached and only advanced once the node
//! reports the transaction.

use super::{BackendClient, BackendReply};
use crate::config::PanelConfig;
use crate::constants::{
    DEFAULT_RELAY_FROM, DEFAULT_RELAY_INTERVAL_SECS, DEFAULT_RELAY_TO, DEFAULT_RELAY_VALUE,
    SEPOLIA_CHAIN_ID, SEPOLIA_USDC,
};
use crate::contracts::IERC20;
use alloy::consensus::Transaction as _;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Parameters of the relay's transfer
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Chain ID set on every transfer
    pub chain_id: u64,
    /// Token contract
    pub token: Address,
    /// Account funds are pulled from
    pub from: Address,
    /// Account funds are sent to
    pub to: Address,
    /// Amount per transfer in base units
    pub value: U256,
    /// Period used by [`RelayBackend::spawn_periodic`] callers
    pub interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            token: SEPOLIA_USDC,
            from: DEFAULT_RELAY_FROM,
            to: DEFAULT_RELAY_TO,
            value: U256::from(DEFAULT_RELAY_VALUE),
            interval: Duration::from_secs(DEFAULT_RELAY_INTERVAL_SECS),
        }
    }
}

impl RelayConfig {
    /// Relay settings sharing the panel's chain and token
    pub fn for_panel(config: &PanelConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            token: config.token,
            ..Self::default()
        }
    }
}

/// Last nonce known to be consumed by the relay account
#[derive(Debug, Default)]
pub(crate) struct NonceCache {
    last_used: Mutex<Option<u64>>,
}

impl NonceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nonce to use next, if one has been recorded
    pub fn next(&self) -> Option<u64> {
        self.last_used().map(|nonce| nonce + 1)
    }

    /// Record a nonce seen on chain
    pub fn record(&self, nonce: u64) {
        if let Ok(mut last_used) = self.last_used.lock() {
            *last_used = Some(nonce);
        }
    }

    fn last_used(&self) -> Option<u64> {
        self.last_used.lock().ok().and_then(|nonce| *nonce)
    }
}

/// Backend implemented in-process with its own key
pub struct RelayBackend {
    /// Provider with wallet filler - handles gas and signing
    provider: Arc<dyn Provider<Ethereum>>,
    address: Address,
    config: RelayConfig,
    nonce: NonceCache,
    /// Serializes transfers so two never share a nonce
    in_flight: tokio::sync::Mutex<()>,
}

impl RelayBackend {
    /// Create a relay signing with a private key hex string
    pub fn from_private_key(
        private_key: impl AsRef<str>,
        rpc_url: impl AsRef<str>,
        config: RelayConfig,
    ) -> Result<Self> {
        let key = private_key.as_ref().trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse relay private key")?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;
        // Fillers skip nonce and chain_id since both are set on every request
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        Ok(Self::with_provider(Arc::new(provider), address, config))
    }

    /// Create a relay sending as `address` through an already built provider
    ///
    /// The provider is responsible for signing (wallet filler) or the node
    /// must hold the key for `address`.
    pub fn with_provider(
        provider: Arc<dyn Provider<Ethereum>>,
        address: Address,
        config: RelayConfig,
    ) -> Self {
        Self {
            provider,
            address,
            config,
            nonce: NonceCache::new(),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Relay account address
    pub fn address(&self) -> Address {
        self.address
    }

    async fn next_nonce(&self) -> u64 {
        if let Some(nonce) = self.nonce.next() {
            return nonce;
        }

        match self.provider.get_transaction_count(self.address).await {
            Ok(nonce) => nonce,
            Err(e) => {
                tracing::warn!("Failed to fetch nonce for {}, using 0: {}", self.address, e);
                0
            }
        }
    }

    async fn transfer(&self) -> BackendReply<String> {
        let _in_flight = self.in_flight.lock().await;
        let nonce = self.next_nonce().await;

        let call = IERC20::transferFromCall {
            from: self.config.from,
            to: self.config.to,
            amount: self.config.value,
        };
        let tx_request = alloy::rpc::types::TransactionRequest::default()
            .with_from(self.address)
            .with_to(self.config.token)
            .with_input(call.abi_encode())
            .with_nonce(nonce)
            .with_chain_id(self.config.chain_id);

        let tx_hash = match self.provider.send_transaction(tx_request).await {
            Ok(pending_tx) => *pending_tx.tx_hash(),
            Err(e) => return BackendReply::Err(format!("{:?}", e)),
        };
        tracing::debug!("Relay transfer {} sent with nonce {}", tx_hash, nonce);

        match self.provider.get_transaction_by_hash(tx_hash).await {
            Ok(Some(tx)) => {
                // The node has the transaction, so its nonce is consumed
                self.nonce.record(tx.nonce());
                BackendReply::Ok(format!("{:?}", tx))
            }
            Ok(None) => BackendReply::Err("Could not get transaction.".to_string()),
            Err(e) => BackendReply::Err(format!("{:?}", e)),
        }
    }

    /// Run a transfer every `interval` until the handle is aborted
    ///
    /// The first transfer happens one full interval after the call.
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);

            loop {
                ticker.tick().await;
                match self.transfer().await {
                    BackendReply::Ok(_) => tracing::info!("Periodic relay transfer succeeded"),
                    BackendReply::Err(e) => {
                        tracing::error!("Periodic relay transfer failed: {}", e)
                    }
                }
            }
        })
    }
}

impl BackendClient for RelayBackend {
    async fn get_address(&self) -> Result<BackendReply<String>> {
        Ok(BackendReply::Ok(self.address.to_checksum(None)))
    }

    async fn transfer_usdc(&self) -> Result<BackendReply<String>> {
        Ok(self.transfer().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::consensus::transaction::Recovered;
    use alloy::consensus::{Signed, TxEnvelope, TxLegacy};
    use alloy::primitives::{Signature, TxKind, B256, U64};
    use alloy::transports::mock::Asserter;

    const DEV_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn test_nonce_cache_advances_from_last_used() {
        let cache = NonceCache::new();
        assert_eq!(cache.next(), None);

        cache.record(7);
        assert_eq!(cache.next(), Some(8));

        cache.record(8);
        assert_eq!(cache.next(), Some(9));
    }

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.value, U256::from(10_000u64));
        assert_eq!(config.interval, Duration::from_secs(10));

        let panel = PanelConfig::new().with_token(Address::repeat_byte(0x42), 6);
        assert_eq!(
            RelayConfig::for_panel(&panel).token,
            Address::repeat_byte(0x42)
        );
    }

    fn relay_account() -> Address {
        Address::repeat_byte(0x70)
    }

    /// Relay over a scripted transport; the node signs, so no fillers run
    fn scripted_relay(asserter: &Asserter) -> RelayBackend {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone());
        RelayBackend::with_provider(Arc::new(provider), relay_account(), RelayConfig::default())
    }

    fn mined_transfer(nonce: u64) -> alloy::rpc::types::Transaction {
        let tx = TxLegacy {
            chain_id: Some(SEPOLIA_CHAIN_ID),
            nonce,
            gas_limit: 60_000,
            to: TxKind::Call(SEPOLIA_USDC),
            ..Default::default()
        };
        let signature = Signature::new(U256::from(1u64), U256::from(1u64), false);
        let signed = Signed::new_unchecked(tx, signature, B256::repeat_byte(nonce as u8));

        alloy::rpc::types::Transaction {
            inner: Recovered::new_unchecked(TxEnvelope::Legacy(signed), relay_account()),
            block_hash: None,
            block_number: None,
            transaction_index: None,
            effective_gas_price: None,
        }
    }

    #[tokio::test]
    async fn test_transfer_caches_nonce_for_next_call() {
        let asserter = Asserter::new();
        let relay = scripted_relay(&asserter);

        // eth_getTransactionCount, eth_sendTransaction, eth_getTransactionByHash
        asserter.push_success(&U64::from(7u64));
        asserter.push_success(&B256::repeat_byte(0xaa));
        asserter.push_success(&mined_transfer(7));

        let reply = relay.transfer_usdc().await.unwrap();
        assert!(matches!(reply, BackendReply::Ok(_)), "{:?}", reply);
        assert_eq!(relay.nonce.next(), Some(8));

        // Cached nonce: no eth_getTransactionCount this time
        asserter.push_success(&B256::repeat_byte(0xbb));
        asserter.push_success(&mined_transfer(8));

        let reply = relay.transfer_usdc().await.unwrap();
        assert!(matches!(reply, BackendReply::Ok(_)), "{:?}", reply);
        assert_eq!(relay.nonce.next(), Some(9));
    }

    #[tokio::test]
    async fn test_nonce_lookup_failure_starts_at_zero() {
        let asserter = Asserter::new();
        let relay = scripted_relay(&asserter);

        asserter.push_failure_msg("rate limited");
        assert_eq!(relay.next_nonce().await, 0);
        assert_eq!(relay.nonce.next(), None);

        relay.nonce.record(4);
        // Served from the cache, the empty queue is never touched
        assert_eq!(relay.next_nonce().await, 5);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_error_reply() {
        let asserter = Asserter::new();
        let relay = scripted_relay(&asserter);

        asserter.push_success(&U64::from(3u64));
        asserter.push_success(&B256::repeat_byte(0xcc));
        asserter.push_success(&serde_json::Value::Null);

        assert_eq!(
            relay.transfer_usdc().await.unwrap(),
            BackendReply::Err("Could not get transaction.".to_string())
        );
        assert_eq!(relay.nonce.next(), None);
    }

    #[tokio::test]
    async fn test_send_failure_is_error_reply() {
        let asserter = Asserter::new();
        let relay = scripted_relay(&asserter);

        asserter.push_success(&U64::from(0u64));
        asserter.push_failure_msg("insufficient funds for gas");

        match relay.transfer_usdc().await.unwrap() {
            BackendReply::Err(e) => assert!(e.contains("insufficient funds for gas"), "{}", e),
            other => panic!("unexpected reply: {:?}", other),
        }
        assert_eq!(relay.nonce.next(), None);
    }

    #[tokio::test]
    async fn test_relay_reports_its_own_address() {
        let relay =
            RelayBackend::from_private_key(DEV_KEY, "http://127.0.0.1:8545", RelayConfig::default())
                .unwrap();
        let expected: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();

        assert_eq!(relay.address(), expected);
        assert_eq!(
            relay.get_address().await.unwrap(),
            BackendReply::Ok("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string())
        );
    }
}
