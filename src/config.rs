//! Panel configuration
//!
//! Every parameter of the approval flow lives here rather than inside the
//! call sequencing in [`crate::panel`].

use crate::constants::{
    scale_to_decimals, DEFAULT_APPROVAL_AMOUNT, SEPOLIA_CHAIN_ID, SEPOLIA_USDC, USDC_DECIMALS,
};
use alloy::primitives::{Address, U256};
use eyre::{Context, Result};
use std::str::FromStr;

/// Where the spender of the approval comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpenderSource {
    /// Use the address reported by the backend (`get_address`)
    #[default]
    BackendAddress,
    /// Always approve this address
    Fixed(Address),
}

/// What happens to a failure after it has been logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log and swallow; the view only shows loading placeholders
    #[default]
    LogOnly,
    /// Log and keep the last failure in panel state so the view renders it
    Surface,
}

impl FromStr for ErrorPolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "log_only" | "log-only" => Ok(Self::LogOnly),
            "surface" => Ok(Self::Surface),
            other => eyre::bail!("Unknown error policy: {}", other),
        }
    }
}

/// Configuration for the panel (Sepolia by default)
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Chain ID (11155111 for Sepolia)
    pub chain_id: u64,
    /// RPC endpoint URL used by wallets and the relay
    pub rpc_url: String,
    /// Base URL of the backend RPC
    pub backend_url: String,
    /// Token contract the approval is sent to
    pub token: Address,
    /// Decimals of the token
    pub token_decimals: u8,
    /// Approval amount as a decimal literal in whole tokens
    pub approval_amount: String,
    /// Spender resolution strategy
    pub spender: SpenderSource,
    /// Error surfacing policy
    pub error_policy: ErrorPolicy,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelConfig {
    /// Create Sepolia configuration with local endpoints (default)
    pub fn new() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            backend_url: "http://127.0.0.1:4943".to_string(),
            token: SEPOLIA_USDC,
            token_decimals: USDC_DECIMALS,
            approval_amount: DEFAULT_APPROVAL_AMOUNT.to_string(),
            spender: SpenderSource::BackendAddress,
            error_policy: ErrorPolicy::LogOnly,
        }
    }

    /// Load configuration from `USDC_PANEL_*` environment variables
    ///
    /// `USDC_PANEL_RPC_URL` is required; everything else falls back to the
    /// Sepolia defaults.
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("USDC_PANEL_RPC_URL")
            .context("USDC_PANEL_RPC_URL environment variable must be set")?;
        let mut config = Self::new().with_rpc_url(rpc_url);

        if let Some(url) = env_var("USDC_PANEL_BACKEND_URL") {
            config = config.with_backend_url(url);
        }
        if let Some(token) = env_var("USDC_PANEL_TOKEN") {
            config.token = token.parse().context("Invalid USDC_PANEL_TOKEN")?;
        }
        if let Some(chain_id) = env_var("USDC_PANEL_CHAIN_ID") {
            config.chain_id = chain_id.parse().context("Invalid USDC_PANEL_CHAIN_ID")?;
        }
        if let Some(decimals) = env_var("USDC_PANEL_TOKEN_DECIMALS") {
            config.token_decimals = decimals
                .parse()
                .context("Invalid USDC_PANEL_TOKEN_DECIMALS")?;
        }
        if let Some(amount) = env_var("USDC_PANEL_APPROVAL_AMOUNT") {
            config = config.with_approval_amount(amount);
        }
        if let Some(spender) = env_var("USDC_PANEL_SPENDER") {
            let spender: Address = spender.parse().context("Invalid USDC_PANEL_SPENDER")?;
            config = config.with_spender(SpenderSource::Fixed(spender));
        }
        if let Some(policy) = env_var("USDC_PANEL_ERROR_POLICY") {
            config = config.with_error_policy(policy.parse()?);
        }

        // Fail at startup rather than on the first click
        config.approval_amount_units()?;
        Ok(config)
    }

    /// Set the RPC URL
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Set the backend base URL
    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    /// Set the token contract and its decimals
    pub fn with_token(mut self, token: Address, decimals: u8) -> Self {
        self.token = token;
        self.token_decimals = decimals;
        self
    }

    /// Set the approval amount literal (whole tokens, e.g. "10.0")
    pub fn with_approval_amount(mut self, amount: impl Into<String>) -> Self {
        self.approval_amount = amount.into();
        self
    }

    /// Set the spender resolution strategy
    pub fn with_spender(mut self, spender: SpenderSource) -> Self {
        self.spender = spender;
        self
    }

    /// Set the error surfacing policy
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Approval amount scaled to the token's base units
    pub fn approval_amount_units(&self) -> Result<U256> {
        scale_to_decimals(&self.approval_amount, self.token_decimals)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
