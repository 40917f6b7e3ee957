//! Backend RPC surface consumed by the panel
//!
//! The backend exposes two methods: `get_address`, returning the Ethereum
//! address it transacts from, and `transfer_usdc`, which performs a token
//! transfer on its own behalf. Replies are tagged `{"Ok": ..}` / `{"Err": ..}`.

mod http;
mod relay;

pub use http::HttpBackend;
pub use relay::{RelayBackend, RelayConfig};

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Tagged result returned by backend methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendReply<T, E = String> {
    Ok(T),
    Err(E),
}

/// Client for the backend's remote methods
///
/// The outer `Result` is a transport failure (unreachable, bad payload); the
/// inner [`BackendReply`] is whatever the backend answered.
pub trait BackendClient: Send + Sync {
    /// Fetch the backend's canonical address
    fn get_address(&self) -> impl Future<Output = Result<BackendReply<String>>> + Send;

    /// Ask the backend to move USDC on its own behalf
    fn transfer_usdc(&self) -> impl Future<Output = Result<BackendReply<String>>> + Send;
}

impl<T: BackendClient> BackendClient for Arc<T> {
    fn get_address(&self) -> impl Future<Output = Result<BackendReply<String>>> + Send {
        (**self).get_address()
    }

    fn transfer_usdc(&self) -> impl Future<Output = Result<BackendReply<String>>> + Send {
        (**self).transfer_usdc()
    }
}
