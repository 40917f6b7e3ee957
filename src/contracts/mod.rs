//! Contract bindings for the USDC token

pub mod usdc;

pub use usdc::*;
