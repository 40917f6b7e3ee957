//! ERC20 (USDC) contract bindings

use alloy::sol;

sol! {
    /// ERC20 surface used by the panel and the transfer relay
    interface IERC20 {
        /// Approves a spender to spend tokens
        function approve(address spender, uint256 amount) external returns (bool);

        /// Transfers tokens from one address to another
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
}
