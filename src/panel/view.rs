//! Text rendering of the panel

use super::state::{Activity, PanelState};
use std::fmt;

pub const TITLE: &str = "Alloy USDC Panel";
pub const LOADING: &str = "Loading...";
pub const APPROVE_LABEL: &str = "Approve Transfer";
pub const TRANSFER_LABEL: &str = "Transfer USDC";

/// Rendered panel: two address lines and two buttons sharing one disabled flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub backend_line: String,
    pub wallet_line: String,
    pub error_line: Option<String>,
    pub activity: Activity,
    pub buttons_disabled: bool,
}

impl From<&PanelState> for PanelView {
    fn from(state: &PanelState) -> Self {
        let backend_line = match &state.backend_address {
            Some(address) => format!("The backend address is: {}", address),
            None => LOADING.to_string(),
        };
        let wallet_line = match &state.wallet_address {
            Some(address) => format!("The wallet address is: {}", address),
            None => LOADING.to_string(),
        };

        Self {
            backend_line,
            wallet_line,
            error_line: state.last_error.as_ref().map(|e| format!("Error: {}", e)),
            activity: state.activity,
            buttons_disabled: !state.activity.is_idle(),
        }
    }
}

impl PanelView {
    fn button(&self, label: &str) -> String {
        if self.buttons_disabled {
            format!("[{} (disabled)]", label)
        } else {
            format!("[{}]", label)
        }
    }
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f, "{}", self.backend_line)?;
        writeln!(f, "{}", self.wallet_line)?;
        if let Some(error) = &self.error_line {
            writeln!(f, "{}", error)?;
        }
        if !self.activity.is_idle() {
            writeln!(f, "Status: {}...", self.activity)?;
        }
        write!(
            f,
            "{}  {}",
            self.button(APPROVE_LABEL),
            self.button(TRANSFER_LABEL)
        )
    }
}
