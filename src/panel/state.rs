//! Observable panel state and the activity state machine

use crate::error::PanelError;
use alloy::primitives::Address;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What the panel is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    /// Approval transaction in flight
    Approving,
    /// Backend transfer in flight
    Transferring,
}

impl Activity {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Approving => "approving",
            Self::Transferring => "transferring",
        };
        f.write_str(label)
    }
}

/// Snapshot of everything the view renders
///
/// Address slots go from `None` to a resolved value; a failed load leaves
/// them untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    /// Address reported by the backend
    pub backend_address: Option<String>,
    /// Active wallet account
    pub wallet_address: Option<Address>,
    /// Current activity; anything but `Idle` disables both buttons
    pub activity: Activity,
    /// Last failure, only kept under `ErrorPolicy::Surface`
    pub last_error: Option<PanelError>,
}

/// Shared state cell
#[derive(Debug, Default)]
pub(crate) struct StateCell(Mutex<PanelState>);

impl StateCell {
    pub(crate) fn lock(&self) -> MutexGuard<'_, PanelState> {
        // State stays consistent across a panic; every write is a single assignment
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave `Idle` for `activity`, or report what is already running
    pub(crate) fn begin(&self, activity: Activity) -> Result<ActivityGuard<'_>, Activity> {
        let mut state = self.lock();
        if !state.activity.is_idle() {
            return Err(state.activity);
        }
        state.activity = activity;
        Ok(ActivityGuard { cell: self })
    }
}

/// Returns the panel to `Idle` when dropped, whichever way the action ends
#[must_use]
pub(crate) struct ActivityGuard<'a> {
    cell: &'a StateCell,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.cell.lock().activity = Activity::Idle;
    }
}
