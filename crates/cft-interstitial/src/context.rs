//! Per-page warning state.

use cft_types::config::DisplayMode;
use cft_types::error::{CftError, Result};

use crate::intent::NavigationIntent;

/// Whether a warning page is still the active document of its tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Live,
    /// Navigated away or closed. Terminal.
    Retired,
}

/// State owned by one open warning page.
///
/// The intent is fixed at construction; showing a different destination
/// means building a new context.
#[derive(Debug, Clone)]
pub struct WarningContext {
    intent: NavigationIntent,
    mode: DisplayMode,
    liveness: Liveness,
}

impl WarningContext {
    pub fn new(intent: NavigationIntent, mode: DisplayMode) -> Self {
        Self {
            intent,
            mode,
            liveness: Liveness::Live,
        }
    }

    pub fn intent(&self) -> &NavigationIntent {
        &self.intent
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_live(&self) -> bool {
        self.liveness == Liveness::Live
    }

    /// Fail with [`CftError::Retired`] unless the context is live.
    pub fn ensure_live(&self) -> Result<()> {
        match self.liveness {
            Liveness::Live => Ok(()),
            Liveness::Retired => Err(CftError::Retired),
        }
    }

    /// Move to [`Liveness::Retired`]. Returns `true` only for the call that
    /// performed the transition.
    pub fn retire(&mut self) -> bool {
        let was_live = self.is_live();
        self.liveness = Liveness::Retired;
        was_live
    }
}
