//! Shared configuration (`cft.toml`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CftError, Result};

/// How much of the blocked URL the warning page reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Only the decoded hostname.
    #[default]
    HostOnly,
    /// Hostname plus path, query and fragment as secondary detail.
    Full,
}

impl DisplayMode {
    /// Integer selector carried in the warning page URL.
    pub fn selector(self) -> u8 {
        match self {
            Self::HostOnly => 0,
            Self::Full => 2,
        }
    }

    /// Interpret the selector from the warning page URL.
    ///
    /// Only `2` selects [`DisplayMode::Full`]; absent, `0`, unknown or
    /// non-numeric values fall back to [`DisplayMode::HostOnly`].
    pub fn from_selector(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::HostOnly;
        };
        match raw.trim().parse::<i64>() {
            Ok(2) => Self::Full,
            Ok(_) => Self::HostOnly,
            Err(_) => {
                log::warn!("ignoring non-numeric display mode {raw:?}");
                Self::HostOnly
            },
        }
    }
}

/// Configuration shared by the interceptor and the warning page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CftConfig {
    /// Base URL of the warning page.
    #[serde(default = "default_warning_page")]
    pub warning_page: String,
    /// Base URL of the isolated view.
    #[serde(default = "default_isolated_view")]
    pub isolated_view: String,
    /// Milliseconds a block check may stay unanswered before it is treated
    /// as inconclusive.
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,
    /// Display mode embedded by the interceptor.
    #[serde(default)]
    pub display_mode: DisplayMode,
}

fn default_warning_page() -> String {
    "ext://cft/blocked.html".to_string()
}

fn default_isolated_view() -> String {
    "ext://cft/sandbox.html".to_string()
}

fn default_oracle_timeout_ms() -> u64 {
    5000
}

impl Default for CftConfig {
    fn default() -> Self {
        Self {
            warning_page: default_warning_page(),
            isolated_view: default_isolated_view(),
            oracle_timeout_ms: default_oracle_timeout_ms(),
            display_mode: DisplayMode::default(),
        }
    }
}

impl CftConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| CftError::Config(format!("{}: {e}", path.display())))
    }

    /// Oracle timeout as a [`Duration`].
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("warning_page", &self.warning_page),
            ("isolated_view", &self.isolated_view),
        ] {
            url::Url::parse(value).map_err(|e| CftError::Config(format!("{key}: {e}")))?;
        }
        if self.warning_page == self.isolated_view {
            return Err(CftError::Config(
                "warning_page and isolated_view must differ".to_string(),
            ));
        }
        Ok(())
    }
}
