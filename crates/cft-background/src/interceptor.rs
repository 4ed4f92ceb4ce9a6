//! Navigation interceptor: redirects blocked navigations to the warning page.

use cft_interstitial::intent::{NavigationIntent, WarningLocation};
use cft_types::config::{CftConfig, DisplayMode};
use cft_types::error::Result;
use url::Url;

use crate::oracle::FilterOracle;

/// What to do with an outgoing navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptDecision {
    /// Let it through.
    Allow,
    /// Send the tab to this warning page URL instead.
    Redirect(String),
}

/// Decides, per navigation, whether to show the warning page.
#[derive(Debug, Clone)]
pub struct NavigationInterceptor {
    warning_page: Url,
    isolated_view: Url,
    warning_base: String,
    mode: DisplayMode,
}

impl NavigationInterceptor {
    pub fn new(config: &CftConfig) -> Result<Self> {
        Ok(Self {
            warning_page: Url::parse(&config.warning_page)?,
            isolated_view: Url::parse(&config.isolated_view)?,
            warning_base: config.warning_page.clone(),
            mode: config.display_mode,
        })
    }

    /// Whether `target` is one of our own pages.
    ///
    /// Our pages are never intercepted, otherwise opening the isolated view
    /// of a blocked site would bounce straight back to the warning.
    pub fn is_exempt(&self, target: &Url) -> bool {
        [&self.warning_page, &self.isolated_view].into_iter().any(|page| {
            target.scheme() == page.scheme()
                && target.host_str() == page.host_str()
                && target.port() == page.port()
                && target.path() == page.path()
        })
    }

    /// Consult `oracle` for an outgoing navigation to `target`.
    pub fn intercept(&self, target: &Url, oracle: &dyn FilterOracle) -> Result<InterceptDecision> {
        if self.is_exempt(target) || !matches!(target.scheme(), "http" | "https") {
            return Ok(InterceptDecision::Allow);
        }
        if !oracle.is_blocked(target) {
            return Ok(InterceptDecision::Allow);
        }
        let intent = NavigationIntent::parse(target.as_str())?;
        let location = WarningLocation::build(&self.warning_base, &intent, self.mode)?;
        log::info!("intercepted {target}");
        Ok(InterceptDecision::Redirect(location))
    }
}
