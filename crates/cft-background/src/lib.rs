//! Privileged side of Content Farm Terminator.
//!
//! Holds the live rule state ([`oracle`]), decides which navigations get
//! the warning page ([`interceptor`]), and answers the pages it spawned
//! ([`hub`]).

pub mod hub;
pub mod interceptor;
pub mod oracle;

#[cfg(test)]
mod scenarios;

pub use hub::{AckStats, BackgroundHub};
pub use interceptor::{InterceptDecision, NavigationInterceptor};
pub use oracle::{FilterOracle, HostRuleSet, LoadStats};
