//! Warning interstitial for blocked navigations.
//!
//! This crate ties together the pieces of the page shown in place of a
//! blocked site: recovering the destination from the page location
//! ([`intent`]), rendering it ([`view`]), and the [`InterstitialController`]
//! that keeps the displayed verdict in step with a blocklist that can change
//! while the page is open.

pub mod context;
pub mod controller;
pub mod history;
pub mod intent;
pub mod ports;
pub mod sequencer;
pub mod view;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use cft_types::config::DisplayMode;
pub use context::{Liveness, WarningContext};
pub use controller::{InterstitialController, ReplyOutcome};
pub use history::SessionHistory;
pub use intent::{NavigationIntent, WarningLocation, isolated_view_url};
pub use ports::{BackgroundPort, BrowsingContext, QueuedPort};
pub use sequencer::QuerySequencer;
pub use view::WarningView;
