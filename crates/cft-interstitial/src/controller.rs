//! The warning page controller.
//!
//! One [`InterstitialController`] runs per open warning page. It is driven
//! by discrete events from a single-threaded loop: user actions, messages
//! from the privileged context ([`dispatch`](InterstitialController::dispatch)),
//! and a periodic [`poll`](InterstitialController::poll).
//!
//! Re-validation is asynchronous. `reconsider()` posts an `is-url-blocked`
//! request and returns at once; the answer arrives later as a
//! `url-blocked-reply`. Each request carries a fresh [`QueryId`] and only a
//! reply to the latest one may move the page, so a slow "not blocked"
//! answer can never override a newer "blocked" one.

use std::time::{Duration, Instant};

use cft_types::config::{CftConfig, DisplayMode};
use cft_types::error::Result;
use cft_types::ids::QueryId;
use cft_types::message::{Ack, BackgroundMessage, PageMessage};

use crate::context::WarningContext;
use crate::intent::{NavigationIntent, WarningLocation, isolated_view_url};
use crate::ports::{BackgroundPort, BrowsingContext};
use crate::sequencer::QuerySequencer;
use crate::view::WarningView;

/// What a block-check reply did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Superseded, already consumed, or the page is retired.
    Discarded,
    /// Still blocked; the warning stays.
    StillBlocked,
    /// No longer blocked; the page replaced itself with the destination.
    Released,
}

/// Controller for one displayed warning page.
pub struct InterstitialController<C: BrowsingContext, P: BackgroundPort> {
    warning: WarningContext,
    view: WarningView,
    sequencer: QuerySequencer,
    /// Set by change notifications, cleared by the next `poll`.
    recheck_requested: bool,
    oracle_timeout: Duration,
    isolated_view: String,
    browsing: C,
    port: P,
}

impl<C: BrowsingContext, P: BackgroundPort> InterstitialController<C, P> {
    /// Recover the blocked destination from the page's own location and
    /// render it.
    ///
    /// A missing or malformed embedded target is an interceptor bug; the
    /// page gets no controller and offers no actions.
    pub fn initialize(raw_location: &str, config: &CftConfig, browsing: C, port: P) -> Result<Self> {
        let location = WarningLocation::parse(raw_location).inspect_err(|e| {
            log::error!("{}: cannot show warning: {e}", browsing.tab_id());
        })?;
        let view = WarningView::new(&location.intent, location.mode);
        log::info!(
            "{}: warning for {} ({:?})",
            browsing.tab_id(),
            location.intent,
            location.mode
        );
        Ok(Self {
            warning: WarningContext::new(location.intent, location.mode),
            view,
            sequencer: QuerySequencer::new(),
            recheck_requested: false,
            oracle_timeout: config.oracle_timeout(),
            isolated_view: config.isolated_view.clone(),
            browsing,
            port,
        })
    }

    pub fn view(&self) -> &WarningView {
        &self.view
    }

    pub fn intent(&self) -> &NavigationIntent {
        self.warning.intent()
    }

    pub fn mode(&self) -> DisplayMode {
        self.warning.mode()
    }

    pub fn is_live(&self) -> bool {
        self.warning.is_live()
    }

    pub fn browsing(&self) -> &C {
        &self.browsing
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Id of the block check whose reply may still act, if any.
    pub fn outstanding_query(&self) -> Option<QueryId> {
        self.sequencer.outstanding()
    }

    pub fn recheck_requested(&self) -> bool {
        self.recheck_requested
    }

    // -------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------

    /// Ask the privileged context whether the destination is still blocked.
    ///
    /// Supersedes any check still in flight. If the request cannot be sent
    /// the check is inconclusive and the page stays.
    pub fn reconsider(&mut self) -> Result<QueryId> {
        self.warning.ensure_live()?;
        let id = self.sequencer.issue(Instant::now());
        let msg = PageMessage::IsUrlBlocked {
            id,
            url: self.warning.intent().as_str().to_string(),
        };
        if let Err(e) = self.port.send(msg) {
            self.sequencer.abandon();
            log::warn!("{}: block check {id} not sent, staying: {e}", self.browsing.tab_id());
            return Err(e);
        }
        log::debug!("{}: block check {id} issued", self.browsing.tab_id());
        Ok(id)
    }

    /// Handle the answer to a block check.
    pub fn on_oracle_reply(&mut self, id: QueryId, blocked: bool) -> Result<ReplyOutcome> {
        if !self.warning.is_live() || !self.sequencer.accept(id) {
            log::debug!("{}: discarding stale reply {id}", self.browsing.tab_id());
            return Ok(ReplyOutcome::Discarded);
        }
        if blocked {
            log::debug!("{}: {id} still blocked", self.browsing.tab_id());
            return Ok(ReplyOutcome::StillBlocked);
        }
        let target = self.warning.intent().as_str().to_string();
        log::info!("{}: {target} no longer blocked, leaving warning", self.browsing.tab_id());
        self.browsing.replace_location(&target)?;
        self.retire();
        Ok(ReplyOutcome::Released)
    }

    /// A block check failed in transport. Fail closed.
    pub fn on_oracle_failure(&mut self, id: QueryId) {
        if self.sequencer.accept(id) {
            log::warn!("{}: block check {id} inconclusive, staying", self.browsing.tab_id());
        }
    }

    /// The privileged context says filter state may have changed.
    ///
    /// The check in flight, if any, is superseded at once: its answer
    /// predates the change and may no longer hold. Sending the follow-up is
    /// coalesced, so any number of notifications before the next
    /// [`poll`](Self::poll) produce a single re-check.
    pub fn on_external_change(&mut self) -> Ack {
        if !self.warning.is_live() {
            return Ack::Ignored;
        }
        if let Some(id) = self.sequencer.abandon() {
            log::debug!("{}: block check {id} superseded by filter change", self.browsing.tab_id());
        }
        if !self.recheck_requested {
            log::debug!("{}: filter state changed, re-check scheduled", self.browsing.tab_id());
        }
        self.recheck_requested = true;
        Ack::Received
    }

    /// Route a message from the privileged context.
    pub fn dispatch(&mut self, msg: BackgroundMessage) -> Ack {
        if !self.warning.is_live() {
            log::debug!(
                "{}: retired, ignoring {}",
                self.browsing.tab_id(),
                msg.command_name()
            );
            return Ack::Ignored;
        }
        match msg {
            BackgroundMessage::UpdateContent => self.on_external_change(),
            BackgroundMessage::UrlBlockedReply { id, blocked } => {
                if let Err(e) = self.on_oracle_reply(id, blocked) {
                    log::error!("{}: failed to leave warning: {e}", self.browsing.tab_id());
                }
                Ack::Received
            },
        }
    }

    /// Expire an unanswered check and run a coalesced re-check.
    ///
    /// Call once per event-loop turn, after queued events are handled.
    pub fn poll(&mut self, now: Instant) {
        if !self.warning.is_live() {
            return;
        }
        if let Some(id) = self.sequencer.expire(now, self.oracle_timeout) {
            log::warn!(
                "{}: block check {id} unanswered after {:?}, staying",
                self.browsing.tab_id(),
                self.oracle_timeout
            );
        }
        if self.recheck_requested {
            self.recheck_requested = false;
            // A send failure is already logged and leaves the page in place.
            let _ = self.reconsider();
        }
    }

    // -------------------------------------------------------------------
    // User actions
    // -------------------------------------------------------------------

    /// Open the destination in the isolated view, replacing the warning.
    pub fn proceed_to_isolated_view(&mut self) -> Result<()> {
        self.warning.ensure_live()?;
        let url = isolated_view_url(&self.isolated_view, self.warning.intent())?;
        log::info!("{}: opening isolated view", self.browsing.tab_id());
        self.browsing.replace_location(&url)?;
        self.retire();
        Ok(())
    }

    /// Step back if there is somewhere to go, otherwise ask for the tab to
    /// be closed.
    pub fn go_back_or_close(&mut self) -> Result<()> {
        self.warning.ensure_live()?;
        if self.browsing.history_depth() > 1 {
            self.browsing.go_back()?;
        } else {
            let tab_id = self.browsing.tab_id();
            log::info!("{tab_id}: nothing to go back to, requesting close");
            self.port.send(PageMessage::CloseTab { tab_id })?;
        }
        self.retire();
        Ok(())
    }

    /// The document was unloaded or its tab closed.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn retire(&mut self) -> bool {
        self.recheck_requested = false;
        self.sequencer.abandon();
        let changed = self.warning.retire();
        if changed {
            log::debug!("{}: warning retired", self.browsing.tab_id());
        }
        changed
    }
}

impl<C: BrowsingContext, P: BackgroundPort> std::fmt::Debug for InterstitialController<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterstitialController")
            .field("tab", &self.browsing.tab_id())
            .field("warning", &self.warning)
            .field("outstanding", &self.sequencer.outstanding())
            .field("recheck_requested", &self.recheck_requested)
            .finish()
    }
}
