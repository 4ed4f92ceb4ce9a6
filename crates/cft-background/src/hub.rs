//! Background message hub.
//!
//! The privileged end of the page channel. Pages post [`PageMessage`]s to
//! [`handle`](BackgroundHub::handle); answers and change notifications are
//! queued per tab and handed over by [`deliver`](BackgroundHub::deliver)
//! when the event loop pumps that tab. Nothing blocks: every call does its
//! work and returns.

use std::collections::{BTreeMap, VecDeque};

use cft_types::error::{CftError, Result};
use cft_types::ids::TabId;
use cft_types::message::{Ack, BackgroundMessage, PageMessage};
use url::Url;

use crate::interceptor::{InterceptDecision, NavigationInterceptor};
use crate::oracle::{FilterOracle, HostRuleSet};

/// Maximum messages queued for one tab before the oldest are dropped.
const MAX_QUEUED_PER_TAB: usize = 64;

/// Delivery bookkeeping for `update-content` notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckStats {
    /// Notifications queued but not yet acknowledged.
    pub awaiting: usize,
    pub received: usize,
    pub ignored: usize,
}

/// Message queue for one open tab.
#[derive(Debug, Default)]
struct TabChannel {
    queue: VecDeque<BackgroundMessage>,
    acks: AckStats,
}

impl TabChannel {
    fn push(&mut self, tab_id: TabId, msg: BackgroundMessage) {
        if self.queue.len() >= MAX_QUEUED_PER_TAB {
            if let Some(dropped) = self.queue.pop_front() {
                log::warn!("{tab_id}: queue full, dropping {}", dropped.command_name());
                if dropped == BackgroundMessage::UpdateContent {
                    self.acks.awaiting = self.acks.awaiting.saturating_sub(1);
                }
            }
        }
        if msg == BackgroundMessage::UpdateContent {
            self.acks.awaiting += 1;
        }
        self.queue.push_back(msg);
    }
}

/// Owns the live filter state and the channels to every open tab.
pub struct BackgroundHub<O: FilterOracle> {
    oracle: O,
    interceptor: NavigationInterceptor,
    tabs: BTreeMap<TabId, TabChannel>,
}

impl<O: FilterOracle> BackgroundHub<O> {
    pub fn new(oracle: O, interceptor: NavigationInterceptor) -> Self {
        Self {
            oracle,
            interceptor,
            tabs: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Tabs
    // -------------------------------------------------------------------

    /// Register a tab so it receives notifications.
    pub fn open_tab(&mut self, tab_id: TabId) {
        self.tabs.entry(tab_id).or_default();
        log::debug!("{tab_id}: channel open");
    }

    /// Close a tab and drop anything queued for it.
    pub fn close_tab(&mut self, tab_id: TabId) -> bool {
        let existed = self.tabs.remove(&tab_id).is_some();
        if existed {
            log::info!("{tab_id}: closed");
        }
        existed
    }

    pub fn is_open(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    pub fn ack_stats(&self, tab_id: TabId) -> Option<AckStats> {
        self.tabs.get(&tab_id).map(|t| t.acks)
    }

    // -------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------

    /// Handle a request posted by the page in `from`.
    ///
    /// A block check for a URL that does not parse is answered as blocked.
    pub fn handle(&mut self, from: TabId, msg: PageMessage) -> Result<()> {
        log::debug!("{from} -> background: {}", msg.command_name());
        match msg {
            PageMessage::IsUrlBlocked { id, url } => {
                let blocked = match Url::parse(&url) {
                    Ok(url) => self.oracle.is_blocked(&url),
                    Err(e) => {
                        log::warn!("{from}: block check {id} for unparsable {url:?}: {e}");
                        true
                    },
                };
                let channel = self
                    .tabs
                    .get_mut(&from)
                    .ok_or_else(|| CftError::Channel(format!("{from} is not open")))?;
                channel.push(from, BackgroundMessage::UrlBlockedReply { id, blocked });
                Ok(())
            },
            PageMessage::CloseTab { tab_id } => {
                if !self.close_tab(tab_id) {
                    log::debug!("{tab_id}: close requested for unknown tab");
                }
                Ok(())
            },
        }
    }

    /// Tell every open tab that filter state may have changed.
    ///
    /// Returns the number of tabs notified.
    pub fn notify_filter_changed(&mut self) -> usize {
        for (&tab_id, channel) in self.tabs.iter_mut() {
            channel.push(tab_id, BackgroundMessage::UpdateContent);
        }
        log::info!("filter state changed, notified {} tab(s)", self.tabs.len());
        self.tabs.len()
    }

    /// Edit the filter state and notify open tabs if `edit` reports a
    /// change. Returns the number of tabs notified.
    pub fn update_filter<F: FnOnce(&mut O) -> bool>(&mut self, edit: F) -> usize {
        if edit(&mut self.oracle) {
            self.notify_filter_changed()
        } else {
            0
        }
    }

    /// Number of messages waiting for `tab_id`.
    pub fn pending(&self, tab_id: TabId) -> usize {
        self.tabs.get(&tab_id).map_or(0, |t| t.queue.len())
    }

    /// Take every message waiting for `tab_id`, oldest first.
    pub fn drain(&mut self, tab_id: TabId) -> Vec<BackgroundMessage> {
        self.tabs
            .get_mut(&tab_id)
            .map(|t| t.queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Hand queued messages to the page in `tab_id` and record its
    /// acknowledgements. Returns the number of messages delivered.
    pub fn deliver<F: FnMut(BackgroundMessage) -> Ack>(&mut self, tab_id: TabId, mut page: F) -> usize {
        let messages = self.drain(tab_id);
        let delivered = messages.len();
        for msg in messages {
            let is_notification = msg == BackgroundMessage::UpdateContent;
            let ack = page(msg);
            if !is_notification {
                continue;
            }
            // The page may have asked for its own tab to close meanwhile.
            let Some(channel) = self.tabs.get_mut(&tab_id) else {
                continue;
            };
            channel.acks.awaiting = channel.acks.awaiting.saturating_sub(1);
            match ack {
                Ack::Received => channel.acks.received += 1,
                Ack::Ignored => channel.acks.ignored += 1,
            }
        }
        delivered
    }

    // -------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------

    /// Run the interceptor for a navigation in `tab_id`.
    ///
    /// A redirect opens the tab's channel, since a warning page is about to
    /// load there.
    pub fn intercept(&mut self, tab_id: TabId, target: &str) -> Result<InterceptDecision> {
        let target = Url::parse(target)?;
        let decision = self.interceptor.intercept(&target, &self.oracle)?;
        if matches!(decision, InterceptDecision::Redirect(_)) {
            self.open_tab(tab_id);
        }
        Ok(decision)
    }
}

impl BackgroundHub<HostRuleSet> {
    /// Add a host rule, notifying open tabs if it is new.
    pub fn add_rule(&mut self, rule: &str) -> Result<usize> {
        let added = self.oracle.add_rule(rule)?;
        log::info!("rule {rule}: {}", if added { "added" } else { "already present" });
        Ok(if added { self.notify_filter_changed() } else { 0 })
    }

    /// Remove a host rule, notifying open tabs if it was present.
    pub fn remove_rule(&mut self, rule: &str) -> usize {
        if self.oracle.remove_rule(rule) {
            log::info!("rule {rule}: removed");
            self.notify_filter_changed()
        } else {
            log::warn!("rule {rule}: not present");
            0
        }
    }
}
