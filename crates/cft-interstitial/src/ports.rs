//! Seams between the warning page and its environment.
//!
//! The controller never touches a real document or extension runtime.
//! It drives two ports:
//!
//! - **[`BrowsingContext`]** -- the tab hosting the warning page: its
//!   identity, how deep its history is, and the two ways the page may
//!   leave (replace the current entry, or step back).
//!
//! - **[`BackgroundPort`]** -- the outbound half of the message channel to
//!   the privileged context. Replies and notifications come back in as
//!   [`BackgroundMessage`](cft_types::message::BackgroundMessage)s handed
//!   to the controller by whoever owns the event loop.

use std::collections::VecDeque;

use cft_types::error::{CftError, Result};
use cft_types::ids::TabId;
use cft_types::message::PageMessage;

// -----------------------------------------------------------------------
// BrowsingContext trait
// -----------------------------------------------------------------------

/// The tab a warning page lives in.
pub trait BrowsingContext {
    /// Identifier of the hosting tab.
    fn tab_id(&self) -> TabId;

    /// Number of history entries up to and including the current one.
    ///
    /// `1` means the warning page is the first entry and there is nothing
    /// to go back to.
    fn history_depth(&self) -> usize;

    /// Replace the current history entry with `url`.
    ///
    /// Going back from `url` must not land on the replaced entry.
    fn replace_location(&mut self, url: &str) -> Result<()>;

    /// Step back one history entry.
    fn go_back(&mut self) -> Result<()>;
}

// -----------------------------------------------------------------------
// BackgroundPort trait
// -----------------------------------------------------------------------

/// Outbound channel to the privileged context.
pub trait BackgroundPort {
    /// Post a request. Delivery is best effort; an `Err` means the message
    /// certainly did not leave.
    fn send(&mut self, msg: PageMessage) -> Result<()>;
}

// -----------------------------------------------------------------------
// QueuedPort
// -----------------------------------------------------------------------

/// A [`BackgroundPort`] that buffers outgoing messages until the event
/// loop drains them into the privileged context.
#[derive(Debug, Default)]
pub struct QueuedPort {
    outbox: VecDeque<PageMessage>,
    disconnected: bool,
}

impl QueuedPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued message, oldest first.
    pub fn drain(&mut self) -> Vec<PageMessage> {
        self.outbox.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Simulate the privileged side going away; later sends fail.
    pub fn disconnect(&mut self) {
        self.disconnected = true;
        self.outbox.clear();
    }
}

impl BackgroundPort for QueuedPort {
    fn send(&mut self, msg: PageMessage) -> Result<()> {
        if self.disconnected {
            return Err(CftError::Channel(format!(
                "{}: background context unreachable",
                msg.command_name()
            )));
        }
        log::debug!("page -> background: {msg:?}");
        self.outbox.push_back(msg);
        Ok(())
    }
}
