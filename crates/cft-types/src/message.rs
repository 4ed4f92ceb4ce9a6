//! Message protocol between the warning page and the background context.
//!
//! Both directions use a closed command set. On the wire each message is a
//! JSON object whose `cmd` field carries the kebab-case command name, e.g.
//! `{"cmd":"close-tab","tab_id":7}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{QueryId, TabId};

/// Requests sent from a page to the privileged context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum PageMessage {
    /// Ask whether `url` is blocked by the live rule set.
    IsUrlBlocked { id: QueryId, url: String },
    /// Ask the privileged context to close the given tab.
    CloseTab { tab_id: TabId },
}

impl PageMessage {
    /// Wire name of the command.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::IsUrlBlocked { .. } => "is-url-blocked",
            Self::CloseTab { .. } => "close-tab",
        }
    }
}

/// Messages pushed from the privileged context to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum BackgroundMessage {
    /// Filter state may have changed; re-validate.
    UpdateContent,
    /// Answer to an `is-url-blocked` request.
    UrlBlockedReply { id: QueryId, blocked: bool },
}

impl BackgroundMessage {
    /// Wire name of the command.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::UpdateContent => "update-content",
            Self::UrlBlockedReply { .. } => "url-blocked-reply",
        }
    }
}

/// Acknowledgement a page returns for a pushed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ack {
    /// The notification was accepted by a live page.
    Received,
    /// The page is retired and dropped the notification.
    Ignored,
}

/// Serialize a message to its JSON wire form.
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Parse a message from its JSON wire form.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}
