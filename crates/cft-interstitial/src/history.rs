//! Session history of a single tab.

use cft_types::error::{CftError, Result};
use cft_types::ids::TabId;

use crate::ports::BrowsingContext;

/// In-memory session history: back stack, current entry, forward stack.
///
/// Used as the [`BrowsingContext`] when the warning page runs outside a
/// real browser (CLI, tests).
#[derive(Debug, Clone)]
pub struct SessionHistory {
    tab_id: TabId,
    back_stack: Vec<String>,
    forward_stack: Vec<String>,
    current: Option<String>,
}

impl SessionHistory {
    pub fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            current: None,
        }
    }

    /// Navigate to a new URL. Pushes the current entry to the back stack
    /// and clears the forward stack.
    pub fn navigate(&mut self, url: &str) {
        if let Some(entry) = self.current.take() {
            self.back_stack.push(entry);
        }
        self.forward_stack.clear();
        self.current = Some(url.to_string());
    }

    /// Go forward in history. Returns the URL now current, or None.
    pub fn go_forward(&mut self) -> Option<&str> {
        let next = self.forward_stack.pop()?;
        if let Some(current) = self.current.take() {
            self.back_stack.push(current);
        }
        self.current = Some(next);
        self.current_url()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    /// Every entry, oldest first, including forward entries.
    pub fn entries(&self) -> Vec<&str> {
        let mut entries: Vec<&str> = self.back_stack.iter().map(String::as_str).collect();
        entries.extend(self.current.as_deref());
        entries.extend(self.forward_stack.iter().rev().map(String::as_str));
        entries
    }
}

impl BrowsingContext for SessionHistory {
    fn tab_id(&self) -> TabId {
        self.tab_id
    }

    fn history_depth(&self) -> usize {
        self.back_stack.len() + usize::from(self.current.is_some())
    }

    fn replace_location(&mut self, url: &str) -> Result<()> {
        log::info!("{}: replacing location with {url}", self.tab_id);
        self.current = Some(url.to_string());
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        let prev = self
            .back_stack
            .pop()
            .ok_or_else(|| CftError::Navigation(format!("{}: no previous entry", self.tab_id)))?;
        if let Some(current) = self.current.take() {
            self.forward_stack.push(current);
        }
        log::info!("{}: back to {prev}", self.tab_id);
        self.current = Some(prev);
        Ok(())
    }
}
