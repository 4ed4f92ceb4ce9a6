//! Sequence numbers for block-check queries.
//!
//! Every query gets a fresh [`QueryId`]. Only the most recently issued one
//! is outstanding; a reply carrying any other id is stale. Nothing is
//! cancelled on the wire, superseded replies are simply dropped on arrival.

use std::time::{Duration, Instant};

use cft_types::ids::QueryId;

#[derive(Debug, Clone, Copy)]
struct Outstanding {
    id: QueryId,
    issued_at: Instant,
}

/// Issues query ids and decides which reply may act.
#[derive(Debug, Default)]
pub struct QuerySequencer {
    last_issued: QueryId,
    outstanding: Option<Outstanding>,
}

impl QuerySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new id, superseding any outstanding one.
    pub fn issue(&mut self, now: Instant) -> QueryId {
        let id = self.last_issued.next();
        self.last_issued = id;
        self.outstanding = Some(Outstanding { id, issued_at: now });
        id
    }

    /// Consume the outstanding query if `id` names it.
    ///
    /// Returns `false` for stale ids, ids already consumed, and ids never
    /// issued.
    pub fn accept(&mut self, id: QueryId) -> bool {
        match self.outstanding {
            Some(o) if o.id == id => {
                self.outstanding = None;
                true
            },
            _ => false,
        }
    }

    /// Consume the outstanding query if it has waited longer than
    /// `timeout`, returning its id.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Option<QueryId> {
        let o = self.outstanding?;
        if now.saturating_duration_since(o.issued_at) < timeout {
            return None;
        }
        self.outstanding = None;
        Some(o.id)
    }

    /// Forget the outstanding query without acting on it.
    pub fn abandon(&mut self) -> Option<QueryId> {
        self.outstanding.take().map(|o| o.id)
    }

    pub fn outstanding(&self) -> Option<QueryId> {
        self.outstanding.map(|o| o.id)
    }

    pub fn last_issued(&self) -> QueryId {
        self.last_issued
    }
}
