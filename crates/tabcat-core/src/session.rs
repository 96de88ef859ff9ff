//! Session-scoped state.
//!
//! The pipeline is stateless; the shell owns one `Session` per user and
//! threads it through. The source table is held immutably and the derived
//! result is stored beside it, never over it. Requests carry a
//! monotonically increasing ticket so a response that arrives after the
//! user moved on (new file, edited categories, abandoned wait) is
//! discarded instead of clobbering newer state.

use crate::category::CategorySet;
use crate::pipeline::CategorizationRequest;
use crate::table::Table;
use crate::validate::CategorizedTable;

/// Handle for one issued request. Only the latest ticket is accepted back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

#[derive(Debug, Default)]
pub struct Session {
    table: Option<Table>,
    categories: Option<CategorySet>,
    result: Option<CategorizedTable>,
    next_seq: u64,
    pending: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a new source table. Drops the previous result and orphans any
    /// pending request.
    pub fn load_table(&mut self, table: Table) {
        self.table = Some(table);
        self.result = None;
        self.pending = None;
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Replace the vocabulary. Orphans any pending request, since its
    /// response would be validated against the wrong category set.
    pub fn set_categories(&mut self, categories: CategorySet) {
        self.categories = Some(categories);
        self.pending = None;
    }

    pub fn categories(&self) -> Option<&CategorySet> {
        self.categories.as_ref()
    }

    /// Whether the trigger action should be enabled: table and vocabulary
    /// present, nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.table.is_some() && self.categories.is_some() && self.pending.is_none()
    }

    /// Issue a ticket for a new request, or `None` while one is pending.
    pub fn begin_request(&mut self) -> Option<RequestTicket> {
        if !self.can_submit() {
            return None;
        }
        self.next_seq += 1;
        self.pending = Some(self.next_seq);
        Some(RequestTicket(self.next_seq))
    }

    /// Snapshot the current table and vocabulary as a unit of work. The
    /// snapshot is detached: later session edits cannot reach into a
    /// request already in flight.
    pub fn request(&self) -> Option<CategorizationRequest> {
        Some(CategorizationRequest {
            table: self.table.clone()?,
            categories: self.categories.clone()?,
        })
    }

    /// Store a completed result. Returns false (and discards the result)
    /// when the ticket is stale.
    pub fn complete(&mut self, ticket: RequestTicket, result: CategorizedTable) -> bool {
        if self.pending != Some(ticket.0) {
            return false;
        }
        self.pending = None;
        self.result = Some(result);
        true
    }

    /// Mark a request as failed. The source table stays intact and
    /// submittable for a retry.
    pub fn fail(&mut self, ticket: RequestTicket) {
        if self.pending == Some(ticket.0) {
            self.pending = None;
        }
    }

    /// Abandon whatever is in flight without recording a failure.
    pub fn abandon(&mut self) {
        self.pending = None;
    }

    pub fn result(&self) -> Option<&CategorizedTable> {
        self.result.as_ref()
    }

    /// Mutable access for shell-side edits to the derived table. The
    /// source table is deliberately not editable.
    pub fn result_mut(&mut self) -> Option<&mut CategorizedTable> {
        self.result.as_mut()
    }
}
