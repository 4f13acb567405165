//! Audit logger implementation

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use super::models::{AuditLogEntry, AuditOutcome};

/// Shared record of access decisions
///
/// Unbounded by default; with a capacity the oldest entries are evicted
/// once the log is full.
#[derive(Clone, Default)]
pub struct AuditLogger {
    entries: Arc<RwLock<VecDeque<AuditLogEntry>>>,
    capacity: Option<usize>,
}

impl AuditLogger {
    /// Create a new, unbounded audit logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logger keeping at most `capacity` entries; 0 means unbounded
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            capacity: (capacity > 0).then_some(capacity),
        }
    }

    /// Maximum number of retained entries, if bounded
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Record one decision
    pub fn record(
        &self,
        action_type: &str,
        accessing: &str,
        accessed: &str,
        granted: bool,
        reason: &str,
    ) {
        let entry = AuditLogEntry::new(
            action_type,
            accessing,
            accessed,
            AuditOutcome::from_granted(granted),
        )
        .with_reason(reason);

        let mut entries = self.entries.write();
        if let Some(capacity) = self.capacity {
            while entries.len() >= capacity {
                entries.pop_front();
            }
        }
        entries.push_back(entry);
    }

    /// Snapshot of all retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("entries", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
