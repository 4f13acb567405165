//! Audit log querying and filtering

use chrono::{DateTime, Utc};

use super::logger::AuditLogger;
use super::models::{AuditLogEntry, AuditOutcome};

/// Filter criteria for audit log queries
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Filter by action-type (case-insensitive)
    pub action_type: Option<String>,
    /// Filter by outcome
    pub outcome: Option<AuditOutcome>,
    /// Filter by accessing or accessed label
    pub participant: Option<String>,
    /// Filter by start date
    pub start_date: Option<DateTime<Utc>>,
    /// Filter by end date
    pub end_date: Option<DateTime<Utc>>,
}

impl QueryFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by action-type
    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }

    /// Filter by outcome
    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Filter by participant label on either side
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    /// Filter by start date
    pub fn with_start_date(mut self, date: DateTime<Utc>) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Filter by end date
    pub fn with_end_date(mut self, date: DateTime<Utc>) -> Self {
        self.end_date = Some(date);
        self
    }

    fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(ref action_type) = self.action_type {
            if !entry.action_type.eq_ignore_ascii_case(action_type) {
                return false;
            }
        }

        if let Some(outcome) = self.outcome {
            if entry.outcome != outcome {
                return false;
            }
        }

        if let Some(ref participant) = self.participant {
            if entry.accessing != *participant && entry.accessed != *participant {
                return false;
            }
        }

        if let Some(start_date) = self.start_date {
            if entry.timestamp < start_date {
                return false;
            }
        }

        if let Some(end_date) = self.end_date {
            if entry.timestamp > end_date {
                return false;
            }
        }

        true
    }
}

/// Queries over an [`AuditLogger`]
pub struct AuditQuery;

impl AuditQuery {
    /// Entries matching `filter`, oldest first
    pub fn search(logger: &AuditLogger, filter: &QueryFilter) -> Vec<AuditLogEntry> {
        logger
            .entries()
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    }

    /// Number of entries matching `filter`
    pub fn count(logger: &AuditLogger, filter: &QueryFilter) -> usize {
        Self::search(logger, filter).len()
    }

    /// Most recent `limit` entries matching `filter`, newest first
    pub fn recent(logger: &AuditLogger, filter: &QueryFilter, limit: usize) -> Vec<AuditLogEntry> {
        let mut entries = Self::search(logger, filter);
        entries.reverse();
        entries.truncate(limit);
        entries
    }
}
