//! Audit log data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Access was granted
    Granted,
    /// Access was refused
    Denied,
}

impl AuditOutcome {
    /// Outcome for a boolean decision
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            AuditOutcome::Granted
        } else {
            AuditOutcome::Denied
        }
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditOutcome::Granted => write!(f, "granted"),
            AuditOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// Entry in the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique identifier for this log entry
    pub id: String,
    /// Timestamp of the decision
    pub timestamp: DateTime<Utc>,
    /// Action-type that was checked
    pub action_type: String,
    /// Label of the accessing participant
    pub accessing: String,
    /// Label of the accessed participant
    pub accessed: String,
    /// Final outcome
    pub outcome: AuditOutcome,
    /// Why the engine decided as it did
    pub reason: String,
}

impl AuditLogEntry {
    /// Create a new audit log entry
    pub fn new(
        action_type: impl Into<String>,
        accessing: impl Into<String>,
        accessed: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action_type: action_type.into(),
            accessing: accessing.into(),
            accessed: accessed.into(),
            outcome,
            reason: String::new(),
        }
    }

    /// Attach the decision reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}
