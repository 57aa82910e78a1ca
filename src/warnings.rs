//! Warning tracking for the reconstruction run.
//!
//! Recoverable anomalies (duplicate adds, orphan cancels, stray fills,
//! unknown action bytes, malformed rows) must neither crash the run nor
//! vanish silently: each is counted by category and optionally forwarded
//! to the `log` facade, and the totals are reported at the end of the run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category of a recoverable anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Add for an order id that is already live (event skipped)
    DuplicateAdd,

    /// Cancel for an order id that is not in the book (suppressed)
    UnknownCancel,

    /// Fill outside a trade sequence (event skipped)
    StrayFill,

    /// Unrecognized action byte in the feed (row ignored)
    UnknownAction,

    /// Row that failed field parsing (dropped before the core)
    MalformedRow,
}

impl WarningKind {
    /// Stable upper-case name for logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            WarningKind::DuplicateAdd => "DUPLICATE_ADD",
            WarningKind::UnknownCancel => "UNKNOWN_CANCEL",
            WarningKind::StrayFill => "STRAY_FILL",
            WarningKind::UnknownAction => "UNKNOWN_ACTION",
            WarningKind::MalformedRow => "MALFORMED_ROW",
        }
    }
}

/// Per-category warning counters.
#[derive(Debug, Clone)]
pub struct WarningTracker {
    log_warnings: bool,
    counts: HashMap<WarningKind, u64>,
    total: u64,
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WarningTracker {
    /// Create a tracker; `log_warnings` controls forwarding to `log::warn!`.
    pub fn new(log_warnings: bool) -> Self {
        Self {
            log_warnings,
            counts: HashMap::new(),
            total: 0,
        }
    }

    /// Count a warning and, if enabled, log it.
    pub fn record(&mut self, kind: WarningKind, message: impl AsRef<str>) {
        *self.counts.entry(kind).or_insert(0) += 1;
        self.total += 1;
        if self.log_warnings {
            log::warn!("{}: {}", kind.name(), message.as_ref());
        }
    }

    /// Count for one category.
    pub fn count(&self, kind: WarningKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total warnings across all categories.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl fmt::Display for WarningTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no warnings");
        }
        let mut entries: Vec<(&WarningKind, &u64)> = self.counts.iter().collect();
        entries.sort_by_key(|(kind, _)| kind.name());
        let mut first = true;
        for (kind, count) in entries {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={count}", kind.name())?;
            first = false;
        }
        Ok(())
    }
}
