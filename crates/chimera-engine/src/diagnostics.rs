//! Diagnostics
//!
//! Every recovered failure is reported twice: as a `tracing` event for the
//! embedding application's subscriber, and as a [`Diagnostic`] entry in a
//! bounded, inspectable [`DiagnosticLog`].

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// Default number of entries a log retains
pub const DEFAULT_LOG_CAPACITY: usize = 1024;

/// What kind of recovery happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// A captured primitive reported a host fault
    PrimitiveFault,
    /// A captured primitive panicked
    PrimitivePanic,
    /// A hierarchy walk revisited a node and was truncated
    HierarchyCycle,
    /// A hierarchy walk hit the depth bound and was truncated
    HierarchyTooDeep,
    /// A hierarchy walk could not read a link and was truncated
    HierarchyBroken,
    /// A host-ownership probe could not be performed
    ProbeFailed,
    /// The host refused to be spliced under a bridge
    SpliceRefused,
    /// The instance refused its hierarchy pointer redirection
    RedirectRefused,
    /// The native origin could not be recorded on the instance
    OriginNotRecorded,
    /// A merge conflict was resolved by keeping the ancestor's definition
    MergeRejected,
    /// A property changed between data and accessor across levels
    KindChanged,
    /// Committing a merged property to the instance failed
    DefineFailed,
}

impl DiagnosticCode {
    /// Stable short name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimitiveFault => "primitive-fault",
            Self::PrimitivePanic => "primitive-panic",
            Self::HierarchyCycle => "hierarchy-cycle",
            Self::HierarchyTooDeep => "hierarchy-too-deep",
            Self::HierarchyBroken => "hierarchy-broken",
            Self::ProbeFailed => "probe-failed",
            Self::SpliceRefused => "splice-refused",
            Self::RedirectRefused => "redirect-refused",
            Self::OriginNotRecorded => "origin-not-recorded",
            Self::MergeRejected => "merge-rejected",
            Self::KindChanged => "kind-changed",
            Self::DefineFailed => "define-failed",
        }
    }

    /// Whether the event degrades a fusion (as opposed to routine noise)
    pub fn is_degrading(&self) -> bool {
        !matches!(self, Self::PrimitiveFault | Self::KindChanged | Self::HierarchyBroken)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recovered failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Kind of recovery
    pub code: DiagnosticCode,
    /// Human-readable detail
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Bounded log of recovered failures. Oldest entries are dropped first.
#[derive(Debug)]
pub struct DiagnosticLog {
    entries: Mutex<VecDeque<Diagnostic>>,
    capacity: usize,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl DiagnosticLog {
    /// Create an empty log with the default capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log retaining at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a diagnostic and emit it as a tracing event
    pub fn emit(&self, code: DiagnosticCode, message: impl Into<String>) {
        let message = message.into();
        if code.is_degrading() {
            warn!(code = %code, "{message}");
        } else {
            debug!(code = %code, "{message}");
        }

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Diagnostic { code, message });
    }

    /// Copy of the retained entries, oldest first
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Remove and return the retained entries
    pub fn drain(&self) -> Vec<Diagnostic> {
        self.entries.lock().drain(..).collect()
    }

    /// Number of retained entries with the given code
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.entries.lock().iter().filter(|d| d.code == code).count()
    }

    /// Check if any retained entry has the given code
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.entries.lock().iter().any(|d| d.code == code)
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
