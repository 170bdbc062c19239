//! Structured advisory findings.
//!
//! Non-fatal observations (suspicious descriptions, cross-modality
//! duplicates, dropped merge rows) are collected here as data. Callers
//! log each finding as it is pushed; downstream code can also inspect
//! the collected set, so nothing ever has to parse log output to react
//! to a finding.

use std::fmt;

/// Category of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryKind {
    /// Description kept for a datatype but missing its common substrings.
    SuspiciousDescription,
    /// Description appears under more than one datatype or modality.
    CrossModalityDuplicate,
    /// Tabular row dropped or unmatched during a merge.
    MergeResidue,
    /// Subject/visit row dropped by a keep-list or filter.
    DroppedRow,
    /// Cohort label could not be recovered or normalized.
    CohortResolution,
    /// Source flagged non-static but shaped like a static table.
    SourceShape,
    /// Per-record heuristic failure skipped in production mode.
    HeuristicSkip,
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdvisoryKind::SuspiciousDescription => "suspicious-description",
            AdvisoryKind::CrossModalityDuplicate => "cross-modality-duplicate",
            AdvisoryKind::MergeResidue => "merge-residue",
            AdvisoryKind::DroppedRow => "dropped-row",
            AdvisoryKind::CohortResolution => "cohort-resolution",
            AdvisoryKind::SourceShape => "source-shape",
            AdvisoryKind::HeuristicSkip => "heuristic-skip",
        };
        write!(f, "{label}")
    }
}

/// One collected finding.
#[derive(Debug, Clone)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

/// Append-only collection of advisories for one run.
#[derive(Debug, Default)]
pub struct AdvisoryLog {
    entries: Vec<Advisory>,
}

impl AdvisoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: AdvisoryKind, message: impl Into<String>) {
        self.entries.push(Advisory {
            kind,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Advisory] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn count_of(&self, kind: AdvisoryKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    /// Moves all findings from `other` into this log.
    pub fn absorb(&mut self, other: AdvisoryLog) {
        self.entries.extend(other.entries);
    }
}
