use serde::Serialize;
use std::path::PathBuf;

/// Result of building or refreshing one folder's archive.
#[derive(Debug, Serialize, Clone)]
pub struct ArchiveOutcome {
    /// Archive file name, e.g. `xrt_smi_phx.a`.
    pub archive: String,
    /// Folder the archive lives in.
    pub folder: PathBuf,
    /// True when the archive did not exist before this run.
    pub created: bool,
    /// Member names present now that were absent before, sorted.
    pub added: Vec<String>,
    /// Member names present before that are gone now, sorted.
    pub removed: Vec<String>,
    /// Previously known members whose source file is newer than the
    /// archive was, sorted. Heuristic only; independent of what `ar`
    /// physically rewrote.
    pub updated: Vec<String>,
}

impl ArchiveOutcome {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.updated.is_empty()
    }
}

/// Running totals for a whole invocation, one entry per archive that
/// was processed successfully.
#[derive(Debug, Serialize, Default)]
pub struct RunSummary {
    /// Folders the user asked for (including ones skipped as missing).
    pub requested: usize,
    /// Folders whose archive was built or refreshed without error.
    pub processed: usize,
    pub total_new: usize,
    pub total_updated: usize,
    pub archives: Vec<ArchiveOutcome>,
}

impl RunSummary {
    pub fn new(requested: usize) -> Self {
        RunSummary {
            requested,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: ArchiveOutcome) {
        self.processed += 1;
        self.total_new += outcome.added.len();
        self.total_updated += outcome.updated.len();
        self.archives.push(outcome);
    }

    /// True only when every requested folder made it through.
    pub fn all_succeeded(&self) -> bool {
        self.processed == self.requested
    }
}
