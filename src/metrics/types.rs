use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Running history of a single file over one repository scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHistoryState {
    /// Signed running total of lines added minus lines deleted.
    pub cumulative_loc: i64,
    pub authors_seen: HashSet<String>,
    pub last_changed: i64,
    pub unique_change_count: u64,
}

impl FileHistoryState {
    pub(crate) fn record_change(&mut self, added: u64, deleted: u64, author: &str, timestamp: i64) {
        self.cumulative_loc += added as i64 - deleted as i64;
        self.authors_seen.insert(author.to_string());
        self.last_changed = timestamp;
        self.unique_change_count += 1;
    }
}

/// File name to history, for every file seen so far in a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistory {
    pub(crate) files: HashMap<String, FileHistoryState>,
}

impl FileHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&FileHistoryState> {
        self.files.get(file_name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Subsystem name to number of prior touches, for one author.
pub type DeveloperExperienceState = HashMap<String, u64>;

/// Author to per-subsystem experience, for every author seen in a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeveloperExperience {
    pub(crate) authors: HashMap<String, DeveloperExperienceState>,
}

impl DeveloperExperience {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, author: &str) -> Option<&DeveloperExperienceState> {
        self.authors.get(author)
    }

    /// Total prior touches by `author` across all subsystems.
    pub fn total(&self, author: &str) -> u64 {
        self.authors
            .get(author)
            .map(|subsystems| subsystems.values().sum())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// Process metrics of one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitMetrics {
    /// Lines added.
    pub la: u64,
    /// Lines deleted.
    pub ld: u64,
    /// Files touched.
    pub nf: usize,
    /// Distinct subsystems touched.
    pub ns: usize,
    /// Distinct directories touched.
    pub nd: usize,
    /// Shannon entropy (base 2) of modified lines across files.
    pub entropy: f64,
    /// Mean lines of code in the touched files before the commit.
    pub lt: f64,
    /// Distinct developers who previously touched these files.
    pub ndev: usize,
    /// Mean days since the touched files last changed.
    pub age: f64,
    pub exp: f64,
    pub rexp: f64,
    pub sexp: u64,
    /// Sum of prior change counts of the touched files.
    pub nuc: u64,
    pub files_seen: Vec<String>,
}
