use std::collections::{HashMap, HashSet};

use super::types::{CommitMetrics, DeveloperExperience, FileHistory};
use crate::history::{FileChangeSummary, LogEntry};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Subsystem and directory name for files at the repository root.
pub const ROOT_SUBSYSTEM: &str = "root";

/// First path segment, or `root` for top-level files.
pub fn subsystem_of(path: &str) -> &str {
    match path.split_once('/') {
        Some((first, _)) => first,
        None => ROOT_SUBSYSTEM,
    }
}

/// Everything but the last path segment, or `root` for top-level files.
pub fn directory_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => ROOT_SUBSYSTEM,
    }
}

/// Shannon entropy (base 2) of the share of modified lines per file.
/// Files with no modified lines contribute nothing; zero total yields 0.
pub fn change_entropy(modified_per_file: &[u64]) -> f64 {
    let total: u64 = modified_per_file.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let mut entropy = 0.0;
    for &modified in modified_per_file {
        if modified > 0 {
            let share = modified as f64 / total as f64;
            entropy -= share * share.log2();
        }
    }
    entropy
}

/// Experience weight from the commit's running age sum. Non-positive age
/// carries no signal.
fn inverse_age_weight(age: f64) -> f64 {
    if age > 0.0 {
        1.0 / age + 1.0
    } else {
        0.0
    }
}

/// Compute the process metrics of one commit and fold the commit into the
/// running file history and developer experience.
///
/// Commits must be fed in chronological order against the same state for
/// the whole repository. Returns `None` when no file was touched; the
/// state is then left unchanged.
pub fn compute_metrics(
    summaries: &[FileChangeSummary],
    files: &mut FileHistory,
    developers: &mut DeveloperExperience,
    author: &str,
    timestamp: i64,
) -> Option<CommitMetrics> {
    let mut la = 0u64;
    let mut ld = 0u64;
    let mut nuc = 0u64;
    let mut sexp = 0u64;
    let mut loc_sum = 0i64;
    let mut age_sum = 0.0;
    let mut exp_sum = 0.0;
    let mut rexp_sum = 0.0;

    let mut authors: HashSet<String> = HashSet::new();
    let mut subsystems: HashSet<&str> = HashSet::new();
    let mut directories: HashSet<&str> = HashSet::new();
    let mut modified_per_file: Vec<u64> = Vec::new();
    let mut files_seen: Vec<String> = Vec::new();

    for summary in summaries {
        let name = summary.file_name.trim();
        if name.is_empty() {
            continue;
        }

        let state = files.files.entry(name.to_string()).or_default();
        if state.unique_change_count > 0 {
            nuc += state.unique_change_count;
            loc_sum += state.cumulative_loc;
            authors.extend(state.authors_seen.iter().cloned());
            age_sum += (timestamp - state.last_changed) as f64 / SECONDS_PER_DAY;
        } else {
            authors.insert(author.to_string());
        }
        state.record_change(summary.lines_added, summary.lines_deleted, author, timestamp);

        let subsystem = subsystem_of(name);
        subsystems.insert(subsystem);
        directories.insert(directory_of(name));

        match developers.authors.get_mut(author) {
            Some(experience) => {
                exp_sum += experience.values().sum::<u64>() as f64;
                match experience.get_mut(subsystem) {
                    Some(count) => {
                        sexp = *count;
                        *count += 1;
                    }
                    None => {
                        experience.insert(subsystem.to_string(), 1);
                    }
                }
                rexp_sum += inverse_age_weight(age_sum);
            }
            None => {
                developers.authors.insert(
                    author.to_string(),
                    HashMap::from([(subsystem.to_string(), 1)]),
                );
            }
        }

        la += summary.lines_added;
        ld += summary.lines_deleted;
        modified_per_file.push(summary.modified_lines());
        files_seen.push(name.to_string());
    }

    let nf = files_seen.len();
    if nf < 1 {
        return None;
    }
    let n = nf as f64;

    Some(CommitMetrics {
        la,
        ld,
        nf,
        ns: subsystems.len(),
        nd: directories.len(),
        entropy: change_entropy(&modified_per_file),
        lt: loc_sum as f64 / n,
        ndev: authors.len(),
        age: age_sum / n,
        exp: exp_sum / n,
        rexp: rexp_sum / n,
        sexp,
        nuc,
        files_seen,
    })
}

/// Owns the running state of one repository scan.
///
/// Single writer: one accumulator per repository, fed commits oldest first.
/// Independent repositories use independent accumulators.
#[derive(Debug, Default)]
pub struct MetricsAccumulator {
    files: FileHistory,
    developers: DeveloperExperience,
    last_timestamp: Option<i64>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, entry: &LogEntry) -> Option<CommitMetrics> {
        let timestamp = entry.header.author_timestamp;
        if let Some(last) = self.last_timestamp {
            if timestamp < last {
                log::debug!(
                    "commit {} is older than its predecessor ({} < {})",
                    entry.header.hash,
                    timestamp,
                    last
                );
            }
        }
        self.last_timestamp = Some(timestamp);

        compute_metrics(
            &entry.files,
            &mut self.files,
            &mut self.developers,
            &entry.header.author_name,
            timestamp,
        )
    }

    pub fn file_history(&self) -> &FileHistory {
        &self.files
    }

    pub fn developer_experience(&self) -> &DeveloperExperience {
        &self.developers
    }
}
