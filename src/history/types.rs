use serde::{Deserialize, Serialize};

/// Commit header fields reassembled from one raw log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitHeader {
    #[serde(rename = "commit_hash")]
    pub hash: String,
    pub parent_hashes: Vec<String>,
    pub author_name: String,
    pub author_email: String,
    /// Author date as git printed it (`%ad`).
    pub author_date: String,
    /// Author date in seconds since the epoch (`%at`).
    #[serde(rename = "author_date_unix_timestamp")]
    pub author_timestamp: i64,
    /// Subject concatenated with body.
    #[serde(rename = "commit_message")]
    pub message: String,
}

impl CommitHeader {
    /// A commit with exactly two parents is a merge.
    pub fn is_merge(&self) -> bool {
        self.parent_hashes.len() == 2
    }
}

/// One `--numstat` line: lines added/deleted for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeSummary {
    pub file_name: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl FileChangeSummary {
    pub fn new(file_name: impl Into<String>, lines_added: u64, lines_deleted: u64) -> Self {
        FileChangeSummary {
            file_name: file_name.into(),
            lines_added,
            lines_deleted,
        }
    }

    pub fn modified_lines(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

/// A parsed commit together with its file-change summaries, in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub header: CommitHeader,
    pub files: Vec<FileChangeSummary>,
}
