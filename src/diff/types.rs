use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Added,
    Deleted,
}

/// One physical line of a hunk with its position in the old and new file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub file_pre: String,
    pub file_new: String,
    pub pre_start: u32,
    pub new_start: u32,
    pub lines: Vec<DiffLine>,
}

/// The hunks of one `diff --git` region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub file_pre: String,
    pub file_new: String,
    pub hunks: Vec<DiffHunk>,
}

/// The commit facts every line record carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitContext {
    pub hash: String,
    pub author: String,
    pub timestamp: i64,
    /// The commit is classified as a defect fix.
    pub fix: bool,
    /// The commit is known to have introduced a defect.
    pub contains_bug: bool,
}

/// Per-line flag: added lines may introduce a bug, deleted lines may be
/// part of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribution {
    Added { bug_introducing: bool },
    Deleted { fix: bool },
}

/// One attributed logical statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChangeRecord {
    pub commit_hash: String,
    pub content: String,
    pub file_pre: String,
    pub file_new: String,
    pub line_number: u32,
    pub author: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub attribution: Attribution,
    pub commit_label: bool,
}

impl LineChangeRecord {
    /// Column header for added-line tables.
    pub const ADDED_COLUMNS: [&'static str; 9] = [
        "commit_hash",
        "content",
        "file_pre",
        "file_new",
        "line_num",
        "author",
        "time",
        "bug_introducing",
        "commit_label",
    ];

    /// Column header for deleted-line tables.
    pub const DELETED_COLUMNS: [&'static str; 9] = [
        "commit_hash",
        "content",
        "file_pre",
        "file_new",
        "line_num",
        "author",
        "time",
        "fix",
        "commit_label",
    ];

    pub fn columns(&self) -> [&'static str; 9] {
        match self.attribution {
            Attribution::Added { .. } => Self::ADDED_COLUMNS,
            Attribution::Deleted { .. } => Self::DELETED_COLUMNS,
        }
    }

    /// Cell values in the order of [`LineChangeRecord::columns`].
    pub fn to_row(&self) -> Vec<String> {
        let flag = match self.attribution {
            Attribution::Added { bug_introducing } => bug_introducing,
            Attribution::Deleted { fix } => fix,
        };
        vec![
            self.commit_hash.clone(),
            self.content.clone(),
            self.file_pre.clone(),
            self.file_new.clone(),
            self.line_number.to_string(),
            self.author.clone(),
            self.timestamp.to_string(),
            flag.to_string(),
            self.commit_label.to_string(),
        ]
    }
}

/// Added and deleted line records of one commit, in hunk then line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAttribution {
    pub added: Vec<LineChangeRecord>,
    pub deleted: Vec<LineChangeRecord>,
}

impl LineAttribution {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}
