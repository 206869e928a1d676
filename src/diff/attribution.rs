use super::buggy::BuggyLineIndex;
use super::parser::parse_diff;
use super::types::{
    Attribution, CommitContext, DiffHunk, LineAttribution, LineChangeRecord, LineKind,
};
use crate::config::MiningConfig;

/// Comment-only lines carry no behaviour and are never attributed.
pub fn is_comment(line: &str) -> bool {
    line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with('*')
        || line.ends_with("*/")
}

/// Whether a trimmed line ends a statement on its own. Lines that are not
/// complete are joined with the following lines until one is.
pub fn is_complete(line: &str) -> bool {
    line.ends_with(['{', '}', ';', ')'])
        || line.starts_with('@')
        || line.contains("class ")
        || line.contains("throws ")
}

fn is_substantive(line: &str, min_chars: usize) -> bool {
    !is_comment(line) && line.chars().count() >= min_chars
}

/// A finished logical statement.
struct Statement {
    content: String,
    line_number: u32,
    flagged: bool,
}

/// Joins the physical lines of one side of a hunk into statements.
#[derive(Default)]
struct StatementBuffer {
    content: String,
    anchor: Option<u32>,
    flagged: bool,
}

impl StatementBuffer {
    fn push(&mut self, text: &str, line_number: u32, flagged: bool) -> Option<Statement> {
        if self.anchor.is_none() {
            self.anchor = Some(line_number);
        } else {
            self.content.push(' ');
        }
        self.content.push_str(text);
        self.flagged |= flagged;

        if !is_complete(text) {
            return None;
        }
        Some(Statement {
            content: std::mem::take(&mut self.content),
            line_number: self.anchor.take().unwrap_or(line_number),
            flagged: std::mem::take(&mut self.flagged),
        })
    }

    fn is_pending(&self) -> bool {
        self.anchor.is_some()
    }
}

fn to_record(
    commit: &CommitContext,
    hunk: &DiffHunk,
    statement: Statement,
    attribution: Attribution,
) -> LineChangeRecord {
    LineChangeRecord {
        commit_hash: commit.hash.clone(),
        content: statement.content,
        file_pre: hunk.file_pre.clone(),
        file_new: hunk.file_new.clone(),
        line_number: statement.line_number,
        author: commit.author.clone(),
        timestamp: commit.timestamp,
        attribution,
        commit_label: commit.contains_bug,
    }
}

fn attribute_hunk(
    hunk: &DiffHunk,
    commit: &CommitContext,
    buggy_lines: &BuggyLineIndex,
    min_chars: usize,
    out: &mut LineAttribution,
) {
    let mut added = StatementBuffer::default();
    let mut deleted = StatementBuffer::default();

    for line in &hunk.lines {
        let text = line.content.trim();
        match (line.kind, line.old_line, line.new_line) {
            (LineKind::Added, _, Some(number)) => {
                if !is_substantive(text, min_chars) {
                    continue;
                }
                let buggy = buggy_lines.contains(&hunk.file_new, number);
                if let Some(statement) = added.push(text, number, buggy) {
                    let bug_introducing = statement.flagged;
                    out.added.push(to_record(
                        commit,
                        hunk,
                        statement,
                        Attribution::Added { bug_introducing },
                    ));
                }
            }
            (LineKind::Deleted, Some(number), _) => {
                if !is_substantive(text, min_chars) {
                    continue;
                }
                if let Some(statement) = deleted.push(text, number, false) {
                    out.deleted.push(to_record(
                        commit,
                        hunk,
                        statement,
                        Attribution::Deleted { fix: commit.fix },
                    ));
                }
            }
            _ => {}
        }
    }

    if added.is_pending() || deleted.is_pending() {
        log::trace!(
            "dropping unterminated statement in {} at +{}",
            hunk.file_new,
            hunk.new_start
        );
    }
}

/// Attribute the substantive added and deleted statements of one commit's
/// diff.
///
/// Diffs longer than `config.max_diff_lines` yield nothing. Regions whose
/// new file is not an allowed source file are skipped, as are hunks with
/// malformed headers.
pub fn attribute_lines(
    diff_text: &str,
    commit: &CommitContext,
    buggy_lines: &BuggyLineIndex,
    config: &MiningConfig,
) -> LineAttribution {
    let mut result = LineAttribution::default();

    let line_count = diff_text.lines().count();
    if line_count > config.max_diff_lines {
        log::warn!(
            "skipping attribution of {}: diff has {} lines (limit {})",
            commit.hash,
            line_count,
            config.max_diff_lines
        );
        return result;
    }

    for region in parse_diff(diff_text) {
        if !config.source_extensions.allows_path(&region.file_new) {
            log::trace!("{}: skipping non-source file {}", commit.hash, region.file_new);
            continue;
        }
        for hunk in &region.hunks {
            attribute_hunk(hunk, commit, buggy_lines, config.min_line_chars, &mut result);
        }
    }

    log::debug!(
        "{}: {} added and {} deleted statements",
        commit.hash,
        result.added.len(),
        result.deleted.len()
    );
    result
}

/// One commit's diff with everything needed to attribute it.
#[derive(Debug, Clone)]
pub struct AttributionJob {
    pub diff_text: String,
    pub commit: CommitContext,
    pub buggy_lines: BuggyLineIndex,
}

/// Attribute many commits. Each job is independent, so with the `parallel`
/// feature the jobs run on the rayon pool. Results keep the input order.
pub fn attribute_commits(jobs: &[AttributionJob], config: &MiningConfig) -> Vec<LineAttribution> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        jobs.par_iter()
            .map(|job| attribute_lines(&job.diff_text, &job.commit, &job.buggy_lines, config))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        jobs.iter()
            .map(|job| attribute_lines(&job.diff_text, &job.commit, &job.buggy_lines, config))
            .collect()
    }
}
