use super::types::{DiffHunk, DiffLine, FileDiff, LineKind};
use crate::error::HunkError;

const REGION_START: &str = "diff --git ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between `diff --git` and the first hunk header.
    Preamble,
    Hunk,
    /// Inside a hunk whose header could not be parsed.
    SkipHunk,
}

/// Parse the text of `git show` / `git diff` into one [`FileDiff`] per
/// `diff --git` region. Text before the first region is ignored, and regions
/// without both a `---` and a `+++ b/` path line are dropped.
pub fn parse_diff(diff_text: &str) -> Vec<FileDiff> {
    let mut regions = Vec::new();
    let mut current: Option<RegionBuilder> = None;

    for line in diff_text.lines() {
        if line.starts_with(REGION_START) {
            if let Some(builder) = current.take() {
                regions.extend(builder.build());
            }
            current = Some(RegionBuilder::new());
        } else if let Some(ref mut builder) = current {
            builder.feed(line);
        }
    }

    if let Some(builder) = current {
        regions.extend(builder.build());
    }

    regions
}

/// Parse `@@ -a[,b] +c[,d] @@ ...` into the old and new start lines.
pub fn parse_hunk_header(line: &str) -> Result<(u32, u32), HunkError> {
    let malformed = || HunkError::MalformedHeader(line.to_string());

    let rest = line.strip_prefix("@@ -").ok_or_else(malformed)?;
    let (ranges, _) = rest.split_once(" @@").ok_or_else(malformed)?;
    let (old, new) = ranges.split_once(" +").ok_or_else(malformed)?;

    let pre_start = parse_range_start(old).ok_or_else(malformed)?;
    let new_start = parse_range_start(new).ok_or_else(malformed)?;
    Ok((pre_start, new_start))
}

fn parse_range_start(range: &str) -> Option<u32> {
    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (start, Some(count)),
        None => (range, None),
    };
    if let Some(count) = count {
        count.parse::<u32>().ok()?;
    }
    start.parse().ok()
}

fn strip_path_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    let path = path.trim_end_matches(['\t', '\r']);
    path.strip_prefix(prefix).unwrap_or(path)
}

struct RegionBuilder {
    state: ParseState,
    file_pre: Option<String>,
    file_new: Option<String>,
    hunks: Vec<DiffHunk>,
    current: Option<HunkBuilder>,
}

impl RegionBuilder {
    fn new() -> Self {
        RegionBuilder {
            state: ParseState::Preamble,
            file_pre: None,
            file_new: None,
            hunks: Vec::new(),
            current: None,
        }
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with("@@") {
            self.start_hunk(line);
            return;
        }

        match self.state {
            ParseState::Preamble => {
                if let Some(path) = line.strip_prefix("--- ") {
                    self.file_pre = Some(strip_path_prefix(path, "a/").to_string());
                } else if let Some(path) = line.strip_prefix("+++ b/") {
                    self.file_new = Some(strip_path_prefix(path, "").to_string());
                }
            }
            ParseState::Hunk => {
                if let Some(ref mut hunk) = self.current {
                    hunk.add_line(line);
                }
            }
            ParseState::SkipHunk => {}
        }
    }

    fn start_hunk(&mut self, line: &str) {
        self.finish_hunk();
        match parse_hunk_header(line) {
            Ok((pre_start, new_start)) => {
                self.current = Some(HunkBuilder::new(pre_start, new_start));
                self.state = ParseState::Hunk;
            }
            Err(e) => {
                log::debug!("skipping hunk: {}", e);
                self.state = ParseState::SkipHunk;
            }
        }
    }

    fn finish_hunk(&mut self) {
        if let Some(hunk) = self.current.take() {
            self.hunks.push(hunk.build(
                self.file_pre.as_deref().unwrap_or_default(),
                self.file_new.as_deref().unwrap_or_default(),
            ));
        }
    }

    fn build(mut self) -> Option<FileDiff> {
        self.finish_hunk();
        match (self.file_pre, self.file_new) {
            (Some(file_pre), Some(file_new)) => Some(FileDiff {
                file_pre,
                file_new,
                hunks: self.hunks,
            }),
            _ => {
                log::debug!(
                    "dropping diff region without path lines ({} hunks)",
                    self.hunks.len()
                );
                None
            }
        }
    }
}

struct HunkBuilder {
    pre_start: u32,
    new_start: u32,
    old_line: u32,
    new_line: u32,
    lines: Vec<DiffLine>,
}

impl HunkBuilder {
    fn new(pre_start: u32, new_start: u32) -> Self {
        HunkBuilder {
            pre_start,
            new_start,
            old_line: pre_start,
            new_line: new_start,
            lines: Vec::new(),
        }
    }

    fn add_line(&mut self, line: &str) {
        let (kind, content) = match line.as_bytes().first() {
            Some(b'+') => (LineKind::Added, &line[1..]),
            Some(b'-') => (LineKind::Deleted, &line[1..]),
            Some(b' ') => (LineKind::Context, &line[1..]),
            // "\ No newline at end of file"
            Some(b'\\') => return,
            _ => (LineKind::Context, line),
        };

        let (old_line, new_line) = match kind {
            LineKind::Added => {
                let n = self.new_line;
                self.new_line += 1;
                (None, Some(n))
            }
            LineKind::Deleted => {
                let o = self.old_line;
                self.old_line += 1;
                (Some(o), None)
            }
            LineKind::Context => {
                let o = self.old_line;
                let n = self.new_line;
                self.old_line += 1;
                self.new_line += 1;
                (Some(o), Some(n))
            }
        };

        self.lines.push(DiffLine {
            kind,
            content: content.to_string(),
            old_line,
            new_line,
        });
    }

    fn build(self, file_pre: &str, file_new: &str) -> DiffHunk {
        DiffHunk {
            file_pre: file_pre.to_string(),
            file_new: file_new.to_string(),
            pre_start: self.pre_start,
            new_start: self.new_start,
            lines: self.lines,
        }
    }
}
