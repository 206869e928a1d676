use std::borrow::Cow;

use super::types::{CommitHeader, FileChangeSummary, LogEntry};
use crate::error::RecordError;

/// Marks the start of every commit record.
pub const RECORD_START: &str = "<<COMMIT>>";
/// Separates a property key from its value.
pub const KEY_VALUE_SEPARATOR: &str = "<<PROP>>";
/// Separates two header properties.
pub const PROPERTY_SEPARATOR: &str = "<<NEXT>>";
/// Ends the header; numstat lines follow.
pub const RECORD_STOP: &str = "<<END>>";

/// The `--pretty` argument that produces the format this module reads.
///
/// Fields, in order:
///   parent_hashes              - %P  (space-separated)
///   commit_hash                - %H
///   author_name                - %an
///   author_email               - %ae
///   author_date                - %ad
///   author_date_unix_timestamp - %at
///   commit_message             - %s%b (subject immediately followed by body)
pub const LOG_PRETTY_FORMAT: &str = "--pretty=format:<<COMMIT>>\
parent_hashes<<PROP>>%P<<NEXT>>\
commit_hash<<PROP>>%H<<NEXT>>\
author_name<<PROP>>%an<<NEXT>>\
author_email<<PROP>>%ae<<NEXT>>\
author_date<<PROP>>%ad<<NEXT>>\
author_date_unix_timestamp<<PROP>>%at<<NEXT>>\
commit_message<<PROP>>%s%b<<END>>";

/// Number of header properties every record must carry.
const HEADER_FIELD_COUNT: usize = 7;

/// Counts used for numstat lines whose counts are not numbers (git prints
/// `-\t-` for binary files).
pub const BINARY_LINE_COUNTS: (u64, u64) = (0, 0);

/// Arguments for `git` that produce a chronological (oldest first) log in
/// the format consumed by [`parse_log`].
pub fn log_command_args() -> [&'static str; 4] {
    ["log", LOG_PRETTY_FORMAT, "--numstat", "--reverse"]
}

/// Lazily tokenize a raw multi-commit log blob.
///
/// Records come out in input order. A record that cannot be parsed is logged
/// and skipped; it never ends the iteration.
pub fn parse_log(raw: &[u8]) -> LogTokenizer<'_> {
    LogTokenizer::new(raw)
}

/// Iterator over the commit records of one log blob.
///
/// The tokenizer walks the blob with a byte cursor: each step takes the text
/// up to the next [`RECORD_START`], splits it at [`RECORD_STOP`] into header
/// and numstat sections, and splits the header into properties.
pub struct LogTokenizer<'a> {
    text: Cow<'a, str>,
    cursor: usize,
    skipped: usize,
}

impl<'a> LogTokenizer<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        let text = match String::from_utf8_lossy(raw) {
            Cow::Borrowed(s) => decode_escaped_transport(s),
            Cow::Owned(s) => Cow::Owned(decode_escaped_transport(&s).into_owned()),
        };
        LogTokenizer {
            text,
            cursor: 0,
            skipped: 0,
        }
    }

    /// Number of records dropped so far because they were ill-formed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn next_segment(&mut self) -> Option<(usize, usize)> {
        if self.cursor >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.cursor..];
        let len = rest.find(RECORD_START).unwrap_or(rest.len());
        let range = (self.cursor, self.cursor + len);
        self.cursor += len + RECORD_START.len();
        Some(range)
    }
}

impl Iterator for LogTokenizer<'_> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        loop {
            let (start, end) = self.next_segment()?;
            let segment = &self.text[start..end];
            if segment.trim().is_empty() {
                continue;
            }
            match parse_record(segment) {
                Ok(entry) => return Some(entry),
                Err(err) => {
                    log::debug!("skipping log record at byte {}: {}", start, err);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Parse the text between two record-start markers.
pub fn parse_record(segment: &str) -> Result<LogEntry, RecordError> {
    let (header_text, stats_text) = segment
        .split_once(RECORD_STOP)
        .ok_or(RecordError::MissingStopMarker)?;

    let header = parse_header(header_text)?;
    let files = stats_text.lines().filter_map(parse_numstat_line).collect();

    Ok(LogEntry { header, files })
}

fn parse_header(header_text: &str) -> Result<CommitHeader, RecordError> {
    let properties: Vec<(&str, &str)> = header_text
        .split(PROPERTY_SEPARATOR)
        .filter_map(|prop| prop.split_once(KEY_VALUE_SEPARATOR))
        .map(|(key, value)| (key.trim(), value))
        .collect();

    if properties.len() < HEADER_FIELD_COUNT {
        return Err(RecordError::TooFewProperties {
            found: properties.len(),
            expected: HEADER_FIELD_COUNT,
        });
    }

    let mut parents = None;
    let mut hash = None;
    let mut author_name = None;
    let mut author_email = None;
    let mut author_date = None;
    let mut timestamp = None;
    let mut message = None;

    for (key, value) in properties {
        match key {
            "parent_hashes" => parents = Some(value),
            "commit_hash" => hash = Some(value),
            "author_name" => author_name = Some(value),
            "author_email" => author_email = Some(value),
            "author_date" => author_date = Some(value),
            "author_date_unix_timestamp" => timestamp = Some(value),
            "commit_message" => message = Some(value),
            other => log::trace!("ignoring unknown log property `{}`", other),
        }
    }

    let hash = clean_value(hash.ok_or(RecordError::MissingField("commit_hash"))?);
    if hash.is_empty() {
        return Err(RecordError::MissingField("commit_hash"));
    }

    let raw_timestamp = clean_value(
        timestamp.ok_or(RecordError::MissingField("author_date_unix_timestamp"))?,
    );
    let author_timestamp = raw_timestamp
        .parse::<i64>()
        .map_err(|_| RecordError::InvalidTimestamp(raw_timestamp.clone()))?;

    let parent_hashes = parents
        .map(clean_value)
        .unwrap_or_default()
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();

    Ok(CommitHeader {
        hash,
        parent_hashes,
        author_name: clean_value(author_name.ok_or(RecordError::MissingField("author_name"))?),
        author_email: author_email.map(clean_value).unwrap_or_default(),
        author_date: author_date.map(clean_value).unwrap_or_default(),
        author_timestamp,
        message: clean_message(message.unwrap_or_default()),
    })
}

/// Parse one `<added>\t<deleted>\t<path>` line. Blank or short lines yield
/// nothing.
fn parse_numstat_line(line: &str) -> Option<FileChangeSummary> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }

    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?;
    let deleted = parts.next()?;
    let path = parts.next()?;

    let file_name = clean_file_name(path);
    if file_name.is_empty() {
        return None;
    }

    let (lines_added, lines_deleted) = parse_line_counts(added, deleted);
    Some(FileChangeSummary {
        file_name,
        lines_added,
        lines_deleted,
    })
}

/// Numstat counts fall back to [`BINARY_LINE_COUNTS`] unless both parse.
pub fn parse_line_counts(added: &str, deleted: &str) -> (u64, u64) {
    match (added.trim().parse::<u64>(), deleted.trim().parse::<u64>()) {
        (Ok(a), Ok(d)) => (a, d),
        _ => BINARY_LINE_COUNTS,
    }
}

fn clean_file_name(path: &str) -> String {
    path.chars()
        .filter(|c| !matches!(c, '\'' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn clean_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn clean_message(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whether the blob arrived through an escaped channel: it has no real
/// newline, and a record stop marker is followed by a literal `\n`. Real
/// output of a single file-less commit has no newline either, so a literal
/// `\n` elsewhere (e.g. in a message) is not enough.
fn is_escaped_transport(raw: &str) -> bool {
    !raw.contains('\n') && raw.contains(&format!("{RECORD_STOP}\\n"))
}

fn flush_bytes(out: &mut String, pending: &mut Vec<u8>) {
    if !pending.is_empty() {
        out.push_str(&String::from_utf8_lossy(pending));
        pending.clear();
    }
}

/// Decode literal escape sequences (`\n`, `\t`, `\r`, `\\`, `\'`, `\xHH`)
/// of an escaped blob. Consecutive `\xHH` bytes are decoded together as
/// UTF-8.
fn decode_escaped_transport(raw: &str) -> Cow<'_, str> {
    if !is_escaped_transport(raw) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut pending: Vec<u8> = Vec::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_bytes(&mut out, &mut pending);
            out.push(c);
            continue;
        }
        let escaped = chars.next();
        if escaped == Some('x') {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 && hex.chars().all(|h| h.is_ascii_hexdigit()) {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    pending.push(byte);
                    continue;
                }
            }
            flush_bytes(&mut out, &mut pending);
            out.push_str("\\x");
            out.push_str(&hex);
            continue;
        }

        flush_bytes(&mut out, &mut pending);
        match escaped {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    flush_bytes(&mut out, &mut pending);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, parents: &str, author: &str, ts: &str, msg: &str, stats: &str) -> String {
        format!(
            "{RECORD_START}parent_hashes{KEY_VALUE_SEPARATOR}{parents}{PROPERTY_SEPARATOR}\
             commit_hash{KEY_VALUE_SEPARATOR}{hash}{PROPERTY_SEPARATOR}\
             author_name{KEY_VALUE_SEPARATOR}{author}{PROPERTY_SEPARATOR}\
             author_email{KEY_VALUE_SEPARATOR}{author}@example.com{PROPERTY_SEPARATOR}\
             author_date{KEY_VALUE_SEPARATOR}Tue Nov 14 22:13:20 2023 +0000{PROPERTY_SEPARATOR}\
             author_date_unix_timestamp{KEY_VALUE_SEPARATOR}{ts}{PROPERTY_SEPARATOR}\
             commit_message{KEY_VALUE_SEPARATOR}{msg}{RECORD_STOP}\n{stats}\n"
        )
    }

    #[test]
    fn test_parse_log_two_records_in_order() {
        let raw = record("aaa", "", "Alice", "1700000000", "Initial commit", "10\t0\tsrc/Main.java")
            + &record("bbb", "aaa", "Bob", "1700086400", "Fix null check", "3\t1\tsrc/Main.java\n2\t2\tREADME.md");

        let entries: Vec<_> = parse_log(raw.as_bytes()).collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].header.hash, "aaa");
        assert!(entries[0].header.parent_hashes.is_empty());
        assert_eq!(entries[0].files, vec![FileChangeSummary::new("src/Main.java", 10, 0)]);

        let second = &entries[1];
        assert_eq!(second.header.hash, "bbb");
        assert_eq!(second.header.parent_hashes, vec!["aaa".to_string()]);
        assert_eq!(second.header.author_name, "Bob");
        assert_eq!(second.header.author_email, "Bob@example.com");
        assert_eq!(second.header.author_timestamp, 1700086400);
        assert_eq!(second.header.author_date, "Tue Nov 14 22:13:20 2023 +0000");
        assert_eq!(second.header.message, "Fix null check");
        assert_eq!(second.files.len(), 2);
        assert_eq!(second.files[1], FileChangeSummary::new("README.md", 2, 2));
    }

    #[test]
    fn test_parse_log_commit_without_files() {
        let raw = record("aaa", "p1 p2", "Alice", "1700000000", "Merge branch 'x'", "");
        let entries: Vec<_> = parse_log(raw.as_bytes()).collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].files.is_empty());
        assert!(entries[0].header.is_merge());
    }

    #[test]
    fn test_parse_log_empty() {
        assert_eq!(parse_log(b"").count(), 0);
        assert_eq!(parse_log(b"  \n ").count(), 0);
    }

    #[test]
    fn test_ill_formed_record_is_skipped_not_fatal() {
        let broken = format!("{RECORD_START}commit_hash{KEY_VALUE_SEPARATOR}zzz{RECORD_STOP}\n1\t1\ta.c\n");
        let no_stop = format!("{RECORD_START}commit_hash{KEY_VALUE_SEPARATOR}yyy\n");
        let raw = broken + &no_stop + &record("aaa", "", "Alice", "1700000000", "ok", "1\t0\ta.c");

        let mut tokenizer = parse_log(raw.as_bytes());
        let entries: Vec<_> = tokenizer.by_ref().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].header.hash, "aaa");
        assert_eq!(tokenizer.skipped(), 2);
    }

    #[test]
    fn test_parse_record_errors() {
        assert_eq!(
            parse_record("commit_hash<<PROP>>abc").unwrap_err(),
            RecordError::MissingStopMarker
        );
        assert_eq!(
            parse_record("commit_hash<<PROP>>abc<<END>>").unwrap_err(),
            RecordError::TooFewProperties {
                found: 1,
                expected: 7
            }
        );

        let bad_ts = record("aaa", "", "Alice", "yesterday", "msg", "");
        let segment = bad_ts.trim_start_matches(RECORD_START);
        assert_eq!(
            parse_record(segment).unwrap_err(),
            RecordError::InvalidTimestamp("yesterday".to_string())
        );
    }

    #[test]
    fn test_property_order_is_irrelevant() {
        let segment = "commit_message<<PROP>>Add parser<<NEXT>>\
                       author_date_unix_timestamp<<PROP>>42<<NEXT>>\
                       author_date<<PROP>>then<<NEXT>>\
                       author_email<<PROP>>c@e.com<<NEXT>>\
                       author_name<<PROP>>Carol<<NEXT>>\
                       commit_hash<<PROP>>ccc<<NEXT>>\
                       parent_hashes<<PROP>>p1<<END>>";
        let entry = parse_record(segment).unwrap();
        assert_eq!(entry.header.hash, "ccc");
        assert_eq!(entry.header.author_name, "Carol");
        assert_eq!(entry.header.author_timestamp, 42);
        assert_eq!(entry.header.parent_hashes, vec!["p1".to_string()]);
        assert_eq!(entry.header.message, "Add parser");
    }

    #[test]
    fn test_binary_numstat_coerces_to_zero() {
        let raw = record("aaa", "", "Alice", "1", "img", "-\t-\tassets/logo.png\n5\tx\tsrc/a.c");
        let entries: Vec<_> = parse_log(raw.as_bytes()).collect();
        assert_eq!(
            entries[0].files,
            vec![
                FileChangeSummary::new("assets/logo.png", 0, 0),
                FileChangeSummary::new("src/a.c", 0, 0),
            ]
        );
        assert_eq!(parse_line_counts("7", "2"), (7, 2));
    }

    #[test]
    fn test_escaped_transport_is_decoded() {
        let escaped = record("aaa", "", "Alice", "1700000000", "msg", "4\t1\tsrc/a.c")
            .replace('\n', "\\n")
            .replace('\t', "\\t");
        assert!(!escaped.contains('\n'));

        let entries: Vec<_> = parse_log(escaped.as_bytes()).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].files, vec![FileChangeSummary::new("src/a.c", 4, 1)]);
    }

    #[test]
    fn test_single_unescaped_record_keeps_literal_escapes() {
        let message = r"Escape \n and \x41 in printf";
        let raw = record("aaa", "p1 p2", "Alice", "1700000000", message, "");
        let raw = raw.trim_end();
        assert!(!raw.contains('\n'));

        let entries: Vec<_> = parse_log(raw.as_bytes()).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].header.message, message);
    }

    #[test]
    fn test_escaped_utf8_bytes_decode_together() {
        let escaped = record("aaa", "", r"Jos\xc3\xa9", "1700000000", r"caf\xc3\xa9 \x41", "1\t0\tsrc/a.c")
            .replace('\n', "\\n")
            .replace('\t', "\\t");

        let entries: Vec<_> = parse_log(escaped.as_bytes()).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].header.author_name, "José");
        assert_eq!(entries[0].header.message, "café A");
        assert_eq!(entries[0].files, vec![FileChangeSummary::new("src/a.c", 1, 0)]);
    }

    #[test]
    fn test_control_characters_stripped_from_header() {
        let raw = record("aaa", "", "Al\u{1b}ice", "1700000000", "line one\nline two\u{7}", "");
        let entries: Vec<_> = parse_log(raw.as_bytes()).collect();
        assert_eq!(entries[0].header.author_name, "Alice");
        assert_eq!(entries[0].header.message, "line one\nline two");
    }

    #[test]
    fn test_file_name_quotes_removed() {
        let raw = record("aaa", "", "Alice", "1", "m", "1\t0\t\"src/my file.c\"");
        let entries: Vec<_> = parse_log(raw.as_bytes()).collect();
        assert_eq!(entries[0].files[0].file_name, "src/my file.c");
    }

    #[test]
    fn test_pretty_format_uses_markers() {
        for marker in [RECORD_START, KEY_VALUE_SEPARATOR, PROPERTY_SEPARATOR, RECORD_STOP] {
            assert!(LOG_PRETTY_FORMAT.contains(marker));
        }
        assert_eq!(LOG_PRETTY_FORMAT.matches(KEY_VALUE_SEPARATOR).count(), HEADER_FIELD_COUNT);
        assert_eq!(log_command_args()[3], "--reverse");
    }
}
