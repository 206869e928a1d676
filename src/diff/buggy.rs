use std::collections::{HashMap, HashSet};

/// Marks the start of one file's entry in a buggy-line annotation.
pub const FILE_MARKER: &str = "FILE_START:";

/// Annotation value for a commit with no known buggy lines.
pub const NO_ANNOTATION: &str = "NULL";

/// File name to new-side line numbers known to be defective.
///
/// Built from annotations of the form
/// `FILE_START:src/A.java,12,40FILE_START:src/B.java,7`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuggyLineIndex {
    files: HashMap<String, HashSet<u32>>,
}

impl BuggyLineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an annotation. `NULL` or an empty string yields an empty index;
    /// line numbers that do not parse are skipped.
    pub fn parse(annotation: &str) -> Self {
        let mut index = Self::new();
        let annotation = annotation.trim();
        if annotation.is_empty() || annotation == NO_ANNOTATION {
            return index;
        }

        for entry in annotation.split(FILE_MARKER).skip(1) {
            let mut fields = entry.split(',');
            let file = match fields.next().map(str::trim) {
                Some(file) if !file.is_empty() => file,
                _ => continue,
            };
            let lines = index.files.entry(file.to_string()).or_default();
            for field in fields.map(str::trim).filter(|f| !f.is_empty()) {
                match field.parse::<u32>() {
                    Ok(line) => {
                        lines.insert(line);
                    }
                    Err(_) => log::debug!("ignoring line number {:?} for {}", field, file),
                }
            }
        }
        index
    }

    pub fn insert(&mut self, file: impl Into<String>, line: u32) {
        self.files.entry(file.into()).or_default().insert(line);
    }

    pub fn contains(&self, file: &str, line: u32) -> bool {
        self.files
            .get(file)
            .map(|lines| lines.contains(&line))
            .unwrap_or(false)
    }

    pub fn lines(&self, file: &str) -> Option<&HashSet<u32>> {
        self.files.get(file)
    }

    /// Number of annotated files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for BuggyLineIndex {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (file, line) in iter {
            index.insert(file, line);
        }
        index
    }
}
