use std::collections::BTreeMap;

use crate::classify::Classification;
use crate::config::ExtensionAllowList;
use crate::scan::CommitRecord;

/// Column header for file tag tables.
pub const TAG_COLUMNS: [&str; 2] = ["filename", "classification"];

/// Separator between classifications in a tag cell.
pub const TAG_SEPARATOR: &str = ";";

/// Source file to the distinct classifications of the window's commits that
/// touched it, in first-seen order.
pub type FileTags = BTreeMap<String, Vec<Classification>>;

/// Tag every allow-listed file with the classifications of the commits in
/// one release window.
///
/// Every allow-listed file in `tracked_files` appears in the result, with an
/// empty tag list when the window never touched it. Allow-listed files that
/// the window touched but `tracked_files` does not name are added too.
pub fn tag_files<'a, I>(
    window: &[CommitRecord],
    tracked_files: I,
    allow_list: &ExtensionAllowList,
) -> FileTags
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags: FileTags = tracked_files
        .into_iter()
        .map(str::trim)
        .filter(|file| allow_list.allows_path(file))
        .map(|file| (file.to_string(), Vec::new()))
        .collect();

    for record in window {
        let Some(metrics) = &record.metrics else {
            continue;
        };
        for file in &metrics.files_seen {
            if !allow_list.allows_path(file) {
                continue;
            }
            let classes = tags.entry(file.clone()).or_default();
            if !classes.contains(&record.classification) {
                classes.push(record.classification);
            }
        }
    }

    log::debug!(
        "tagged {} files from {} commits",
        tags.values().filter(|c| !c.is_empty()).count(),
        window.len()
    );
    tags
}

/// Rows matching [`TAG_COLUMNS`].
pub fn tag_rows(tags: &FileTags) -> Vec<[String; 2]> {
    tags.iter()
        .map(|(file, classes)| {
            let labels: Vec<&str> = classes.iter().map(Classification::label).collect();
            [file.clone(), labels.join(TAG_SEPARATOR)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::CommitHeader;
    use crate::metrics::CommitMetrics;

    fn record(hash: &str, classification: Classification, files: &[&str]) -> CommitRecord {
        let metrics = (!files.is_empty()).then(|| CommitMetrics {
            la: 1,
            ld: 0,
            nf: files.len(),
            ns: 1,
            nd: 1,
            entropy: 0.0,
            lt: 0.0,
            ndev: 1,
            age: 0.0,
            exp: 0.0,
            rexp: 0.0,
            sexp: 0,
            nuc: 0,
            files_seen: files.iter().map(|f| f.to_string()).collect(),
        });
        CommitRecord {
            header: CommitHeader {
                hash: hash.to_string(),
                parent_hashes: vec![],
                author_name: "Alice".to_string(),
                author_email: String::new(),
                author_date: String::new(),
                author_timestamp: 0,
                message: String::new(),
            },
            is_merge: false,
            classification,
            fix: classification.is_fix(),
            metrics,
        }
    }

    #[test]
    fn test_tags_follow_window() {
        let window = vec![
            record("c1", Classification::FeatureAddition, &["src/A.java", "docs/guide.md"]),
            record("c2", Classification::Corrective, &["src/A.java", "src/B.java"]),
            record("c3", Classification::FeatureAddition, &["src/A.java"]),
            record("c4", Classification::Merge, &[]),
        ];
        let tracked = ["src/A.java", "src/B.java", "src/C.java", "README.md"];
        let tags = tag_files(&window, tracked, &ExtensionAllowList::new(["java"]));

        assert_eq!(tags.len(), 3);
        assert_eq!(
            tags["src/A.java"],
            vec![Classification::FeatureAddition, Classification::Corrective]
        );
        assert_eq!(tags["src/B.java"], vec![Classification::Corrective]);
        assert!(tags["src/C.java"].is_empty());
        assert!(!tags.contains_key("docs/guide.md"));
    }

    #[test]
    fn test_untracked_touched_file_is_added() {
        let window = vec![record("c1", Classification::Perfective, &["src/New.java"])];
        let tags = tag_files(&window, [], &ExtensionAllowList::new(["java"]));
        assert_eq!(tags["src/New.java"], vec![Classification::Perfective]);
    }

    #[test]
    fn test_tag_rows() {
        let window = vec![
            record("c1", Classification::Corrective, &["A.java"]),
            record("c2", Classification::NonFunctional, &["A.java"]),
        ];
        let tags = tag_files(&window, ["B.java"], &ExtensionAllowList::new(["java"]));
        let rows = tag_rows(&tags);
        assert_eq!(
            rows,
            vec![
                ["A.java".to_string(), "Corrective;Non Functional".to_string()],
                ["B.java".to_string(), String::new()],
            ]
        );
    }
}
