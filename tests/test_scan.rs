use defect_miner::classify::{Classification, ClassificationRule};
use defect_miner::config::MiningConfig;
use defect_miner::diff::{attribute_commits, Attribution, AttributionJob, BuggyLineIndex};
use defect_miner::history::parse_log;
use defect_miner::scan::RepositoryScan;
use defect_miner::tagging::tag_files;

const DAY: i64 = 86_400;

fn record(hash: &str, parents: &str, author: &str, ts: i64, msg: &str, stats: &str) -> String {
    format!(
        "<<COMMIT>>parent_hashes<<PROP>>{parents}<<NEXT>>\
         commit_hash<<PROP>>{hash}<<NEXT>>\
         author_name<<PROP>>{author}<<NEXT>>\
         author_email<<PROP>>{author}@example.com<<NEXT>>\
         author_date<<PROP>>unused<<NEXT>>\
         author_date_unix_timestamp<<PROP>>{ts}<<NEXT>>\
         commit_message<<PROP>>{msg}<<END>>\n{stats}\n"
    )
}

fn history() -> String {
    [
        record("c1", "", "Alice", 0, "Add parser", "20\t0\tsrc/Parser.java\n5\t0\tREADME.md"),
        record("c2", "c1", "Bob", 2 * DAY, "Fix off-by-one in parser", "2\t2\tsrc/Parser.java"),
        record("broken", "c2", "Bob", 3 * DAY, "no stop marker", ""),
        record("c3", "c1 c2", "Alice", 4 * DAY, "Merge branch 'fix'", ""),
        record("c4", "c3", "Carol", 6 * DAY, "Add lexer", "-\t-\tdocs/logo.png\n40\t0\tsrc/Lexer.java"),
    ]
    .concat()
    .replacen("no stop marker<<END>>", "no stop marker", 1)
}

fn config() -> MiningConfig {
    MiningConfig::from_toml_str(
        r#"
[[classification_rules]]
label = "Corrective"
pattern = "\\bfix"

[[classification_rules]]
label = "Feature Addition"
pattern = "\\badd"
"#,
    )
    .unwrap()
}

#[test]
fn test_tokenizer_skips_broken_record() {
    let raw = history();
    let mut tokenizer = parse_log(raw.as_bytes());
    let hashes: Vec<String> = tokenizer.by_ref().map(|e| e.header.hash).collect();
    assert_eq!(hashes, vec!["c1", "c2", "c3", "c4"]);
    assert_eq!(tokenizer.skipped(), 1);
}

#[test]
fn test_end_to_end_scan() {
    let config = config();
    let mut scan = RepositoryScan::new(config.classifier().unwrap());
    let records = scan.ingest(history().as_bytes());
    assert_eq!(records.len(), 4);

    let c1 = &records[0];
    assert_eq!(c1.classification, Classification::FeatureAddition);
    let m1 = c1.metrics.as_ref().unwrap();
    assert_eq!((m1.la, m1.nf, m1.ns, m1.nd), (25, 2, 2, 2));
    assert_eq!(m1.lt, 0.0);

    let c2 = &records[1];
    assert!(c2.fix);
    let m2 = c2.metrics.as_ref().unwrap();
    assert_eq!(m2.lt, 20.0);
    assert_eq!(m2.age, 2.0);
    assert_eq!(m2.ndev, 1);
    assert_eq!(m2.nuc, 1);

    let merge = &records[2];
    assert!(merge.is_merge);
    assert_eq!(merge.classification, Classification::Merge);
    assert!(merge.metrics.is_none());

    // binary numstat counts as zero lines
    let m4 = records[3].metrics.as_ref().unwrap();
    assert_eq!((m4.la, m4.ld, m4.nf), (40, 0, 2));
    assert_eq!(m4.entropy, 0.0);

    let flat = records[3].to_flat_map();
    assert_eq!(flat["files_seen"], "docs/logo.png,src/Lexer.java");
}

#[test]
fn test_attribution_from_scan_records() {
    let config = config();
    let mut scan = RepositoryScan::new(config.classifier().unwrap());
    let records = scan.ingest(history().as_bytes());

    let fix_diff = "\
diff --git a/src/Parser.java b/src/Parser.java
index 1111111..2222222 100644
--- a/src/Parser.java
+++ b/src/Parser.java
@@ -7,4 +7,4 @@ public class Parser {
     int parse(String input) {
-        for (int i = 0; i <= input.length(); i++) {
-            consume(input.charAt(i));
+        for (int i = 0; i < input.length(); i++) {
+            consume(input.charAt(i));
         }
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1 +1 @@
-Parser for the thing;
+Parser for the thing, fixed;
";

    let jobs = vec![AttributionJob {
        diff_text: fix_diff.to_string(),
        commit: records[1].context(false),
        buggy_lines: BuggyLineIndex::parse("FILE_START:src/Parser.java,8"),
    }];
    let results = attribute_commits(&jobs, &config);
    let result = &results[0];

    let added: Vec<(u32, Attribution)> = result.added.iter().map(|r| (r.line_number, r.attribution)).collect();
    assert_eq!(
        added,
        vec![
            (8, Attribution::Added { bug_introducing: true }),
            (9, Attribution::Added { bug_introducing: false }),
        ]
    );
    assert_eq!(result.deleted.len(), 2);
    assert!(result.deleted.iter().all(|r| r.attribution == Attribution::Deleted { fix: true }));
    assert!(result.deleted.iter().all(|r| r.file_new == "src/Parser.java"));
    assert_eq!(result.added[0].author, "Bob");
    assert_eq!(result.added[0].content, "for (int i = 0; i < input.length(); i++) {");
}

#[test]
fn test_window_tagging() {
    let config = config();
    let mut scan = RepositoryScan::new(config.classifier().unwrap());
    let records = scan.ingest(history().as_bytes());

    let tracked = ["src/Parser.java", "src/Lexer.java", "src/Util.java", "README.md"];
    let tags = tag_files(&records, tracked, &config.source_extensions);

    assert_eq!(tags.len(), 3);
    assert_eq!(
        tags["src/Parser.java"],
        vec![Classification::FeatureAddition, Classification::Corrective]
    );
    assert_eq!(tags["src/Lexer.java"], vec![Classification::FeatureAddition]);
    assert!(tags["src/Util.java"].is_empty());
}

#[test]
fn test_rules_round_trip_through_config() {
    let rules = config().classification_rules;
    assert_eq!(
        rules[0],
        ClassificationRule {
            label: Classification::Corrective,
            pattern: "\\bfix".to_string(),
        }
    );
}
