use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{classify_commit, Classification, CommitClassifier};
use crate::diff::CommitContext;
use crate::history::{parse_log, CommitHeader, LogEntry};
use crate::metrics::{CommitMetrics, MetricsAccumulator};

/// A classified commit with its process metrics. Metrics are absent when
/// the commit touched no files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(flatten)]
    pub header: CommitHeader,
    pub is_merge: bool,
    pub classification: Classification,
    pub fix: bool,
    #[serde(flatten)]
    pub metrics: Option<CommitMetrics>,
}

impl CommitRecord {
    /// Flat key/value form for tabular and relational sinks. List values are
    /// joined with `,`.
    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            map.insert(key.to_string(), value);
        };

        put("commit_hash", self.header.hash.clone());
        put("parent_hashes", self.header.parent_hashes.join(","));
        put("author_name", self.header.author_name.clone());
        put("author_email", self.header.author_email.clone());
        put("author_date", self.header.author_date.clone());
        put(
            "author_date_unix_timestamp",
            self.header.author_timestamp.to_string(),
        );
        put("commit_message", self.header.message.clone());
        put("is_merge", self.is_merge.to_string());
        put("classification", self.classification.to_string());
        put("fix", self.fix.to_string());

        if let Some(m) = &self.metrics {
            put("la", m.la.to_string());
            put("ld", m.ld.to_string());
            put("nf", m.nf.to_string());
            put("ns", m.ns.to_string());
            put("nd", m.nd.to_string());
            put("entropy", m.entropy.to_string());
            put("lt", m.lt.to_string());
            put("ndev", m.ndev.to_string());
            put("age", m.age.to_string());
            put("exp", m.exp.to_string());
            put("rexp", m.rexp.to_string());
            put("sexp", m.sexp.to_string());
            put("nuc", m.nuc.to_string());
            put("files_seen", m.files_seen.join(","));
        }
        map
    }

    /// The attribution context for this commit's diff. `contains_bug` comes
    /// from ground truth the scan does not have.
    pub fn context(&self, contains_bug: bool) -> CommitContext {
        CommitContext {
            hash: self.header.hash.clone(),
            author: self.header.author_name.clone(),
            timestamp: self.header.author_timestamp,
            fix: self.fix,
            contains_bug,
        }
    }
}

/// Sequential fold over one repository's history: tokenizer, classifier,
/// then the metrics engine.
///
/// A scan owns the running metrics state, so it must see every commit of
/// the repository once, oldest first. Use one scan per repository.
pub struct RepositoryScan<C> {
    classifier: C,
    metrics: MetricsAccumulator,
    processed: usize,
}

impl<C: CommitClassifier> RepositoryScan<C> {
    pub fn new(classifier: C) -> Self {
        RepositoryScan {
            classifier,
            metrics: MetricsAccumulator::new(),
            processed: 0,
        }
    }

    pub fn process(&mut self, entry: &LogEntry) -> CommitRecord {
        let classification = classify_commit(&entry.header, &self.classifier);
        let metrics = self.metrics.accumulate(entry);
        if metrics.is_none() {
            log::debug!("commit {} touched no files", entry.header.hash);
        }
        self.processed += 1;

        CommitRecord {
            header: entry.header.clone(),
            is_merge: entry.header.is_merge(),
            classification,
            fix: classification.is_fix(),
            metrics,
        }
    }

    /// Tokenize one raw log blob and process every well-formed record in
    /// order. Ill-formed records are skipped.
    pub fn ingest(&mut self, raw_log: &[u8]) -> Vec<CommitRecord> {
        log::info!("ingesting {} bytes of log", raw_log.len());

        let mut tokenizer = parse_log(raw_log);
        let records: Vec<CommitRecord> = tokenizer.by_ref().map(|e| self.process(&e)).collect();

        log::info!(
            "ingested {} commits ({} skipped, {} total in scan)",
            records.len(),
            tokenizer.skipped(),
            self.processed
        );
        records
    }

    /// Commits processed so far across all ingested blobs.
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }
}
