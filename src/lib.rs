pub mod error;
pub mod config;
pub mod history;
pub mod classify;
pub mod metrics;
pub mod scan;
pub mod diff;
pub mod tagging;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

use wasm_bindgen::prelude::*;

use classify::{ClassificationRule, RegexClassifier};
use config::MiningConfig;
use diff::{BuggyLineIndex, CommitContext};
use scan::{CommitRecord, RepositoryScan};

// ---------------------------------------------------------------------------
// Handle storage for repository scans that span several WASM calls.
// ---------------------------------------------------------------------------

/// Global storage for in-progress scans, keyed by opaque u32 handles.
fn scan_store() -> &'static Mutex<ScanStore> {
    static STORE: OnceLock<Mutex<ScanStore>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(ScanStore::new()))
}

struct ScanStore {
    scans: HashMap<u32, RepositoryScan<RegexClassifier>>,
    next_handle: u32,
}

impl ScanStore {
    fn new() -> Self {
        ScanStore {
            scans: HashMap::new(),
            next_handle: 1,
        }
    }

    fn insert(&mut self, scan: RepositoryScan<RegexClassifier>) -> u32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        if self.next_handle == 0 {
            self.next_handle = 1; // 0 is never a valid handle
        }
        self.scans.insert(handle, scan);
        handle
    }

    fn get_mut(&mut self, handle: u32) -> Option<&mut RepositoryScan<RegexClassifier>> {
        self.scans.get_mut(&handle)
    }

    fn remove(&mut self, handle: u32) -> bool {
        self.scans.remove(&handle).is_some()
    }
}

// ---------------------------------------------------------------------------
// JSON result wrappers
// ---------------------------------------------------------------------------

#[derive(serde::Serialize)]
struct HandleResult {
    handle: u32,
}

#[derive(serde::Serialize)]
struct IngestResult {
    handle: u32,
    processed: usize,
    commits: Vec<CommitRecord>,
}

#[derive(serde::Serialize)]
struct ErrorResult {
    error: String,
}

fn json_error(msg: &str) -> String {
    serde_json::to_string(&ErrorResult {
        error: msg.to_string(),
    })
    .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", msg))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| json_error(&format!("Serialization error: {}", e)))
}

/// Deserialize `text`, treating blank input as the type's default.
fn from_json_or_default<T>(text: &str) -> Result<T, serde_json::Error>
where
    T: serde::de::DeserializeOwned + Default,
{
    if text.trim().is_empty() {
        Ok(T::default())
    } else {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// WASM-exported functions
// ---------------------------------------------------------------------------

/// The `git` arguments that produce the log format `ingest_log` reads.
///
/// Returns: JSON array of strings.
#[wasm_bindgen]
pub fn log_command() -> String {
    to_json(&history::log_command_args())
}

/// Start a repository scan.
///
/// `rules_json` is a JSON array of `{label, pattern}` classification rules,
/// or empty for none. Returns: JSON `{ handle }`.
///
/// The handle is fed with `ingest_log` and must be freed with `free_scan`.
#[wasm_bindgen]
pub fn create_scan(rules_json: &str) -> String {
    let rules: Vec<ClassificationRule> = match from_json_or_default(rules_json) {
        Ok(r) => r,
        Err(e) => return json_error(&format!("Invalid rules: {}", e)),
    };
    let classifier = match RegexClassifier::new(&rules) {
        Ok(c) => c,
        Err(e) => return json_error(&e.to_string()),
    };

    let mut store = match scan_store().lock() {
        Ok(s) => s,
        Err(_) => return json_error("Failed to acquire scan store lock"),
    };
    let handle = store.insert(RepositoryScan::new(classifier));

    to_json(&HandleResult { handle })
}

/// Feed a raw log blob to a scan.
///
/// Blobs must arrive oldest first, since metrics depend on all earlier
/// commits of the repository.
/// Returns: JSON `{ handle, processed, commits }`.
#[wasm_bindgen]
pub fn ingest_log(handle: u32, raw_log: &[u8]) -> String {
    let mut store = match scan_store().lock() {
        Ok(s) => s,
        Err(_) => return json_error("Failed to acquire scan store lock"),
    };
    let scan = match store.get_mut(handle) {
        Some(s) => s,
        None => return json_error(&format!("Invalid handle: {}", handle)),
    };

    let commits = scan.ingest(raw_log);
    to_json(&IngestResult {
        handle,
        processed: scan.processed(),
        commits,
    })
}

/// Free a scan handle and its running state.
///
/// After calling this, the handle is invalid and must not be used.
#[wasm_bindgen]
pub fn free_scan(handle: u32) {
    if let Ok(mut store) = scan_store().lock() {
        store.remove(handle);
    }
}

/// Attribute the added and deleted statements of one commit's diff.
///
/// `context_json` is a `CommitContext` object, `annotation` a buggy-line
/// annotation (`FILE_START:...` or `NULL`), and `config_json` a
/// `MiningConfig` object or empty for defaults. `extensions_file` is not
/// read here; pass `source_extensions` instead.
/// Returns: JSON `{ added, deleted }`.
#[wasm_bindgen]
pub fn attribute_diff(diff: &str, context_json: &str, annotation: &str, config_json: &str) -> String {
    let context: CommitContext = match serde_json::from_str(context_json) {
        Ok(c) => c,
        Err(e) => return json_error(&format!("Invalid commit context: {}", e)),
    };
    let config: MiningConfig = match from_json_or_default(config_json) {
        Ok(c) => c,
        Err(e) => return json_error(&format!("Invalid config: {}", e)),
    };
    let buggy_lines = BuggyLineIndex::parse(annotation);

    to_json(&diff::attribute_lines(diff, &context, &buggy_lines, &config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
