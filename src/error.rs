use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a caller's request (loading configuration, decoding a
/// host payload). Nothing inside a repository scan produces one of these.
#[derive(Error, Debug)]
pub enum MiningError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Invalid classification pattern for {label}: {source}")]
    Pattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MiningError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single commit record was dropped from the log stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record has no stop marker")]
    MissingStopMarker,
    #[error("record has {found} property segments, expected at least {expected}")]
    TooFewProperties { found: usize, expected: usize },
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid unix timestamp `{0}`")]
    InvalidTimestamp(String),
}

/// Why a single hunk was dropped from a diff region.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HunkError {
    #[error("malformed hunk header `{0}`")]
    MalformedHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_messages() {
        let err = RecordError::TooFewProperties {
            found: 3,
            expected: 7,
        };
        assert_eq!(
            err.to_string(),
            "record has 3 property segments, expected at least 7"
        );
        assert_eq!(
            RecordError::MissingField("commit_hash").to_string(),
            "record is missing required field `commit_hash`"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = MiningError::io(
            "/tmp/exts.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/exts.txt"));
        assert!(msg.contains("gone"));
    }
}
