use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::{ClassificationRule, RegexClassifier};
use crate::error::MiningError;

/// Diffs longer than this many lines are not attributed.
pub const DEFAULT_MAX_DIFF_LINES: usize = 10_000;

/// Changed lines shorter than this (after trimming) carry too little
/// information to attribute.
pub const DEFAULT_MIN_LINE_CHARS: usize = 10;

const BUILTIN_SOURCE_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx", "cs", "java", "scala", "kt", "kts",
    "groovy", "go", "rs", "py", "rb", "php", "js", "jsx", "ts", "tsx", "m", "mm", "swift",
    "pl", "pm", "lua", "erl", "ex", "exs", "hs", "clj",
];

/// Case-insensitive set of file extensions that count as source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExtensionAllowList {
    extensions: HashSet<String>,
}

impl ExtensionAllowList {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        ExtensionAllowList { extensions }
    }

    /// Parse the one-extension-per-line format. Blank lines and `#` comments
    /// are ignored.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn from_file(path: &Path) -> Result<Self, MiningError> {
        let text = std::fs::read_to_string(path).map_err(|e| MiningError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_lowercase())
    }

    /// Whether the file's extension (text after the last `.` of its name)
    /// is allowed. Files without an extension are never allowed.
    pub fn allows_path(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => self.contains(ext),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionAllowList {
    fn default() -> Self {
        Self::new(BUILTIN_SOURCE_EXTENSIONS)
    }
}

impl From<Vec<String>> for ExtensionAllowList {
    fn from(extensions: Vec<String>) -> Self {
        Self::new(extensions)
    }
}

impl From<ExtensionAllowList> for Vec<String> {
    fn from(list: ExtensionAllowList) -> Self {
        let mut extensions: Vec<String> = list.extensions.into_iter().collect();
        extensions.sort();
        extensions
    }
}

/// Tunables for a mining run. Every field has a default, so an empty TOML
/// document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    pub max_diff_lines: usize,
    pub min_line_chars: usize,
    pub source_extensions: ExtensionAllowList,
    /// One-per-line allow-list file; replaces `source_extensions` on load.
    pub extensions_file: Option<PathBuf>,
    pub classification_rules: Vec<ClassificationRule>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            max_diff_lines: DEFAULT_MAX_DIFF_LINES,
            min_line_chars: DEFAULT_MIN_LINE_CHARS,
            source_extensions: ExtensionAllowList::default(),
            extensions_file: None,
            classification_rules: Vec::new(),
        }
    }
}

impl MiningConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, MiningError> {
        let mut config: MiningConfig = toml::from_str(text)?;
        config.resolve_extensions_file()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, MiningError> {
        let text = std::fs::read_to_string(path).map_err(|e| MiningError::io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!(
            "loaded config from {:?} ({} source extensions)",
            path,
            config.source_extensions.len()
        );
        Ok(config)
    }

    /// Replace `source_extensions` with the contents of `extensions_file`,
    /// if one is configured.
    pub fn resolve_extensions_file(&mut self) -> Result<(), MiningError> {
        if let Some(path) = &self.extensions_file {
            self.source_extensions = ExtensionAllowList::from_file(path)?;
        }
        Ok(())
    }

    pub fn classifier(&self) -> Result<RegexClassifier, MiningError> {
        RegexClassifier::new(&self.classification_rules)
    }
}
