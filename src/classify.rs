use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MiningError;
use crate::history::CommitHeader;

/// Purpose of a commit as reported by the message classifier. Serialized as
/// its label; deserialized leniently through [`Classification::from_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Classification {
    Corrective,
    FeatureAddition,
    NonFunctional,
    Perfective,
    Preventative,
    Merge,
    Unclassified,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Corrective => "Corrective",
            Classification::FeatureAddition => "Feature Addition",
            Classification::NonFunctional => "Non Functional",
            Classification::Perfective => "Perfective",
            Classification::Preventative => "Preventative",
            Classification::Merge => "Merge",
            Classification::Unclassified => "None",
        }
    }

    /// Parse a label, ignoring case and treating `_`/`-` like spaces.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace(['_', '-'], " ");
        let class = match normalized.as_str() {
            "corrective" => Classification::Corrective,
            "feature addition" => Classification::FeatureAddition,
            "non functional" => Classification::NonFunctional,
            "perfective" => Classification::Perfective,
            "preventative" => Classification::Preventative,
            "merge" => Classification::Merge,
            "none" => Classification::Unclassified,
            _ => return None,
        };
        Some(class)
    }

    /// Corrective commits are taken to fix a defect somewhere in the system.
    pub fn is_fix(&self) -> bool {
        *self == Classification::Corrective
    }
}

impl TryFrom<String> for Classification {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Classification::from_label(&label).ok_or_else(|| format!("unknown classification `{}`", label))
    }
}

impl From<Classification> for String {
    fn from(class: Classification) -> Self {
        class.label().to_string()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Oracle that labels a commit from its lowercased message.
pub trait CommitClassifier {
    fn classify(&self, lowercased_message: &str) -> Classification;
}

impl<F> CommitClassifier for F
where
    F: Fn(&str) -> Classification,
{
    fn classify(&self, lowercased_message: &str) -> Classification {
        self(lowercased_message)
    }
}

/// Classify a commit. Merges are labelled `Merge` without consulting the
/// classifier.
pub fn classify_commit<C: CommitClassifier + ?Sized>(
    header: &CommitHeader,
    classifier: &C,
) -> Classification {
    if header.is_merge() {
        return Classification::Merge;
    }
    classifier.classify(&header.message.to_lowercase())
}

/// A configured `label = pattern` rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub label: Classification,
    pub pattern: String,
}

/// Classifier driven by an ordered rule table; the first matching pattern
/// wins and no match yields `Unclassified`.
#[derive(Debug, Clone, Default)]
pub struct RegexClassifier {
    rules: Vec<(Classification, Regex)>,
}

impl RegexClassifier {
    pub fn new(rules: &[ClassificationRule]) -> Result<Self, MiningError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (rule.label, re))
                    .map_err(|source| MiningError::Pattern {
                        label: rule.label.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RegexClassifier { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl CommitClassifier for RegexClassifier {
    fn classify(&self, lowercased_message: &str) -> Classification {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(lowercased_message))
            .map(|(label, _)| *label)
            .unwrap_or(Classification::Unclassified)
    }
}
