//! Binary grader verdicts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A yes/no verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryScore {
    Yes,
    No,
}

impl BinaryScore {
    pub fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl From<bool> for BinaryScore {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

impl fmt::Display for BinaryScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the exact literals are accepted; anything else is a contract violation.
impl FromStr for BinaryScore {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(DomainError::invalid_grade(format!("{:?}", other))),
        }
    }
}

/// Uniform output of the relevance, groundedness and adequacy graders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    pub binary_score: BinaryScore,
}

impl GradeResult {
    pub fn yes() -> Self {
        Self {
            binary_score: BinaryScore::Yes,
        }
    }

    pub fn no() -> Self {
        Self {
            binary_score: BinaryScore::No,
        }
    }

    pub fn is_yes(&self) -> bool {
        self.binary_score.is_yes()
    }

    /// Parse raw grader output of the form `{"binary_score": "yes"}`
    ///
    /// The JSON object may be surrounded by prose or a markdown fence. A missing
    /// field, a non-string value or any literal other than `yes`/`no` is rejected.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let json_str = extract_json(raw).ok_or_else(|| DomainError::invalid_grade(preview(raw)))?;

        let value: serde_json::Value = serde_json::from_str(json_str)
            .map_err(|_| DomainError::invalid_grade(preview(raw)))?;

        match value.get("binary_score") {
            Some(serde_json::Value::String(score)) => Ok(Self {
                binary_score: score.parse()?,
            }),
            Some(other) => Err(DomainError::invalid_grade(other.to_string())),
            None => Err(DomainError::invalid_grade("missing binary_score")),
        }
    }
}

impl From<BinaryScore> for GradeResult {
    fn from(binary_score: BinaryScore) -> Self {
        Self { binary_score }
    }
}

/// Extract JSON object from a string (handles markdown code blocks)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    (start < end).then(|| &text[start..=end])
}

fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    let cut: String = trimmed.chars().take(80).collect();

    if cut.len() < trimmed.len() {
        format!("{:?}…", cut)
    } else {
        format!("{:?}", cut)
    }
}
