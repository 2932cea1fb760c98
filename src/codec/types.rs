//! Position descriptor types
//!
//! A descriptor is a sequence of element steps from a fixed container down
//! to a text node, plus a character offset within that node's content.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::parser::DescriptorParseError;

/// One element step: tag name plus 1-based ordinal among same-tag siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    pub index: u32,
}

impl PathStep {
    pub fn new(tag: impl Into<String>, index: u32) -> Self {
        Self {
            tag: tag.into(),
            index,
        }
    }
}

/// Structural path plus character offset
///
/// Serializes as its textual form (`/div[1]/p[3]::42`), which is also the
/// persisted representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionDescriptor {
    pub steps: Vec<PathStep>,
    pub offset: u32,
}

impl PositionDescriptor {
    pub fn new(steps: Vec<PathStep>, offset: u32) -> Self {
        Self { steps, offset }
    }

    /// Number of differing step positions between two paths, counting
    /// length difference. Used to rank reanchor candidates: fewer edits
    /// means structurally closer to the original position.
    pub fn step_distance(&self, other: &PositionDescriptor) -> u32 {
        let common = self.steps.len().min(other.steps.len());
        let mut edits = (self.steps.len().max(other.steps.len()) - common) as u32;
        for i in 0..common {
            if self.steps[i] != other.steps[i] {
                edits += 1;
            }
        }
        edits
    }
}

impl fmt::Display for PositionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{}[{}]", step.tag, step.index)?;
        }
        write!(f, "::{}", self.offset)
    }
}

impl FromStr for PositionDescriptor {
    type Err = DescriptorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parser::parse(s)
    }
}

impl TryFrom<String> for PositionDescriptor {
    type Error = DescriptorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PositionDescriptor> for String {
    fn from(descriptor: PositionDescriptor) -> Self {
        descriptor.to_string()
    }
}

// Total order approximating reading order: step-by-step ordinal comparison,
// then path length, then character offset. Exact document order is only
// guaranteed for paths that share their tag sequence.
impl Ord for PositionDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.steps.iter().zip(other.steps.iter()) {
            let step_cmp = a.index.cmp(&b.index).then_with(|| a.tag.cmp(&b.tag));
            if step_cmp != Ordering::Equal {
                return step_cmp;
            }
        }
        self.steps
            .len()
            .cmp(&other.steps.len())
            .then_with(|| self.offset.cmp(&other.offset))
    }
}

impl PartialOrd for PositionDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Canonical tag form: lowercase, namespace prefix stripped, and the
/// configured synthetic wrapper prefix stripped when present.
pub fn normalize_tag(raw: &str, tag_prefix: Option<&str>) -> String {
    let stripped = match raw.rsplit_once(':') {
        Some((_, local)) => local,
        None => raw,
    };
    let lower = stripped.to_ascii_lowercase();
    match tag_prefix {
        Some(prefix) => lower
            .strip_prefix(&prefix.to_ascii_lowercase())
            .map(|rest| rest.to_string())
            .unwrap_or(lower),
        None => lower,
    }
}
