//! Annotation types

use std::cell::Cell;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::PositionDescriptor;
use crate::dom::TextRange;

/// Annotation identifier, generated client-side at creation
pub type AnnotationId = Uuid;

/// Annotation author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One contiguous annotated span
///
/// `quote` is the literal text captured at encode time. It always equals
/// the text spanned by (`start`, `end`) at the moment the selector was
/// produced and is the ground truth used to detect and repair structural
/// drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSelector {
    pub start: PositionDescriptor,
    pub end: PositionDescriptor,
    pub quote: String,
    /// Ephemeral live-range cache, recomputed on demand. Never persisted,
    /// never compared.
    #[serde(skip)]
    range: Cell<Option<TextRange>>,
}

impl RangeSelector {
    pub fn new(start: PositionDescriptor, end: PositionDescriptor, quote: impl Into<String>) -> Self {
        Self {
            start,
            end,
            quote: quote.into(),
            range: Cell::new(None),
        }
    }

    /// Last resolved live range, if one has been cached
    pub fn cached_range(&self) -> Option<TextRange> {
        self.range.get()
    }

    pub fn set_cached_range(&self, range: Option<TextRange>) {
        self.range.set(range);
    }
}

// The range cache is excluded from equality on purpose.
impl PartialEq for RangeSelector {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.quote == other.quote
    }
}

impl Eq for RangeSelector {}

/// What one logical annotation is anchored to
///
/// `selectors` is a sequence, not a set: order defines reading order for
/// multi-part spans. A target under construction may carry zero selectors;
/// it is only persisted once it has content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationTarget {
    pub id: AnnotationId,
    pub selectors: Vec<RangeSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<User>,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl AnnotationTarget {
    /// Fresh in-memory target with no selectors yet
    pub fn new(creator: Option<User>) -> Self {
        Self {
            id: Uuid::new_v4(),
            selectors: Vec::new(),
            creator,
            created: Utc::now(),
            updated: None,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.selectors.is_empty()
    }

    /// Replace the selector sequence, stamping the update time
    pub fn set_selectors(&mut self, selectors: Vec<RangeSelector>) {
        self.selectors = selectors;
        self.updated = Some(Utc::now());
    }
}

/// A complete annotation as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub id: AnnotationId,
    pub target: AnnotationTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<AnnotationBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<AnnotationStyle>,
}

impl TextAnnotation {
    /// Wrap a target into an annotation record, sharing its id
    pub fn from_target(target: AnnotationTarget) -> Self {
        Self {
            id: target.id,
            target,
            body: None,
            style: None,
        }
    }

    pub fn with_body(mut self, body: AnnotationBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.style = Some(AnnotationStyle {
            color: color.to_string(),
            opacity: Some(0.3),
        });
        self
    }

    /// Concatenated quote across all selectors, in reading order
    pub fn quote(&self) -> String {
        self.target
            .selectors
            .iter()
            .map(|s| s.quote.as_str())
            .collect()
    }
}

/// Body/content of an annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBody {
    #[serde(rename = "type")]
    pub body_type: BodyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl AnnotationBody {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            body_type: BodyType::TextualBody,
            value: Some(value.into()),
            format: Some("text/plain".to_string()),
        }
    }
}

/// Types of annotation body content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BodyType {
    /// Plain text note
    TextualBody,
    /// No body (e.g. simple highlight)
    None,
}

/// Visual style consumed by the default painter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStyle {
    /// Highlight color (CSS color value)
    pub color: String,
    /// Opacity (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: "#ffff00".to_string(), // Yellow
            opacity: Some(0.3),
        }
    }
}
