//! Annotation data model
//!
//! Targets, selectors, and provenance metadata. Loosely follows the W3C
//! Web Annotation Data Model so persisted annotations stay interoperable.
//!
//! Reference: <https://www.w3.org/TR/annotation-model/>

mod types;

pub use types::{
    AnnotationBody, AnnotationId, AnnotationStyle, AnnotationTarget, BodyType, RangeSelector,
    TextAnnotation, User,
};
