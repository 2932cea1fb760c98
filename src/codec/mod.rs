//! Position codec
//!
//! Encodes a live (text-node, character-offset) boundary point to a
//! structure-independent [`PositionDescriptor`] and back. Descriptors are
//! container-relative paths, so the same descriptor stays valid wherever
//! the container is mounted.
//!
//! # Textual form
//!
//! ```text
//! /div[1]/p[3]::42
//! │       │    └── character offset (UTF-16 code units)
//! │       └─────── 3rd <p> among <p> siblings
//! └─────────────── 1st <div> under the container
//! ```
//!
//! Tag names are lowercased and namespace prefixes are stripped before
//! encoding, so the descriptor is structure-only and vocabulary-agnostic.
//! A fixed per-step tag prefix (e.g. a rendering layer that wraps every
//! `seg` in a synthetic `x-seg`) is configured once and applied
//! symmetrically by encode and decode.

mod parser;
mod position;
mod types;

pub use parser::{parse, DescriptorParseError};
pub use position::{decode_position, encode_position, DecodeFailure};
pub(crate) use position::resolve_element;
pub use types::{normalize_tag, PathStep, PositionDescriptor};
