//! Descriptor parser
//!
//! Parses the textual descriptor form into a [`PositionDescriptor`].
//!
//! Grammar:
//! ```text
//! descriptor = step+ "::" number
//! step       = "/" tag ["[" number "]"]
//! tag        = one or more characters other than '/', '[', ':'
//! ```
//!
//! A step without an explicit `[n]` ordinal means the first same-tag
//! sibling.

use thiserror::Error;

use super::types::{PathStep, PositionDescriptor};

/// Descriptor parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorParseError {
    #[error("Empty descriptor string")]
    Empty,

    #[error("Expected '/' at position {0}")]
    ExpectedStep(usize),

    #[error("Expected tag name at position {0}")]
    ExpectedTag(usize),

    #[error("Expected number at position {0}")]
    ExpectedNumber(usize),

    #[error("Unclosed bracket at position {0}")]
    UnclosedBracket(usize),

    #[error("Missing '::' offset marker")]
    MissingOffsetMarker,

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// Parser state
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Parse a sequence of digits as u32
    fn parse_number(&mut self) -> Result<u32, DescriptorParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        if self.pos == start {
            return Err(DescriptorParseError::ExpectedNumber(start));
        }

        self.input[start..self.pos]
            .parse()
            .map_err(|_| DescriptorParseError::ExpectedNumber(start))
    }

    /// Parse a tag name (runs to the next '/', '[' or ':')
    fn parse_tag(&mut self) -> Result<String, DescriptorParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '/' || ch == '[' || ch == ':' {
                break;
            }
            self.advance();
        }

        if self.pos == start {
            return Err(DescriptorParseError::ExpectedTag(start));
        }

        Ok(self.input[start..self.pos].to_ascii_lowercase())
    }

    /// Parse a single step: "/" tag ["[" number "]"]
    fn parse_step(&mut self) -> Result<PathStep, DescriptorParseError> {
        if !self.skip_if('/') {
            return Err(DescriptorParseError::ExpectedStep(self.pos));
        }

        let tag = self.parse_tag()?;

        let index = if self.skip_if('[') {
            let bracket_start = self.pos;
            let index = self.parse_number()?;
            if !self.skip_if(']') {
                return Err(DescriptorParseError::UnclosedBracket(bracket_start));
            }
            index
        } else {
            1
        };

        Ok(PathStep { tag, index })
    }

    fn parse_descriptor(&mut self) -> Result<PositionDescriptor, DescriptorParseError> {
        let mut steps = Vec::new();

        while self.peek() == Some('/') {
            steps.push(self.parse_step()?);
        }

        if steps.is_empty() {
            return Err(DescriptorParseError::ExpectedStep(self.pos));
        }

        if !self.skip_str("::") {
            return Err(DescriptorParseError::MissingOffsetMarker);
        }

        let offset = self.parse_number()?;

        Ok(PositionDescriptor { steps, offset })
    }
}

/// Parse a descriptor string
pub fn parse(input: &str) -> Result<PositionDescriptor, DescriptorParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DescriptorParseError::Empty);
    }

    let mut parser = Parser::new(input);
    let descriptor = parser.parse_descriptor()?;

    // Ensure we consumed all input
    if !parser.at_end() {
        return Err(DescriptorParseError::UnexpectedChar(
            parser.peek().unwrap_or('\0'),
            parser.pos,
        ));
    }

    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PathStep;

    #[test]
    fn test_parse_simple() {
        let descriptor = parse("/div[1]/p[3]::42").unwrap();
        assert_eq!(descriptor.steps.len(), 2);
        assert_eq!(descriptor.steps[0], PathStep::new("div", 1));
        assert_eq!(descriptor.steps[1], PathStep::new("p", 3));
        assert_eq!(descriptor.offset, 42);
    }

    #[test]
    fn test_parse_missing_index_defaults_to_first() {
        let descriptor = parse("/body/p[2]::0").unwrap();
        assert_eq!(descriptor.steps[0], PathStep::new("body", 1));
        assert_eq!(descriptor.steps[1], PathStep::new("p", 2));
    }

    #[test]
    fn test_parse_lowercases_tags() {
        let descriptor = parse("/DIV[1]/P[1]::5").unwrap();
        assert_eq!(descriptor.steps[0].tag, "div");
        assert_eq!(descriptor.steps[1].tag, "p");
    }

    #[test]
    fn test_round_trip() {
        let original = "/body[1]/div[2]/p[7]::113";
        assert_eq!(parse(original).unwrap().to_string(), original);
    }

    #[test]
    fn test_error_empty() {
        assert!(matches!(parse(""), Err(DescriptorParseError::Empty)));
        assert!(matches!(parse("   "), Err(DescriptorParseError::Empty)));
    }

    #[test]
    fn test_error_missing_marker() {
        assert!(matches!(
            parse("/div[1]/p[3]"),
            Err(DescriptorParseError::MissingOffsetMarker)
        ));
    }

    #[test]
    fn test_error_no_steps() {
        assert!(matches!(
            parse("::42"),
            Err(DescriptorParseError::ExpectedStep(0))
        ));
    }

    #[test]
    fn test_error_unclosed_bracket() {
        assert!(matches!(
            parse("/div[1/p[2]::3"),
            Err(DescriptorParseError::UnclosedBracket(_))
        ));
    }

    #[test]
    fn test_error_trailing_garbage() {
        assert!(matches!(
            parse("/div[1]::42 extra"),
            Err(DescriptorParseError::UnexpectedChar(_, _))
        ));
    }
}
