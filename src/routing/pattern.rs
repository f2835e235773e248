//! Route template compilation.
//!
//! # Responsibilities
//! - Normalize the template (leading `/`)
//! - Split it into `/`-delimited segments
//! - Classify each segment by its first character
//!
//! # Design Decisions
//! - No validation: `:` with an empty name or a `*` in the middle are accepted
//! - Empty segments are kept (`/a//b` has an empty segment between `a` and `b`)
//! - Segment count is fixed here; only a trailing wildcard relaxes it at match time

use std::fmt;

/// A single compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Empty segment (produced by a leading or doubled `/`).
    Empty,
    /// Segment starting with `*`.
    Wildcard(String),
    /// Segment starting with `:`.
    Capture(String),
    /// Any other segment, compared verbatim.
    Literal(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.as_bytes().first() {
            None => Segment::Empty,
            Some(b'*') => Segment::Wildcard(raw.to_string()),
            Some(b':') => Segment::Capture(raw.to_string()),
            Some(_) => Segment::Literal(raw.to_string()),
        }
    }

    /// Returns the segment as written in the template.
    pub fn as_raw(&self) -> &str {
        match self {
            Segment::Empty => "",
            Segment::Wildcard(raw) | Segment::Capture(raw) | Segment::Literal(raw) => raw,
        }
    }

    /// Capture key (text after the `:`), for capture segments only.
    pub fn capture_name(&self) -> Option<&str> {
        match self {
            Segment::Capture(raw) => Some(&raw[1..]),
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard(_))
    }
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a route template.
    ///
    /// A template that is empty or lacks a leading `/` gets one prepended, so
    /// `"users/:id"` and `"/users/:id"` compile to the same segments.
    pub fn compile(template: &str) -> Self {
        let template = if template.starts_with('/') {
            template.to_string()
        } else {
            format!("/{}", template)
        };

        let segments = template.split('/').map(Segment::parse).collect();

        Self { template, segments }
    }

    /// The normalized template string.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when the last segment is a wildcard, making the pattern
    /// open-ended in length.
    pub fn is_open_ended(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_wildcard)
    }

    /// Names of all capture segments, in template order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::capture_name)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Split a request path into segments the same way templates are split.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').collect()
}
