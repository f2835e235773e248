//! A registered route: compiled pattern, match mode and handler list.
//!
//! # Matching
//! ```text
//! length gate:   pattern longer than path        → no match
//!                  (a trailing `*` may match zero segments)
//!                strict and path longer than pattern → no match
//!                  (unless the pattern ends in `*`)
//! per segment:   equal text        → next
//!                `*`               → next (last one swallows the rest)
//!                empty vs empty    → next
//!                empty, weak route → next
//!                `:name`           → capture, next
//!                otherwise         → no match
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::http::handler::BoxedHandler;
use crate::routing::pattern::{Pattern, Segment};

/// How strictly the path length must follow the pattern length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Path and pattern must have the same segment count.
    Strict,
    /// Path may be longer than the pattern; empty pattern segments match anything.
    Weak,
}

impl MatchMode {
    pub fn is_strict(self) -> bool {
        matches!(self, MatchMode::Strict)
    }
}

/// A named capture bound during a successful match.
pub type Capture = (String, String);

pub struct Route {
    pattern: Pattern,
    mode: MatchMode,
    name: Option<String>,
    handlers: Vec<BoxedHandler>,
}

impl Route {
    pub fn new(pattern: Pattern, mode: MatchMode) -> Self {
        Self {
            pattern,
            mode,
            name: None,
            handlers: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }

    pub(crate) fn push_handler(&mut self, handler: BoxedHandler) {
        self.handlers.push(handler);
    }

    /// Label used in logs and metrics: the route name or its template.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.pattern.template())
    }

    /// Match pre-split path segments against this route.
    ///
    /// Captures are only pushed onto `captures` when the whole route matches.
    pub fn matches(&self, path: &[&str], captures: &mut Vec<Capture>) -> bool {
        let segments = self.pattern.segments();
        let len = segments.len();
        let open_ended = self.pattern.is_open_ended();
        let strict = self.mode.is_strict();

        let min_len = if open_ended { len - 1 } else { len };
        if path.len() < min_len {
            return false;
        }
        if strict && !open_ended && path.len() > len {
            return false;
        }

        let mut bound = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            // Only reachable for a trailing wildcard matching zero segments.
            let Some(&value) = path.get(i) else { break };

            if segment.as_raw() == value {
                continue;
            }

            match segment {
                Segment::Wildcard(_) => {
                    if i == len - 1 {
                        break;
                    }
                }
                Segment::Empty => {
                    if !value.is_empty() && strict {
                        return false;
                    }
                }
                Segment::Capture(raw) => bound.push((raw[1..].to_string(), value.to_string())),
                Segment::Literal(_) => return false,
            }
        }

        captures.extend(bound);
        true
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.template())
            .field("mode", &self.mode)
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
