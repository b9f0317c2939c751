//! Concrete document paths and wildcard path patterns

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step into a document: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a value inside a document, root first
pub type Path = Vec<PathSegment>;

/// Render a path as `a.b[0].c`, or `(root)` for the empty path
pub fn display_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "(root)".to_string();
    }
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{}]", index));
            }
        }
    }
    out
}

/// One step of a path pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternSegment {
    Literal(String),
    Wildcard,
}

impl PatternSegment {
    /// Whether this pattern step accepts the given concrete step
    pub fn accepts(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (Self::Wildcard, _) => true,
            (Self::Literal(expected), PathSegment::Key(actual)) => expected == actual,
            (Self::Literal(_), PathSegment::Index(_)) => false,
        }
    }
}

/// Structural location of a field wherever it recurs, e.g. `steps.*.skipApproval`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn new(segments: Vec<PatternSegment>) -> Self {
        Self { segments }
    }

    /// Parse the dotted form, where `*` is a wildcard
    pub fn parse(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    PatternSegment::Wildcard
                } else {
                    PatternSegment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final literal key of the pattern, if it ends in one
    pub fn leaf_key(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PatternSegment::Literal(key)) => Some(key),
            _ => None,
        }
    }

    /// Pattern extended by one more segment
    pub fn child(&self, segment: PatternSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// True iff same length and every literal segment equals the concrete key at that position
    pub fn matches(&self, path: &[PathSegment]) -> bool {
        self.segments.len() == path.len() && self.segments.iter().zip(path).all(|(p, s)| p.accepts(s))
    }

    /// True iff this pattern is exactly one segment deeper than `path` and its prefix matches it
    pub fn is_child_of(&self, path: &[PathSegment]) -> bool {
        self.segments.len() == path.len() + 1
            && self.segments[..path.len()].iter().zip(path).all(|(p, s)| p.accepts(s))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                PatternSegment::Literal(key) => key.as_str(),
                PatternSegment::Wildcard => "*",
            })
            .collect();
        write!(f, "{}", rendered.join("."))
    }
}

/// Free-function form of [`PathPattern::matches`]
pub fn path_matches(pattern: &PathPattern, path: &[PathSegment]) -> bool {
    pattern.matches(path)
}
