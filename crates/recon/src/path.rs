//! Typed field paths for addressing values inside a proposal.
//!
//! Configuration addresses fields with dotted/bracket strings such as
//! `employee.payments[0].amount`. Those strings are parsed once, at the
//! configuration boundary, into a [`FieldPath`] segment list so ignore
//! matching and transformer lookup operate on structured segments instead of
//! re-scanning string notation on every comparison.
//!
//! ## Ignore semantics
//!
//! Ignore patterns use **prefix** matching on parsed segments: a pattern
//! matches a concrete path when the pattern's segments are a prefix of the
//! concrete path's segments. The pattern `items` therefore covers `items`,
//! `items[0]`, and `items[0].name`; the pattern `items[0]` covers
//! `items[0].name` but not `items[1]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// One step of a [`FieldPath`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// An object member, e.g. `amount` in `payments[0].amount`.
    Key(String),
    /// An array element, e.g. `0` in `payments[0]`.
    Index(usize),
}

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

/// A parsed field path.
///
/// Parsing is total: input that does not follow the dotted/bracket convention
/// degrades to key segments rather than failing, so configuration handling
/// never raises an error for an odd-looking pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, addressing the value itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A single-key path.
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Parses the dotted/bracket notation (`employee.payments[0].amount`).
    ///
    /// Bracket groups that contain a non-negative integer become
    /// [`PathSegment::Index`]; any other bracket text is folded back into the
    /// surrounding key segment.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        for token in raw.split('.') {
            if token.is_empty() {
                continue;
            }
            parse_token(token, &mut segments);
        }
        Self(segments)
    }

    /// Returns the underlying segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns `true` if the path has no segments.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new path extended with an object key.
    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// Returns a new path extended with an array index.
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns `true` if `prefix`'s segments are a prefix of this path's.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Resolves this path inside a JSON value, returning the addressed
    /// sub-value, or `None` if any segment is absent or of the wrong kind.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.0 {
            current = match segment {
                PathSegment::Key(key) => current.as_object()?.get(key)?,
                PathSegment::Index(index) => current.as_array()?.get(*index)?,
            };
        }
        Some(current)
    }
}

/// Splits one dot-separated token into key and index segments.
fn parse_token(token: &str, segments: &mut Vec<PathSegment>) {
    let key_end = token.find('[').unwrap_or(token.len());
    let (head, mut rest) = token.split_at(key_end);
    if !head.is_empty() {
        segments.push(PathSegment::Key(head.to_string()));
    }
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            // Unterminated bracket: keep the remainder as literal key text.
            push_key_text(segments, rest);
            return;
        };
        let inner = &stripped[..close];
        match inner.parse::<usize>() {
            Ok(index) => segments.push(PathSegment::Index(index)),
            Err(_) => push_key_text(segments, &rest[..close + 2]),
        }
        rest = &stripped[close + 1..];
    }
    if !rest.is_empty() {
        push_key_text(segments, rest);
    }
}

/// Appends literal text to the preceding key segment, or starts a new one.
fn push_key_text(segments: &mut Vec<PathSegment>, text: &str) {
    match segments.last_mut() {
        Some(PathSegment::Key(key)) => key.push_str(text),
        _ => segments.push(PathSegment::Key(text.to_string())),
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if position > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

// ---------------------------------------------------------------------------
// Ignore matching
// ---------------------------------------------------------------------------

/// Returns `true` if `path` matches any of the configured ignore `patterns`.
///
/// Matching is prefix-based (see the module documentation) and costs one
/// segment-prefix check per pattern.
pub fn should_ignore_path(path: &FieldPath, patterns: &[FieldPath]) -> bool {
    patterns.iter().any(|pattern| path.starts_with(pattern))
}
