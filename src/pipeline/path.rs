//! Hierarchical paths addressing nodes and terminals in the pipeline tree.
//!
//! A path is an immutable list of name segments, written with `/` separators
//! (`"reader/energy"`). It is resolved relative to some node, so there is no
//! notion of an absolute path at this level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker segment that refers to the current container in content specs.
pub const THIS_CONTAINER: &str = ".";

/// Ordered sequence of name segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HierPath {
    segments: Vec<String>,
}

impl HierPath {
    /// Parse a `/`-separated path. Empty segments (leading, trailing or
    /// doubled separators) are dropped, so `""` and `"/"` give an empty path.
    pub fn parse(text: &str) -> Self {
        Self {
            segments: text
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The single-segment path that denotes "this container".
    pub fn this_container() -> Self {
        Self::from_segments([THIS_CONTAINER])
    }

    pub fn is_this_container(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == THIS_CONTAINER
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, if any.
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// New path with `name` appended.
    pub fn join(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }
}

impl fmt::Display for HierPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for HierPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for HierPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for HierPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<HierPath> for String {
    fn from(path: HierPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let path = HierPath::parse("reader/energy");
        assert_eq!(path.segments(), &["reader", "energy"]);
        assert_eq!(path.head(), Some("reader"));
        assert_eq!(path.last(), Some("energy"));
        assert_eq!(path.to_string(), "reader/energy");
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        assert!(HierPath::parse("").is_empty());
        assert!(HierPath::parse(" / ").is_empty());
        assert_eq!(HierPath::parse("/a//b/").segments(), &["a", "b"]);
    }

    #[test]
    fn test_this_container() {
        assert!(HierPath::this_container().is_this_container());
        assert!(HierPath::parse(".").is_this_container());
        assert!(!HierPath::parse("./x").is_this_container());
    }

    #[test]
    fn test_join() {
        let base = HierPath::parse("gen");
        let joined = base.join("h1");
        assert_eq!(joined.to_string(), "gen/h1");
        assert_eq!(base.len(), 1);
    }
}
