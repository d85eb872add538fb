//! Declarative content of a store writer.
//!
//! Content is a nested structure of groups and source references:
//!
//! ```toml
//! [nodes.content]
//! "." = ["reader"]             # every output of `reader`, in the top group
//! hist = ["gen/h1", "gen/h2"]  # two terminals in group `hist`
//!
//! [nodes.content.calib]
//! "." = ["calib/table"]
//! summary = "calib/summary"    # a single string is a one-element list
//! ```
//!
//! Mapping order is preserved, so groups are created in the order written.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSpec {
    /// Group name to nested content; `"."` refers to the enclosing group.
    Mapping(Vec<(String, ContentSpec)>),
    /// Source references (`node` or `node/terminal`).
    Sequence(Vec<String>),
}

impl Default for ContentSpec {
    fn default() -> Self {
        ContentSpec::Sequence(Vec::new())
    }
}

impl ContentSpec {
    pub fn sources<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentSpec::Sequence(refs.into_iter().map(Into::into).collect())
    }

    pub fn group(entries: Vec<(&str, ContentSpec)>) -> Self {
        ContentSpec::Mapping(
            entries
                .into_iter()
                .map(|(name, spec)| (name.to_string(), spec))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ContentSpec::Mapping(entries) => entries.is_empty(),
            ContentSpec::Sequence(refs) => refs.is_empty(),
        }
    }

    /// Number of source references at any depth.
    pub fn source_count(&self) -> usize {
        match self {
            ContentSpec::Mapping(entries) => entries.iter().map(|(_, s)| s.source_count()).sum(),
            ContentSpec::Sequence(refs) => refs.len(),
        }
    }
}

impl Serialize for ContentSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentSpec::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, spec) in entries {
                    map.serialize_entry(name, spec)?;
                }
                map.end()
            }
            ContentSpec::Sequence(refs) => {
                let mut seq = serializer.serialize_seq(Some(refs.len()))?;
                for r in refs {
                    seq.serialize_element(r)?;
                }
                seq.end()
            }
        }
    }
}

struct ContentVisitor;

impl<'de> Visitor<'de> for ContentVisitor {
    type Value = ContentSpec;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of groups, a list of source references or a single source reference")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ContentSpec, E> {
        Ok(ContentSpec::Sequence(vec![v.to_string()]))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ContentSpec, A::Error> {
        let mut refs = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(r) = seq.next_element::<String>()? {
            refs.push(r);
        }
        Ok(ContentSpec::Sequence(refs))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ContentSpec, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, spec)) = map.next_entry::<String, ContentSpec>()? {
            entries.push((name, spec));
        }
        Ok(ContentSpec::Mapping(entries))
    }
}

impl<'de> Deserialize<'de> for ContentSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ContentVisitor)
    }
}
