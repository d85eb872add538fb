//! Values flowing through terminals and the artifacts persisted from them.
//!
//! Every terminal holds a [`Value`]. Consumers that persist values (the
//! store writer) only accept kinds that are both *nameable* and *cloneable*;
//! that requirement is checked against the declared [`ValueKind`] when inputs
//! are connected, through [`Capabilities`], instead of asking a type registry.
//!
//! # Kinds
//!
//! | Kind        | Nameable | Cloneable | Persisted as          |
//! |-------------|----------|-----------|-----------------------|
//! | `Empty`     | no       | no        | -                     |
//! | `Scalar`    | no       | yes       | -                     |
//! | `Histogram` | yes      | yes       | `Artifact::Histogram` |
//! | `Table`     | yes      | yes       | `Artifact::Table`     |
//! | `Object`    | yes      | yes       | `Artifact::Object`    |

pub mod histogram;
pub mod object;
pub mod table;

pub use histogram::Histogram;
pub use object::NamedObject;
pub use table::Table;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Bool(_) => ScalarType::Bool,
            Scalar::Int(_) => ScalarType::Int,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Text(_) => ScalarType::Text,
        }
    }

    /// Numeric view, used by fill operations. Text has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(_) => None,
        }
    }

    /// Convert into `target` if the conversion is lossless in intent.
    /// Integers widen to floats; everything else must already match.
    pub fn coerce(self, target: ScalarType) -> Option<Scalar> {
        match (self, target) {
            (Scalar::Int(v), ScalarType::Float) => Some(Scalar::Float(v as f64)),
            (s, t) if s.scalar_type() == t => Some(s),
            _ => None,
        }
    }
}

/// Column/terminal scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Text,
}

impl ScalarType {
    pub fn display_name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Text => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarType::Text)
    }
}

/// Declared kind of a terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Empty,
    Scalar(ScalarType),
    Histogram,
    Table,
    Object,
}

impl ValueKind {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            ValueKind::Empty => Capabilities::NONE,
            ValueKind::Scalar(_) => Capabilities::CLONEABLE,
            ValueKind::Histogram | ValueKind::Table | ValueKind::Object => {
                Capabilities::NAMEABLE_CLONEABLE
            }
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ValueKind::Empty => "empty",
            ValueKind::Scalar(t) => t.display_name(),
            ValueKind::Histogram => "histogram",
            ValueKind::Table => "table",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Small capability set. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const NAMEABLE: Capabilities = Capabilities(1);
    pub const CLONEABLE: Capabilities = Capabilities(1 << 1);
    pub const NAMEABLE_CLONEABLE: Capabilities = Capabilities(1 | (1 << 1));

    /// True if every capability in `required` is present.
    #[inline]
    pub fn satisfies(self, required: Capabilities) -> bool {
        self.0 & required.0 == required.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

/// Anything with an identifying name and a human-readable title.
pub trait Nameable {
    fn name(&self) -> &str;
    fn title(&self) -> &str;
}

/// Runtime value held by a terminal.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    Scalar(Scalar),
    Histogram(Histogram),
    Table(Table),
    Object(NamedObject),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Scalar(s) => ValueKind::Scalar(s.scalar_type()),
            Value::Histogram(_) => ValueKind::Histogram,
            Value::Table(_) => ValueKind::Table,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_nameable(&self) -> Option<&dyn Nameable> {
        match self {
            Value::Histogram(h) => Some(h),
            Value::Table(t) => Some(t),
            Value::Object(o) => Some(o),
            Value::Empty | Value::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Independent copy suitable for storage; `None` for kinds that are not nameable.
    pub fn to_artifact(&self) -> Option<Artifact> {
        match self {
            Value::Histogram(h) => Some(Artifact::Histogram(h.clone())),
            Value::Table(t) => Some(Artifact::Table(t.clone())),
            Value::Object(o) => Some(Artifact::Object(o.clone())),
            Value::Empty | Value::Scalar(_) => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Histogram> for Value {
    fn from(h: Histogram) -> Self {
        Value::Histogram(h)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<NamedObject> for Value {
    fn from(o: NamedObject) -> Self {
        Value::Object(o)
    }
}

/// Owned, serializable copy of a nameable value, as written to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Histogram(Histogram),
    Table(Table),
    Object(NamedObject),
}

impl Artifact {
    pub fn kind(&self) -> ValueKind {
        match self {
            Artifact::Histogram(_) => ValueKind::Histogram,
            Artifact::Table(_) => ValueKind::Table,
            Artifact::Object(_) => ValueKind::Object,
        }
    }
}

impl Nameable for Artifact {
    fn name(&self) -> &str {
        match self {
            Artifact::Histogram(h) => h.name(),
            Artifact::Table(t) => t.name(),
            Artifact::Object(o) => o.name(),
        }
    }

    fn title(&self) -> &str {
        match self {
            Artifact::Histogram(h) => h.title(),
            Artifact::Table(t) => t.title(),
            Artifact::Object(o) => o.title(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(Capabilities::NAMEABLE_CLONEABLE.satisfies(Capabilities::NAMEABLE));
        assert!(Capabilities::NAMEABLE_CLONEABLE.satisfies(Capabilities::NAMEABLE_CLONEABLE));
        assert!(!Capabilities::CLONEABLE.satisfies(Capabilities::NAMEABLE_CLONEABLE));
        assert_eq!(
            Capabilities::NAMEABLE | Capabilities::CLONEABLE,
            Capabilities::NAMEABLE_CLONEABLE
        );
        assert!(Capabilities::NONE.satisfies(Capabilities::NONE));
    }

    #[test]
    fn test_kind_capabilities() {
        let required = Capabilities::NAMEABLE_CLONEABLE;
        assert!(ValueKind::Histogram.capabilities().satisfies(required));
        assert!(ValueKind::Table.capabilities().satisfies(required));
        assert!(ValueKind::Object.capabilities().satisfies(required));
        assert!(!ValueKind::Scalar(ScalarType::Float).capabilities().satisfies(required));
        assert!(!ValueKind::Empty.capabilities().satisfies(required));
    }

    #[test]
    fn test_scalar_coerce() {
        assert_eq!(
            Scalar::Int(3).coerce(ScalarType::Float),
            Some(Scalar::Float(3.0))
        );
        assert_eq!(Scalar::Float(1.5).coerce(ScalarType::Int), None);
        assert_eq!(
            Scalar::Text("a".into()).coerce(ScalarType::Text),
            Some(Scalar::Text("a".into()))
        );
    }

    #[test]
    fn test_scalar_untagged_json() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[true, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Bool(true),
                Scalar::Int(3),
                Scalar::Float(2.5),
                Scalar::Text("x".into())
            ]
        );
    }

    #[test]
    fn test_value_nameable() {
        let obj = NamedObject::new("run_info", "Run information");
        let value = Value::from(obj);
        assert_eq!(value.as_nameable().map(|n| n.name()), Some("run_info"));
        assert!(Value::Scalar(Scalar::Int(1)).as_nameable().is_none());
        assert!(Value::Empty.to_artifact().is_none());
    }

    #[test]
    fn test_to_artifact_is_independent_copy() {
        let mut hist = Histogram::new("h1", "Energy", 4, 0.0, 4.0).unwrap();
        hist.fill(1.5);
        let mut value = Value::from(hist);
        let artifact = value.to_artifact().unwrap();

        if let Value::Histogram(h) = &mut value {
            h.fill(2.5);
        }

        match artifact {
            Artifact::Histogram(h) => assert_eq!(h.entries(), 1),
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_artifact_tagged_json() {
        let artifact = Artifact::Object(NamedObject::new("cfg", "Config"));
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains(r#""kind":"object""#));
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "cfg");
    }
}
