//! Generic named object carrying scalar attributes.

use super::{Nameable, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named bag of attributes, e.g. run metadata or fit results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedObject {
    name: String,
    title: String,
    #[serde(default)]
    attributes: BTreeMap<String, Scalar>,
}

impl NamedObject {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Scalar) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Scalar) {
        self.attributes.insert(key.into(), value);
    }

    pub fn attribute(&self, key: &str) -> Option<&Scalar> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Scalar> {
        &self.attributes
    }
}

impl Nameable for NamedObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }
}
