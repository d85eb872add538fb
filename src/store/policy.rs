//! Object write policy.
//!
//! Some artifact kinds register themselves with the directory that is active
//! when they are created; writing them explicitly as well would store them
//! twice. The policy decides, per artifact, whether to issue an explicit write
//! or to let the directory retain the object until its file is finalized.
//!
//! The decision is a lookup in a small table of [`KindRule`]s, each tying a
//! kind to the registration scope it belongs to. A scope only applies while it
//! is switched on in [`AutoRegistration`].

use super::{DirHandle, ObjectStore};
use crate::artifact::{Artifact, Nameable, ValueKind};
use crate::error::{PipeStoreError, Result};
use serde::{Deserialize, Serialize};

/// Registration scope a self-registering kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationScope {
    /// Histogram-like artifacts.
    Histogram,
    /// Directory-bound artifacts such as tables.
    Directory,
}

/// Which registration scopes are currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRegistration {
    pub histograms: bool,
    pub directory_objects: bool,
}

impl Default for AutoRegistration {
    fn default() -> Self {
        Self {
            histograms: true,
            directory_objects: true,
        }
    }
}

impl AutoRegistration {
    /// Every artifact is written explicitly.
    pub const DISABLED: AutoRegistration = AutoRegistration {
        histograms: false,
        directory_objects: false,
    };

    pub fn is_active(&self, scope: RegistrationScope) -> bool {
        match scope {
            RegistrationScope::Histogram => self.histograms,
            RegistrationScope::Directory => self.directory_objects,
        }
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRule {
    pub kind: ValueKind,
    pub scope: RegistrationScope,
}

/// Built-in self-registering kinds.
pub const SELF_REGISTERING: &[KindRule] = &[
    KindRule {
        kind: ValueKind::Histogram,
        scope: RegistrationScope::Histogram,
    },
    KindRule {
        kind: ValueKind::Table,
        scope: RegistrationScope::Directory,
    },
];

/// Outcome of a policy-driven write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    /// Persisted immediately.
    Explicit,
    /// Retained by the directory, persisted when the file is finalized.
    AutoRegistered,
}

#[derive(Debug, Clone)]
pub struct WritePolicy {
    rules: Vec<KindRule>,
    scopes: AutoRegistration,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self::new(AutoRegistration::default())
    }
}

impl WritePolicy {
    pub fn new(scopes: AutoRegistration) -> Self {
        Self {
            rules: SELF_REGISTERING.to_vec(),
            scopes,
        }
    }

    /// Add a kind to the classification table.
    pub fn with_rule(mut self, rule: KindRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn scopes(&self) -> AutoRegistration {
        self.scopes
    }

    pub fn classify(&self, kind: ValueKind) -> WriteAction {
        let self_registers = self
            .rules
            .iter()
            .any(|rule| rule.kind == kind && self.scopes.is_active(rule.scope));
        if self_registers {
            WriteAction::AutoRegistered
        } else {
            WriteAction::Explicit
        }
    }

    /// Place `artifact` into `dir` according to its classification.
    ///
    /// Artifacts without a name are rejected before touching the store.
    pub fn write(
        &self,
        store: &mut dyn ObjectStore,
        dir: DirHandle,
        artifact: Artifact,
    ) -> Result<WriteAction> {
        if artifact.name().is_empty() {
            return Err(PipeStoreError::Config(format!(
                "Refusing to add {} with empty name to \"{}\"",
                artifact.kind(),
                store.describe(dir)
            )));
        }
        let action = self.classify(artifact.kind());
        match action {
            WriteAction::Explicit => store.write_object(dir, artifact)?,
            WriteAction::AutoRegistered => store.attach_object(dir, artifact)?,
        }
        Ok(action)
    }
}
