//! Hierarchical object stores.
//!
//! A store holds top-level *files*, each a tree of nested directories that
//! contain named artifacts. Callers only see opaque [`DirHandle`]s; a handle is
//! valid from the moment its file is created until that file is finalized.
//!
//! Two kinds of object placement exist:
//!
//! - **write**: the artifact is persisted immediately under its name. Writing
//!   the same name again bumps its cycle number.
//! - **attach**: the directory retains the artifact and persists it when the
//!   owning file is finalized (see [`policy`]).
//!
//! # Implementations
//!
//! - [`MemoryStore`] - shareable in-memory tree, inspectable while in use
//! - [`FsStore`] - one filesystem directory per store directory, one JSON file per object

pub mod fs;
pub mod memory;
pub mod policy;

pub use fs::{ContainerManifest, FsStore};
pub use memory::{MemoryStore, StoredObject};
pub use policy::{AutoRegistration, KindRule, RegistrationScope, WriteAction, WritePolicy};

use crate::artifact::Artifact;
use crate::error::{PipeStoreError, Result};
use std::fmt;
use std::path::{Component, Path};

/// Opaque handle to a directory inside a store.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirHandle(pub u32);

impl DirHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DirHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirHandle({})", self.0)
    }
}

/// Storage engine capability consumed by the store writer.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore: Send {
    /// Create a top-level file, truncating any previous file of the same name.
    fn create_file(&mut self, name: &str, label: &str) -> Result<DirHandle>;

    /// Create a nested directory, or return the existing one with that name.
    fn mkdir(&mut self, parent: DirHandle, name: &str) -> Result<DirHandle>;

    /// Persist `artifact` in `dir` now.
    fn write_object(&mut self, dir: DirHandle, artifact: Artifact) -> Result<()>;

    /// Retain `artifact` in `dir` until the owning file is finalized.
    fn attach_object(&mut self, dir: DirHandle, artifact: Artifact) -> Result<()>;

    /// Persist retained objects of the whole file and close all its handles.
    fn finalize(&mut self, file: DirHandle) -> Result<()>;

    /// Human-readable location of `dir`, for diagnostics.
    fn describe(&self, dir: DirHandle) -> String;
}

/// Check that `name` can be used as a single directory or object name.
pub(crate) fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\')
    {
        return Err(PipeStoreError::Config(format!(
            "\"{}\" is not a valid store entry name",
            name
        )));
    }
    Ok(())
}

/// Check that `name` addresses exactly one top-level file below a store's base.
///
/// Creating a file truncates whatever the name points at, so anything that
/// could leave the base (`..`, `.`, absolute paths, separators, drive
/// prefixes) is refused before the store is touched.
pub fn validate_file_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || validate_entry_name(name).is_err() {
        return Err(PipeStoreError::Resource {
            resource: name.to_string(),
            message: "not a single file name inside the store".to_string(),
        });
    }
    Ok(())
}
