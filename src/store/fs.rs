//! Filesystem-backed object store.
//!
//! Layout under the store's base directory:
//!
//! ```text
//! <file>/                     top-level file (recreated on every create)
//! +-- _container.json         manifest, written on finalize
//! +-- <object>.json           one JSON document per persisted artifact
//! +-- <sub>/                  nested directories, same layout minus manifest
//! ```

use super::{validate_entry_name, validate_file_name, DirHandle, ObjectStore};
use crate::artifact::{Artifact, Nameable};
use crate::error::{PipeStoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manifest file name inside every top-level file directory.
pub const MANIFEST_FILE: &str = "_container.json";

/// Metadata written next to the contents of a finalized file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerManifest {
    pub name: String,
    pub label: String,
    pub finalized_at: chrono::DateTime<chrono::Utc>,
    /// Number of persist operations across the whole file.
    pub objects_written: usize,
    /// Directory paths relative to the file, in creation order.
    pub directories: Vec<String>,
}

impl ContainerManifest {
    pub fn load(file_dir: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(file_dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Debug)]
struct FsDir {
    path: PathBuf,
    /// Path relative to the file directory, empty for roots.
    relative: String,
    root: DirHandle,
    label: String,
    children: Vec<(String, DirHandle)>,
    retained: Vec<Artifact>,
    open: bool,
    writes: usize,
}

/// Store writing each file as a directory tree below `base`.
#[derive(Debug)]
pub struct FsStore {
    base: PathBuf,
    dirs: Vec<FsDir>,
}

impl FsStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            dirs: Vec::new(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Read back an artifact written under `relative_dir` (relative to `base`).
    pub fn read_object(&self, relative_dir: impl AsRef<Path>, name: &str) -> Result<Artifact> {
        let path = self
            .base
            .join(relative_dir)
            .join(format!("{}.json", name));
        let json = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn open_dir(&mut self, handle: DirHandle) -> Result<&mut FsDir> {
        match self.dirs.get_mut(handle.index()) {
            Some(dir) if dir.open => Ok(dir),
            Some(dir) => Err(PipeStoreError::State(format!(
                "Directory \"{}\" is not open",
                dir.path.display()
            ))),
            None => Err(PipeStoreError::State(format!(
                "Unknown directory handle {:?}",
                handle
            ))),
        }
    }

    fn persist(path: &Path, artifact: &Artifact) -> Result<()> {
        let target = path.join(format!("{}.json", artifact.name()));
        let json = serde_json::to_vec_pretty(artifact)?;
        std::fs::write(&target, json)?;
        Ok(())
    }

    fn resource_error(path: &Path, err: std::io::Error) -> PipeStoreError {
        PipeStoreError::Resource {
            resource: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl ObjectStore for FsStore {
    fn create_file(&mut self, name: &str, label: &str) -> Result<DirHandle> {
        validate_file_name(name)?;
        let path = self.base.join(name);
        for dir in self.dirs.iter_mut().filter(|d| d.path.starts_with(&path)) {
            dir.open = false;
        }
        if path.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| Self::resource_error(&path, e))?;
        } else if path.exists() {
            std::fs::remove_file(&path).map_err(|e| Self::resource_error(&path, e))?;
        }
        std::fs::create_dir_all(&path).map_err(|e| Self::resource_error(&path, e))?;

        let handle = DirHandle(self.dirs.len() as u32);
        self.dirs.push(FsDir {
            path,
            relative: String::new(),
            root: handle,
            label: label.to_string(),
            children: Vec::new(),
            retained: Vec::new(),
            open: true,
            writes: 0,
        });
        Ok(handle)
    }

    fn mkdir(&mut self, parent: DirHandle, name: &str) -> Result<DirHandle> {
        validate_entry_name(name)?;
        let parent_dir = self.open_dir(parent)?;
        if let Some((_, existing)) = parent_dir.children.iter().find(|(n, _)| n == name) {
            return Ok(*existing);
        }
        let path = parent_dir.path.join(name);
        let relative = if parent_dir.relative.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent_dir.relative, name)
        };
        let root = parent_dir.root;
        std::fs::create_dir_all(&path).map_err(|e| Self::resource_error(&path, e))?;

        let handle = DirHandle(self.dirs.len() as u32);
        self.dirs.push(FsDir {
            path,
            relative,
            root,
            label: String::new(),
            children: Vec::new(),
            retained: Vec::new(),
            open: true,
            writes: 0,
        });
        self.dirs[parent.index()]
            .children
            .push((name.to_string(), handle));
        Ok(handle)
    }

    fn write_object(&mut self, dir: DirHandle, artifact: Artifact) -> Result<()> {
        validate_entry_name(artifact.name())?;
        let dir = self.open_dir(dir)?;
        Self::persist(&dir.path, &artifact)?;
        dir.writes += 1;
        Ok(())
    }

    fn attach_object(&mut self, dir: DirHandle, artifact: Artifact) -> Result<()> {
        validate_entry_name(artifact.name())?;
        let dir = self.open_dir(dir)?;
        dir.retained.retain(|a| a.name() != artifact.name());
        dir.retained.push(artifact);
        Ok(())
    }

    fn finalize(&mut self, file: DirHandle) -> Result<()> {
        let root = self.open_dir(file)?;
        if root.root != file {
            return Err(PipeStoreError::State(format!(
                "\"{}\" is a nested directory, only files can be finalized",
                root.path.display()
            )));
        }
        let root_path = root.path.clone();
        let label = root.label.clone();

        let mut objects_written = 0;
        let mut directories = Vec::new();
        for dir in self
            .dirs
            .iter_mut()
            .filter(|d| d.open && d.root == file)
        {
            for artifact in std::mem::take(&mut dir.retained) {
                Self::persist(&dir.path, &artifact)?;
                dir.writes += 1;
            }
            objects_written += dir.writes;
            if !dir.relative.is_empty() {
                directories.push(dir.relative.clone());
            }
            dir.open = false;
        }

        let manifest = ContainerManifest {
            name: root_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            label,
            finalized_at: chrono::Utc::now(),
            objects_written,
            directories,
        };
        std::fs::write(
            root_path.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )?;
        tracing::debug!(
            "Finalized store file {:?} ({} objects)",
            root_path,
            objects_written
        );
        Ok(())
    }

    fn describe(&self, dir: DirHandle) -> String {
        self.dirs
            .get(dir.index())
            .map(|d| d.path.display().to_string())
            .unwrap_or_else(|| format!("{:?}", dir))
    }
}
