//! In-memory object store.
//!
//! Cloning a `MemoryStore` yields another handle to the same tree, so a test
//! or an embedding application can keep one clone for inspection while a
//! writer node owns another.

use super::{validate_entry_name, validate_file_name, DirHandle, ObjectStore};
use crate::artifact::{Artifact, Nameable};
use crate::error::{PipeStoreError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// An artifact persisted in a directory, with the number of times its name was written.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub artifact: Artifact,
    pub cycle: u32,
}

#[derive(Debug)]
struct MemDir {
    /// `file` for roots, `file/sub/...` for nested directories.
    path: String,
    file: String,
    children: Vec<(String, DirHandle)>,
    objects: BTreeMap<String, StoredObject>,
    retained: Vec<Artifact>,
    is_root: bool,
    open: bool,
    /// False once the owning file has been truncated by a newer create.
    live: bool,
    writes: usize,
}

#[derive(Debug, Clone)]
struct FileEntry {
    label: String,
    finalized: bool,
}

#[derive(Debug, Default)]
struct MemoryTree {
    dirs: Vec<MemDir>,
    files: BTreeMap<String, FileEntry>,
}

impl MemoryTree {
    fn open_dir(&mut self, handle: DirHandle) -> Result<&mut MemDir> {
        match self.dirs.get_mut(handle.index()) {
            Some(dir) if dir.open => Ok(dir),
            Some(dir) => Err(PipeStoreError::State(format!(
                "Directory \"{}\" is not open",
                dir.path
            ))),
            None => Err(PipeStoreError::State(format!(
                "Unknown directory handle {:?}",
                handle
            ))),
        }
    }

    fn find(&self, path: &str) -> Option<&MemDir> {
        self.dirs.iter().find(|d| d.live && d.path == path)
    }

    fn push_dir(&mut self, dir: MemDir) -> DirHandle {
        let handle = DirHandle(self.dirs.len() as u32);
        self.dirs.push(dir);
        handle
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryTree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, MemoryTree> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `file` exists and has been finalized.
    pub fn is_finalized(&self, file: &str) -> bool {
        self.tree().files.get(file).map(|f| f.finalized).unwrap_or(false)
    }

    pub fn label(&self, file: &str) -> Option<String> {
        self.tree().files.get(file).map(|f| f.label.clone())
    }

    /// Persisted object `name` in directory `path` (`file/sub/...`).
    pub fn object(&self, path: &str, name: &str) -> Option<StoredObject> {
        self.tree()
            .find(path)
            .and_then(|d| d.objects.get(name).cloned())
    }

    /// Names of persisted objects in `path`, sorted.
    pub fn object_names(&self, path: &str) -> Vec<String> {
        self.tree()
            .find(path)
            .map(|d| d.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Names of objects retained in `path` and not yet persisted.
    pub fn retained_names(&self, path: &str) -> Vec<String> {
        self.tree()
            .find(path)
            .map(|d| d.retained.iter().map(|a| a.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Child directory names of `path`, in creation order.
    pub fn subdirs(&self, path: &str) -> Vec<String> {
        self.tree()
            .find(path)
            .map(|d| d.children.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of persist operations performed in `path` (writes plus flushed retained objects).
    pub fn write_count(&self, path: &str) -> usize {
        self.tree().find(path).map(|d| d.writes).unwrap_or(0)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.tree().find(path).is_some()
    }
}

impl ObjectStore for MemoryStore {
    fn create_file(&mut self, name: &str, label: &str) -> Result<DirHandle> {
        validate_file_name(name)?;
        let mut tree = self.tree();
        for dir in tree.dirs.iter_mut().filter(|d| d.file == name) {
            dir.live = false;
            dir.open = false;
        }
        tree.files.insert(
            name.to_string(),
            FileEntry {
                label: label.to_string(),
                finalized: false,
            },
        );
        Ok(tree.push_dir(MemDir {
            path: name.to_string(),
            file: name.to_string(),
            children: Vec::new(),
            objects: BTreeMap::new(),
            retained: Vec::new(),
            is_root: true,
            open: true,
            live: true,
            writes: 0,
        }))
    }

    fn mkdir(&mut self, parent: DirHandle, name: &str) -> Result<DirHandle> {
        validate_entry_name(name)?;
        let mut tree = self.tree();
        let parent_dir = tree.open_dir(parent)?;
        if let Some((_, existing)) = parent_dir.children.iter().find(|(n, _)| n == name) {
            return Ok(*existing);
        }
        let path = format!("{}/{}", parent_dir.path, name);
        let file = parent_dir.file.clone();
        let handle = tree.push_dir(MemDir {
            path,
            file,
            children: Vec::new(),
            objects: BTreeMap::new(),
            retained: Vec::new(),
            is_root: false,
            open: true,
            live: true,
            writes: 0,
        });
        tree.dirs[parent.index()]
            .children
            .push((name.to_string(), handle));
        Ok(handle)
    }

    fn write_object(&mut self, dir: DirHandle, artifact: Artifact) -> Result<()> {
        validate_entry_name(artifact.name())?;
        let mut tree = self.tree();
        let dir = tree.open_dir(dir)?;
        let cycle = dir
            .objects
            .get(artifact.name())
            .map(|o| o.cycle + 1)
            .unwrap_or(1);
        dir.objects
            .insert(artifact.name().to_string(), StoredObject { artifact, cycle });
        dir.writes += 1;
        Ok(())
    }

    fn attach_object(&mut self, dir: DirHandle, artifact: Artifact) -> Result<()> {
        validate_entry_name(artifact.name())?;
        let mut tree = self.tree();
        let dir = tree.open_dir(dir)?;
        // A directory retains one object per name; the newest copy wins
        dir.retained.retain(|a| a.name() != artifact.name());
        dir.retained.push(artifact);
        Ok(())
    }

    fn finalize(&mut self, file: DirHandle) -> Result<()> {
        let mut tree = self.tree();
        let root = tree.open_dir(file)?;
        if !root.is_root {
            return Err(PipeStoreError::State(format!(
                "\"{}\" is a nested directory, only files can be finalized",
                root.path
            )));
        }
        let file_name = root.file.clone();
        for dir in tree
            .dirs
            .iter_mut()
            .filter(|d| d.live && d.open && d.file == file_name)
        {
            for artifact in std::mem::take(&mut dir.retained) {
                let cycle = dir
                    .objects
                    .get(artifact.name())
                    .map(|o| o.cycle + 1)
                    .unwrap_or(1);
                dir.objects
                    .insert(artifact.name().to_string(), StoredObject { artifact, cycle });
                dir.writes += 1;
            }
            dir.open = false;
        }
        if let Some(entry) = tree.files.get_mut(&file_name) {
            entry.finalized = true;
        }
        tracing::debug!("Finalized in-memory file \"{}\"", file_name);
        Ok(())
    }

    fn describe(&self, dir: DirHandle) -> String {
        self.tree()
            .dirs
            .get(dir.index())
            .map(|d| d.path.clone())
            .unwrap_or_else(|| format!("{:?}", dir))
    }
}
