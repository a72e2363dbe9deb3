use crate::error::StoreError;
use frbench_core::project::ProjectKind;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A file the model asked to write, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub rel_path: PathBuf,
    pub content: Vec<u8>,
}

impl FileWrite {
    pub fn new(rel_path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            rel_path: rel_path.into(),
            content: content.into(),
        }
    }
}

/// Full copy of the workspace files, used to undo a failed attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, rel_path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(rel_path.as_ref()).map(Vec::as_slice)
    }
}

/// The shared on-disk project directory candidate code is written into.
///
/// There is exactly one writer (the runner). The directory is wiped and
/// reseeded from a template before every (model, project) pair.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wipe the workspace and copy the template seed directory into it.
    pub fn reset_from(&self, seed_dir: impl AsRef<Path>) -> Result<(), StoreError> {
        let seed_dir = seed_dir.as_ref();
        if !seed_dir.is_dir() {
            return Err(StoreError::TemplateNotFound(seed_dir.display().to_string()));
        }
        self.wipe()?;
        copy_dir_recursive(seed_dir, &self.root)?;
        debug!(workspace = %self.root.display(), seed = %seed_dir.display(), "workspace reset");
        Ok(())
    }

    fn wipe(&self) -> Result<(), StoreError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Install the reference tests of requirement `number` (1-based).
    ///
    /// Cumulative install copies `reference/<number>_*` files. Checkpoint
    /// projects whose `reference/<number>/` directory holds test files first
    /// remove every test file from the workspace, then copy that checkpoint's
    /// tests. Returns the installed workspace-relative paths.
    pub fn install_tests(
        &self,
        reference_dir: impl AsRef<Path>,
        number: usize,
        kind: ProjectKind,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let reference_dir = reference_dir.as_ref();
        if !reference_dir.is_dir() {
            return Err(StoreError::TemplateNotFound(
                reference_dir.display().to_string(),
            ));
        }

        let checkpoint_dir = reference_dir.join(number.to_string());
        if kind == ProjectKind::Checkpoints && checkpoint_dir.is_dir() {
            let tests = list_files(&checkpoint_dir)?
                .into_iter()
                .filter(|p| is_test_file(p))
                .collect::<Vec<_>>();
            if !tests.is_empty() {
                for existing in self.test_files()? {
                    fs::remove_file(self.root.join(&existing))?;
                }
                let mut installed = Vec::new();
                for rel in tests {
                    copy_file(&checkpoint_dir.join(&rel), &self.root.join(&rel))?;
                    installed.push(rel);
                }
                debug!(number, count = installed.len(), "installed checkpoint tests");
                return Ok(installed);
            }
        }

        let prefix = format!("{}_", number);
        let mut installed = Vec::new();
        for entry in fs::read_dir(reference_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&prefix) {
                copy_file(&entry.path(), &self.root.join(&name))?;
                installed.push(PathBuf::from(name));
            }
        }
        installed.sort();
        debug!(number, count = installed.len(), "installed requirement tests");
        Ok(installed)
    }

    /// Workspace-relative paths of all test files.
    pub fn test_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        Ok(list_files(&self.root)?
            .into_iter()
            .filter(|p| is_test_file(p))
            .collect())
    }

    /// Concatenate every workspace file, each wrapped in
    /// `// start of <path>` / `// end of <path>` markers, in path order.
    pub fn load_codebase(&self) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::new();
        for rel in list_files(&self.root)? {
            let bytes = fs::read(self.root.join(&rel))?;
            let name = rel_display(&rel);
            out.extend_from_slice(format!("// start of {}\n", name).as_bytes());
            out.extend_from_slice(&bytes);
            if !bytes.is_empty() && !bytes.ends_with(b"\n") {
                out.push(b'\n');
            }
            out.extend_from_slice(format!("// end of {}\n", name).as_bytes());
        }
        Ok(out)
    }

    /// Write candidate files, creating directories as needed.
    ///
    /// Every path is validated before anything is written.
    pub fn write_files(&self, files: &[FileWrite]) -> Result<(), StoreError> {
        for file in files {
            check_relative(&file.rel_path)?;
        }
        for file in files {
            let target = self.root.join(&file.rel_path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &file.content)?;
            debug!(path = %file.rel_path.display(), bytes = file.content.len(), "wrote file");
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let mut files = BTreeMap::new();
        for rel in list_files(&self.root)? {
            let bytes = fs::read(self.root.join(&rel))?;
            files.insert(rel, bytes);
        }
        Ok(Snapshot { files })
    }

    /// Make the workspace contain exactly the files of `snapshot`.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.wipe()?;
        for (rel, bytes) in &snapshot.files {
            let target = self.root.join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, bytes)?;
        }
        Ok(())
    }

    /// Copy the workspace tree into `dest` (created if missing).
    pub fn copy_to(&self, dest: impl AsRef<Path>) -> Result<(), StoreError> {
        copy_dir_recursive(&self.root, dest.as_ref())
    }
}

/// Test files are recognised by a `_test.` infix (`1_test.go`, `main_test.go`).
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().contains("_test."))
        .unwrap_or(false)
}

fn check_relative(path: &Path) -> Result<(), StoreError> {
    let ok = !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(())
    } else {
        Err(StoreError::UnsafePath(path.display().to_string()))
    }
}

fn rel_display(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// All regular files under `dir`, relative to it, sorted.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut out = Vec::new();
    collect_files(dir, Path::new(""), &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_files(base: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> Result<(), StoreError> {
    let entries = match fs::read_dir(base.join(rel)) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StoreError::Io(e)),
    };
    for entry in entries {
        let entry = entry?;
        let child = rel.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(base, &child, out)?;
        } else if file_type.is_file() {
            out.push(child);
        }
    }
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> Result<(), StoreError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(to)?;
    for rel in list_files(from)? {
        copy_file(&from.join(&rel), &to.join(&rel))?;
    }
    Ok(())
}
