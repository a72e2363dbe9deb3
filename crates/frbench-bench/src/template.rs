//! Project templates on disk: `templates/<dir>/{project.yml, init/, reference/}`.

use crate::error::BenchError;
use frbench_core::{Project, ProjectKind, Requirement};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROJECT_FILE: &str = "project.yml";

const EMPTY_MAIN: &str = "package main\n\nfunc main() {\n\n}\n";
const EMPTY_TEST: &str = "package main\n\nimport \"testing\"\n\nfunc TestMain(t *testing.T) {\n\n}\n";

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTemplate {
    /// Directory name under the templates root. Used as the project key in stats.
    pub dir_name: String,
    pub root: PathBuf,
    pub project: Project,
}

impl ProjectTemplate {
    pub fn load(templates_dir: &Path, dir_name: &str) -> Result<Self, BenchError> {
        let root = templates_dir.join(dir_name);
        let yml = root.join(PROJECT_FILE);
        let content = fs::read_to_string(&yml)
            .map_err(|e| BenchError::Setup(format!("cannot read {}: {}", yml.display(), e)))?;
        let project: Project = serde_yaml::from_str(&content)?;
        if project.requirements.is_empty() {
            return Err(BenchError::Setup(format!(
                "project '{}' has no requirements",
                dir_name
            )));
        }
        Ok(Self {
            dir_name: dir_name.to_string(),
            root,
            project,
        })
    }

    /// All templates under `templates_dir`, sorted by directory name.
    pub fn list(templates_dir: &Path) -> Result<Vec<Self>, BenchError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(templates_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() && entry.path().join(PROJECT_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        names
            .iter()
            .map(|name| Self::load(templates_dir, name))
            .collect()
    }

    /// Seed files copied into the workspace before the first requirement.
    pub fn init_dir(&self) -> PathBuf {
        self.root.join("init")
    }

    pub fn reference_dir(&self) -> PathBuf {
        self.root.join("reference")
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.project.requirements
    }

    /// Raw bytes of the first attachment of requirement `index`, if any.
    pub fn image(&self, index: usize) -> Result<Option<Vec<u8>>, BenchError> {
        let Some(attachment) = self
            .project
            .requirements
            .get(index)
            .and_then(|r| r.attachments.first())
        else {
            return Ok(None);
        };
        let path = self.root.join(attachment);
        debug!(path = %path.display(), "loading attachment");
        fs::read(&path)
            .map(Some)
            .map_err(|e| BenchError::Setup(format!("cannot read attachment {}: {}", path.display(), e)))
    }

    /// Create a new template skeleton. Refuses to touch an existing directory.
    pub fn scaffold(templates_dir: &Path, dir_name: &str, kind: ProjectKind) -> Result<PathBuf, BenchError> {
        let root = templates_dir.join(dir_name);
        if root.exists() {
            return Err(BenchError::Setup(format!(
                "template directory {} already exists",
                root.display()
            )));
        }

        let project = Project {
            name: "Sample Project".into(),
            description: String::new(),
            kind,
            requirements: vec![Requirement {
                name: "First requirement".into(),
                description: "First requirement description".into(),
                attachments: Vec::new(),
                score: 1,
            }],
        };

        fs::create_dir_all(root.join("init"))?;
        fs::create_dir_all(root.join("reference"))?;
        fs::write(root.join(PROJECT_FILE), serde_yaml::to_string(&project)?)?;
        fs::write(root.join("init/main.go"), EMPTY_MAIN)?;
        fs::write(root.join("reference/main.go"), EMPTY_MAIN)?;
        fs::write(root.join("reference/1_test.go"), EMPTY_TEST)?;
        Ok(root)
    }
}
