use anyhow::{Context, Result};
use frbench_bench::ProjectTemplate;
use frbench_core::ProjectKind;
use std::path::{Path, PathBuf};

pub fn run(config_path: &Path, name: &str, checkpoints: bool, templates: Option<PathBuf>) -> Result<()> {
    let dir = match templates {
        Some(dir) => dir,
        None => super::load_config(config_path)?.templates_dir,
    };
    let kind = if checkpoints {
        ProjectKind::Checkpoints
    } else {
        ProjectKind::Single
    };
    let root = ProjectTemplate::scaffold(&dir, name, kind)
        .with_context(|| format!("failed to create template {}", name))?;
    println!("Created template '{}' in {}", name, root.display());
    Ok(())
}
