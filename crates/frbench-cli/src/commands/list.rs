use anyhow::{Context, Result};
use frbench_bench::ProjectTemplate;
use frbench_core::ProjectKind;
use std::path::{Path, PathBuf};

pub fn run(config_path: &Path, templates: Option<PathBuf>) -> Result<()> {
    let dir = match templates {
        Some(dir) => dir,
        None => super::load_config(config_path)?.templates_dir,
    };
    let all = ProjectTemplate::list(&dir)
        .with_context(|| format!("cannot list templates in {}", dir.display()))?;

    if all.is_empty() {
        println!("No templates in {}", dir.display());
        return Ok(());
    }
    for t in &all {
        let kind = match t.project.kind {
            ProjectKind::Single => "single",
            ProjectKind::Checkpoints => "checkpoints",
        };
        println!(
            "{:<24} {:<12} {:>3} requirements  {}",
            t.dir_name,
            kind,
            t.requirements().len(),
            t.project.name
        );
    }
    Ok(())
}
