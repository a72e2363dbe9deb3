use anyhow::{Context, Result};
use frbench_connect::lookup;
use frbench_store::ResponseCache;
use std::path::{Path, PathBuf};

pub fn clear(config_path: &Path, model: Option<String>, cache: Option<PathBuf>) -> Result<()> {
    let root = match cache {
        Some(dir) => dir,
        None => super::load_config(config_path)?.cache_dir,
    };

    let target = match &model {
        Some(model) => {
            let spec = lookup(model).with_context(|| format!("unknown model {}", model))?;
            ResponseCache::for_model(&root, spec.provider.cache_dir(), spec.id)
        }
        None => ResponseCache::new(&root),
    };
    target
        .clear()
        .with_context(|| format!("failed to clear {}", target.base().display()))?;

    match model {
        Some(model) => println!("Cleared cached responses of {}", model),
        None => println!("Cleared response cache {}", root.display()),
    }
    Ok(())
}
