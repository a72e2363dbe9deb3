use crate::RunArgs;
use anyhow::{bail, Context, Result};
use frbench_bench::{prompt, report, BenchConfig, BenchmarkRunner, ProjectTemplate};
use frbench_connect::{connector_for, ApiKeys, Connector, Provider, ProviderConfig};
use frbench_core::ScoreMode;
use std::path::Path;

pub async fn run(config_path: &Path, args: RunArgs) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    let mut provider = ProviderConfig::default().with_api_keys(ApiKeys::from_env());
    for (p, url) in [
        (Provider::Anthropic, args.anthropic_url.clone()),
        (Provider::OpenAi, args.openai_url.clone()),
        (Provider::Google, args.google_url.clone()),
    ] {
        if let Some(url) = url {
            provider = provider.with_base_url(p, url);
        }
    }
    apply_overrides(&mut config, args);
    config.validate()?;

    if config.models.is_empty() {
        bail!(
            "no models selected; pass --model or set `models` in {}",
            config_path.display()
        );
    }
    let templates = select_templates(&config)?;

    if let Some(dir) = &config.trace_dir {
        provider = provider.with_trace_dir(dir);
    }
    let mut connectors = config
        .models
        .iter()
        .map(|model| {
            connector_for(model, &provider, &config.cache_dir, prompt::SYSTEM_PROMPT)
                .with_context(|| format!("cannot set up model {}", model))
        })
        .collect::<Result<Vec<Box<dyn Connector>>>>()?;

    let mut runner = BenchmarkRunner::new(config)?;
    let outcome = runner.run(&mut connectors, &templates).await;

    for mode in ScoreMode::ALL {
        report::write_reports(runner.run_dir(), runner.stats(), mode)?;
    }
    report::print_summary(runner.stats(), ScoreMode::WeightedScoreK);
    println!("Results written to {}", runner.run_dir().display());

    outcome.context("benchmark aborted")
}

fn apply_overrides(config: &mut BenchConfig, args: RunArgs) {
    if !args.models.is_empty() {
        config.models = args.models;
    }
    if !args.projects.is_empty() {
        config.projects = args.projects;
    }
    if let Some(k) = args.k {
        config.k = k;
    }
    if let Some(t) = args.temperature {
        config.temperature = t;
    }
    if args.no_cache {
        config.use_cache = false;
    }
    if args.history {
        config.use_history = true;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(dir) = args.templates {
        config.templates_dir = dir;
    }
    if let Some(dir) = args.workspace {
        config.workspace_dir = dir;
    }
    if let Some(dir) = args.cache {
        config.cache_dir = dir;
    }
    if let Some(dir) = args.out {
        config.out_dir = dir;
    }
    if args.interactive {
        config.interactive = true;
    }
    if args.snapshots {
        config.snapshots = true;
    }
    if args.trace_dir.is_some() {
        config.trace_dir = args.trace_dir;
    }
}

fn select_templates(config: &BenchConfig) -> Result<Vec<ProjectTemplate>> {
    let dir = &config.templates_dir;
    if config.projects.is_empty() {
        let all = ProjectTemplate::list(dir)
            .with_context(|| format!("cannot list templates in {}", dir.display()))?;
        if all.is_empty() {
            bail!("no project templates in {}", dir.display());
        }
        return Ok(all);
    }
    config
        .projects
        .iter()
        .map(|name| {
            ProjectTemplate::load(dir, name).with_context(|| format!("cannot load project {}", name))
        })
        .collect()
}
