//! The attempt / verify / score loop.
//!
//! For every model and every project the runner resets the shared workspace
//! from the template, then walks the requirements in order. Each requirement
//! gets up to `k` attempts: prompt the model, apply its answer, run the test
//! oracle. A requirement that never passes ends the project for that model,
//! since later requirements build on it.

use crate::config::{BenchConfig, PromptMode};
use crate::confirm::{Confirm, NoConfirm, StdinConfirm};
use crate::error::BenchError;
use crate::oracle::{CommandOracle, PatchCommand, Patcher, TestOracle};
use crate::parse;
use crate::prompt;
use crate::report::STATS_FILE;
use crate::template::ProjectTemplate;
use frbench_connect::{Connector, PromptRequest};
use frbench_core::serialize::write_json_file;
use frbench_core::{BenchmarkStats, ModelCost, ProjectStats, RequirementStats};
use frbench_store::{StoreError, Workspace};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct BenchmarkRunner {
    config: BenchConfig,
    workspace: Workspace,
    oracle: Box<dyn TestOracle>,
    patcher: Box<dyn Patcher>,
    confirm: Box<dyn Confirm>,
    stats: BenchmarkStats,
    run_dir: PathBuf,
}

impl BenchmarkRunner {
    /// Runner with the command-line tools named in `config`.
    pub fn new(config: BenchConfig) -> Result<Self, BenchError> {
        config.validate()?;
        let oracle = CommandOracle::from_argv(&config.oracle)?;
        let confirm: Box<dyn Confirm> = if config.interactive {
            Box::new(StdinConfirm)
        } else {
            Box::new(NoConfirm)
        };
        let stats = BenchmarkStats::new();
        let run_dir = config.out_dir.join(&stats.timestamp);

        Ok(Self {
            workspace: Workspace::new(&config.workspace_dir),
            oracle: Box::new(oracle),
            patcher: Box::new(PatchCommand::default()),
            confirm,
            stats,
            run_dir,
            config,
        })
    }

    pub fn with_oracle(mut self, oracle: Box<dyn TestOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_patcher(mut self, patcher: Box<dyn Patcher>) -> Self {
        self.patcher = patcher;
        self
    }

    pub fn with_confirm(mut self, confirm: Box<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn stats(&self) -> &BenchmarkStats {
        &self.stats
    }

    pub fn into_stats(self) -> BenchmarkStats {
        self.stats
    }

    /// `<out_dir>/<timestamp>`, where `stats.json` is kept up to date.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Run every connector against every project, strictly in sequence.
    ///
    /// Stats are written after each (model, project) pair. A fatal error
    /// aborts the run after persisting what was collected so far; any other
    /// error only stops the current pair.
    pub async fn run(
        &mut self,
        connectors: &mut [Box<dyn Connector>],
        templates: &[ProjectTemplate],
    ) -> Result<(), BenchError> {
        info!(
            models = connectors.len(),
            projects = templates.len(),
            k = self.config.k,
            run_dir = %self.run_dir.display(),
            "starting benchmark"
        );

        for connector in connectors.iter_mut() {
            let model = connector.model_name().to_string();
            for template in templates {
                let project = template.dir_name.as_str();
                let mut project_stats = ProjectStats::with_max_scores(template.project.max_scores());
                let outcome = self
                    .run_project(connector.as_mut(), template, &mut project_stats)
                    .await;

                info!(
                    model = %model,
                    project,
                    completed = project_stats.completed_count(),
                    requirements = project_stats.requirements.len(),
                    "project finished"
                );
                self.stats.record(&model, project, project_stats);
                self.persist()?;

                match outcome {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        error!(model = %model, project, error = %e, "aborting benchmark");
                        return Err(e);
                    }
                    Err(e) => {
                        error!(model = %model, project, error = %e, "project stopped early");
                    }
                }

                if self.config.snapshots {
                    let dest = self.run_dir.join("snapshots").join(&model).join(project);
                    self.workspace.copy_to(&dest)?;
                }
            }
        }
        Ok(())
    }

    /// Run all requirements of one project for one model, filling `stats`.
    pub async fn run_project(
        &mut self,
        connector: &mut dyn Connector,
        template: &ProjectTemplate,
        stats: &mut ProjectStats,
    ) -> Result<(), BenchError> {
        let model = connector.model_name().to_string();
        let project = template.dir_name.as_str();

        self.workspace.reset_from(template.init_dir())?;

        for (index, requirement) in template.requirements().iter().enumerate() {
            let number = index + 1;
            info!(model = %model, project, requirement = number, name = %requirement.name, "requirement");

            self.workspace
                .install_tests(template.reference_dir(), number, template.project.kind)?;
            if self.oracle.run(self.workspace.root())?.passed {
                return Err(BenchError::AlreadyPassing {
                    project: project.to_string(),
                    requirement: number,
                });
            }

            let Some(req_stats) = stats.requirements.get_mut(index) else {
                return Err(BenchError::Setup(format!(
                    "no stats slot for requirement {} of {}",
                    number, project
                )));
            };
            let completed = self
                .run_requirement(connector, template, index, req_stats)
                .await?;
            if !completed {
                warn!(
                    model = %model,
                    project,
                    requirement = number,
                    attempts = self.config.k,
                    "requirement not completed, skipping the rest of the project"
                );
                break;
            }
        }
        Ok(())
    }

    async fn run_requirement(
        &mut self,
        connector: &mut dyn Connector,
        template: &ProjectTemplate,
        index: usize,
        stats: &mut RequirementStats,
    ) -> Result<bool, BenchError> {
        let number = index + 1;
        let requirement = &template.requirements()[index];
        let image = template.image(index)?;
        let codebase = self.workspace.load_codebase()?;
        let prompt = prompt::build(self.config.mode, &requirement.description, &codebase);
        let snapshot = self.workspace.snapshot()?;
        let pricing = connector.cost();

        while stats.attempts < self.config.k {
            let attempt = stats.begin_attempt();
            let request = PromptRequest::user(prompt.clone(), number, self.config.temperature)
                .with_image(image.clone())
                .with_cache(self.config.use_cache)
                .with_history(self.config.use_history);

            match self.attempt(connector, &request, &pricing, stats).await {
                Ok(true) => {
                    stats.complete();
                    info!(requirement = number, attempt, "requirement completed");
                    return Ok(true);
                }
                Ok(false) => {
                    warn!(requirement = number, attempt, "tests failed");
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(requirement = number, attempt, error = %e, "attempt failed");
                }
            }

            self.workspace.restore(&snapshot)?;
            if stats.attempts < self.config.k {
                self.confirm
                    .wait(&format!("requirement {} attempt {} failed", number, attempt))?;
            }
        }
        Ok(false)
    }

    /// One prompt / apply / verify cycle. `Ok(false)` means the tests ran
    /// and failed.
    async fn attempt(
        &mut self,
        connector: &mut dyn Connector,
        request: &PromptRequest,
        pricing: &ModelCost,
        stats: &mut RequirementStats,
    ) -> Result<bool, BenchError> {
        let result = connector.send_prompt(request).await?;
        if !result.cache_hit {
            stats.accrue(result.cost(pricing), result.latency);
        }

        let verdict = self.apply_and_verify(&result.content);
        let passed = matches!(verdict, Ok(true));

        if passed && !result.cache_hit {
            if let Err(e) = connector.cache_response(&result.cache_key, &result.raw) {
                warn!(cache_key = %result.cache_key.short(), error = %e, "failed to cache response");
            }
        }
        if !passed && result.cache_hit && !matches!(&verdict, Err(e) if e.is_fatal()) {
            warn!(cache_key = %result.cache_key.short(), "cached answer failed verification, invalidating");
            if let Err(e) = connector.invalidate_cached(&result.cache_key) {
                warn!(cache_key = %result.cache_key.short(), error = %e, "failed to invalidate cache entry");
            }
        }
        verdict
    }

    fn apply_and_verify(&mut self, content: &str) -> Result<bool, BenchError> {
        match self.config.mode {
            PromptMode::Write => {
                let files = parse::parse_files(content)?;
                debug!(files = files.len(), "writing model output");
                self.workspace.write_files(&files).map_err(|e| match e {
                    StoreError::UnsafePath(p) => BenchError::Parse(format!("unsafe path in output: {}", p)),
                    other => other.into(),
                })?;
            }
            PromptMode::Patch => {
                let patch = parse::clean_patch(content)?;
                debug!(bytes = patch.len(), "applying model patch");
                self.patcher.apply(self.workspace.root(), &patch)?;
            }
        }

        let outcome = self.oracle.run(self.workspace.root())?;
        if !outcome.passed {
            debug!(output = %outcome.output, "test output");
        }
        Ok(outcome.passed)
    }

    fn persist(&self) -> Result<(), BenchError> {
        write_json_file(self.run_dir.join(STATS_FILE), &self.stats)?;
        Ok(())
    }
}
