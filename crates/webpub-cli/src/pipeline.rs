//! The compile pipeline: resolve → clean → manifest → build → templates → publish.
//!
//! Stages run strictly one after another and the first failure ends the run.
//! Nothing is retried or rolled back; a rerun starts from a clean slate
//! because cleaning and the manifest rewrite are idempotent.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use webpub_build::{
    BuildError, BuildInvoker, BuildSummary, Bundler, CleanError, RelocateError, TemplateRelocator,
    clean_workspace,
};
use webpub_core::{BundleConfig, Environment, ProcessDescriptor, Settings};
use webpub_deploy::{AssetPublisher, PublishError, PublishResult, Publisher};

/// Values taken from the process environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct PipelineInputs {
    /// Raw `NODE_ENV`
    pub environment: Option<String>,
    /// Raw `npm_package_name`
    pub package_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Resolving,
    Cleaning,
    RewritingManifest,
    Building,
    RelocatingTemplates,
    Publishing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolving => "resolving configuration",
            Self::Cleaning => "cleaning",
            Self::RewritingManifest => "rewriting process descriptor",
            Self::Building => "building",
            Self::RelocatingTemplates => "relocating templates",
            Self::Publishing => "publishing",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Everything the Resolving stage determines before any side effect.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub environment: Environment,
    pub bundle: BundleConfig,
    pub views_dir: PathBuf,
    pub process_path: PathBuf,
    pub descriptor: ProcessDescriptor,
    pub package_name: String,
}

impl Plan {
    pub fn resolve(
        root: &Path,
        settings: &Settings,
        inputs: &PipelineInputs,
    ) -> webpub_core::Result<Self> {
        let environment = Environment::resolve(inputs.environment.as_deref());
        let bundle = BundleConfig::load(root, settings, &environment)?;
        let process_path = settings.process_path(root);
        let descriptor = ProcessDescriptor::load(&process_path)?;
        let package_name = webpub_core::package_name(root, inputs.package_name.as_deref())?;

        Ok(Self {
            environment,
            bundle,
            views_dir: settings.views_dir(root),
            process_path,
            descriptor,
            package_name,
        })
    }
}

/// Summary of a successful run.
#[derive(Debug)]
pub(crate) struct PipelineReport {
    pub environment: Environment,
    pub renamed_processes: usize,
    pub build: BuildSummary,
    pub templates_moved: usize,
    pub published: Option<PublishResult>,
    pub elapsed: Duration,
    pub history: Vec<Stage>,
}

/// Failure classes an operator acts on differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    ConfigNotFound,
    InvalidConfig,
    Filesystem,
    Build,
    Publish,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    #[error(transparent)]
    Core(#[from] webpub_core::Error),

    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Relocate(#[from] RelocateError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(webpub_core::Error::ConfigNotFound { .. }) => ErrorKind::ConfigNotFound,
            Self::Core(e) if e.is_filesystem() => ErrorKind::Filesystem,
            Self::Core(_) => ErrorKind::InvalidConfig,
            Self::Clean(_) | Self::Relocate(_) => ErrorKind::Filesystem,
            Self::Build(_) => ErrorKind::Build,
            Self::Publish(_) => ErrorKind::Publish,
        }
    }
}

/// A run that ended in [`Stage::Failed`].
#[derive(Debug, thiserror::Error)]
#[error("compile failed while {stage}")]
pub(crate) struct StageFailure {
    /// Stage that failed
    pub stage: Stage,
    /// Every stage entered, ending with [`Stage::Failed`]
    pub history: Vec<Stage>,
    #[source]
    pub error: PipelineError,
}

pub(crate) struct Pipeline<B: Bundler, P: Publisher> {
    root: PathBuf,
    settings: Settings,
    invoker: BuildInvoker<B>,
    publisher: AssetPublisher<P>,
}

impl<B: Bundler, P: Publisher> Pipeline<B, P> {
    pub fn new(root: impl Into<PathBuf>, settings: Settings, bundler: B, publisher: P) -> Self {
        let imagemin = settings.publish.imagemin;
        Self {
            root: root.into(),
            settings,
            invoker: BuildInvoker::new(bundler),
            publisher: AssetPublisher::new(publisher, imagemin),
        }
    }

    /// Run every stage to completion or to the first failure.
    pub async fn run(&self, inputs: &PipelineInputs) -> Result<PipelineReport, StageFailure> {
        let started = Instant::now();
        let mut history = Vec::new();

        match self.execute(inputs, &mut history).await {
            Ok(mut report) => {
                history.push(Stage::Done);
                report.elapsed = started.elapsed();
                report.history = history;
                Ok(report)
            }
            Err(error) => {
                let stage = history.last().copied().unwrap_or(Stage::Resolving);
                history.push(Stage::Failed);
                tracing::debug!(%stage, kind = ?error.kind(), "pipeline failed");
                Err(StageFailure {
                    stage,
                    history,
                    error,
                })
            }
        }
    }

    async fn execute(
        &self,
        inputs: &PipelineInputs,
        history: &mut Vec<Stage>,
    ) -> Result<PipelineReport, PipelineError> {
        enter(history, Stage::Resolving);
        let plan = Plan::resolve(&self.root, &self.settings, inputs)?;
        println!("using {} config", plan.environment);

        enter(history, Stage::Cleaning);
        println!("clean views and build path");
        clean_workspace(&plan.views_dir, &plan.bundle.output_path).await?;

        enter(history, Stage::RewritingManifest);
        println!("update {}", self.settings.paths.process.display());
        let mut descriptor = plan.descriptor.clone();
        let renamed_processes = descriptor.prefix_names(&plan.package_name);
        descriptor.save(&plan.process_path)?;

        enter(history, Stage::Building);
        println!("bundler building...");
        let build = self.invoker.run(&plan.bundle).await?;
        println!("bundler build success in {} s", build.elapsed_secs());

        enter(history, Stage::RelocatingTemplates);
        println!("move views template");
        let templates_moved = TemplateRelocator::new(
            &plan.bundle.output_path,
            &plan.views_dir,
            &self.settings.templates,
        )
        .relocate()
        .await?;

        enter(history, Stage::Publishing);
        if plan.environment.is_published() {
            println!("publishing static assets...");
        }
        let published = self
            .publisher
            .publish(
                &plan.environment,
                &plan.bundle.output_path,
                plan.bundle.public_path.as_deref(),
            )
            .await?;
        if published.is_some() {
            println!("publish success");
        }

        Ok(PipelineReport {
            environment: plan.environment,
            renamed_processes,
            build,
            templates_moved,
            published,
            elapsed: Duration::ZERO,
            history: Vec::new(),
        })
    }
}

fn enter(history: &mut Vec<Stage>, stage: Stage) {
    tracing::debug!(%stage, "entering stage");
    history.push(stage);
}
