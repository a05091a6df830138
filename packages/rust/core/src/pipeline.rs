//! End-to-end book pipeline: PDF → chapters → processed → translations →
//! summaries → audio → website.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use bookpipe_shared::{
    AppConfig, BookJob, BookPaths, BookPipeError, ChapterSelection, Result, ScriptsConfig, StepId,
    StepSet,
};

use crate::layout;
use crate::runner::{StageExecutor, StageInvocation, StepOutcome, StepRunner};

/// Resolved launch settings for a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the stages run in; relative paths are resolved against it.
    pub working_dir: PathBuf,
    /// Root for per-book work directories.
    pub output_root: PathBuf,
    /// Root for generated sites.
    pub docs_root: PathBuf,
    /// Program that runs each stage script.
    pub interpreter: String,
    /// Directory holding the stage scripts.
    pub scripts_dir: PathBuf,
    /// Script file name per stage.
    pub scripts: ScriptsConfig,
}

impl PipelineConfig {
    /// Resolve the file config against `working_dir`.
    pub fn from_app_config(config: &AppConfig, working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            output_root: working_dir.join(&config.paths.output_root),
            docs_root: working_dir.join(&config.paths.docs_root),
            interpreter: config.runtime.interpreter.clone(),
            scripts_dir: config.runtime.scripts_dir.clone(),
            scripts: config.scripts.clone(),
        }
    }

    fn script(&self, step: StepId) -> PathBuf {
        self.scripts_dir.join(self.scripts.for_step(step))
    }

    fn invocation(&self, step: StepId) -> StageInvocation {
        StageInvocation::new(step, &self.interpreter, &self.working_dir).arg(self.script(step))
    }
}

/// Per-run flags.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Drop the audio stage from the plan.
    pub skip_audio: bool,
    /// Front-matter pages the extract stage skips.
    pub skip_pages: u32,
    /// Upper bound on chapters for preprocess/translate/summarize.
    pub max_chapters: Option<u32>,
    /// Single-step mode.
    pub step: Option<StepId>,
    /// Chapter filter for the audio stage.
    pub audio_chapters: Option<ChapterSelection>,
    /// Print the plan instead of executing it.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            skip_audio: false,
            skip_pages: 10,
            max_chapters: None,
            step: None,
            audio_chapters: None,
            dry_run: false,
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    pub paths: BookPaths,
    /// Steps that ran to completion.
    pub completed: Vec<StepId>,
    /// Steps left out by single-step mode.
    pub skipped: Vec<StepId>,
    /// Steps printed but not run (dry run).
    pub planned: Vec<StepId>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called right before a stage process is started.
    fn step_started(&self, invocation: &StageInvocation);
    /// Called when a step is not selected.
    fn step_skipped(&self, step: StepId);
    /// Called instead of `step_started` on a dry run.
    fn step_planned(&self, invocation: &StageInvocation);
    /// Called after a stage exits successfully.
    fn step_finished(&self, step: StepId, elapsed: Duration);
    /// Called when the pipeline completes.
    fn done(&self, report: &PipelineReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn step_started(&self, _invocation: &StageInvocation) {}
    fn step_skipped(&self, _step: StepId) {}
    fn step_planned(&self, _invocation: &StageInvocation) {}
    fn step_finished(&self, _step: StepId, _elapsed: Duration) {}
    fn done(&self, _report: &PipelineReport) {}
}

/// Build the ordered stage command lines for a book.
///
/// Each stage reads the previous stage's directory and writes its own. The
/// audio stage is left out entirely when `skip_audio` is set.
pub fn build_plan(
    config: &PipelineConfig,
    job: &BookJob,
    options: &RunOptions,
    paths: &BookPaths,
) -> Vec<StageInvocation> {
    let pdf_path = config.working_dir.join(&job.pdf_path);
    let max = options.max_chapters;

    let mut plan = vec![
        config
            .invocation(StepId::Extract)
            .arg(&pdf_path)
            .arg(&paths.chapters)
            .arg("--skip-pages")
            .arg(options.skip_pages.to_string()),
        config
            .invocation(StepId::Preprocess)
            .arg(&paths.chapters)
            .arg(&paths.processed)
            .opt_arg("--max", max),
        config
            .invocation(StepId::Translate)
            .arg(&paths.processed)
            .arg(&paths.translations)
            .opt_arg("--max", max),
        config
            .invocation(StepId::Summarize)
            .arg(&paths.translations)
            .arg(&paths.summaries)
            .opt_arg("--max", max),
    ];

    if !options.skip_audio {
        plan.push(
            config
                .invocation(StepId::Audio)
                .arg(&paths.translations)
                .arg(&paths.audio)
                .opt_arg("--chapters", options.audio_chapters.as_ref()),
        );
    }

    plan.push(
        config
            .invocation(StepId::Website)
            .arg(&job.slug)
            .arg(&job.title)
            .arg("--output-base")
            .arg(&config.output_root)
            .arg("--docs-base")
            .arg(&config.docs_root),
    );

    plan
}

/// Run the full pipeline for one book.
///
/// 1. Check the input PDF exists
/// 2. Create the work directories
/// 3. Run each selected stage in order, stopping at the first failure
#[instrument(skip_all, fields(slug = %job.slug))]
pub async fn run_pipeline<E: StageExecutor>(
    config: &PipelineConfig,
    job: &BookJob,
    options: &RunOptions,
    executor: &E,
    progress: &dyn ProgressReporter,
) -> Result<PipelineReport> {
    let start = Instant::now();

    ensure_input(&config.working_dir.join(&job.pdf_path))?;

    let paths = BookPaths::new(&config.output_root, &config.docs_root, &job.slug);
    layout::materialize(&paths)?;

    let plan = build_plan(config, job, options, &paths);
    if let Some(step) = options.step {
        if !plan.iter().any(|inv| inv.step == step) {
            warn!(%step, "selected step is disabled for this run, nothing will execute");
        }
    }

    info!(
        title = %job.title,
        steps = plan.len(),
        single_step = options.step.map(|s| s.as_str()),
        dry_run = options.dry_run,
        "starting book pipeline"
    );

    let selected = StepSet::from_single(options.step);
    let runner = StepRunner::new(&selected, executor, progress, options.dry_run);

    let mut completed = Vec::new();
    let mut skipped = Vec::new();
    let mut planned = Vec::new();

    for invocation in &plan {
        match runner.run(invocation).await? {
            StepOutcome::Completed => completed.push(invocation.step),
            StepOutcome::Skipped => skipped.push(invocation.step),
            StepOutcome::Planned => planned.push(invocation.step),
        }
    }

    let report = PipelineReport {
        paths,
        completed,
        skipped,
        planned,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        completed = report.completed.len(),
        skipped = report.skipped.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "book pipeline complete"
    );

    Ok(report)
}

fn ensure_input(pdf_path: &Path) -> Result<()> {
    if pdf_path.is_file() {
        Ok(())
    } else {
        Err(BookPipeError::validation(format!(
            "PDF file not found: {}",
            pdf_path.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
