//! CLI definition, tracing setup, run handler, and exit-code mapping.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{CommandFactory, Parser};
use color_eyre::eyre::{Report, Result, eyre};
use tracing::info;

use bookpipe_core::pipeline::{
    PipelineConfig, PipelineReport, ProgressReporter, RunOptions, run_pipeline,
};
use bookpipe_core::runner::{ProcessExecutor, StageInvocation};
use bookpipe_shared::{BookJob, BookPipeError, ChapterSelection, StepId, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookpipe: turn a PDF book into a translated, narrated website.
#[derive(Parser)]
#[command(
    name = "bookpipe",
    version,
    about = "Run the extract → preprocess → translate → summarize → audio → website pipeline for one book.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Path to the source PDF.
    pub pdf_path: PathBuf,

    /// Short identifier used as the book's directory name.
    pub book_slug: String,

    /// Display title for the generated website.
    pub book_title: String,

    /// Leave the audio stage out of the run entirely.
    #[arg(long)]
    pub skip_audio: bool,

    /// Front-matter pages the extract stage skips [default: 10].
    #[arg(long, value_name = "N")]
    pub skip_pages: Option<u32>,

    /// Process at most N chapters in preprocess, translate and summarize.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_chapters: Option<u32>,

    /// Run only this step; the others are reported as skipped.
    #[arg(
        long,
        value_name = "NAME",
        value_parser = PossibleValuesParser::new(StepId::NAMES)
            .try_map(|name| name.parse::<StepId>()),
    )]
    pub step: Option<StepId>,

    /// Chapters to narrate in the audio stage, e.g. "1-5" or "1,3,5".
    #[arg(long, value_name = "SPEC")]
    pub audio_chapters: Option<ChapterSelection>,

    /// Print each stage's command line instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Config file (defaults to ./bookpipe.toml, then ~/.bookpipe/bookpipe.toml).
    #[arg(long, value_name = "PATH", env = "BOOKPIPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr; stdout carries the step banners and the stages' own
/// output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bookpipe=warn",
        1 => "bookpipe=info",
        2 => "bookpipe=debug",
        _ => "bookpipe=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Print a clap error and map it to an exit code: 0 for `--help` and
/// `--version`, 1 for everything else.
pub(crate) fn parse_failure(err: &clap::Error) -> ExitCode {
    let _ = err.print();
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Print a run error and map it to an exit code.
pub(crate) fn run_failure(report: &Report) -> ExitCode {
    eprintln!("Error: {report:?}");

    if let Some(BookPipeError::Usage { .. }) = report.downcast_ref::<BookPipeError>() {
        eprintln!();
        eprintln!("{}", Cli::command().render_usage());
    }

    u8::try_from(failure_code(report)).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Stage failures exit with the stage's own code; anything else with 1.
fn failure_code(report: &Report) -> i32 {
    report
        .downcast_ref::<BookPipeError>()
        .map_or(1, BookPipeError::exit_code)
}

// ---------------------------------------------------------------------------
// Run handler
// ---------------------------------------------------------------------------

/// Run the pipeline for the book named on the command line.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let job = BookJob::new(&cli.pdf_path, &cli.book_slug, &cli.book_title)?;

    let cwd = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;

    let app_config = load_config(cli.config.as_deref(), &cwd)?;
    let config = PipelineConfig::from_app_config(&app_config, &cwd);

    let options = RunOptions {
        skip_audio: cli.skip_audio,
        skip_pages: cli.skip_pages.unwrap_or(app_config.defaults.skip_pages),
        max_chapters: cli.max_chapters,
        step: cli.step,
        audio_chapters: cli.audio_chapters,
        dry_run: cli.dry_run,
    };

    info!(
        pdf = %job.pdf_path.display(),
        slug = %job.slug,
        title = %job.title,
        "processing book"
    );

    let reporter = CliProgress;
    let result = run_pipeline(&config, &job, &options, &ProcessExecutor, &reporter).await;

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            if let Some(step) = err.step() {
                println!();
                println!("  Pipeline stopped at the {step} step.");
                println!(
                    "  Resume with: bookpipe {} {} '{}' --step {step}",
                    job.pdf_path.display(),
                    job.slug,
                    job.title
                );
                println!();
            }
            return Err(err.into());
        }
    };

    print_summary(&job, &report, &options, &cwd);
    Ok(())
}

fn print_summary(job: &BookJob, report: &PipelineReport, options: &RunOptions, cwd: &Path) {
    let rel = |p: &Path| p.strip_prefix(cwd).unwrap_or(p).display().to_string();
    let paths = &report.paths;

    println!();
    if options.dry_run {
        println!("  Dry run complete, no stage was executed.");
    } else {
        println!("  Book pipeline complete!");
    }
    println!("  Book:         {} ({})", job.title, job.slug);
    println!("  Chapters:     {}", rel(&paths.chapters));
    println!("  Processed:    {}", rel(&paths.processed));
    println!("  Translations: {}", rel(&paths.translations));
    println!("  Summaries:    {}", rel(&paths.summaries));
    if options.skip_audio {
        println!("  Audio:        (skipped)");
    } else {
        println!("  Audio:        {}", rel(&paths.audio));
    }
    println!("  Website:      {}", rel(&paths.site));
    println!("  Time:         {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Prints a banner per step to stdout.
struct CliProgress;

fn position(step: StepId) -> usize {
    StepId::ALL.iter().position(|s| *s == step).map_or(0, |i| i + 1)
}

impl ProgressReporter for CliProgress {
    fn step_started(&self, invocation: &StageInvocation) {
        let step = invocation.step;
        println!();
        println!("==> [{}/{}] {step}", position(step), StepId::ALL.len());
        println!("    {}", invocation.command_line());
    }

    fn step_skipped(&self, step: StepId) {
        println!("--- [{}/{}] {step} (skipped)", position(step), StepId::ALL.len());
    }

    fn step_planned(&self, invocation: &StageInvocation) {
        let step = invocation.step;
        println!("==> [{}/{}] {step} (dry run)", position(step), StepId::ALL.len());
        println!("    {}", invocation.command_line());
    }

    fn step_finished(&self, step: StepId, elapsed: Duration) {
        println!("<== {step} done in {:.1}s", elapsed.as_secs_f64());
    }

    fn done(&self, report: &PipelineReport) {
        println!();
        println!(
            "  Steps run: {}, skipped: {}",
            report.completed.len(),
            report.skipped.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positionals_with_defaults() {
        let cli = Cli::try_parse_from(["bookpipe", "book.pdf", "my-book", "My Book"]).unwrap();
        assert_eq!(cli.pdf_path, PathBuf::from("book.pdf"));
        assert_eq!(cli.book_slug, "my-book");
        assert_eq!(cli.book_title, "My Book");
        assert!(!cli.skip_audio);
        assert_eq!(cli.skip_pages, None);
        assert_eq!(cli.max_chapters, None);
        assert_eq!(cli.step, None);
        assert!(!cli.dry_run);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "bookpipe",
            "book.pdf",
            "my-book",
            "My Book",
            "--skip-audio",
            "--skip-pages",
            "3",
            "--max-chapters",
            "2",
            "--step",
            "translate",
            "--audio-chapters",
            "1,4",
            "--dry-run",
        ])
        .unwrap();
        assert!(cli.skip_audio);
        assert_eq!(cli.skip_pages, Some(3));
        assert_eq!(cli.max_chapters, Some(2));
        assert_eq!(cli.step, Some(StepId::Translate));
        assert_eq!(cli.audio_chapters, Some(ChapterSelection::List(vec![1, 4])));
        assert!(cli.dry_run);
    }

    #[test]
    fn missing_positionals_is_error() {
        let err = Cli::try_parse_from(["bookpipe", "book.pdf", "my-book"])
            .err()
            .expect("should fail");
        assert!(err.use_stderr());
    }

    #[test]
    fn unknown_flag_is_error() {
        let result = Cli::try_parse_from(["bookpipe", "a.pdf", "a", "A", "--fast"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_step_is_error() {
        let result = Cli::try_parse_from(["bookpipe", "a.pdf", "a", "A", "--step", "publish"]);
        assert!(result.is_err());
    }

    #[test]
    fn numeric_flags_are_checked() {
        for args in [
            ["--skip-pages", "-1"],
            ["--skip-pages", "ten"],
            ["--max-chapters", "0"],
        ] {
            let mut argv = vec!["bookpipe", "a.pdf", "a", "A"];
            argv.extend(args);
            assert!(Cli::try_parse_from(argv).is_err(), "{args:?}");
        }
    }

    #[test]
    fn stage_exit_code_is_propagated() {
        let report: Report = BookPipeError::StageFailed {
            step: StepId::Summarize,
            code: 9,
        }
        .into();
        assert_eq!(failure_code(&report), 9);

        let report: Report = BookPipeError::validation("PDF file not found").into();
        assert_eq!(failure_code(&report), 1);

        assert_eq!(failure_code(&eyre!("cannot determine working directory")), 1);
    }

    #[test]
    fn step_positions() {
        assert_eq!(position(StepId::Extract), 1);
        assert_eq!(position(StepId::Website), 6);
    }
}
