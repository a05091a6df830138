//! Core domain types for a book pipeline run.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BookPipeError, Result};

// ---------------------------------------------------------------------------
// StepId
// ---------------------------------------------------------------------------

/// One of the six pipeline stages, in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepId {
    Extract,
    Preprocess,
    Translate,
    Summarize,
    Audio,
    Website,
}

impl StepId {
    /// All steps in execution order.
    pub const ALL: [StepId; 6] = [
        Self::Extract,
        Self::Preprocess,
        Self::Translate,
        Self::Summarize,
        Self::Audio,
        Self::Website,
    ];

    /// Lowercase names accepted on the command line, in execution order.
    pub const NAMES: [&'static str; 6] = [
        "extract",
        "preprocess",
        "translate",
        "summarize",
        "audio",
        "website",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Preprocess => "preprocess",
            Self::Translate => "translate",
            Self::Summarize => "summarize",
            Self::Audio => "audio",
            Self::Website => "website",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = BookPipeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| {
                BookPipeError::usage(format!(
                    "unknown step '{s}': expected one of {}",
                    Self::NAMES.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// StepSet
// ---------------------------------------------------------------------------

/// The set of steps selected to execute in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSet(BTreeSet<StepId>);

impl StepSet {
    /// Every step selected.
    pub fn all() -> Self {
        Self(StepId::ALL.into_iter().collect())
    }

    /// Only `step` selected (single-step mode).
    pub fn only(step: StepId) -> Self {
        Self(BTreeSet::from([step]))
    }

    /// `all()` when `step` is `None`, `only(step)` otherwise.
    pub fn from_single(step: Option<StepId>) -> Self {
        step.map_or_else(Self::all, Self::only)
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.0.contains(&step)
    }

    pub fn iter(&self) -> impl Iterator<Item = StepId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StepSet {
    fn default() -> Self {
        Self::all()
    }
}

// ---------------------------------------------------------------------------
// ChapterSelection
// ---------------------------------------------------------------------------

/// Chapter filter forwarded to the audio stage as `--chapters`.
///
/// Accepts an inclusive range (`1-5`) or a comma list (`1,3,5`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterSelection {
    Range { start: u32, end: u32 },
    List(Vec<u32>),
}

impl fmt::Display for ChapterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { start, end } => write!(f, "{start}-{end}"),
            Self::List(chapters) => {
                let joined: Vec<String> = chapters.iter().map(u32::to_string).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl FromStr for ChapterSelection {
    type Err = BookPipeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parse_num = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| {
                BookPipeError::usage(format!(
                    "invalid chapter selection '{s}': expected e.g. \"1-5\" or \"1,3,5\""
                ))
            })
        };

        if let Some((start, end)) = s.split_once('-') {
            let start = parse_num(start)?;
            let end = parse_num(end)?;
            if start > end {
                return Err(BookPipeError::usage(format!(
                    "invalid chapter range '{s}': start is after end"
                )));
            }
            return Ok(Self::Range { start, end });
        }

        let chapters = s.split(',').map(parse_num).collect::<Result<Vec<_>>>()?;
        Ok(Self::List(chapters))
    }
}

// ---------------------------------------------------------------------------
// BookJob
// ---------------------------------------------------------------------------

/// A single book to push through the pipeline.
#[derive(Debug, Clone)]
pub struct BookJob {
    /// Source PDF.
    pub pdf_path: PathBuf,
    /// Short identifier, used as a path segment under the output roots.
    pub slug: String,
    /// Display title handed to the website stage.
    pub title: String,
}

impl BookJob {
    /// Build a job, rejecting empty values and slugs that are not a single
    /// path segment.
    pub fn new(
        pdf_path: impl Into<PathBuf>,
        slug: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self> {
        let slug = slug.into();
        let title = title.into();

        if slug.trim().is_empty() {
            return Err(BookPipeError::usage("book slug must not be empty"));
        }
        if slug == "." || slug == ".." || slug.contains(['/', '\\']) {
            return Err(BookPipeError::usage(format!(
                "book slug '{slug}' must be a single directory name"
            )));
        }
        if title.trim().is_empty() {
            return Err(BookPipeError::usage("book title must not be empty"));
        }

        Ok(Self {
            pdf_path: pdf_path.into(),
            slug,
            title,
        })
    }
}

// ---------------------------------------------------------------------------
// BookPaths
// ---------------------------------------------------------------------------

/// Per-book directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPaths {
    /// `<output_root>/<slug>`
    pub root: PathBuf,
    pub chapters: PathBuf,
    pub processed: PathBuf,
    pub translations: PathBuf,
    pub summaries: PathBuf,
    pub audio: PathBuf,
    /// `<docs_root>/<slug>`, written by the website stage.
    pub site: PathBuf,
}

impl BookPaths {
    pub fn new(output_root: &Path, docs_root: &Path, slug: &str) -> Self {
        let root = output_root.join(slug);
        Self {
            chapters: root.join("chapters"),
            processed: root.join("processed"),
            translations: root.join("translations"),
            summaries: root.join("summaries"),
            audio: root.join("audio"),
            site: docs_root.join(slug),
            root,
        }
    }

    /// The five stage work directories, in pipeline order.
    pub fn work_dirs(&self) -> [&Path; 5] {
        [
            &self.chapters,
            &self.processed,
            &self.translations,
            &self.summaries,
            &self.audio,
        ]
    }
}
