//! End-to-end search: reference, walk, compare, collect

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use sm_cad::GeometryKernel;

use crate::cancel::CancelToken;
use crate::compare::{Deviation, SimilarityComparator, ToleranceConfig};
use crate::descriptor::ShapeDescriptor;
use crate::error::SearchError;
use crate::options::SearchOptions;
use crate::walk::BoundedTreeWalker;

/// Where a search run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    Init,
    ReferenceLoaded,
    Walking,
    Done,
    Failed,
}

/// Inputs of one search run
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Reference model (usually an STL export)
    pub reference: PathBuf,
    /// Root of the tree to search
    pub directory: PathBuf,
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(reference: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            directory: directory.into(),
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

/// A candidate that matched the reference
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub path: PathBuf,
    pub descriptor: ShapeDescriptor,
    pub deviation: Deviation,
}

/// A file or directory the search had to pass over
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a completed (or cancelled) search
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Descriptor of the reference model
    pub reference: ShapeDescriptor,
    /// Matches in traversal order
    pub matches: Vec<CandidateMatch>,
    /// Candidates the walk yielded and the search attempted
    pub scanned: usize,
    /// Candidates that failed to load or measure
    pub skipped: Vec<SkippedEntry>,
    /// Directories that could not be listed
    pub unreadable_dirs: Vec<SkippedEntry>,
    /// The run was stopped through its cancel token
    pub cancelled: bool,
}

impl MatchResult {
    fn new(reference: ShapeDescriptor) -> Self {
        Self {
            reference,
            matches: Vec::new(),
            scanned: 0,
            skipped: Vec::new(),
            unreadable_dirs: Vec::new(),
            cancelled: false,
        }
    }

    /// Matching paths in traversal order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.matches.iter().map(|m| m.path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    fn record(&mut self, path: PathBuf, outcome: Outcome) {
        self.scanned += 1;
        match outcome {
            Outcome::Matched(descriptor, deviation) => self.matches.push(CandidateMatch {
                path,
                descriptor,
                deviation,
            }),
            Outcome::Rejected => {}
            Outcome::Skipped(reason) => self.skipped.push(SkippedEntry { path, reason }),
        }
    }
}

/// Result of evaluating one candidate
enum Outcome {
    Matched(ShapeDescriptor, Deviation),
    Rejected,
    Skipped(String),
}

/// Runs searches against one geometry kernel
pub struct SearchOrchestrator<'k> {
    kernel: &'k dyn GeometryKernel,
    phase: SearchPhase,
    cancel: CancelToken,
}

impl<'k> SearchOrchestrator<'k> {
    pub fn new(kernel: &'k dyn GeometryKernel) -> Self {
        Self::with_cancel(kernel, CancelToken::new())
    }

    /// Create an orchestrator that stops when `cancel` is triggered
    pub fn with_cancel(kernel: &'k dyn GeometryKernel, cancel: CancelToken) -> Self {
        Self {
            kernel,
            phase: SearchPhase::Init,
            cancel,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn enter(&mut self, phase: SearchPhase) {
        tracing::info!("Search phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn fail(&mut self, error: SearchError) -> SearchError {
        tracing::error!("Search failed: {}", error);
        self.enter(SearchPhase::Failed);
        error
    }

    /// Run one search
    ///
    /// Fails only on invalid input or when the reference cannot be loaded,
    /// measured or used as a denominator. Candidate failures are recorded in
    /// [`MatchResult::skipped`].
    pub fn run(&mut self, request: &SearchRequest) -> Result<MatchResult, SearchError> {
        self.enter(SearchPhase::Init);

        let tolerance = validate(request).map_err(|e| self.fail(e))?;
        if !self.kernel.is_available() {
            tracing::warn!("Geometry kernel '{}' is not available", self.kernel.name());
        }

        let options = &request.options;
        let reference =
            ShapeDescriptor::extract(self.kernel, &request.reference, options.verbose_brep)
                .map_err(|e| self.fail(e))?;
        tracing::info!(
            "Reference {}: volume {:.6}, size ({:.4}, {:.4}, {:.4}), {} faces, {} shells",
            request.reference.display(),
            reference.volume,
            reference.size.x,
            reference.size.y,
            reference.size.z,
            reference.num_faces,
            reference.num_shells
        );
        self.enter(SearchPhase::ReferenceLoaded);

        let comparator = SimilarityComparator::new(reference, &request.reference, tolerance)
            .map_err(|e| self.fail(e))?;

        self.enter(SearchPhase::Walking);
        tracing::info!(
            "Searching {} (depth {}, tolerance {})",
            request.directory.display(),
            options.max_depth,
            tolerance.tolerance_percentage
        );

        let walker =
            BoundedTreeWalker::new(&request.directory, options.max_depth, &options.suffixes);
        let mut walk = walker.walk(self.cancel.clone());
        let reference_path = std::fs::canonicalize(&request.reference).ok();
        let is_reference = |path: &Path| {
            reference_path
                .as_ref()
                .is_some_and(|r| std::fs::canonicalize(path).is_ok_and(|p| &p == r))
        };

        let kernel = self.kernel;
        let verbose = options.verbose_brep;
        let mut result = MatchResult::new(comparator.reference().clone());

        if options.parallel {
            let candidates: Vec<PathBuf> = walk
                .by_ref()
                .filter(|p| !is_reference(p.as_path()))
                .collect();
            let cancel = &self.cancel;
            let outcomes: Vec<(PathBuf, Option<Outcome>)> = candidates
                .into_par_iter()
                .map(|path| {
                    let outcome = (!cancel.is_cancelled())
                        .then(|| evaluate(kernel, &comparator, &path, verbose));
                    (path, outcome)
                })
                .collect();
            for (path, outcome) in outcomes {
                if let Some(outcome) = outcome {
                    result.record(path, outcome);
                }
            }
        } else {
            for path in walk.by_ref() {
                if is_reference(path.as_path()) {
                    continue;
                }
                let outcome = evaluate(kernel, &comparator, &path, verbose);
                result.record(path, outcome);
            }
        }

        result.unreadable_dirs = walk
            .into_unreadable()
            .into_iter()
            .map(|e| match e {
                SearchError::DirectoryAccess { path, reason } => SkippedEntry { path, reason },
                other => SkippedEntry {
                    path: request.directory.clone(),
                    reason: other.to_string(),
                },
            })
            .collect();
        result.cancelled = self.cancel.is_cancelled();

        if result.cancelled {
            tracing::warn!("Search cancelled after {} candidates", result.scanned);
        }
        tracing::info!(
            "Scanned {} candidates: {} matched, {} skipped",
            result.scanned,
            result.matches.len(),
            result.skipped.len()
        );
        self.enter(SearchPhase::Done);
        Ok(result)
    }
}

/// Check the request before any geometry work
fn validate(request: &SearchRequest) -> Result<ToleranceConfig, SearchError> {
    if !request.reference.is_file() {
        return Err(SearchError::Input(format!(
            "reference file not found: {}",
            request.reference.display()
        )));
    }
    if !request.directory.is_dir() {
        return Err(SearchError::Input(format!(
            "search directory not found: {}",
            request.directory.display()
        )));
    }
    if request.options.suffixes.is_empty() {
        return Err(SearchError::Input(
            "at least one candidate suffix is required".into(),
        ));
    }
    if request.options.suffixes.iter().any(|s| s.trim().is_empty()) {
        return Err(SearchError::Input(
            "candidate suffixes must not be empty".into(),
        ));
    }
    ToleranceConfig::new(request.options.tolerance)
}

fn evaluate(
    kernel: &dyn GeometryKernel,
    comparator: &SimilarityComparator,
    path: &Path,
    verbose: bool,
) -> Outcome {
    match ShapeDescriptor::extract(kernel, path, verbose) {
        Ok(candidate) => {
            let deviation = comparator.deviation(&candidate);
            let tolerance = comparator.tolerance().tolerance_percentage;
            tracing::debug!(
                "{}: volume {:.6}, max deviation {:.4}",
                path.display(),
                candidate.volume,
                deviation.max()
            );
            if deviation.within(tolerance) {
                tracing::info!("Match: {}", path.display());
                Outcome::Matched(candidate, deviation)
            } else {
                Outcome::Rejected
            }
        }
        Err(e) => {
            tracing::warn!("Skipping {}: {}", path.display(), e);
            Outcome::Skipped(e.to_string())
        }
    }
}

/// Find the files under `directory` that match `reference`
///
/// Uses the default suffix and sequential evaluation; see
/// [`SearchOrchestrator`] for the full result and options.
pub fn search_directory(
    kernel: &dyn GeometryKernel,
    reference: impl AsRef<Path>,
    directory: impl AsRef<Path>,
    max_depth: usize,
    tolerance: f64,
) -> Result<Vec<PathBuf>, SearchError> {
    let request = SearchRequest::new(reference.as_ref(), directory.as_ref()).with_options(
        SearchOptions {
            tolerance,
            max_depth,
            ..SearchOptions::default()
        },
    );
    SearchOrchestrator::new(kernel)
        .run(&request)
        .map(|result| result.paths())
}
