//! stepmatch - find the STEP files that match a reference STL
//!
//! Compares volume and bounding box extents of every candidate under a
//! directory (up to a fixed depth) against the reference, within a relative
//! tolerance, and prints the matching paths.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sm_cad::GeometryKernel;
use sm_core::{MatchResult, SearchError, SearchOptions, SearchOrchestrator, SearchRequest};

#[derive(Parser, Debug)]
#[command(name = "stepmatch")]
#[command(about = "Find STEP files geometrically equivalent to a reference STL", long_about = None)]
struct Cli {
    /// Reference model (STL)
    stl_file: PathBuf,

    /// Directory to search
    directory: PathBuf,

    /// Relative tolerance for volume and each bounding box extent (default: 0.02)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Directory levels below DIRECTORY to search, 0 = only its own files (default: 1)
    #[arg(long, allow_negative_numbers = true)]
    depth: Option<i64>,

    /// Candidate file suffix, may be repeated (default: .step)
    #[arg(long = "suffix")]
    suffixes: Vec<String>,

    /// Evaluate candidates in parallel
    #[arg(long)]
    parallel: bool,

    /// Treat STL meshes that are not closed manifolds as geometry errors
    #[arg(long)]
    strict_manifold: bool,

    /// Debug logging and per-shell STEP loader output
    #[arg(short, long)]
    verbose: bool,

    /// RON profile with default search options; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Profile (or built-in defaults) with command-line overrides applied
    fn search_options(&self) -> Result<SearchOptions> {
        let mut options = match &self.config {
            Some(path) => SearchOptions::load(path)
                .with_context(|| format!("Failed to load profile {}", path.display()))?,
            None => SearchOptions::default(),
        };

        if let Some(tolerance) = self.tolerance {
            options.tolerance = tolerance;
        }
        if let Some(depth) = self.depth {
            options.max_depth = usize::try_from(depth).map_err(|_| {
                SearchError::Input(format!("depth must be 0 or greater, got {depth}"))
            })?;
        }
        if !self.suffixes.is_empty() {
            options.suffixes = self.suffixes.clone();
        }
        options.parallel |= self.parallel;
        options.verbose_brep |= self.verbose;
        Ok(options)
    }

    fn kernel(&self) -> Box<dyn GeometryKernel> {
        #[cfg(feature = "truck")]
        {
            Box::new(sm_cad::TruckKernel::with_options(sm_cad::KernelOptions {
                strict_manifold: self.strict_manifold,
                ..Default::default()
            }))
        }

        #[cfg(not(feature = "truck"))]
        {
            if self.strict_manifold {
                tracing::warn!("--strict-manifold has no effect without a geometry kernel");
            }
            sm_cad::default_kernel()
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_filter = if verbose {
        "sm_cli=debug,sm_core=debug,sm_cad=debug"
    } else {
        "sm_cli=info,sm_core=info,sm_cad=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn render_text(result: &MatchResult) -> String {
    if result.matches.is_empty() {
        return "No matching STEP files found.\n".to_string();
    }
    let mut out = String::from("Matching STEP files found:\n");
    for path in result.paths() {
        out.push_str(&path.display().to_string());
        out.push('\n');
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.search_options()?;
    let kernel = cli.kernel();
    tracing::debug!("Using geometry kernel '{}'", kernel.name());

    let request = SearchRequest::new(&cli.stl_file, &cli.directory).with_options(options);
    let result = SearchOrchestrator::new(&*kernel)
        .run(&request)
        .with_context(|| format!("Search for {} failed", cli.stl_file.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        print!("{}", render_text(&result));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stepmatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = parse(&["ref.stl", "parts"]).search_options().unwrap();
        assert_eq!(options, SearchOptions::default());
    }

    #[test]
    fn test_flags_override_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("archive.ron");
        SearchOptions {
            tolerance: 0.1,
            max_depth: 4,
            suffixes: vec![".stp".into()],
            ..SearchOptions::default()
        }
        .save(&profile)
        .unwrap();

        let cli = parse(&[
            "ref.stl",
            "parts",
            "--config",
            profile.to_str().unwrap(),
            "--depth",
            "0",
            "--parallel",
        ]);
        let options = cli.search_options().unwrap();
        assert_eq!(options.tolerance, 0.1);
        assert_eq!(options.max_depth, 0);
        assert_eq!(options.suffixes, vec![".stp".to_string()]);
        assert!(options.parallel);
    }

    #[test]
    fn test_repeated_suffix() {
        let cli = parse(&["ref.stl", "parts", "--suffix", ".step", "--suffix", ".stp"]);
        let options = cli.search_options().unwrap();
        assert_eq!(options.suffixes, vec![".step".to_string(), ".stp".to_string()]);
    }

    #[test]
    fn test_negative_depth_rejected() {
        let cli = parse(&["ref.stl", "parts", "--depth", "-1"]);
        let err = cli.search_options().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SearchError>(),
            Some(SearchError::Input(_))
        ));
    }

    #[test]
    fn test_missing_profile() {
        let cli = parse(&["ref.stl", "parts", "--config", "/nonexistent/profile.ron"]);
        assert!(cli.search_options().is_err());
    }
}
