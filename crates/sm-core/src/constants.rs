//! Global constants for sm-core

/// Default relative tolerance for volume and size comparison
pub const DEFAULT_TOLERANCE: f64 = 0.02;

/// Default traversal depth below the search root
pub const DEFAULT_MAX_DEPTH: usize = 1;

/// Default candidate file suffix
pub const DEFAULT_SUFFIX: &str = ".step";
