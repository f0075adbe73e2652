//! stepmatch core
//!
//! This crate finds the CAD files in a directory tree that describe the same
//! part as a reference model:
//! - ShapeDescriptor: volume, bounding box and topology counts of one file
//! - SimilarityComparator: relative-tolerance match against a reference
//! - BoundedTreeWalker: depth-limited candidate enumeration
//! - SearchOrchestrator: the end-to-end search and its MatchResult

pub mod cancel;
pub mod compare;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod options;
pub mod search;
pub mod walk;

#[cfg(test)]
mod testing;

pub use cancel::*;
pub use compare::*;
pub use constants::*;
pub use descriptor::*;
pub use error::*;
pub use format::*;
pub use options::*;
pub use search::*;
pub use walk::*;
