//! Geometry Kernel Abstraction
//!
//! This crate provides:
//! - The `GeometryKernel` trait for loading and measuring CAD solids
//! - Scoped solid handles that release kernel storage on drop
//! - A pure Rust backend (STL via stl_io, STEP via truck-stepio)

pub mod kernel;

// Re-exports for convenience
#[cfg(feature = "truck")]
pub use kernel::{KernelOptions, TruckKernel};
pub use kernel::{
    BoundingBox, CadError, CadErrorKind, CadResult, GeometryKernel, LoadedSolid, MeshBody,
    NullKernel, Solid, default_kernel, load_stl,
};
