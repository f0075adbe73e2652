//! Geometry kernel trait definitions
//!
//! These traits define the interface that all geometry kernels must implement.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Axis-aligned bounding box of a solid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner (xmin, ymin, zmin)
    pub min: DVec3,
    /// Maximum corner (xmax, ymax, zmax)
    pub max: DVec3,
}

impl BoundingBox {
    /// Create a bounding box from two corners, ordering each axis
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing all points, or `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Extent along each axis (xmax - xmin, ymax - ymin, zmax - zmin)
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the box diagonal
    pub fn diameter(&self) -> f64 {
        self.size().length()
    }

    /// The six coordinates as (xmin, ymin, zmin, xmax, ymax, zmax)
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }
}

/// Error type for geometry kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Mesh import failed: {0}")]
    MeshImport(String),

    #[error("STEP import failed: {0}")]
    StepImport(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No solid found: {0}")]
    EmptySolid(String),

    #[error("Geometry computation failed: {0}")]
    Geometry(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),
}

/// Coarse classification of a [`CadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadErrorKind {
    /// The file could not be read or parsed into a solid
    Load,
    /// The solid loaded but a measurement failed
    Geometry,
    /// No usable kernel backend
    Unavailable,
}

impl CadError {
    /// Classify this error
    pub fn kind(&self) -> CadErrorKind {
        match self {
            CadError::KernelNotAvailable(_) => CadErrorKind::Unavailable,
            CadError::FileIo(_)
            | CadError::MeshImport(_)
            | CadError::StepImport(_)
            | CadError::UnsupportedFormat(_)
            | CadError::EmptySolid(_) => CadErrorKind::Load,
            CadError::Geometry(_) | CadError::SolidNotFound(_) => CadErrorKind::Geometry,
        }
    }
}

/// Result type for kernel operations
pub type CadResult<T> = Result<T, CadError>;

/// Handle to a solid body held by a kernel
///
/// The geometry itself stays inside the kernel; the handle is only valid for
/// the kernel that produced it and until it is released.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
}

impl Solid {
    /// Create a new solid handle with the given ID
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// The geometry kernel trait
///
/// Implementations load CAD files into solids and measure them. All calls
/// are blocking.
pub trait GeometryKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Load a tessellated mesh file (STL) as a solid
    fn load_mesh(&self, path: &Path) -> CadResult<Solid>;

    /// Load a boundary-representation file (STEP) as a solid
    ///
    /// # Arguments
    /// * `path` - Path to the STEP file
    /// * `verbose` - Log per-shell progress while loading
    fn load_brep(&self, path: &Path, verbose: bool) -> CadResult<Solid>;

    /// Enclosed volume of a solid
    fn volume(&self, solid: &Solid) -> CadResult<f64>;

    /// Axis-aligned bounding box of a solid
    fn bounding_box(&self, solid: &Solid) -> CadResult<BoundingBox>;

    /// Number of topological faces
    fn face_count(&self, solid: &Solid) -> CadResult<usize>;

    /// Number of topological shells
    fn shell_count(&self, solid: &Solid) -> CadResult<usize>;

    /// Drop any kernel-side data held for the solid
    fn release(&self, solid: &Solid);
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn load_mesh(&self, _path: &Path) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No geometry kernel available for mesh import".into(),
        ))
    }

    fn load_brep(&self, _path: &Path, _verbose: bool) -> CadResult<Solid> {
        Err(CadError::KernelNotAvailable(
            "No geometry kernel available for STEP import".into(),
        ))
    }

    fn volume(&self, solid: &Solid) -> CadResult<f64> {
        Err(CadError::SolidNotFound(solid.id))
    }

    fn bounding_box(&self, solid: &Solid) -> CadResult<BoundingBox> {
        Err(CadError::SolidNotFound(solid.id))
    }

    fn face_count(&self, solid: &Solid) -> CadResult<usize> {
        Err(CadError::SolidNotFound(solid.id))
    }

    fn shell_count(&self, solid: &Solid) -> CadResult<usize> {
        Err(CadError::SolidNotFound(solid.id))
    }

    fn release(&self, _solid: &Solid) {}
}

/// A solid borrowed from a kernel for the duration of a scope
///
/// The kernel handle is released when the guard is dropped, so every exit
/// path (including `?` returns) gives the kernel its storage back.
pub struct LoadedSolid<'k> {
    kernel: &'k dyn GeometryKernel,
    solid: Solid,
}

impl<'k> LoadedSolid<'k> {
    /// Load a mesh file and hold the resulting solid
    pub fn mesh(kernel: &'k dyn GeometryKernel, path: &Path) -> CadResult<Self> {
        let solid = kernel.load_mesh(path)?;
        Ok(Self { kernel, solid })
    }

    /// Load a B-rep file and hold the resulting solid
    pub fn brep(kernel: &'k dyn GeometryKernel, path: &Path, verbose: bool) -> CadResult<Self> {
        let solid = kernel.load_brep(path, verbose)?;
        Ok(Self { kernel, solid })
    }

    /// The underlying handle
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    pub fn volume(&self) -> CadResult<f64> {
        self.kernel.volume(&self.solid)
    }

    pub fn bounding_box(&self) -> CadResult<BoundingBox> {
        self.kernel.bounding_box(&self.solid)
    }

    pub fn face_count(&self) -> CadResult<usize> {
        self.kernel.face_count(&self.solid)
    }

    pub fn shell_count(&self) -> CadResult<usize> {
        self.kernel.shell_count(&self.solid)
    }
}

impl Drop for LoadedSolid<'_> {
    fn drop(&mut self) {
        self.kernel.release(&self.solid);
    }
}
