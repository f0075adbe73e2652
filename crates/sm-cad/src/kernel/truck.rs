//! Truck Geometry Kernel Backend
//!
//! Pure Rust kernel: STL meshes through stl_io, STEP B-reps through
//! truck-stepio with truck-meshalgo tessellation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::mesh::{MeshBody, load_stl};
use super::step::load_step;
use super::{BoundingBox, CadError, CadResult, GeometryKernel, Solid};

/// Tunables for the truck backend
#[derive(Debug, Clone)]
pub struct KernelOptions {
    /// Final tessellation tolerance as a fraction of the part diameter
    pub tessellation_ratio: f64,
    /// Reject STL meshes that are not closed manifolds
    pub strict_manifold: bool,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            tessellation_ratio: 0.001,
            strict_manifold: false,
        }
    }
}

/// Truck-based geometry kernel
pub struct TruckKernel {
    options: KernelOptions,
    /// Storage for loaded bodies (keyed by UUID)
    bodies: Mutex<HashMap<Uuid, Arc<MeshBody>>>,
}

impl TruckKernel {
    /// Create a new Truck kernel
    pub fn new() -> Self {
        Self::with_options(KernelOptions::default())
    }

    /// Create a kernel with custom options
    pub fn with_options(options: KernelOptions) -> Self {
        Self {
            options,
            bodies: Mutex::new(HashMap::new()),
        }
    }

    /// Number of bodies currently held
    pub fn live_solids(&self) -> usize {
        self.bodies.lock().len()
    }

    /// Store a body and return a Solid reference
    fn store_body(&self, body: MeshBody) -> Solid {
        let id = Uuid::new_v4();
        self.bodies.lock().insert(id, Arc::new(body));
        Solid::new(id)
    }

    /// Run a query against a stored body
    ///
    /// The store lock is only held to look the body up, so measurements of
    /// different solids run concurrently.
    fn with_body<T>(
        &self,
        solid: &Solid,
        f: impl FnOnce(&MeshBody) -> CadResult<T>,
    ) -> CadResult<T> {
        let body = self
            .bodies
            .lock()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))?;
        f(body.as_ref())
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryKernel for TruckKernel {
    fn name(&self) -> &str {
        "truck"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn load_mesh(&self, path: &Path) -> CadResult<Solid> {
        let body = load_stl(path, self.options.strict_manifold)?;
        tracing::debug!(
            "Loaded mesh {} ({} triangles)",
            path.display(),
            body.triangles.len()
        );
        Ok(self.store_body(body))
    }

    fn load_brep(&self, path: &Path, verbose: bool) -> CadResult<Solid> {
        let body = load_step(path, self.options.tessellation_ratio, verbose)?;
        tracing::debug!(
            "Loaded STEP {} ({} shells, {} faces)",
            path.display(),
            body.shell_count,
            body.face_count
        );
        Ok(self.store_body(body))
    }

    fn volume(&self, solid: &Solid) -> CadResult<f64> {
        self.with_body(solid, MeshBody::volume)
    }

    fn bounding_box(&self, solid: &Solid) -> CadResult<BoundingBox> {
        self.with_body(solid, MeshBody::bounding_box)
    }

    fn face_count(&self, solid: &Solid) -> CadResult<usize> {
        self.with_body(solid, |body| Ok(body.face_count))
    }

    fn shell_count(&self, solid: &Solid) -> CadResult<usize> {
        self.with_body(solid, |body| Ok(body.shell_count))
    }

    fn release(&self, solid: &Solid) {
        self.bodies.lock().remove(&solid.id);
    }
}
