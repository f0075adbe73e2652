//! Comparable shape summaries extracted from CAD files

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use sm_cad::{BoundingBox, CadError, CadErrorKind, GeometryKernel, LoadedSolid};

use crate::error::SearchError;
use crate::format::ShapeFormat;

/// Volume, extent and topology counts of one loaded solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Enclosed volume
    pub volume: f64,
    /// Axis-aligned bounding box
    pub bounding_box: BoundingBox,
    /// Bounding box extent (x, y, z)
    pub size: DVec3,
    /// Topological face count (not used for matching)
    pub num_faces: usize,
    /// Topological shell count (not used for matching)
    pub num_shells: usize,
}

impl ShapeDescriptor {
    /// Build a descriptor from raw measurements
    pub fn new(
        volume: f64,
        bounding_box: BoundingBox,
        num_faces: usize,
        num_shells: usize,
    ) -> Self {
        Self {
            volume,
            size: bounding_box.size(),
            bounding_box,
            num_faces,
            num_shells,
        }
    }

    /// Load a file through the kernel and measure it
    ///
    /// The loader is chosen from the file extension. The kernel handle is held
    /// only while measuring and released before returning, on success and on
    /// error alike.
    pub fn extract(
        kernel: &dyn GeometryKernel,
        path: &Path,
        verbose: bool,
    ) -> Result<Self, SearchError> {
        let loaded = match ShapeFormat::from_path(path) {
            ShapeFormat::Mesh => LoadedSolid::mesh(kernel, path),
            ShapeFormat::BRep => LoadedSolid::brep(kernel, path, verbose),
            ShapeFormat::Unknown => Err(CadError::UnsupportedFormat(format!(
                "{} is neither STL nor STEP",
                path.display()
            ))),
        }
        .map_err(|e| classify(path, e))?;

        let volume = loaded.volume().map_err(|e| classify(path, e))?;
        let bounding_box = loaded.bounding_box().map_err(|e| classify(path, e))?;
        let num_faces = loaded.face_count().map_err(|e| classify(path, e))?;
        let num_shells = loaded.shell_count().map_err(|e| classify(path, e))?;

        Ok(Self::new(volume, bounding_box, num_faces, num_shells))
    }
}

/// Sort a kernel error into the load or geometry bucket
fn classify(path: &Path, source: CadError) -> SearchError {
    let path = path.to_path_buf();
    match source.kind() {
        CadErrorKind::Geometry => SearchError::Geometry { path, source },
        CadErrorKind::Load | CadErrorKind::Unavailable => SearchError::Load { path, source },
    }
}
